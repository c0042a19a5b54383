//! Semantic conflict detection.
//!
//! Three snapshots (base, local, remote) are compared record by record and
//! field by field. A field conflicts only when local and remote both moved
//! away from base and did not land on the same value; absence counts as a
//! value. Records never influence each other.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::field_diff::{diff_fields_with, field_names};
use super::matcher::EntryMatcher;
use super::plan::MergePlan;
use crate::config::{BothAddedPolicy, MergePolicy};
use crate::models::{FieldChange, Record, RecordDiff, Snapshot, TypeChange};

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// One conflicting field with its value on each side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldConflict {
    pub field: String,
    pub base: Option<String>,
    pub local: Option<String>,
    pub remote: Option<String>,
}

/// Conflicting entry types. `None` means the record is absent on that side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeConflict {
    pub base: Option<String>,
    pub local: Option<String>,
    pub remote: Option<String>,
}

/// Every conflict found in one record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordConflict {
    pub citation_key: String,
    pub base: Option<Record>,
    pub local: Option<Record>,
    pub remote: Option<Record>,
    /// Conflicting fields in field-name order.
    pub fields: Vec<FieldConflict>,
    pub entry_type: Option<TypeConflict>,
}

impl RecordConflict {
    pub fn field(&self, name: &str) -> Option<&FieldConflict> {
        self.fields.iter().find(|fc| fc.field == name)
    }

    /// The conflicting part of the record as a local -> remote diff.
    ///
    /// When one side deleted the record, the diff runs from base to the
    /// surviving side instead, so every edit that blocks the deletion shows.
    pub fn diff(&self) -> RecordDiff {
        let field_changes = self
            .fields
            .iter()
            .filter_map(|fc| {
                let (old, new) = self.endpoints(&fc.base, &fc.local, &fc.remote);
                FieldChange::between(&fc.field, old.as_deref(), new.as_deref())
            })
            .collect();
        let type_change = self.entry_type.as_ref().map(|tc| {
            let (old, new) = self.endpoints(&tc.base, &tc.local, &tc.remote);
            TypeChange {
                old_type: old.clone(),
                new_type: new.clone(),
            }
        });
        RecordDiff {
            citation_key: self.citation_key.clone(),
            field_changes,
            type_change,
        }
    }

    /// Old and new side of the diff for one conflicting value.
    fn endpoints<'v>(
        &self,
        base: &'v Option<String>,
        local: &'v Option<String>,
        remote: &'v Option<String>,
    ) -> (&'v Option<String>, &'v Option<String>) {
        match (&self.local, &self.remote) {
            (None, Some(_)) => (base, remote),
            (Some(_), None) => (base, local),
            _ => (local, remote),
        }
    }
}

/// Conflicts of a three-way comparison, in citation-key order.
///
/// A record appears at most once. An empty report means the merge is clean.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConflictReport {
    entries: Vec<RecordConflict>,
}

impl ConflictReport {
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn entries(&self) -> &[RecordConflict] {
        &self.entries
    }

    pub fn iter(&self) -> std::slice::Iter<'_, RecordConflict> {
        self.entries.iter()
    }

    pub fn get(&self, citation_key: &str) -> Option<&RecordConflict> {
        self.entries
            .binary_search_by(|c| c.citation_key.as_str().cmp(citation_key))
            .ok()
            .map(|index| &self.entries[index])
    }

    /// `true` when `field` of `citation_key` is part of a conflict.
    pub fn is_field_conflicting(&self, citation_key: &str, field: &str) -> bool {
        self.get(citation_key)
            .is_some_and(|conflict| conflict.field(field).is_some())
    }

    /// One [`RecordDiff`] per conflicting record.
    pub fn record_diffs(&self) -> Vec<RecordDiff> {
        self.entries.iter().map(RecordConflict::diff).collect()
    }

    /// Render the report as pretty JSON for a presentation layer.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

impl<'a> IntoIterator for &'a ConflictReport {
    type Item = &'a RecordConflict;
    type IntoIter = std::slice::Iter<'a, RecordConflict>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

// ---------------------------------------------------------------------------
// Detector
// ---------------------------------------------------------------------------

/// Stateless detector parameterized by a [`MergePolicy`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SemanticConflictDetector {
    policy: MergePolicy,
}

impl SemanticConflictDetector {
    pub fn new(policy: MergePolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &MergePolicy {
        &self.policy
    }

    /// Build the forward patch that turns `base` into `remote`.
    pub fn extract_merge_plan(&self, base: &Snapshot, remote: &Snapshot) -> MergePlan {
        let matched = EntryMatcher::match_entries(base, remote);
        let mut plan = MergePlan::default();

        for (base_record, remote_record) in &matched.common {
            let key = base_record.usable_key().unwrap_or_default();
            let changes = diff_fields_with(base_record.fields(), remote_record.fields(), &self.policy);
            if !changes.is_empty() {
                debug!(citation_key = key, changes = changes.len(), "field changes");
                plan.add_field_changes(key, changes);
            }
            if base_record.entry_type() != remote_record.entry_type() {
                debug!(
                    citation_key = key,
                    new_type = remote_record.entry_type(),
                    "type change"
                );
                plan.set_type_change(key, remote_record.entry_type());
            }
        }

        for record in matched.only_in_b {
            // An unkeyed record that already existed in base is not new.
            if record.usable_key().is_none() && base.unkeyed().contains(record) {
                continue;
            }
            plan.insert_record(record.clone());
        }

        for record in matched.only_in_a {
            if let Some(key) = record.usable_key() {
                plan.delete(key);
            }
        }

        info!(
            insertions = plan.insertions().len(),
            deletions = plan.deletions().len(),
            patched = plan.field_changes().len(),
            retyped = plan.type_changes().len(),
            "merge plan extracted"
        );
        plan
    }

    /// Compare base, local and remote and collect every conflicting record.
    pub fn detect_conflicts(
        &self,
        base: &Snapshot,
        local: &Snapshot,
        remote: &Snapshot,
    ) -> ConflictReport {
        let keys: BTreeSet<&str> = base.keys().chain(local.keys()).chain(remote.keys()).collect();
        info!(records = keys.len(), "detecting conflicts");

        let entries: Vec<RecordConflict> = keys
            .into_iter()
            .filter_map(|key| {
                self.detect_record(key, base.get(key), local.get(key), remote.get(key))
            })
            .collect();

        info!(count = entries.len(), "conflict detection complete");
        ConflictReport { entries }
    }

    /// Classify one record across the three snapshots.
    fn detect_record(
        &self,
        key: &str,
        base: Option<&Record>,
        local: Option<&Record>,
        remote: Option<&Record>,
    ) -> Option<RecordConflict> {
        let (fields, entry_type) = match (base, local, remote) {
            (_, None, None) => return None,
            (None, Some(l), Some(r)) if self.policy.both_added == BothAddedPolicy::Conflict => {
                self.differences(l, r)
            }
            (Some(b), None, Some(survivor)) | (Some(b), Some(survivor), None) => {
                self.deletion_against_edit(b, local, remote, survivor)
            }
            _ => self.three_way(base, local, remote),
        };

        if fields.is_empty() && entry_type.is_none() {
            return None;
        }

        debug!(
            citation_key = key,
            fields = fields.len(),
            type_conflict = entry_type.is_some(),
            "conflict detected"
        );
        Some(RecordConflict {
            citation_key: key.to_string(),
            base: base.cloned(),
            local: local.cloned(),
            remote: remote.cloned(),
            fields,
            entry_type,
        })
    }

    /// Per-field classification over the union of field names.
    fn three_way(
        &self,
        base: Option<&Record>,
        local: Option<&Record>,
        remote: Option<&Record>,
    ) -> (Vec<FieldConflict>, Option<TypeConflict>) {
        let names = field_names([base, local, remote].into_iter().flatten().map(Record::fields));

        let fields = names
            .into_iter()
            .filter_map(|name| {
                let triple = field_triple(name, base, local, remote);
                self.is_conflict(
                    triple.base.as_deref(),
                    triple.local.as_deref(),
                    triple.remote.as_deref(),
                )
                .then_some(triple)
            })
            .collect();

        let base_type = base.map(Record::entry_type);
        let local_type = local.map(Record::entry_type);
        let remote_type = remote.map(Record::entry_type);
        let type_conflict = local_type != remote_type
            && local_type != base_type
            && remote_type != base_type;

        (fields, type_conflict.then(|| type_triple(base, local, remote)))
    }

    /// One side deleted the record; the survivor conflicts wherever it
    /// differs from base.
    fn deletion_against_edit(
        &self,
        base: &Record,
        local: Option<&Record>,
        remote: Option<&Record>,
        survivor: &Record,
    ) -> (Vec<FieldConflict>, Option<TypeConflict>) {
        let fields = field_names([base.fields(), survivor.fields()])
            .into_iter()
            .filter(|name| !self.policy.values_equal(base.field(name), survivor.field(name)))
            .map(|name| field_triple(name, Some(base), local, remote))
            .collect();
        let entry_type = (base.entry_type() != survivor.entry_type())
            .then(|| type_triple(Some(base), local, remote));
        (fields, entry_type)
    }

    /// Every difference between two independently created records.
    fn differences(
        &self,
        local: &Record,
        remote: &Record,
    ) -> (Vec<FieldConflict>, Option<TypeConflict>) {
        let fields = field_names([local.fields(), remote.fields()])
            .into_iter()
            .filter(|name| !self.policy.values_equal(local.field(name), remote.field(name)))
            .map(|name| field_triple(name, None, Some(local), Some(remote)))
            .collect();
        let entry_type = (local.entry_type() != remote.entry_type())
            .then(|| type_triple(None, Some(local), Some(remote)));
        (fields, entry_type)
    }

    /// The three-way rule for one value.
    pub(crate) fn is_conflict(
        &self,
        base: Option<&str>,
        local: Option<&str>,
        remote: Option<&str>,
    ) -> bool {
        !self.policy.values_equal(local, remote)
            && !self.policy.values_equal(local, base)
            && !self.policy.values_equal(remote, base)
    }
}

fn field_triple(
    name: &str,
    base: Option<&Record>,
    local: Option<&Record>,
    remote: Option<&Record>,
) -> FieldConflict {
    let value = |record: Option<&Record>| record.and_then(|r| r.field(name)).map(str::to_string);
    FieldConflict {
        field: name.to_string(),
        base: value(base),
        local: value(local),
        remote: value(remote),
    }
}

fn type_triple(base: Option<&Record>, local: Option<&Record>, remote: Option<&Record>) -> TypeConflict {
    let entry_type = |record: Option<&Record>| record.map(|r| r.entry_type().to_string());
    TypeConflict {
        base: entry_type(base),
        local: entry_type(local),
        remote: entry_type(remote),
    }
}
