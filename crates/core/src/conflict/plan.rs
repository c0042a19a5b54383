//! Materialized forward patch between two snapshots.
//!
//! A [`MergePlan`] is read-only outside this crate. It is produced by
//! [`SemanticConflictDetector::extract_merge_plan`](super::SemanticConflictDetector::extract_merge_plan)
//! or [`SemanticMergeAnalyzer::analyze`](super::SemanticMergeAnalyzer::analyze),
//! amended by [`ConflictResolver`](super::ConflictResolver), and replayed by
//! [`SemanticMerger`](super::SemanticMerger).

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::models::{FieldChange, Record};

/// Insertions, deletions and per-record edits.
///
/// Insertions, deletions and field changes never share a citation key, so
/// the order in which they are applied does not matter. Type changes only
/// target keys that may also carry field changes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergePlan {
    insertions: Vec<Record>,
    deletions: BTreeSet<String>,
    field_changes: BTreeMap<String, Vec<FieldChange>>,
    type_changes: BTreeMap<String, String>,
}

impl MergePlan {
    /// Whole records to add.
    pub fn insertions(&self) -> &[Record] {
        &self.insertions
    }

    /// Citation keys to delete.
    pub fn deletions(&self) -> &BTreeSet<String> {
        &self.deletions
    }

    /// Field edits per citation key, each list ordered by field name.
    pub fn field_changes(&self) -> &BTreeMap<String, Vec<FieldChange>> {
        &self.field_changes
    }

    /// New entry type per citation key.
    pub fn type_changes(&self) -> &BTreeMap<String, String> {
        &self.type_changes
    }

    pub fn changes_for(&self, citation_key: &str) -> Option<&[FieldChange]> {
        self.field_changes.get(citation_key).map(Vec::as_slice)
    }

    /// The change a plan makes to one field of one record, if any.
    pub fn change_for_field(&self, citation_key: &str, field: &str) -> Option<&FieldChange> {
        self.changes_for(citation_key)?
            .iter()
            .find(|change| change.field() == field)
    }

    /// `true` when applying the plan cannot modify anything.
    pub fn is_empty(&self) -> bool {
        self.insertions.is_empty()
            && self.deletions.is_empty()
            && self.field_changes.is_empty()
            && self.type_changes.is_empty()
    }

    // -- construction (crate-internal) --------------------------------------

    pub(crate) fn insert_record(&mut self, record: Record) {
        self.insertions.push(record);
    }

    pub(crate) fn delete(&mut self, citation_key: impl Into<String>) {
        self.deletions.insert(citation_key.into());
    }

    /// Record field changes for a key, merging with any already present.
    ///
    /// A later change to the same field replaces the earlier one. Empty
    /// change lists leave the plan untouched.
    pub(crate) fn add_field_changes(&mut self, citation_key: &str, changes: Vec<FieldChange>) {
        if changes.is_empty() {
            return;
        }
        let existing = self.field_changes.entry(citation_key.to_string()).or_default();
        for change in changes {
            existing.retain(|c| c.field() != change.field());
            existing.push(change);
        }
        existing.sort_by(|a, b| a.field().cmp(b.field()));
    }

    pub(crate) fn set_type_change(&mut self, citation_key: &str, entry_type: impl Into<String>) {
        self.type_changes
            .insert(citation_key.to_string(), entry_type.into());
    }

    /// Drop every entry that targets `citation_key`.
    pub(crate) fn forget(&mut self, citation_key: &str) {
        self.insertions
            .retain(|record| record.usable_key() != Some(citation_key));
        self.deletions.remove(citation_key);
        self.field_changes.remove(citation_key);
        self.type_changes.remove(citation_key);
    }
}
