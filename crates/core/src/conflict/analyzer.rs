//! Three-way merge analysis.
//!
//! Where [`SemanticConflictDetector::extract_merge_plan`] replays everything
//! remote did since base, the analyzer builds a plan that is safe to apply on
//! top of local: it only carries remote changes that local has not touched
//! and that are not part of a conflict.

use std::collections::{BTreeMap, BTreeSet};

use tracing::{debug, info};

use super::detector::{ConflictReport, SemanticConflictDetector};
use super::field_diff::{diff_fields_with, field_names};
use super::plan::MergePlan;
use crate::config::MergePolicy;
use crate::models::{FieldChange, Record, Snapshot};

/// Result of a three-way analysis.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeAnalysis {
    /// Non-conflicting remote changes to apply to local.
    pub auto_plan: MergePlan,
    /// Everything that needs a human decision.
    pub conflicts: ConflictReport,
}

impl MergeAnalysis {
    pub fn is_clean(&self) -> bool {
        self.conflicts.is_empty()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SemanticMergeAnalyzer {
    detector: SemanticConflictDetector,
}

impl SemanticMergeAnalyzer {
    pub fn new(policy: MergePolicy) -> Self {
        Self {
            detector: SemanticConflictDetector::new(policy),
        }
    }

    pub fn analyze(&self, base: &Snapshot, local: &Snapshot, remote: &Snapshot) -> MergeAnalysis {
        let conflicts = self.detector.detect_conflicts(base, local, remote);
        let mut auto_plan = MergePlan::default();

        let keys: BTreeSet<&str> = base.keys().chain(local.keys()).chain(remote.keys()).collect();
        for key in keys {
            match (base.get(key), local.get(key), remote.get(key)) {
                (None, None, Some(r)) => {
                    debug!(citation_key = key, "new remote entry");
                    auto_plan.insert_record(r.clone());
                }
                (Some(b), l, None) => {
                    let untouched = l.map_or(true, |l| self.unchanged(b, l));
                    if untouched {
                        debug!(citation_key = key, "remote deletion");
                        auto_plan.delete(key);
                    }
                }
                (b, Some(l), Some(r)) => {
                    self.patch_record(&mut auto_plan, &conflicts, key, b, l, r);
                }
                // Local-only additions and local deletions are kept as they are.
                _ => {}
            }
        }

        // Remote-only unkeyed records that base did not already have.
        for record in remote.unkeyed() {
            if !base.unkeyed().contains(record) && !local.unkeyed().contains(record) {
                auto_plan.insert_record(record.clone());
            }
        }

        info!(
            conflicts = conflicts.len(),
            insertions = auto_plan.insertions().len(),
            deletions = auto_plan.deletions().len(),
            patched = auto_plan.field_changes().len(),
            "merge analysis complete"
        );
        MergeAnalysis {
            auto_plan,
            conflicts,
        }
    }

    /// Carry over remote edits to fields local left at their base value.
    fn patch_record(
        &self,
        plan: &mut MergePlan,
        conflicts: &ConflictReport,
        key: &str,
        base: Option<&Record>,
        local: &Record,
        remote: &Record,
    ) {
        let empty = BTreeMap::new();
        let base_fields = base.map_or(&empty, Record::fields);
        let policy = self.detector.policy();

        let changes: Vec<FieldChange> = field_names([base_fields, local.fields(), remote.fields()])
            .into_iter()
            .filter(|name| !conflicts.is_field_conflicting(key, name))
            .filter_map(|name| {
                let b = base_fields.get(name).map(String::as_str);
                let l = local.field(name);
                let r = remote.field(name);
                if policy.values_equal(l, r) || !policy.values_equal(l, b) {
                    return None;
                }
                FieldChange::between(name, l, r)
            })
            .collect();
        plan.add_field_changes(key, changes);

        let type_conflicting = conflicts
            .get(key)
            .is_some_and(|c| c.entry_type.is_some());
        let base_type = base.map(Record::entry_type);
        if !type_conflicting
            && local.entry_type() != remote.entry_type()
            && base_type == Some(local.entry_type())
        {
            plan.set_type_change(key, remote.entry_type());
        }
    }

    fn unchanged(&self, base: &Record, local: &Record) -> bool {
        base.entry_type() == local.entry_type()
            && diff_fields_with(base.fields(), local.fields(), self.detector.policy()).is_empty()
    }
}
