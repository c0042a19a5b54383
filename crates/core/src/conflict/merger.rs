//! Replays a [`MergePlan`] against a target snapshot.
//!
//! The merger does no conflict checking; it is a plain patch replay that
//! tolerates a target which has drifted from the plan's base. Replaying the
//! same plan twice leaves the target unchanged the second time.

use tracing::{debug, info};

use super::plan::MergePlan;
use crate::models::{FieldChange, Snapshot};

/// What a single [`SemanticMerger::apply_merge_plan`] call did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApplySummary {
    pub inserted: usize,
    pub deleted: usize,
    pub fields_set: usize,
    pub fields_cleared: usize,
    pub types_changed: usize,
    /// Plan entries that found nothing to act on in the target.
    pub skipped: usize,
}

impl ApplySummary {
    /// `true` when the target was not modified.
    pub fn is_noop(&self) -> bool {
        self.inserted == 0
            && self.deleted == 0
            && self.fields_set == 0
            && self.fields_cleared == 0
            && self.types_changed == 0
    }
}

/// Stateless patch replay engine.
pub struct SemanticMerger;

impl SemanticMerger {
    /// Patch `target` in place with `plan`.
    ///
    /// - deletions of missing keys are ignored;
    /// - an insertion whose key already exists leaves the existing record
    ///   untouched (first writer wins);
    /// - field and type changes for a missing record are skipped, so a
    ///   locally deleted record is never resurrected.
    pub fn apply_merge_plan(target: &mut Snapshot, plan: &MergePlan) -> ApplySummary {
        info!(
            insertions = plan.insertions().len(),
            deletions = plan.deletions().len(),
            patched = plan.field_changes().len(),
            "applying merge plan"
        );
        let mut summary = ApplySummary::default();

        for key in plan.deletions() {
            if target.remove(key).is_some() {
                debug!(citation_key = %key, "deleted entry");
                summary.deleted += 1;
            } else {
                summary.skipped += 1;
            }
        }

        for record in plan.insertions() {
            let exists = match record.usable_key() {
                Some(key) => target.contains_key(key),
                None => target.unkeyed().contains(record),
            };
            if exists {
                debug!(citation_key = ?record.citation_key(), "entry already present, keeping target");
                summary.skipped += 1;
            } else {
                target.insert(record.clone());
                summary.inserted += 1;
            }
        }

        for (key, changes) in plan.field_changes() {
            let Some(entry) = target.get_mut(key) else {
                debug!(citation_key = %key, "entry missing in target, skipping field changes");
                summary.skipped += 1;
                continue;
            };
            for change in changes {
                match change {
                    FieldChange::Added { field, new_value }
                    | FieldChange::Modified {
                        field, new_value, ..
                    } => {
                        if entry.field(field) != Some(new_value.as_str()) {
                            entry.set_field(field.clone(), new_value.clone());
                            summary.fields_set += 1;
                        }
                    }
                    FieldChange::Removed { field, .. } => {
                        if entry.clear_field(field).is_some() {
                            summary.fields_cleared += 1;
                        }
                    }
                }
            }
        }

        for (key, entry_type) in plan.type_changes() {
            match target.get_mut(key) {
                Some(entry) if entry.entry_type() != entry_type => {
                    entry.set_entry_type(entry_type.clone());
                    summary.types_changed += 1;
                }
                Some(_) => {}
                None => summary.skipped += 1,
            }
        }

        info!(?summary, "merge plan applied");
        summary
    }
}
