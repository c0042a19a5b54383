//! Semantic three-way merging of bibliography snapshots.
//!
//! The conflict subsystem is responsible for:
//! 1. **Detection** -- classifying every field touched by local and remote
//!    relative to base as conflicting or not.
//! 2. **Planning** -- extracting a forward patch from (base, remote), or a
//!    conflict-free patch from all three snapshots.
//! 3. **Merging** -- replaying a plan against a target snapshot.
//! 4. **Resolution** -- folding human decisions back into a plan.

pub mod analyzer;
pub mod detector;
pub mod field_diff;
pub mod matcher;
pub mod merger;
pub mod plan;
pub mod resolver;

pub use analyzer::{MergeAnalysis, SemanticMergeAnalyzer};
pub use detector::{
    ConflictReport, FieldConflict, RecordConflict, SemanticConflictDetector, TypeConflict,
};
pub use field_diff::{diff_fields, diff_fields_with};
pub use matcher::{EntryMatch, EntryMatcher};
pub use merger::{ApplySummary, SemanticMerger};
pub use plan::MergePlan;
pub use resolver::{ConflictResolver, Resolution};

use crate::models::Snapshot;

/// Forward patch from `base` to `remote` with the default policy.
pub fn extract_merge_plan(base: &Snapshot, remote: &Snapshot) -> MergePlan {
    SemanticConflictDetector::default().extract_merge_plan(base, remote)
}

/// Three-way conflict detection with the default policy.
pub fn detect_conflicts(base: &Snapshot, local: &Snapshot, remote: &Snapshot) -> ConflictReport {
    SemanticConflictDetector::default().detect_conflicts(base, local, remote)
}

/// Patch `target` in place with `plan`.
pub fn apply_merge_plan(target: &mut Snapshot, plan: &MergePlan) -> ApplySummary {
    SemanticMerger::apply_merge_plan(target, plan)
}
