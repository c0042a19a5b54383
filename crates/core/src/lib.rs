//! bibmerge core library.
//!
//! Field-level three-way merging for bibliographies kept under version
//! control. Records are matched by citation key and compared field by field,
//! so reordered fields, reformatted entries, or edits to unrelated fields
//! never produce a spurious conflict.
//!
//! Reading revisions, parsing and serializing bibliography text, and
//! presenting conflicts are left to the caller; this crate works on parsed
//! [`Snapshot`]s only.

pub mod config;
pub mod conflict;
pub mod errors;
pub mod models;

// Re-exports for convenience.
pub use config::{MergeConfig, MergePolicy};
pub use conflict::{
    apply_merge_plan, detect_conflicts, extract_merge_plan, ConflictReport, MergeAnalysis,
    MergePlan, SemanticConflictDetector, SemanticMergeAnalyzer, SemanticMerger,
};
pub use errors::CoreError;
pub use models::{FieldChange, Record, RecordDiff, Snapshot};
