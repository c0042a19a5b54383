//! Conflict resolution actions.
//!
//! A presentation layer shows a [`RecordConflict`] to a person and feeds the
//! decision back here. [`ConflictResolver::amend_plan`] folds that decision
//! into a [`MergePlan`] so the merger can apply it together with the
//! non-conflicting changes.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::detector::{FieldConflict, RecordConflict};
use super::plan::MergePlan;
use crate::errors::ConflictError;
use crate::models::FieldChange;

/// Named resolution strategies for one conflicting record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Resolution {
    /// Keep the local version.
    AcceptLocal,
    /// Take the remote version, including a remote deletion.
    AcceptRemote,
    /// Explicit values for conflicting fields; `None` clears the field.
    AcceptValues(BTreeMap<String, Option<String>>),
    /// Leave the conflict for later; the plan is not touched.
    Deferred,
}

/// Stateless conflict resolution operations.
pub struct ConflictResolver;

impl ConflictResolver {
    /// Return `plan` extended with the edits `resolution` implies for
    /// `conflict`, meant to be applied to the local snapshot.
    pub fn amend_plan(
        mut plan: MergePlan,
        conflict: &RecordConflict,
        resolution: &Resolution,
    ) -> Result<MergePlan, ConflictError> {
        let key = conflict.citation_key.as_str();
        info!(citation_key = key, ?resolution, "resolving conflict");

        match resolution {
            Resolution::AcceptLocal | Resolution::Deferred => {}
            Resolution::AcceptRemote => match (&conflict.local, &conflict.remote) {
                (None, None) => {}
                (Some(_), None) => {
                    plan.forget(key);
                    plan.delete(key);
                }
                (None, Some(remote)) => {
                    plan.forget(key);
                    plan.insert_record(remote.clone());
                }
                (Some(_), Some(remote)) => {
                    let changes = conflict
                        .fields
                        .iter()
                        .filter_map(|fc| {
                            FieldChange::between(&fc.field, fc.local.as_deref(), fc.remote.as_deref())
                        })
                        .collect();
                    plan.add_field_changes(key, changes);
                    if conflict.entry_type.is_some() {
                        plan.set_type_change(key, remote.entry_type());
                    }
                }
            },
            Resolution::AcceptValues(values) => {
                let Some(local) = &conflict.local else {
                    return Err(ConflictError::InvalidResolution {
                        citation_key: key.to_string(),
                        detail: "entry no longer exists locally".into(),
                    });
                };
                let mut changes = Vec::with_capacity(values.len());
                for (field, value) in values {
                    if conflict.field(field).is_none() {
                        return Err(ConflictError::UnknownField {
                            citation_key: key.to_string(),
                            field: field.clone(),
                        });
                    }
                    if let Some(change) = FieldChange::between(field, local.field(field), value.as_deref())
                    {
                        changes.push(change);
                    }
                }
                plan.add_field_changes(key, changes);
            }
        }

        debug!(citation_key = key, "plan amended");
        Ok(plan)
    }

    /// The value `resolution` picks for one conflicting field.
    ///
    /// The outer `None` means the resolution does not decide this field; the
    /// inner `None` means the field ends up absent.
    pub fn resolved_value(
        resolution: &Resolution,
        conflict: &FieldConflict,
    ) -> Option<Option<String>> {
        match resolution {
            Resolution::AcceptLocal => Some(conflict.local.clone()),
            Resolution::AcceptRemote => Some(conflict.remote.clone()),
            Resolution::AcceptValues(values) => values.get(&conflict.field).cloned(),
            Resolution::Deferred => None,
        }
    }
}
