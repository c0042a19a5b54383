//! Domain model types used throughout bibmerge.
//!
//! A [`Snapshot`] is the parsed bibliography at one revision; it is produced
//! and consumed by collaborators outside this crate (parser, serializer).
//! Field absence is modelled as `None`, never as an empty string.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::errors::ModelError;

// ---------------------------------------------------------------------------
// Record
// ---------------------------------------------------------------------------

/// A single bibliographic record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    citation_key: Option<String>,
    entry_type: String,
    fields: BTreeMap<String, String>,
}

impl Record {
    /// Create a record with no fields.
    pub fn new(citation_key: impl Into<String>, entry_type: impl Into<String>) -> Self {
        Self {
            citation_key: Some(citation_key.into()),
            entry_type: entry_type.into(),
            fields: BTreeMap::new(),
        }
    }

    /// Create a record that carries no citation key.
    pub fn without_key(entry_type: impl Into<String>) -> Self {
        Self {
            citation_key: None,
            entry_type: entry_type.into(),
            fields: BTreeMap::new(),
        }
    }

    /// Builder-style field setter.
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_field(name, value);
        self
    }

    /// The raw citation key, usable or not.
    pub fn citation_key(&self) -> Option<&str> {
        self.citation_key.as_deref()
    }

    /// The citation key if it can identify the record across revisions.
    ///
    /// Blank keys are treated as missing.
    pub fn usable_key(&self) -> Option<&str> {
        self.citation_key
            .as_deref()
            .filter(|key| !key.trim().is_empty())
    }

    pub fn entry_type(&self) -> &str {
        &self.entry_type
    }

    pub fn set_entry_type(&mut self, entry_type: impl Into<String>) {
        self.entry_type = entry_type.into();
    }

    pub fn fields(&self) -> &BTreeMap<String, String> {
        &self.fields
    }

    /// Value of a field, `None` when the field is absent.
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }

    /// Set a field, returning the previous value.
    pub fn set_field(&mut self, name: impl Into<String>, value: impl Into<String>) -> Option<String> {
        self.fields.insert(name.into(), value.into())
    }

    /// Remove a field, returning the previous value.
    pub fn clear_field(&mut self, name: &str) -> Option<String> {
        self.fields.remove(name)
    }
}

// ---------------------------------------------------------------------------
// Snapshot
// ---------------------------------------------------------------------------

/// All records of a bibliography at one point in history.
///
/// Keyed records are indexed by citation key. Records without a usable key
/// are kept separately in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    entries: BTreeMap<String, Record>,
    unkeyed: Vec<Record>,
}

impl Snapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a snapshot, rejecting duplicate citation keys.
    pub fn try_from_records<I>(records: I) -> Result<Self, ModelError>
    where
        I: IntoIterator<Item = Record>,
    {
        let mut snapshot = Self::new();
        for record in records {
            if let Some(key) = record.usable_key() {
                if snapshot.entries.contains_key(key) {
                    return Err(ModelError::DuplicateCitationKey(key.to_string()));
                }
            }
            snapshot.insert(record);
        }
        Ok(snapshot)
    }

    /// Add a record. A keyed record replaces (and returns) any record with the
    /// same key.
    pub fn insert(&mut self, record: Record) -> Option<Record> {
        match record.usable_key() {
            Some(key) => {
                let key = key.to_string();
                self.entries.insert(key, record)
            }
            None => {
                self.unkeyed.push(record);
                None
            }
        }
    }

    pub fn get(&self, citation_key: &str) -> Option<&Record> {
        self.entries.get(citation_key)
    }

    pub fn get_mut(&mut self, citation_key: &str) -> Option<&mut Record> {
        self.entries.get_mut(citation_key)
    }

    pub fn remove(&mut self, citation_key: &str) -> Option<Record> {
        self.entries.remove(citation_key)
    }

    pub fn contains_key(&self, citation_key: &str) -> bool {
        self.entries.contains_key(citation_key)
    }

    /// Citation keys in ascending order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Keyed records in citation-key order.
    pub fn records(&self) -> impl Iterator<Item = &Record> {
        self.entries.values()
    }

    /// `(citation key, record)` pairs in citation-key order.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &Record)> {
        self.entries.iter().map(|(key, record)| (key.as_str(), record))
    }

    /// Records without a usable citation key.
    pub fn unkeyed(&self) -> &[Record] {
        &self.unkeyed
    }

    /// Total number of records, keyed and unkeyed.
    pub fn len(&self) -> usize {
        self.entries.len() + self.unkeyed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty() && self.unkeyed.is_empty()
    }
}

impl FromIterator<Record> for Snapshot {
    /// Unchecked construction: a later record with a repeated key wins.
    fn from_iter<I: IntoIterator<Item = Record>>(iter: I) -> Self {
        let mut snapshot = Self::new();
        for record in iter {
            snapshot.insert(record);
        }
        snapshot
    }
}

// ---------------------------------------------------------------------------
// Changes
// ---------------------------------------------------------------------------

/// A change to a single named field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FieldChange {
    Added {
        field: String,
        new_value: String,
    },
    Removed {
        field: String,
        old_value: String,
    },
    Modified {
        field: String,
        old_value: String,
        new_value: String,
    },
}

impl FieldChange {
    /// Describe the transition between two optional values.
    ///
    /// Returns `None` when both sides are absent or hold the same value.
    pub fn between(field: &str, old: Option<&str>, new: Option<&str>) -> Option<Self> {
        match (old, new) {
            (None, Some(new)) => Some(Self::Added {
                field: field.to_string(),
                new_value: new.to_string(),
            }),
            (Some(old), None) => Some(Self::Removed {
                field: field.to_string(),
                old_value: old.to_string(),
            }),
            (Some(old), Some(new)) if old != new => Some(Self::Modified {
                field: field.to_string(),
                old_value: old.to_string(),
                new_value: new.to_string(),
            }),
            _ => None,
        }
    }

    pub fn field(&self) -> &str {
        match self {
            Self::Added { field, .. } | Self::Removed { field, .. } | Self::Modified { field, .. } => {
                field
            }
        }
    }

    /// The value the field holds after the change; `None` for a removal.
    pub fn new_value(&self) -> Option<&str> {
        match self {
            Self::Added { new_value, .. } | Self::Modified { new_value, .. } => Some(new_value),
            Self::Removed { .. } => None,
        }
    }

    /// The value the field held before the change; `None` for an addition.
    pub fn old_value(&self) -> Option<&str> {
        match self {
            Self::Removed { old_value, .. } | Self::Modified { old_value, .. } => Some(old_value),
            Self::Added { .. } => None,
        }
    }
}

impl std::fmt::Display for FieldChange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Added { field, new_value } => write!(f, "+{field} = {{{new_value}}}"),
            Self::Removed { field, old_value } => write!(f, "-{field} = {{{old_value}}}"),
            Self::Modified {
                field,
                old_value,
                new_value,
            } => write!(f, "~{field}: {{{old_value}}} -> {{{new_value}}}"),
        }
    }
}

/// A change of entry type. `None` means the record is absent on that side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeChange {
    pub old_type: Option<String>,
    pub new_type: Option<String>,
}

/// The delta between two versions of the same record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordDiff {
    pub citation_key: String,
    pub field_changes: Vec<FieldChange>,
    pub type_change: Option<TypeChange>,
}

impl RecordDiff {
    pub fn is_empty(&self) -> bool {
        self.field_changes.is_empty() && self.type_change.is_none()
    }
}
