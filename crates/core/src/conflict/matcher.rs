//! Pairing of records across two snapshots by citation key.

use crate::models::{Record, Snapshot};

/// Records of two snapshots partitioned by citation key.
///
/// Every list is in citation-key order; unkeyed records are appended to the
/// `only_in_*` side they came from.
#[derive(Debug, Default)]
pub struct EntryMatch<'a> {
    pub common: Vec<(&'a Record, &'a Record)>,
    pub only_in_a: Vec<&'a Record>,
    pub only_in_b: Vec<&'a Record>,
}

/// Stateless record matcher.
pub struct EntryMatcher;

impl EntryMatcher {
    /// Pair the records of `a` and `b` by citation key.
    ///
    /// Records without a usable key never match anything and are reported
    /// as present on their own side only.
    pub fn match_entries<'a>(a: &'a Snapshot, b: &'a Snapshot) -> EntryMatch<'a> {
        let mut result = EntryMatch::default();

        for (key, record) in a.entries() {
            match b.get(key) {
                Some(other) => result.common.push((record, other)),
                None => result.only_in_a.push(record),
            }
        }
        for (key, record) in b.entries() {
            if !a.contains_key(key) {
                result.only_in_b.push(record);
            }
        }

        result.only_in_a.extend(a.unkeyed());
        result.only_in_b.extend(b.unkeyed());
        result
    }
}
