//! Field-level diffing of two versions of the same record.

use std::collections::{BTreeMap, BTreeSet};

use crate::config::MergePolicy;
use crate::models::FieldChange;

/// Compare two field maps with exact value equality.
///
/// Changes are ordered by field name.
pub fn diff_fields(
    from: &BTreeMap<String, String>,
    to: &BTreeMap<String, String>,
) -> Vec<FieldChange> {
    diff_fields_with(from, to, &MergePolicy::default())
}

/// Compare two field maps, using `policy` to decide value equality.
pub fn diff_fields_with(
    from: &BTreeMap<String, String>,
    to: &BTreeMap<String, String>,
    policy: &MergePolicy,
) -> Vec<FieldChange> {
    field_names([from, to])
        .into_iter()
        .filter_map(|name| {
            let old = from.get(name).map(String::as_str);
            let new = to.get(name).map(String::as_str);
            if policy.values_equal(old, new) {
                None
            } else {
                FieldChange::between(name, old, new)
            }
        })
        .collect()
}

/// Sorted union of the field names of several field maps.
pub(crate) fn field_names<'a, I>(maps: I) -> BTreeSet<&'a str>
where
    I: IntoIterator<Item = &'a BTreeMap<String, String>>,
{
    maps.into_iter()
        .flat_map(|map| map.keys().map(String::as_str))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LineEndings;

    fn fields(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_identical_maps() {
        let a = fields(&[("author", "lala"), ("doi", "xya")]);
        assert!(diff_fields(&a, &a.clone()).is_empty());
    }

    #[test]
    fn test_added_removed_modified() {
        let from = fields(&[("author", "lala"), ("doi", "xya"), ("title", "T")]);
        let to = fields(&[("author", "bob"), ("title", "T"), ("year", "2025")]);
        let changes = diff_fields(&from, &to);

        assert_eq!(
            changes,
            vec![
                FieldChange::Modified {
                    field: "author".into(),
                    old_value: "lala".into(),
                    new_value: "bob".into(),
                },
                FieldChange::Removed {
                    field: "doi".into(),
                    old_value: "xya".into(),
                },
                FieldChange::Added {
                    field: "year".into(),
                    new_value: "2025".into(),
                },
            ]
        );
    }

    #[test]
    fn test_empty_string_is_not_removal() {
        let from = fields(&[("note", "x")]);
        let to = fields(&[("note", "")]);
        let changes = diff_fields(&from, &to);
        assert!(matches!(changes[0], FieldChange::Modified { .. }));
    }

    #[test]
    fn test_line_ending_policy() {
        let from = fields(&[("comment", "line1\n\nline3")]);
        let to = fields(&[("comment", "line1\r\n\r\nline3")]);
        assert_eq!(diff_fields(&from, &to).len(), 1);

        let policy = MergePolicy {
            line_endings: LineEndings::Normalize,
            ..MergePolicy::default()
        };
        assert!(diff_fields_with(&from, &to, &policy).is_empty());
    }
}
