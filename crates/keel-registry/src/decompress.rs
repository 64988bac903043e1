//! Expansion of range-keyed tables into per-version tables.
//!
//! `Compat.toml` and `Deps.toml` key their entries by version range so that a value
//! shared by many releases is written once. [`decompress`] is the inverse transform.
//! It relies on two facts about its input: the target versions are sorted ascending,
//! and the versions a range contains form one contiguous run of that sorted list.
//! Each range therefore costs two boundary scans instead of a containment test per
//! version.

use std::collections::BTreeMap;

use crate::{
    error::{RegistryError, Result},
    version::{Version, VersionRange},
};

/// A compressed table: version range to attribute map.
pub type RangeTable<T> = BTreeMap<VersionRange, BTreeMap<String, T>>;

/// A decompressed table: concrete version to attribute map.
pub type VersionTable<T> = BTreeMap<Version, BTreeMap<String, T>>;

/// Expands `compressed` over `versions`.
///
/// `versions` must be sorted ascending without duplicates. Versions covered by no
/// range are absent from the result. Two ranges defining the same key for one version
/// fail with [`RegistryError::OverlapConflict`], naming `table`.
pub fn decompress<T: Clone>(
    compressed: &RangeTable<T>,
    versions: &[Version],
    table: &str,
) -> Result<VersionTable<T>> {
    debug_assert!(versions.windows(2).all(|w| w[0] < w[1]));

    let mut uncompressed: VersionTable<T> = BTreeMap::new();

    for (range, attrs) in compressed {
        let first = versions
            .iter()
            .position(|v| range.contains(v))
            .unwrap_or(versions.len());
        let last = versions
            .iter()
            .rposition(|v| range.contains(v))
            .map_or(0, |i| i + 1);

        for version in versions.iter().take(last).skip(first) {
            let merged = uncompressed.entry(version.clone()).or_default();
            for (key, value) in attrs {
                if merged.contains_key(key) {
                    return Err(RegistryError::OverlapConflict {
                        key: key.clone(),
                        table: table.to_string(),
                        version: version.clone(),
                    });
                }
                merged.insert(key.clone(), value.clone());
            }
        }
    }

    Ok(uncompressed)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn versions(list: &[&str]) -> Vec<Version> {
        list.iter().map(|v| Version::parse(v).unwrap()).collect()
    }

    fn table(entries: &[(&str, &[(&str, &str)])]) -> RangeTable<String> {
        entries
            .iter()
            .map(|(range, attrs)| {
                let attrs = attrs
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .collect();
                (range.parse().unwrap(), attrs)
            })
            .collect()
    }

    #[test]
    fn test_expands_ranges_per_version() {
        let compressed = table(&[("1-1.1", &[("julia", "1.6")]), ("2", &[("julia", "1.8")])]);
        let vs = versions(&["1.0.0", "1.1.0", "2.0.0"]);

        let out = decompress(&compressed, &vs, "Compat.toml").unwrap();
        assert_eq!(out.len(), 3);
        assert_eq!(out[&vs[0]]["julia"], "1.6");
        assert_eq!(out[&vs[1]]["julia"], "1.6");
        assert_eq!(out[&vs[2]]["julia"], "1.8");
    }

    #[test]
    fn test_uncovered_versions_absent() {
        let compressed = table(&[("1", &[("Example", "0.5")])]);
        let vs = versions(&["0.9.0", "1.0.0", "2.0.0"]);

        let out = decompress(&compressed, &vs, "Compat.toml").unwrap();
        assert!(!out.contains_key(&vs[0]));
        assert!(out.contains_key(&vs[1]));
        assert!(!out.contains_key(&vs[2]));
    }

    #[test]
    fn test_range_matching_nothing() {
        let compressed = table(&[("5", &[("Example", "1")])]);
        let vs = versions(&["1.0.0", "2.0.0"]);

        assert!(decompress(&compressed, &vs, "Deps.toml").unwrap().is_empty());
        assert!(decompress(&compressed, &[], "Deps.toml").unwrap().is_empty());
    }

    #[test]
    fn test_overlapping_ranges_different_keys_merge() {
        let compressed = table(&[
            ("1-2", &[("A", "1")]),
            ("1.5-3", &[("B", "2")]),
        ]);
        let vs = versions(&["1.0.0", "1.5.0", "2.0.0", "3.0.0"]);

        let out = decompress(&compressed, &vs, "Compat.toml").unwrap();
        assert_eq!(out[&vs[0]].len(), 1);
        assert_eq!(out[&vs[1]].len(), 2);
        assert_eq!(out[&vs[2]].len(), 2);
        assert_eq!(out[&vs[3]].keys().collect::<Vec<_>>(), vec!["B"]);
    }

    #[test]
    fn test_overlapping_ranges_same_key_conflict() {
        let compressed = table(&[("1-2", &[("A", "1")]), ("2-3", &[("A", "2")])]);
        let vs = versions(&["1.0.0", "2.0.0", "3.0.0"]);

        let err = decompress(&compressed, &vs, "Foo/Compat.toml").unwrap_err();
        match err {
            RegistryError::OverlapConflict {
                key,
                table,
                version,
            } => {
                assert_eq!(key, "A");
                assert_eq!(table, "Foo/Compat.toml");
                assert_eq!(version, Version::new(2, 0, 0));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_overlap_outside_target_versions_is_fine() {
        let compressed = table(&[("1-2", &[("A", "1")]), ("2-3", &[("A", "2")])]);
        let vs = versions(&["1.0.0", "3.0.0"]);

        let out = decompress(&compressed, &vs, "Compat.toml").unwrap();
        assert_eq!(out[&vs[0]]["A"], "1");
        assert_eq!(out[&vs[1]]["A"], "2");
    }
}
