//! Locating registries under depot roots.
//!
//! A depot root holds a `registries/` directory with one subdirectory per registry.
//! Discovery only looks for the `Registry.toml` marker; the manifests themselves are
//! read later, when each [`RegistryIndex`] is first used.

use std::{
    collections::HashSet,
    path::{Path, PathBuf},
};

use keel_utils::{fs::sorted_subdirs, path::dir_contains};
use tracing::{debug, trace};

use crate::{error::Result, files::REGISTRY_FILE, registry::RegistryIndex};

/// Name of the directory holding registries inside a depot root.
pub const REGISTRIES_DIR: &str = "registries";

/// Finds the registries under each of `search_roots`, in root order and then by
/// directory name. Roots without a `registries/` directory are skipped, as is a
/// registry directory reached twice through repeated roots.
pub fn discover_registries<P: AsRef<Path>>(search_roots: &[P]) -> Result<Vec<RegistryIndex>> {
    let mut seen: HashSet<PathBuf> = HashSet::new();
    let mut registries = Vec::new();

    for root in search_roots {
        let dir = root.as_ref().join(REGISTRIES_DIR);
        if !dir.is_dir() {
            debug!(path = %dir.display(), "no registries directory");
            continue;
        }

        for candidate in sorted_subdirs(&dir)? {
            if !dir_contains(&candidate, REGISTRY_FILE) {
                trace!(path = %candidate.display(), "not a registry, skipping");
                continue;
            }
            if seen.insert(candidate.clone()) {
                registries.push(RegistryIndex::new(candidate));
            }
        }
    }

    debug!(count = registries.len(), "discovered registries");
    Ok(registries)
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::tempdir;

    use super::*;
    use crate::test_utils::write;

    fn registry_at(depot: &Path, name: &str) {
        write(
            depot,
            &format!("{REGISTRIES_DIR}/{name}/{REGISTRY_FILE}"),
            &format!("name = \"{name}\"\nuuid = \"23338594-aafe-5451-b93e-139f81909106\"\n"),
        );
    }

    #[test]
    fn test_discovery_order() {
        let first = tempdir().unwrap();
        let second = tempdir().unwrap();
        registry_at(first.path(), "Zeta");
        registry_at(first.path(), "Alpha");
        registry_at(second.path(), "Beta");
        fs::create_dir_all(first.path().join(REGISTRIES_DIR).join("not-a-registry")).unwrap();
        write(first.path(), &format!("{REGISTRIES_DIR}/stray.toml"), "");

        let found = discover_registries(&[first.path(), second.path()]).unwrap();
        let names: Vec<&str> = found.iter().map(|r| r.name().unwrap()).collect();
        assert_eq!(names, vec!["Alpha", "Zeta", "Beta"]);
        assert!(found.iter().all(RegistryIndex::is_initialized));
    }

    #[test]
    fn test_discovery_is_lazy() {
        let depot = tempdir().unwrap();
        registry_at(depot.path(), "General");

        let found = discover_registries(&[depot.path()]).unwrap();
        assert_eq!(found.len(), 1);
        assert!(!found[0].is_initialized());
        assert_eq!(
            found[0].path(),
            depot.path().join(REGISTRIES_DIR).join("General")
        );
    }

    #[test]
    fn test_discovery_skips_missing_and_repeated_roots() {
        let depot = tempdir().unwrap();
        let empty = tempdir().unwrap();
        registry_at(depot.path(), "General");

        let roots = vec![
            depot.path().to_path_buf(),
            empty.path().to_path_buf(),
            PathBuf::from("/nonexistent/depot"),
            depot.path().to_path_buf(),
        ];
        let found = discover_registries(roots.as_slice()).unwrap();
        assert_eq!(found.len(), 1);
    }

    #[test]
    fn test_discovery_without_roots() {
        let roots: Vec<PathBuf> = Vec::new();
        assert!(discover_registries(roots.as_slice()).unwrap().is_empty());
    }
}
