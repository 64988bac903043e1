//! The lazily initialized registry index.

use std::{
    collections::HashMap,
    path::{Path, PathBuf},
    sync::Arc,
};

use once_cell::sync::OnceCell;
use tracing::debug;

use crate::{
    cache::RegistryCaches,
    error::{RegistryError, Result},
    files::{
        read_optional_toml, read_toml, RegistryManifest, TreeInfo, REGISTRY_FILE,
        TREE_INFO_FILE,
    },
    id::{PackageId, RUNTIME_NAME},
    package::{parse_id, PackageRecord, RegistryContext},
};

/// Identity of a registry, as declared in its `Registry.toml`.
#[derive(Debug, Clone)]
pub struct RegistryInfo {
    pub name: String,
    pub uuid: PackageId,
    pub url: Option<String>,
    pub repo: Option<String>,
    pub description: Option<String>,
    /// Tree hash of the whole registry, present for unpacked snapshots that ship a
    /// `.tree_info.toml`.
    pub content_hash: Option<String>,
}

#[derive(Debug)]
struct RegistryState {
    info: RegistryInfo,
    packages: HashMap<PackageId, PackageRecord>,
    name_to_ids: OnceCell<HashMap<String, Vec<PackageId>>>,
}

/// A registry rooted at a directory.
///
/// Construction performs no I/O. The manifest is parsed on the first call that needs
/// it, package files on the first request for that package's versions. The set of
/// packages never changes after initialization.
#[derive(Debug)]
pub struct RegistryIndex {
    context: Arc<RegistryContext>,
    state: OnceCell<RegistryState>,
}

impl RegistryIndex {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self {
            context: Arc::new(RegistryContext {
                root: path.into(),
                caches: RegistryCaches::default(),
            }),
            state: OnceCell::new(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.context.root
    }

    pub fn is_initialized(&self) -> bool {
        self.state.get().is_some()
    }

    /// Interning caches shared by this registry's packages.
    pub fn caches(&self) -> &RegistryCaches {
        &self.context.caches
    }

    /// Parses `Registry.toml` unless that already happened.
    pub fn ensure_initialized(&self) -> Result<()> {
        self.state().map(|_| ())
    }

    pub fn info(&self) -> Result<&RegistryInfo> {
        Ok(&self.state()?.info)
    }

    pub fn name(&self) -> Result<&str> {
        Ok(&self.state()?.info.name)
    }

    pub fn uuid(&self) -> Result<PackageId> {
        Ok(self.state()?.info.uuid)
    }

    pub fn content_hash(&self) -> Result<Option<&str>> {
        Ok(self.state()?.info.content_hash.as_deref())
    }

    pub fn len(&self) -> Result<usize> {
        Ok(self.state()?.packages.len())
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.state()?.packages.is_empty())
    }

    pub fn contains(&self, id: PackageId) -> Result<bool> {
        Ok(self.state()?.packages.contains_key(&id))
    }

    /// All package identities, sorted.
    pub fn package_ids(&self) -> Result<Vec<PackageId>> {
        let mut ids: Vec<PackageId> = self.state()?.packages.keys().copied().collect();
        ids.sort();
        Ok(ids)
    }

    pub fn packages(&self) -> Result<impl Iterator<Item = &PackageRecord>> {
        Ok(self.state()?.packages.values())
    }

    pub fn lookup_by_uuid(&self, id: PackageId) -> Result<Option<&PackageRecord>> {
        Ok(self.state()?.packages.get(&id))
    }

    /// Identities registered under `name`. Several packages may share a name.
    pub fn lookup_by_name(&self, name: &str) -> Result<Vec<PackageId>> {
        let state = self.state()?;
        let index = state.name_to_ids.get_or_init(|| {
            let mut index: HashMap<String, Vec<PackageId>> = HashMap::new();
            for (id, record) in &state.packages {
                index.entry(record.name().to_string()).or_default().push(*id);
            }
            for ids in index.values_mut() {
                ids.sort();
            }
            index
        });
        Ok(index.get(name).cloned().unwrap_or_default())
    }

    /// Returns the record for `id` with its detail loaded.
    pub fn get_or_load(&self, id: PackageId) -> Result<&PackageRecord> {
        let record = self
            .lookup_by_uuid(id)?
            .ok_or(RegistryError::PackageNotFound(id))?;
        record.load_detail()?;
        Ok(record)
    }

    /// Loads every package's detail. Returns the number of packages.
    pub fn load_all_details(&self) -> Result<usize> {
        let mut count = 0;
        for record in self.packages()? {
            record.load_detail()?;
            count += 1;
        }
        Ok(count)
    }

    /// Loads and fully decompresses every package. Returns the number of versions
    /// newly decompressed.
    pub fn decompress_all(&self) -> Result<usize> {
        let mut count = 0;
        for record in self.packages()? {
            count += record.decompress(None)?;
        }
        Ok(count)
    }

    fn state(&self) -> Result<&RegistryState> {
        self.state.get_or_try_init(|| self.read_state())
    }

    fn read_state(&self) -> Result<RegistryState> {
        let root = &self.context.root;
        let manifest_path = root.join(REGISTRY_FILE);
        debug!(path = %manifest_path.display(), "initializing registry");

        let manifest: RegistryManifest = read_toml(&manifest_path)?;
        let uuid = parse_id(&manifest.uuid, &manifest_path)?;
        let content_hash = read_optional_toml::<TreeInfo>(&root.join(TREE_INFO_FILE))?
            .map(|info| info.git_tree_sha1);

        let mut packages = HashMap::with_capacity(manifest.packages.len());
        for (key, entry) in manifest.packages {
            let id = parse_id(&key, &manifest_path)?;
            if entry.name == RUNTIME_NAME || id.is_runtime() {
                debug!(uuid = %id, "skipping runtime pseudo-package");
                continue;
            }
            let record = PackageRecord::stub(
                PathBuf::from(entry.path),
                entry.name,
                id,
                Arc::clone(&self.context),
            );
            packages.insert(id, record);
        }

        debug!(
            registry = manifest.name,
            packages = packages.len(),
            "registry initialized"
        );

        Ok(RegistryState {
            info: RegistryInfo {
                name: manifest.name,
                uuid,
                url: manifest.url,
                repo: manifest.repo,
                description: manifest.description,
                content_hash,
            },
            packages,
            name_to_ids: OnceCell::new(),
        })
    }
}
