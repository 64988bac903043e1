//! Per-package metadata, loaded and decompressed on demand.
//!
//! A [`PackageRecord`] starts as a stub holding only what `Registry.toml` says about
//! it. [`PackageRecord::load_detail`] reads the package's own files once and freezes
//! the result in a [`PackageDetail`]. Per-version compat and deps are expanded from
//! the compressed tables by [`PackageDetail::decompress`], once per version.

use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
    sync::{Arc, Mutex, PoisonError},
};

use once_cell::sync::OnceCell;
use tracing::{debug, trace};

use crate::{
    cache::RegistryCaches,
    decompress::{decompress, RangeTable},
    error::{RegistryError, Result},
    files::{
        read_optional_toml, read_toml, CompatFile, DepsFile, PackageManifest, VersionsFile,
        COMPAT_FILE, DEPS_FILE, PACKAGE_FILE, VERSIONS_FILE,
    },
    id::{PackageId, RUNTIME_NAME},
    version::{Version, VersionRange, VersionSpec},
};

/// Dependency name to acceptable versions.
pub type CompatMap = BTreeMap<String, Arc<VersionSpec>>;

/// Dependency name to identity.
pub type DepsMap = BTreeMap<String, PackageId>;

/// State shared by a registry and all of its package records.
#[derive(Debug)]
pub(crate) struct RegistryContext {
    pub(crate) root: PathBuf,
    pub(crate) caches: RegistryCaches,
}

#[derive(Debug)]
struct Uncompressed {
    compat: CompatMap,
    deps: DepsMap,
}

/// Metadata of one released version.
#[derive(Debug)]
pub struct VersionMeta {
    content_hash: String,
    yanked: bool,
    uncompressed: OnceCell<Uncompressed>,
}

impl VersionMeta {
    fn new(content_hash: String, yanked: bool) -> Self {
        Self {
            content_hash,
            yanked,
            uncompressed: OnceCell::new(),
        }
    }

    /// Tree hash of the package source at this version.
    pub fn content_hash(&self) -> &str {
        &self.content_hash
    }

    pub fn is_yanked(&self) -> bool {
        self.yanked
    }

    pub fn is_decompressed(&self) -> bool {
        self.uncompressed.get().is_some()
    }

    /// Compat entries for this version, `None` until decompressed.
    ///
    /// Includes the entry naming the host runtime, if the package declares one.
    pub fn compat(&self) -> Option<&CompatMap> {
        self.uncompressed.get().map(|u| &u.compat)
    }

    /// Dependency identities for this version, `None` until decompressed.
    pub fn deps(&self) -> Option<&DepsMap> {
        self.uncompressed.get().map(|u| &u.deps)
    }

    /// The compat entry constraining the host runtime.
    pub fn runtime_compat(&self) -> Option<&Arc<VersionSpec>> {
        self.compat()?.get(RUNTIME_NAME)
    }

    /// Dependencies keyed by identity, each with its acceptable versions.
    ///
    /// Joins `deps` and `compat` by dependency name. A dependency without a compat
    /// entry accepts any version. The host runtime never appears here.
    pub fn dependencies(&self) -> Option<BTreeMap<PackageId, Arc<VersionSpec>>> {
        let uncompressed = self.uncompressed.get()?;
        let joined = uncompressed
            .deps
            .iter()
            .filter(|(_, id)| !id.is_runtime())
            .map(|(name, id)| {
                let spec = uncompressed
                    .compat
                    .get(name)
                    .cloned()
                    .unwrap_or_else(|| Arc::new(VersionSpec::any()));
                (*id, spec)
            })
            .collect();
        Some(joined)
    }
}

/// Everything read from a package's own files.
#[derive(Debug)]
pub struct PackageDetail {
    repo: Option<String>,
    subdir: Option<String>,
    versions: BTreeMap<Version, VersionMeta>,
    compressed_compat: RangeTable<Arc<VersionSpec>>,
    compressed_deps: RangeTable<PackageId>,
    compat_table: String,
    deps_table: String,
    decompress_lock: Mutex<()>,
}

impl PackageDetail {
    pub fn repo(&self) -> Option<&str> {
        self.repo.as_deref()
    }

    pub fn subdir(&self) -> Option<&str> {
        self.subdir.as_deref()
    }

    pub fn versions(&self) -> &BTreeMap<Version, VersionMeta> {
        &self.versions
    }

    pub fn version(&self, version: &Version) -> Option<&VersionMeta> {
        self.versions.get(version)
    }

    pub fn compressed_compat(&self) -> &RangeTable<Arc<VersionSpec>> {
        &self.compressed_compat
    }

    pub fn compressed_deps(&self) -> &RangeTable<PackageId> {
        &self.compressed_deps
    }

    pub fn is_yanked(&self, version: &Version) -> Option<bool> {
        self.version(version).map(VersionMeta::is_yanked)
    }

    pub fn content_hash(&self, version: &Version) -> Option<&str> {
        self.version(version).map(VersionMeta::content_hash)
    }

    /// Known versions in ascending order, optionally skipping yanked ones.
    pub fn available_versions(&self, include_yanked: bool) -> Vec<&Version> {
        self.versions
            .iter()
            .filter(|(_, meta)| include_yanked || !meta.is_yanked())
            .map(|(version, _)| version)
            .collect()
    }

    pub fn latest(&self, include_yanked: bool) -> Option<&Version> {
        self.available_versions(include_yanked).pop()
    }

    /// Expands compat and deps for `versions`, or for every known version when `None`.
    ///
    /// Versions already decompressed, and versions this package does not have, are
    /// skipped. Returns how many versions were newly decompressed. On error no version
    /// of the batch is touched.
    pub fn decompress(&self, versions: Option<&[Version]>) -> Result<usize> {
        let _guard = self
            .decompress_lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        let mut pending: Vec<Version> = match versions {
            Some(requested) => {
                requested
                    .iter()
                    .filter(|v| self.versions.get(*v).is_some_and(|m| !m.is_decompressed()))
                    .cloned()
                    .collect()
            }
            None => {
                self.versions
                    .iter()
                    .filter(|(_, meta)| !meta.is_decompressed())
                    .map(|(version, _)| version.clone())
                    .collect()
            }
        };
        if pending.is_empty() {
            return Ok(0);
        }
        pending.sort();
        pending.dedup();

        let mut compat = decompress(&self.compressed_compat, &pending, &self.compat_table)?;
        let mut deps = decompress(&self.compressed_deps, &pending, &self.deps_table)?;

        for version in &pending {
            let uncompressed = Uncompressed {
                compat: compat.remove(version).unwrap_or_default(),
                deps: deps.remove(version).unwrap_or_default(),
            };
            if let Some(meta) = self.versions.get(version) {
                // Writers hold `decompress_lock`, so the cell is still empty here.
                let _ = meta.uncompressed.set(uncompressed);
            }
        }

        trace!(
            table = self.compat_table,
            count = pending.len(),
            "decompressed versions"
        );
        Ok(pending.len())
    }

    /// Decompresses `version` if needed and returns its compat entries.
    pub fn compat_for(&self, version: &Version) -> Result<Option<&CompatMap>> {
        self.decompress(Some(std::slice::from_ref(version)))?;
        Ok(self.version(version).and_then(VersionMeta::compat))
    }

    /// Decompresses `version` if needed and returns its dependency identities.
    pub fn deps_for(&self, version: &Version) -> Result<Option<&DepsMap>> {
        self.decompress(Some(std::slice::from_ref(version)))?;
        Ok(self.version(version).and_then(VersionMeta::deps))
    }

    /// Decompresses `version` if needed and returns its identity-keyed dependencies.
    pub fn dependencies_for(
        &self,
        version: &Version,
    ) -> Result<Option<BTreeMap<PackageId, Arc<VersionSpec>>>> {
        self.decompress(Some(std::slice::from_ref(version)))?;
        Ok(self.version(version).and_then(VersionMeta::dependencies))
    }
}

/// One package of a registry.
#[derive(Debug)]
pub struct PackageRecord {
    path: PathBuf,
    name: String,
    uuid: PackageId,
    context: Arc<RegistryContext>,
    detail: OnceCell<PackageDetail>,
}

impl PackageRecord {
    pub(crate) fn stub(
        path: PathBuf,
        name: String,
        uuid: PackageId,
        context: Arc<RegistryContext>,
    ) -> Self {
        Self {
            path,
            name,
            uuid,
            context,
            detail: OnceCell::new(),
        }
    }

    /// Location of the package's files, relative to the registry root.
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn uuid(&self) -> PackageId {
        self.uuid
    }

    pub fn is_loaded(&self) -> bool {
        self.detail.get().is_some()
    }

    /// The loaded detail, without triggering a load.
    pub fn detail(&self) -> Option<&PackageDetail> {
        self.detail.get()
    }

    /// Reads the package's files on first call and returns the frozen detail.
    ///
    /// Later calls return the same detail without touching the disk. A failed load
    /// leaves the record unloaded, so the next call reads the files again.
    pub fn load_detail(&self) -> Result<&PackageDetail> {
        self.detail.get_or_try_init(|| self.read_detail())
    }

    /// Loads the detail if needed, then decompresses `versions` (all when `None`).
    pub fn decompress(&self, versions: Option<&[Version]>) -> Result<usize> {
        self.load_detail()?.decompress(versions)
    }

    fn read_detail(&self) -> Result<PackageDetail> {
        let dir = self.context.root.join(&self.path);
        debug!(
            package = self.name,
            path = %dir.display(),
            "loading package metadata"
        );

        let manifest: PackageManifest = read_toml(&dir.join(PACKAGE_FILE))?;
        if manifest.name != self.name {
            return Err(RegistryError::Consistency {
                path: self.path.clone(),
                expected: self.name.clone(),
                found: manifest.name,
            });
        }
        if let Some(raw) = manifest.uuid.as_deref() {
            let declared = parse_id(raw, &dir.join(PACKAGE_FILE))?;
            if declared != self.uuid {
                return Err(RegistryError::Consistency {
                    path: self.path.clone(),
                    expected: self.uuid.to_string(),
                    found: declared.to_string(),
                });
            }
        }

        let versions = self.read_versions(&dir.join(VERSIONS_FILE))?;
        let compressed_compat = self.read_compat(&dir.join(COMPAT_FILE))?;
        let compressed_deps = self.read_deps(&dir.join(DEPS_FILE))?;

        Ok(PackageDetail {
            repo: manifest.repo,
            subdir: manifest.subdir,
            versions,
            compressed_compat,
            compressed_deps,
            compat_table: self.path.join(COMPAT_FILE).display().to_string(),
            deps_table: self.path.join(DEPS_FILE).display().to_string(),
            decompress_lock: Mutex::new(()),
        })
    }

    fn read_versions(&self, path: &Path) -> Result<BTreeMap<Version, VersionMeta>> {
        let file: VersionsFile = read_optional_toml(path)?.unwrap_or_default();
        file.into_iter()
            .map(|(raw, entry)| {
                let version =
                    Version::parse(raw.trim()).map_err(|_| RegistryError::InvalidVersion {
                        value: raw.clone(),
                        path: path.to_path_buf(),
                    })?;
                Ok((version, VersionMeta::new(entry.git_tree_sha1, entry.yanked)))
            })
            .collect()
    }

    fn read_compat(&self, path: &Path) -> Result<RangeTable<Arc<VersionSpec>>> {
        let file: CompatFile = read_optional_toml(path)?.unwrap_or_default();
        let specs = &self.context.caches.specs;

        let mut table = RangeTable::new();
        for (raw_range, entries) in file {
            let range = parse_range(&raw_range, path)?;
            let mut attrs = BTreeMap::new();
            for (dep, raw) in entries {
                let token = raw.token();
                let spec = specs
                    .try_intern(&token, || VersionSpec::parse_list(&raw.items()).map(Arc::new))
                    .map_err(|_| RegistryError::InvalidRange {
                        value: raw.to_string(),
                        path: path.to_path_buf(),
                    })?;
                attrs.insert(dep, spec);
            }
            insert_range(&mut table, range, &raw_range, attrs, path)?;
        }
        Ok(table)
    }

    fn read_deps(&self, path: &Path) -> Result<RangeTable<PackageId>> {
        let file: DepsFile = read_optional_toml(path)?.unwrap_or_default();
        let ids = &self.context.caches.ids;

        let mut table = RangeTable::new();
        for (raw_range, entries) in file {
            let range = parse_range(&raw_range, path)?;
            let mut attrs = BTreeMap::new();
            for (dep, raw) in entries {
                let id = if dep == RUNTIME_NAME {
                    PackageId::RUNTIME
                } else {
                    ids.try_intern(raw.trim(), || parse_id(raw.trim(), path))?
                };
                attrs.insert(dep, id);
            }
            insert_range(&mut table, range, &raw_range, attrs, path)?;
        }
        Ok(table)
    }
}

pub(crate) fn parse_id(raw: &str, path: &Path) -> Result<PackageId> {
    raw.parse().map_err(|_| RegistryError::InvalidUuid {
        value: raw.to_string(),
        path: path.to_path_buf(),
    })
}

fn parse_range(raw: &str, path: &Path) -> Result<VersionRange> {
    raw.parse().map_err(|_| RegistryError::InvalidRange {
        value: raw.to_string(),
        path: path.to_path_buf(),
    })
}

/// Two spellings of the same range (`"1"` and `"1.*"`) share one table entry.
/// They may not both define the same key.
fn insert_range<T>(
    table: &mut RangeTable<T>,
    range: VersionRange,
    raw_range: &str,
    attrs: BTreeMap<String, T>,
    path: &Path,
) -> Result<()> {
    let merged = table.entry(range).or_default();
    for (key, value) in attrs {
        if merged.contains_key(&key) {
            return Err(RegistryError::DuplicateRange {
                value: raw_range.to_string(),
                key,
                path: path.to_path_buf(),
            });
        }
        merged.insert(key, value);
    }
    Ok(())
}
