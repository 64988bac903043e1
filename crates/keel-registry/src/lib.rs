//! Lazy access to package registry metadata.
//!
//! A registry is a directory tree: a `Registry.toml` listing every package, and one
//! directory per package holding its versions, compat bounds and dependencies. The
//! compat and deps tables are keyed by version range rather than by version.
//!
//! Nothing is read up front. A [`RegistryIndex`] parses its manifest on first use,
//! each [`PackageRecord`] reads its own files on first request, and per-version
//! tables are expanded from the range-keyed ones only for the versions asked for.
//!
//! # Example
//!
//! ```no_run
//! use keel_registry::discover_registries;
//!
//! fn print_deps(depot: &str) -> keel_registry::Result<()> {
//!     for registry in discover_registries(&[depot])? {
//!         for id in registry.lookup_by_name("Example")? {
//!             let detail = registry.get_or_load(id)?.load_detail()?;
//!             let latest = detail.latest(false).cloned();
//!             if let Some(version) = latest {
//!                 println!("{:?}", detail.dependencies_for(&version)?);
//!             }
//!         }
//!     }
//!     Ok(())
//! }
//! ```

pub mod cache;
pub mod decompress;
pub mod discovery;
pub mod error;
pub mod files;
pub mod id;
pub mod package;
pub mod registry;
pub mod version;

#[cfg(test)]
mod test_utils;

pub use cache::{RegistryCaches, ValueCache};
pub use decompress::{decompress, RangeTable, VersionTable};
pub use discovery::{discover_registries, REGISTRIES_DIR};
pub use error::{ErrorContext, RegistryError, Result};
pub use id::{PackageId, RUNTIME_NAME};
pub use package::{CompatMap, DepsMap, PackageDetail, PackageRecord, VersionMeta};
pub use registry::{RegistryIndex, RegistryInfo};
pub use version::{RangeParseError, Version, VersionBound, VersionRange, VersionSpec};
