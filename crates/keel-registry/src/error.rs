//! Error types for the registry crate.
//!
//! This module defines [`RegistryError`], the error type used throughout
//! the crate, along with helper traits for error context.

use std::path::PathBuf;

use miette::Diagnostic;
use semver::Version;
use thiserror::Error;

use crate::id::PackageId;

/// Errors that can occur while reading registry metadata.
///
/// Parse, token and consistency errors abort the lazy step that triggered them.
/// The field being initialized stays empty, so a later call retries once the
/// files on disk have been fixed.
#[derive(Error, Diagnostic, Debug)]
pub enum RegistryError {
    #[error("Error while {action}: {source}")]
    #[diagnostic(code(keel_registry::io))]
    IoError {
        action: String,
        source: std::io::Error,
    },

    #[error("Failed to parse {}: {source}", path.display())]
    #[diagnostic(
        code(keel_registry::parse),
        help("The registry file is malformed or missing a required field")
    )]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("Invalid version `{value}` in {}", path.display())]
    #[diagnostic(code(keel_registry::invalid_version))]
    InvalidVersion { value: String, path: PathBuf },

    #[error("Invalid version range `{value}` in {}", path.display())]
    #[diagnostic(
        code(keel_registry::invalid_range),
        help("Ranges look like `1`, `1.2`, `1-1.4`, `0.5 - 2` or `*`")
    )]
    InvalidRange { value: String, path: PathBuf },

    #[error("Invalid UUID `{value}` in {}", path.display())]
    #[diagnostic(code(keel_registry::invalid_uuid))]
    InvalidUuid { value: String, path: PathBuf },

    #[error("Inconsistent package metadata in {}: expected `{expected}`, found `{found}`", path.display())]
    #[diagnostic(
        code(keel_registry::consistency),
        help("Registry.toml and Package.toml must agree on the package identity")
    )]
    Consistency {
        path: PathBuf,
        expected: String,
        found: String,
    },

    #[error("Overlapping ranges for `{key}` for version {version} in {table}")]
    #[diagnostic(
        code(keel_registry::overlap),
        help("Two ranges in the same table define this entry for one version")
    )]
    OverlapConflict {
        key: String,
        table: String,
        version: Version,
    },

    #[error("Range `{value}` redefines `{key}` in {}", path.display())]
    #[diagnostic(
        code(keel_registry::duplicate_range),
        help("Two keys of this table spell the same version range")
    )]
    DuplicateRange {
        value: String,
        key: String,
        path: PathBuf,
    },

    #[error("Package {0} not found in registry")]
    #[diagnostic(code(keel_registry::package_not_found))]
    PackageNotFound(PackageId),

    #[error(transparent)]
    #[diagnostic(transparent)]
    FileSystem(#[from] keel_utils::error::FileSystemError),
}

/// A specialized Result type for registry operations.
pub type Result<T> = std::result::Result<T, RegistryError>;

/// Extension trait for adding context to I/O errors.
///
/// This trait provides a convenient way to convert `std::io::Result` into
/// [`Result`] with descriptive context about what operation failed.
pub trait ErrorContext<T> {
    /// Adds context to an error, describing what action was being performed.
    fn with_context<C>(self, context: C) -> Result<T>
    where
        C: FnOnce() -> String;
}

impl<T> ErrorContext<T> for std::io::Result<T> {
    fn with_context<C>(self, context: C) -> Result<T>
    where
        C: FnOnce() -> String,
    {
        self.map_err(|err| {
            RegistryError::IoError {
                action: context(),
                source: err,
            }
        })
    }
}
