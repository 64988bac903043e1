//! Error type for the command line front end.

use keel_config::error::ConfigError;
use keel_registry::RegistryError;
use keel_utils::error::PathError;
use miette::Diagnostic;
use thiserror::Error;

#[derive(Error, Diagnostic, Debug)]
pub enum KeelError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    PathError(#[from] PathError),

    #[error("Package '{0}' not found")]
    #[diagnostic(
        code(keel::package_not_found),
        help("Run 'keel registries' to see which registries are searched")
    )]
    PackageNotFound(String),

    #[error("Package '{package}' has no version {version}")]
    #[diagnostic(
        code(keel::version_not_found),
        help("Run 'keel info {package}' to list released versions")
    )]
    VersionNotFound { package: String, version: String },

    #[error("Invalid version '{0}'")]
    #[diagnostic(
        code(keel::invalid_version),
        help("Use a full semantic version such as 1.2.0")
    )]
    InvalidVersion(String),

    #[error("'{package}' matches {count} packages")]
    #[diagnostic(
        code(keel::ambiguous_package),
        help("Pass the package UUID instead of its name")
    )]
    AmbiguousPackage { package: String, count: usize },
}

pub type KeelResult<T> = std::result::Result<T, KeelError>;
