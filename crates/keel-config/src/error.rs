use keel_utils::error::{FileSystemError, PathError, UtilsError};
use miette::Diagnostic;
use thiserror::Error;

#[derive(Error, Diagnostic, Debug)]
pub enum ConfigError {
    #[error("TOML serialization error: {0}")]
    #[diagnostic(
        code(keel_config::toml_serialize),
        help("Check your configuration structure for invalid values")
    )]
    TomlSerError(#[from] toml::ser::Error),

    #[error("TOML deserialization error: {0}")]
    #[diagnostic(
        code(keel_config::toml_deserialize),
        help("Check your config.toml syntax and structure")
    )]
    TomlDeError(#[from] toml::de::Error),

    #[error("Configuration file already exists: {0}")]
    #[diagnostic(
        code(keel_config::already_exists),
        help("Remove the existing config file or pass a different path with --config")
    )]
    ConfigAlreadyExists(String),

    #[error("Invalid depot path: `{0}`")]
    #[diagnostic(
        code(keel_config::invalid_depot),
        help("Depot entries must be non-empty paths")
    )]
    InvalidDepotPath(String),

    #[error("No depot configured")]
    #[diagnostic(
        code(keel_config::no_depots),
        help("Add at least one entry to `depots`, or set KEEL_DEPOT_PATH")
    )]
    NoDepots,

    #[error("IO error: {0}")]
    #[diagnostic(code(keel_config::io))]
    IoError(#[from] std::io::Error),

    #[error(transparent)]
    #[diagnostic(code(keel_config::utils))]
    Utils(#[from] UtilsError),

    #[error("Failed to parse TOML: {0}")]
    #[diagnostic(code(keel_config::toml))]
    Toml(#[from] toml_edit::TomlError),

    #[error("Encountered unexpected TOML item: {0}")]
    #[diagnostic(code(keel_config::unexpected_toml_item))]
    UnexpectedTomlItem(String),
}

impl From<PathError> for ConfigError {
    fn from(err: PathError) -> Self {
        Self::Utils(UtilsError::Path(err))
    }
}

impl From<FileSystemError> for ConfigError {
    fn from(err: FileSystemError) -> Self {
        Self::Utils(UtilsError::FileSystem(err))
    }
}

pub type Result<T> = std::result::Result<T, ConfigError>;
