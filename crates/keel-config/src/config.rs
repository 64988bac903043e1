use std::{
    fs,
    path::{Path, PathBuf},
    sync::{LazyLock, PoisonError, RwLock},
};

use documented::{Documented, DocumentedFields};
use keel_utils::{
    fs::{ensure_dir_exists, write_file},
    path::{resolve_path, split_search_path, xdg_config_home, xdg_data_home},
};
use serde::{Deserialize, Serialize};
use toml_edit::DocumentMut;
use tracing::{debug, info};

use crate::{
    annotations::annotate_toml_table,
    display::{DisplaySettings, TableStyle},
    error::{ConfigError, Result},
};

/// Environment variable selecting the configuration file.
pub const CONFIG_ENV: &str = "KEEL_CONFIG";

/// Environment variable overriding the configured depots, `:`-separated.
pub const DEPOT_PATH_ENV: &str = "KEEL_DEPOT_PATH";

/// keel configuration
#[derive(Clone, Debug, Default, Deserialize, Serialize, Documented, DocumentedFields)]
pub struct Config {
    /// Depot roots searched for registries, in order. Registries live in
    /// `<depot>/registries/<name>`. Environment variables and `~` are expanded.
    /// KEEL_DEPOT_PATH overrides this list.
    /// Default: ["$XDG_DATA_HOME/keel"]
    pub depots: Option<Vec<String>>,

    /// Maximum number of packages listed by `search`.
    /// Default: 50
    pub search_limit: Option<usize>,

    /// Display settings for CLI output formatting
    pub display: Option<DisplaySettings>,
}

pub static CONFIG: LazyLock<RwLock<Option<Config>>> = LazyLock::new(|| RwLock::new(None));

pub static CONFIG_PATH: LazyLock<RwLock<PathBuf>> = LazyLock::new(|| {
    RwLock::new(match std::env::var(CONFIG_ENV) {
        Ok(path_str) => PathBuf::from(path_str),
        Err(_) => xdg_config_home().join("keel").join("config.toml"),
    })
});

/// Loads the configuration file into the global slot.
pub fn init() -> Result<()> {
    let config = Config::new()?;
    let mut global_config = CONFIG.write().unwrap_or_else(PoisonError::into_inner);
    *global_config = Some(config);
    Ok(())
}

/// Points later loads and `defconfig` at `path` instead of the default location.
pub fn set_config_path(path: PathBuf) {
    let mut config_path = CONFIG_PATH.write().unwrap_or_else(PoisonError::into_inner);
    *config_path = path;
}

pub fn config_path() -> PathBuf {
    CONFIG_PATH
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .to_path_buf()
}

/// The global configuration, falling back to defaults when [`init`] never ran.
pub fn get_config() -> Config {
    CONFIG
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .clone()
        .unwrap_or_else(Config::default_config)
}

pub fn default_depot() -> String {
    format!("{}/keel", xdg_data_home().display())
}

impl Config {
    pub fn default_config() -> Self {
        Self {
            depots: Some(vec![default_depot()]),
            search_limit: Some(50),
            display: Some(DisplaySettings {
                table_style: Some(TableStyle::default()),
                colors: Some(true),
                show_yanked: Some(false),
            }),
        }
    }

    /// Reads the file at [`config_path`]. A missing file yields the defaults.
    pub fn new() -> Result<Self> {
        Self::from_path(&config_path())
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let mut config = match fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content)?,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "no config file, using defaults");
                Self::default_config()
            }
            Err(err) => return Err(ConfigError::IoError(err)),
        };

        config.resolve()?;
        Ok(config)
    }

    /// Fills unset fields with their defaults and validates depot entries.
    pub fn resolve(&mut self) -> Result<()> {
        let depots = self.depots.get_or_insert_with(|| vec![default_depot()]);
        if let Some(invalid) = depots.iter().find(|depot| depot.trim().is_empty()) {
            return Err(ConfigError::InvalidDepotPath(invalid.clone()));
        }

        self.search_limit.get_or_insert(50);
        self.display.get_or_insert_with(DisplaySettings::default);

        Ok(())
    }

    /// Depot roots in search order.
    ///
    /// A non-empty `KEEL_DEPOT_PATH` wins over the `depots` list.
    pub fn depot_paths(&self) -> Result<Vec<PathBuf>> {
        if let Ok(value) = std::env::var(DEPOT_PATH_ENV) {
            let paths = split_search_path(&value)?;
            if !paths.is_empty() {
                return Ok(paths);
            }
        }

        let paths = match &self.depots {
            Some(depots) => {
                depots
                    .iter()
                    .map(|depot| resolve_path(depot))
                    .collect::<std::result::Result<Vec<_>, _>>()?
            }
            None => vec![resolve_path(&default_depot())?],
        };
        if paths.is_empty() {
            return Err(ConfigError::NoDepots);
        }
        Ok(paths)
    }

    pub fn search_limit(&self) -> usize {
        self.search_limit.unwrap_or(50)
    }

    pub fn display(&self) -> DisplaySettings {
        self.display.clone().unwrap_or_default()
    }

    pub fn to_annotated_document(&self) -> Result<DocumentMut> {
        let toml_string = toml::to_string_pretty(self)?;
        let mut doc = toml_string.parse::<DocumentMut>()?;

        annotate_toml_table::<Config>(doc.as_table_mut(), true)?;

        if let Some(display_table) = doc.get_mut("display").and_then(|item| item.as_table_mut()) {
            annotate_toml_table::<DisplaySettings>(display_table, false)?;
        }

        Ok(doc)
    }
}

/// Writes the annotated default configuration to [`config_path`] and returns the path.
pub fn generate_default_config() -> Result<PathBuf> {
    let config_path = config_path();

    if config_path.exists() {
        return Err(ConfigError::ConfigAlreadyExists(
            config_path.display().to_string(),
        ));
    }

    let annotated_doc = Config::default_config().to_annotated_document()?;

    if let Some(parent) = config_path.parent() {
        ensure_dir_exists(parent)?;
    }

    write_file(&config_path, &annotated_doc.to_string())?;
    info!(
        "Default configuration file generated with documentation at: {}",
        config_path.display()
    );
    Ok(config_path)
}

#[cfg(test)]
mod tests {
    use serial_test::serial;
    use tempfile::tempdir;

    use keel_utils::error::{FileSystemError, UtilsError};

    use super::*;
    use crate::test_utils::with_env;

    #[test]
    fn test_default_config_creation() {
        let config = Config::default_config();

        assert_eq!(config.depots.as_ref().map(Vec::len), Some(1));
        assert_eq!(config.search_limit(), 50);
        assert_eq!(config.display().table_style(), TableStyle::Rounded);
    }

    #[test]
    fn test_config_resolve_sets_defaults() {
        let mut config = Config::default();
        config.resolve().unwrap();

        assert!(config.depots.is_some());
        assert_eq!(config.search_limit, Some(50));
        assert!(config.display.is_some());
    }

    #[test]
    fn test_config_resolve_rejects_blank_depot() {
        let mut config = Config::default_config();
        config.depots = Some(vec!["/srv/keel".to_string(), "  ".to_string()]);

        assert!(matches!(
            config.resolve(),
            Err(ConfigError::InvalidDepotPath(_))
        ));
    }

    #[test]
    #[serial]
    fn test_depot_paths_from_config() {
        with_env(vec![], &[DEPOT_PATH_ENV], || {
            let mut config = Config::default_config();
            config.depots = Some(vec!["/srv/keel".to_string(), "/opt/keel".to_string()]);

            assert_eq!(
                config.depot_paths().unwrap(),
                vec![PathBuf::from("/srv/keel"), PathBuf::from("/opt/keel")]
            );
        });
    }

    #[test]
    #[serial]
    fn test_depot_paths_env_override() {
        with_env(vec![(DEPOT_PATH_ENV, "/a/depot::/b/depot")], &[], || {
            let config = Config::default_config();
            assert_eq!(
                config.depot_paths().unwrap(),
                vec![PathBuf::from("/a/depot"), PathBuf::from("/b/depot")]
            );
        });
    }

    #[test]
    #[serial]
    fn test_depot_paths_empty_env_is_ignored() {
        with_env(vec![(DEPOT_PATH_ENV, "")], &[], || {
            let mut config = Config::default_config();
            config.depots = Some(vec!["/srv/keel".to_string()]);
            assert_eq!(
                config.depot_paths().unwrap(),
                vec![PathBuf::from("/srv/keel")]
            );
        });
    }

    #[test]
    #[serial]
    fn test_depot_paths_expand_variables() {
        with_env(vec![("KEEL_TEST_ROOT", "/data")], &[DEPOT_PATH_ENV], || {
            let mut config = Config::default_config();
            config.depots = Some(vec!["$KEEL_TEST_ROOT/keel".to_string()]);
            assert_eq!(
                config.depot_paths().unwrap(),
                vec![PathBuf::from("/data/keel")]
            );
        });
    }

    #[test]
    #[serial]
    fn test_no_depots() {
        with_env(vec![], &[DEPOT_PATH_ENV], || {
            let mut config = Config::default_config();
            config.depots = Some(Vec::new());
            assert!(matches!(config.depot_paths(), Err(ConfigError::NoDepots)));
        });
    }

    #[test]
    fn test_from_path() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            "depots = [\"/srv/keel\"]\n\n[display]\ntable_style = \"ascii\"\n",
        )
        .unwrap();

        let config = Config::from_path(&path).unwrap();
        assert_eq!(config.depots, Some(vec!["/srv/keel".to_string()]));
        assert_eq!(config.display().table_style(), TableStyle::Ascii);
        assert_eq!(config.search_limit(), 50);
    }

    #[test]
    fn test_from_missing_path_uses_defaults() {
        let dir = tempdir().unwrap();
        let config = Config::from_path(&dir.path().join("missing.toml")).unwrap();
        assert_eq!(config.search_limit(), 50);
        assert!(config.display().colors());
    }

    #[test]
    fn test_from_malformed_path() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "depots = \"not a list\"\n").unwrap();

        assert!(matches!(
            Config::from_path(&path),
            Err(ConfigError::TomlDeError(_))
        ));
    }

    #[test]
    fn test_config_serialization() {
        let config = Config::default_config();
        let serialized = toml::to_string(&config).unwrap();

        let deserialized: Config = toml::from_str(&serialized).unwrap();
        assert_eq!(deserialized.depots, config.depots);
    }

    #[test]
    #[serial]
    fn test_generate_default_config() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let previous = config_path();
        set_config_path(path.clone());

        let written = generate_default_config().unwrap();
        assert_eq!(written, path);
        let content = fs::read_to_string(&path).unwrap();
        assert!(content.contains("# Depot roots searched for registries"));

        let parsed = Config::from_path(&path).unwrap();
        assert_eq!(parsed.display().table_style(), TableStyle::Rounded);

        assert!(matches!(
            generate_default_config(),
            Err(ConfigError::ConfigAlreadyExists(_))
        ));

        set_config_path(previous);
    }

    #[test]
    #[serial]
    #[cfg(unix)]
    fn test_generate_default_config_write_failure() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::os::unix::fs::symlink(dir.path().join("missing").join("target.toml"), &path)
            .unwrap();
        let previous = config_path();
        set_config_path(path.clone());

        match generate_default_config() {
            Err(ConfigError::Utils(UtilsError::FileSystem(FileSystemError::File {
                path: failed,
                action,
                ..
            }))) => {
                assert_eq!(failed, path);
                assert_eq!(action, "write");
            }
            other => panic!("expected a file write error, got {other:?}"),
        }

        set_config_path(previous);
    }
}
