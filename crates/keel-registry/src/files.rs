//! Serde models of the files making up a registry, plus the readers for them.
//!
//! ```text
//! <registry>/Registry.toml        name, uuid, url?, repo?, description?, [packages]
//! <registry>/.tree_info.toml      git-tree-sha1 (optional)
//! <registry>/<pkg>/Package.toml   name, uuid?, repo?, subdir?
//! <registry>/<pkg>/Versions.toml  "<version>" = { git-tree-sha1, yanked? }
//! <registry>/<pkg>/Compat.toml    "<range>" = { dep = "<range>" | ["<range>", ...] }
//! <registry>/<pkg>/Deps.toml      "<range>" = { dep = "<uuid>" }
//! ```

use std::{collections::BTreeMap, fmt, fs, io, path::Path};

use serde::{de::DeserializeOwned, Deserialize};

use crate::error::{ErrorContext, RegistryError, Result};

pub const REGISTRY_FILE: &str = "Registry.toml";
pub const TREE_INFO_FILE: &str = ".tree_info.toml";
pub const PACKAGE_FILE: &str = "Package.toml";
pub const VERSIONS_FILE: &str = "Versions.toml";
pub const COMPAT_FILE: &str = "Compat.toml";
pub const DEPS_FILE: &str = "Deps.toml";

#[derive(Debug, Clone, Deserialize)]
pub struct RegistryManifest {
    pub name: String,
    pub uuid: String,
    pub url: Option<String>,
    pub repo: Option<String>,
    pub description: Option<String>,
    #[serde(default)]
    pub packages: BTreeMap<String, PackageEntry>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PackageEntry {
    pub name: String,
    pub path: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TreeInfo {
    #[serde(rename = "git-tree-sha1")]
    pub git_tree_sha1: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PackageManifest {
    pub name: String,
    pub uuid: Option<String>,
    pub repo: Option<String>,
    pub subdir: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VersionEntry {
    #[serde(rename = "git-tree-sha1")]
    pub git_tree_sha1: String,
    #[serde(default)]
    pub yanked: bool,
}

pub type VersionsFile = BTreeMap<String, VersionEntry>;

/// A compat value: one range or a list of ranges forming a union.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum RawSpec {
    Single(String),
    Union(Vec<String>),
}

impl RawSpec {
    /// The cache token for this value. Equal tokens mean equal raw values.
    ///
    /// The variant is tagged and list items are length-prefixed, so no single string
    /// can share a token with a list.
    pub fn token(&self) -> String {
        match self {
            RawSpec::Single(s) => format!("s{}", s.trim()),
            RawSpec::Union(items) => {
                let mut token = String::from("u");
                for item in items {
                    let item = item.trim();
                    token.push_str(&format!("{}:{item}", item.len()));
                }
                token
            }
        }
    }

    pub fn items(&self) -> Vec<&str> {
        match self {
            RawSpec::Single(s) => vec![s.trim()],
            RawSpec::Union(items) => items.iter().map(|s| s.trim()).collect(),
        }
    }
}

impl fmt::Display for RawSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RawSpec::Single(s) => f.write_str(s.trim()),
            RawSpec::Union(_) => write!(f, "[{}]", self.items().join(", ")),
        }
    }
}

pub type CompatFile = BTreeMap<String, BTreeMap<String, RawSpec>>;
pub type DepsFile = BTreeMap<String, BTreeMap<String, String>>;

fn parse_toml<T: DeserializeOwned>(content: &str, path: &Path) -> Result<T> {
    toml::from_str(content).map_err(|source| {
        RegistryError::Parse {
            path: path.to_path_buf(),
            source,
        }
    })
}

/// Reads and deserializes a TOML file.
pub fn read_toml<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content =
        fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    parse_toml(&content, path)
}

/// Reads a TOML file, returning `None` when it does not exist.
pub fn read_optional_toml<T: DeserializeOwned>(path: &Path) -> Result<Option<T>> {
    match fs::read_to_string(path) {
        Ok(content) => parse_toml(&content, path).map(Some),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(err) => Err(err).with_context(|| format!("reading {}", path.display())),
    }
}
