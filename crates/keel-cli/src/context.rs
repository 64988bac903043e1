use std::path::PathBuf;

use keel_config::config::Config;
use keel_registry::{discover_registries, PackageId, PackageRecord, RegistryIndex};
use keel_utils::path::resolve_path;
use tracing::debug;

use crate::error::KeelResult;

/// A package as found in one registry.
pub struct PackageMatch<'a> {
    pub registry: &'a RegistryIndex,
    pub record: &'a PackageRecord,
}

/// Configuration plus the registries discovered under the depot roots.
pub struct KeelContext {
    config: Config,
    depots: Vec<PathBuf>,
    registries: Vec<RegistryIndex>,
    json: bool,
}

impl KeelContext {
    /// Discovers registries under `depot_override`, or under the configured depots
    /// when no override is given.
    pub fn new(config: Config, depot_override: &[String], json: bool) -> KeelResult<Self> {
        let depots = if depot_override.is_empty() {
            config.depot_paths()?
        } else {
            depot_override
                .iter()
                .map(|depot| resolve_path(depot))
                .collect::<Result<Vec<_>, _>>()?
        };
        debug!(depots = ?depots, "searching depots");

        let registries = discover_registries(&depots)?;

        Ok(Self {
            config,
            depots,
            registries,
            json,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn depots(&self) -> &[PathBuf] {
        &self.depots
    }

    pub fn registries(&self) -> &[RegistryIndex] {
        &self.registries
    }

    pub fn json(&self) -> bool {
        self.json
    }

    /// Resolves `query` as a UUID, or else as a package name, across all registries.
    pub fn find_packages(&self, query: &str) -> KeelResult<Vec<PackageMatch<'_>>> {
        let mut matches = Vec::new();
        let by_uuid = query.parse::<PackageId>().ok();

        for registry in &self.registries {
            let ids = match by_uuid {
                Some(id) => vec![id],
                None => registry.lookup_by_name(query)?,
            };
            for id in ids {
                if let Some(record) = registry.lookup_by_uuid(id)? {
                    matches.push(PackageMatch {
                        registry,
                        record,
                    });
                }
            }
        }

        debug!(query, count = matches.len(), "resolved package query");
        Ok(matches)
    }
}
