use keel_registry::PackageId;
use nu_ansi_term::Color::{Blue, Cyan, Green, Red, Yellow};
use tabled::builder::Builder;
use tracing::{debug, info};

use crate::{
    context::KeelContext,
    error::KeelResult,
    utils::{render_table, Colored, Icons},
};

pub fn list_registries(ctx: &KeelContext) -> KeelResult<()> {
    if ctx.registries().is_empty() {
        info!(
            "{} No registries found under {}",
            Colored(Yellow, Icons::CROSS),
            ctx.depots()
                .iter()
                .map(|depot| depot.display().to_string())
                .collect::<Vec<_>>()
                .join(", ")
        );
        return Ok(());
    }

    let mut builder = Builder::new();
    builder.push_record(["Name", "UUID", "Packages", "Path"].map(String::from));

    for registry in ctx.registries() {
        let info = registry.info()?;
        let count = registry.len()?;

        if ctx.json() {
            info!(
                name = info.name,
                uuid = %info.uuid,
                packages = count,
                path = %registry.path().display(),
                content_hash = info.content_hash.as_deref(),
                "{}",
                info.name
            );
            continue;
        }

        builder.push_record([
            format!("{}", Colored(Blue, &info.name)),
            format!("{}", Colored(Cyan, info.uuid)),
            format!("{}", Colored(Green, count)),
            registry.path().display().to_string(),
        ]);
    }

    if !ctx.json() {
        let style = ctx.config().display().table_style();
        info!("\n{}", render_table(builder, "Registries", style));
    }

    Ok(())
}

struct SearchHit {
    name: String,
    uuid: PackageId,
    registry: String,
}

pub fn search_packages(
    ctx: &KeelContext,
    query: &str,
    exact: bool,
    limit: Option<usize>,
) -> KeelResult<()> {
    let limit = limit.unwrap_or_else(|| ctx.config().search_limit());
    debug!(query, exact, limit, "searching packages");

    let needle = query.to_lowercase();
    let mut hits = Vec::new();

    for registry in ctx.registries() {
        let registry_name = registry.name()?.to_string();
        if exact {
            for uuid in registry.lookup_by_name(query)? {
                hits.push(SearchHit {
                    name: query.to_string(),
                    uuid,
                    registry: registry_name.clone(),
                });
            }
            continue;
        }

        for record in registry.packages()? {
            if record.name().to_lowercase().contains(&needle) {
                hits.push(SearchHit {
                    name: record.name().to_string(),
                    uuid: record.uuid(),
                    registry: registry_name.clone(),
                });
            }
        }
    }

    // Shortest names first.
    hits.sort_by(|a, b| {
        (a.name.len(), &a.name, &a.registry, a.uuid).cmp(&(
            b.name.len(),
            &b.name,
            &b.registry,
            b.uuid,
        ))
    });
    let total = hits.len();

    for hit in hits.iter().take(limit) {
        info!(
            name = hit.name,
            uuid = %hit.uuid,
            registry = hit.registry,
            "{} {} ({})",
            Colored(Blue, &hit.name),
            Colored(Cyan, hit.uuid),
            Colored(Green, &hit.registry)
        );
    }

    if !ctx.json() {
        if total == 0 {
            info!("{}", Colored(Red, format!("No packages matching '{query}'")));
        } else {
            info!(
                "Showing {} of {}",
                Colored(Green, total.min(limit)),
                Colored(Cyan, total)
            );
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{context_for, sample_depot};

    #[test]
    fn test_listing_initializes_registries() {
        let depot = sample_depot();
        let ctx = context_for(&depot);
        assert!(ctx.registries().iter().all(|r| !r.is_initialized()));

        list_registries(&ctx).unwrap();
        assert!(ctx.registries().iter().all(|r| r.is_initialized()));
    }

    #[test]
    fn test_search_does_not_load_packages() {
        let depot = sample_depot();
        let ctx = context_for(&depot);

        search_packages(&ctx, "ba", false, None).unwrap();
        search_packages(&ctx, "Bar", true, Some(1)).unwrap();

        for registry in ctx.registries() {
            assert!(registry.packages().unwrap().all(|p| !p.is_loaded()));
        }
    }
}
