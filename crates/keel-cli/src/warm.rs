use std::time::Instant;

use nu_ansi_term::Color::{Blue, Cyan, Green, Yellow};
use tabled::builder::Builder;
use tracing::info;

use crate::{
    context::KeelContext,
    error::KeelResult,
    utils::{render_table, Colored},
};

/// Loads every package of every registry and expands every version.
pub fn warm_registries(ctx: &KeelContext) -> KeelResult<()> {
    let mut builder = Builder::new();
    builder.push_record(
        ["Registry", "Packages", "Versions", "Specs", "UUIDs", "Time"].map(String::from),
    );

    for registry in ctx.registries() {
        let start = Instant::now();
        let packages = registry.load_all_details()?;
        let versions = registry.decompress_all()?;
        let elapsed = start.elapsed();

        let name = registry.name()?;
        let specs = registry.caches().specs.len();
        let ids = registry.caches().ids.len();

        info!(
            registry = name,
            packages,
            versions,
            interned_specs = specs,
            interned_ids = ids,
            elapsed_ms = elapsed.as_millis() as u64,
            "warmed {}",
            name
        );

        builder.push_record([
            format!("{}", Colored(Blue, name)),
            format!("{}", Colored(Cyan, packages)),
            format!("{}", Colored(Cyan, versions)),
            format!("{}", Colored(Green, specs)),
            format!("{}", Colored(Green, ids)),
            format!("{}", Colored(Yellow, format!("{elapsed:.2?}"))),
        ]);
    }

    if !ctx.json() && !ctx.registries().is_empty() {
        info!(
            "\n{}",
            render_table(builder, "Warm", ctx.config().display().table_style())
        );
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{context_for, sample_depot};

    #[test]
    fn test_warm_loads_everything() {
        let depot = sample_depot();
        let ctx = context_for(&depot);

        warm_registries(&ctx).unwrap();

        for registry in ctx.registries() {
            for record in registry.packages().unwrap() {
                let detail = record.detail().unwrap();
                assert!(detail.versions().values().all(|m| m.is_decompressed()));
            }
        }
    }
}
