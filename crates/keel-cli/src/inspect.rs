use std::collections::BTreeMap;

use keel_registry::{PackageId, Version, RUNTIME_NAME};
use nu_ansi_term::Color::{Blue, Cyan, Green, LightRed, Magenta, Red, Yellow};
use tabled::builder::Builder;
use tracing::{debug, info};

use crate::{
    context::{KeelContext, PackageMatch},
    error::{KeelError, KeelResult},
    utils::{json_string, render_table, Colored, Icons},
};

pub fn package_info(ctx: &KeelContext, query: &str, include_yanked: bool) -> KeelResult<()> {
    let matches = ctx.find_packages(query)?;
    if matches.is_empty() {
        return Err(KeelError::PackageNotFound(query.to_string()));
    }

    let display = ctx.config().display();
    let include_yanked = include_yanked || display.show_yanked();

    for PackageMatch {
        registry,
        record,
    } in matches
    {
        let detail = record.load_detail()?;
        let registry_name = registry.name()?;
        let versions = detail.available_versions(include_yanked);
        let latest = detail.latest(false);

        if ctx.json() {
            let versions: Vec<String> = versions.iter().map(ToString::to_string).collect();
            info!(
                name = record.name(),
                uuid = %record.uuid(),
                registry = registry_name,
                repo = detail.repo(),
                subdir = detail.subdir(),
                latest = latest.map(ToString::to_string),
                versions = json_string(&versions),
                "{}",
                record.name()
            );
            continue;
        }

        let mut builder = Builder::new();
        builder.push_record([
            format!("{} Name", Icons::PACKAGE),
            format!("{}", Colored(Blue, record.name())),
        ]);
        builder.push_record([
            "UUID".to_string(),
            format!("{}", Colored(Cyan, record.uuid())),
        ]);
        builder.push_record([
            "Registry".to_string(),
            format!("{}", Colored(Green, registry_name)),
        ]);
        if let Some(repo) = detail.repo() {
            builder.push_record(["Repository".to_string(), repo.to_string()]);
        }
        if let Some(subdir) = detail.subdir() {
            builder.push_record(["Subdirectory".to_string(), subdir.to_string()]);
        }
        builder.push_record([
            "Latest".to_string(),
            latest
                .map(|v| format!("{}", Colored(LightRed, v)))
                .unwrap_or_else(|| "-".to_string()),
        ]);

        let table = render_table(builder, record.name(), display.table_style());
        info!("\n{}", table);

        for version in versions {
            let yanked = detail.is_yanked(version).unwrap_or(false);
            info!(
                "  {} {}{}",
                Icons::ARROW,
                Colored(LightRed, version),
                if yanked {
                    format!(" {}", Colored(Red, "[yanked]"))
                } else {
                    String::new()
                }
            );
        }
    }

    Ok(())
}

pub fn package_deps(ctx: &KeelContext, query: &str, version: &str) -> KeelResult<()> {
    let version =
        Version::parse(version).map_err(|_| KeelError::InvalidVersion(version.to_string()))?;

    let matches = ctx.find_packages(query)?;
    if matches.is_empty() {
        return Err(KeelError::PackageNotFound(query.to_string()));
    }

    let mut candidates = Vec::new();
    for found in matches {
        if found.record.load_detail()?.version(&version).is_some() {
            candidates.push(found);
        }
    }
    let found = match candidates.len() {
        0 => {
            return Err(KeelError::VersionNotFound {
                package: query.to_string(),
                version: version.to_string(),
            })
        }
        1 => candidates.remove(0),
        count => {
            return Err(KeelError::AmbiguousPackage {
                package: query.to_string(),
                count,
            })
        }
    };

    let detail = found.record.load_detail()?;
    let newly = detail.decompress(Some(std::slice::from_ref(&version)))?;
    debug!(
        package = found.record.name(),
        version = %version,
        newly,
        "decompressed version"
    );

    let Some(meta) = detail.version(&version) else {
        return Err(KeelError::VersionNotFound {
            package: query.to_string(),
            version: version.to_string(),
        });
    };
    let compat = meta.compat().cloned().unwrap_or_default();
    let deps = meta.deps().cloned().unwrap_or_default();
    let runtime = meta.runtime_compat().map(ToString::to_string);

    // Name-keyed rows: every dependency, plus compat-only entries such as weak deps.
    let mut rows: BTreeMap<&str, (Option<PackageId>, String)> = BTreeMap::new();
    for (name, id) in &deps {
        if name == RUNTIME_NAME || id.is_runtime() {
            continue;
        }
        let spec = compat
            .get(name)
            .map(ToString::to_string)
            .unwrap_or_else(|| "*".to_string());
        rows.insert(name, (Some(*id), spec));
    }
    for (name, spec) in &compat {
        if name != RUNTIME_NAME && !rows.contains_key(name.as_str()) {
            rows.insert(name, (None, spec.to_string()));
        }
    }

    if ctx.json() {
        for (name, (id, spec)) in &rows {
            info!(
                name = name,
                uuid = id.map(|id| id.to_string()),
                compat = spec,
                "{}",
                name
            );
        }
        info!(
            package = found.record.name(),
            version = %version,
            runtime = runtime,
            yanked = meta.is_yanked(),
            content_hash = meta.content_hash(),
            dependencies = rows.len(),
            "{}@{}",
            found.record.name(),
            version
        );
        return Ok(());
    }

    let title = format!("{} v{}", found.record.name(), version);
    if let Some(runtime) = &runtime {
        info!(
            "{} {} {}",
            Icons::RUNTIME,
            Colored(Magenta, RUNTIME_NAME),
            Colored(Yellow, runtime)
        );
    }
    if meta.is_yanked() {
        info!("{}", Colored(Red, format!("{title} is yanked")));
    }
    if rows.is_empty() {
        info!("{title} has no dependencies");
        return Ok(());
    }

    let mut builder = Builder::new();
    builder.push_record(["Name", "UUID", "Compat"].map(String::from));
    for (name, (id, spec)) in &rows {
        builder.push_record([
            format!("{}", Colored(Blue, name)),
            id.map(|id| format!("{}", Colored(Cyan, id)))
                .unwrap_or_else(|| "-".to_string()),
            format!("{}", Colored(Green, spec)),
        ]);
    }

    info!(
        "\n{}",
        render_table(builder, &title, ctx.config().display().table_style())
    );

    Ok(())
}
