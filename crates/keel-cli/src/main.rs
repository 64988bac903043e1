use std::{env, path::Path};

use clap::Parser;
use cli::Args;
use context::KeelContext;
use error::KeelResult;
use inspect::{package_deps, package_info};
use keel_config::config::{
    self, config_path, generate_default_config, get_config, set_config_path, DEPOT_PATH_ENV,
};
use keel_registry::REGISTRIES_DIR;
use keel_utils::path::resolve_path;
use list::{list_registries, search_packages};
use logging::setup_logging;
use nu_ansi_term::Color::{Blue, Green, Red, Yellow};
use tracing::info;
use utils::{set_color, Colored, Icons};
use warm::warm_registries;

mod cli;
mod context;
mod error;
mod inspect;
mod list;
mod logging;
mod utils;
mod warm;

#[cfg(test)]
mod test_utils;

fn print_env(ctx: &KeelContext) {
    let config_file = config_path();
    let marker = |path: &Path| {
        if path.exists() {
            format!("{}", Colored(Green, "found"))
        } else {
            format!("{}", Colored(Red, "missing"))
        }
    };

    if ctx.json() {
        let depots: Vec<String> = ctx
            .depots()
            .iter()
            .map(|depot| depot.display().to_string())
            .collect();
        info!(
            config = %config_file.display(),
            config_exists = config_file.exists(),
            depot_path_env = env::var(DEPOT_PATH_ENV).ok(),
            depots = utils::json_string(&depots),
            registries = ctx.registries().len(),
            "env"
        );
        return;
    }

    info!(
        "{}: {} ({})",
        Colored(Blue, "Config"),
        config_file.display(),
        marker(&config_file)
    );
    if let Ok(value) = env::var(DEPOT_PATH_ENV) {
        info!("{}: {}", Colored(Blue, DEPOT_PATH_ENV), value);
    }
    info!("{}:", Colored(Blue, "Depots"));
    for depot in ctx.depots() {
        let registries = depot.join(REGISTRIES_DIR);
        info!(
            "  {} {} ({})",
            Icons::ARROW,
            depot.display(),
            marker(&registries)
        );
    }
    info!(
        "{}: {}",
        Colored(Blue, "Registries"),
        Colored(Yellow, ctx.registries().len())
    );
}

fn handle_cli() -> KeelResult<()> {
    let args = Args::parse();

    setup_logging(&args);

    if let Some(ref c) = args.config {
        set_config_path(resolve_path(c)?);
    }

    if matches!(args.command, cli::Commands::DefConfig) {
        let path = generate_default_config()?;
        info!(
            "Default configuration written to {}",
            Colored(Green, path.display())
        );
        return Ok(());
    }

    config::init()?;
    let config = get_config();
    set_color(!args.no_color && !args.json && config.display().colors());

    let ctx = KeelContext::new(config, &args.depot, args.json)?;

    match args.command {
        cli::Commands::Registries => list_registries(&ctx)?,
        cli::Commands::Search {
            query,
            exact,
            limit,
        } => search_packages(&ctx, &query, exact, limit)?,
        cli::Commands::Info {
            package,
            yanked,
        } => package_info(&ctx, &package, yanked)?,
        cli::Commands::Deps {
            package,
            version,
        } => package_deps(&ctx, &package, &version)?,
        cli::Commands::Warm => warm_registries(&ctx)?,
        cli::Commands::Env => print_env(&ctx),
        cli::Commands::DefConfig => unreachable!(),
    }

    Ok(())
}

fn main() {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(2)
                .build(),
        )
    }))
    .ok();

    if let Err(err) = handle_cli() {
        eprintln!("{:?}", miette::Report::new(err));
        std::process::exit(1);
    }
}
