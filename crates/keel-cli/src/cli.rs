use clap::{ArgAction, Parser, Subcommand, ValueHint};

#[derive(Parser)]
#[command(
    author,
    version,
    about,
    help_template = "{before-help}{name} {version}
{author-with-newline}{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}",
    arg_required_else_help = true
)]
pub struct Args {
    /// Set output verbosity
    #[arg(short = 'v', long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress outputs
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Output as json
    #[arg(short, long, global = true)]
    pub json: bool,

    /// Disable colors in output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Provide custom config file
    #[arg(short, long, global = true, value_hint = ValueHint::FilePath)]
    pub config: Option<String>,

    /// Search this depot instead of the configured ones (repeatable)
    #[arg(short, long, global = true, action = ArgAction::Append, value_hint = ValueHint::DirPath)]
    pub depot: Vec<String>,

    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List the registries found in the depots
    #[clap(name = "registries", visible_alias = "ls")]
    Registries,

    /// Search packages by name
    #[command(arg_required_else_help = true)]
    #[clap(name = "search", visible_alias = "s", visible_alias = "find")]
    Search {
        /// Name or part of a name
        #[arg(required = true)]
        query: String,

        /// Only list packages whose name matches exactly
        #[arg(required = false, short, long)]
        exact: bool,

        /// Limit number of result
        #[arg(required = false, long)]
        limit: Option<usize>,
    },

    /// Show package identity and released versions
    #[command(arg_required_else_help = true)]
    #[clap(name = "info", visible_alias = "query", visible_alias = "Q")]
    Info {
        /// Package name or UUID
        #[arg(required = true)]
        package: String,

        /// Include yanked versions
        #[arg(required = false, long)]
        yanked: bool,
    },

    /// Show compat bounds and dependencies of one version
    #[command(arg_required_else_help = true)]
    #[clap(name = "deps")]
    Deps {
        /// Package name or UUID
        #[arg(required = true)]
        package: String,

        /// Exact version, e.g. 1.2.0
        #[arg(required = true)]
        version: String,
    },

    /// Load every package and expand every version, reporting timings
    #[clap(name = "warm")]
    Warm,

    /// Generate default config
    #[clap(name = "defconfig")]
    DefConfig,

    /// Print the effective configuration paths
    #[clap(name = "env")]
    Env,
}
