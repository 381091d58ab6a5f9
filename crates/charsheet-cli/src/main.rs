mod cmd;
mod output;
mod root;

use clap::{Parser, Subcommand};
use cmd::{claim::ClaimSubcommand, config::ConfigSubcommand, Env, Identity};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "charsheet",
    about = "Character sheet lookups, dice rolls and legacy sheet migration",
    version,
    propagate_version = true
)]
struct Cli {
    /// Config file (default: nearest charsheet.yaml upwards from the current directory)
    #[arg(long, global = true, env = "CHARSHEET_CONFIG")]
    config: Option<PathBuf>,

    /// OAuth access token for the document API
    #[arg(long, global = true, env = "CHARSHEET_ACCESS_TOKEN", hide_env_values = true)]
    access_token: Option<String>,

    /// Override the document API base URL
    #[arg(long, global = true, env = "CHARSHEET_API_BASE")]
    api_base: Option<String>,

    /// Output as JSON
    #[arg(long, global = true, short = 'j')]
    json: bool,

    /// Log workflow steps to stderr
    #[arg(long, global = true, short = 'v')]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the sheets of the document
    Sheets,

    /// Classify a character's sheets without changing anything
    Topology {
        /// Character (sheet title)
        name: String,
    },

    /// Move a character from the legacy layout onto the template
    Migrate {
        /// Character (sheet title)
        name: String,
    },

    /// Bind a sheet to a user
    Claim {
        #[command(subcommand)]
        subcommand: ClaimSubcommand,
    },

    /// Roll dice, e.g. `2d6 + 3 - d4`
    Roll {
        #[command(flatten)]
        identity: Identity,

        #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
        expression: Vec<String>,
    },

    /// Roll an ability check, e.g. `Climb` or `Str + Athletics`
    Check {
        #[command(flatten)]
        identity: Identity,

        /// Character sheet to read (default: the claimed sheet)
        #[arg(long, short = 'c')]
        character: Option<String>,

        #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
        abilities: Vec<String>,
    },

    /// Create, show and validate the config
    Config {
        #[command(subcommand)]
        subcommand: ConfigSubcommand,
    },
}

fn main() {
    let cli = Cli::parse();

    let default_level = if cli.verbose {
        tracing::Level::INFO
    } else {
        tracing::Level::WARN
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(default_level.into()),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let env = Env {
        config_path: root::resolve_config(cli.config.as_deref()),
        access_token: cli.access_token,
        api_base: cli.api_base,
    };
    let json = cli.json;

    let result = match cli.command {
        Commands::Sheets => cmd::sheets::run(&env, json),
        Commands::Topology { name } => cmd::topology::run(&env, &name, json),
        Commands::Migrate { name } => cmd::migrate::run(&env, &name, json),
        Commands::Claim { subcommand } => cmd::claim::run(&env, subcommand, json),
        Commands::Roll {
            identity,
            expression,
        } => cmd::roll::run(&env, &identity, &expression, json),
        Commands::Check {
            identity,
            character,
            abilities,
        } => cmd::check::run(&env, &identity, character.as_deref(), &abilities, json),
        Commands::Config { subcommand } => cmd::config::run(&env, subcommand, json),
    };

    if let Err(e) = result {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}
