use super::Env;
use crate::output::print_json;
use anyhow::Context;
use charsheet_core::config::{Config, WarnLevel};
use clap::Subcommand;

// ---------------------------------------------------------------------------
// Subcommand types
// ---------------------------------------------------------------------------

#[derive(Subcommand)]
pub enum ConfigSubcommand {
    /// Write a default config file
    Init {
        /// Spreadsheet id of the character document
        #[arg(long)]
        document_id: String,
        /// Title of the template sheet
        #[arg(long)]
        template: Option<String>,
        /// Overwrite an existing config
        #[arg(long)]
        force: bool,
    },

    /// Print the effective config (access token redacted)
    Show,

    /// Validate the config for common mistakes
    Validate,
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

pub fn run(env: &Env, subcmd: ConfigSubcommand, json: bool) -> anyhow::Result<()> {
    match subcmd {
        ConfigSubcommand::Init {
            document_id,
            template,
            force,
        } => init(env, document_id, template, force, json),
        ConfigSubcommand::Show => show(env, json),
        ConfigSubcommand::Validate => validate(env, json),
    }
}

// ---------------------------------------------------------------------------
// init
// ---------------------------------------------------------------------------

fn init(
    env: &Env,
    document_id: String,
    template: Option<String>,
    force: bool,
    json: bool,
) -> anyhow::Result<()> {
    let path = &env.config_path;
    let mut config = Config::new(document_id);
    if let Some(template) = template {
        config.template_title = template;
    }

    let written = if force {
        config.save(path).map(|()| true)
    } else {
        config.save_new(path)
    }
    .with_context(|| format!("failed to write {}", path.display()))?;

    if json {
        let value = serde_json::json!({
            "path": path,
            "written": written,
        });
        print_json(&value)?;
    } else if written {
        println!("Wrote {}", path.display());
    } else {
        println!("{} already exists (use --force to overwrite)", path.display());
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// show
// ---------------------------------------------------------------------------

fn show(env: &Env, json: bool) -> anyhow::Result<()> {
    let config = env.load_config()?.redacted();
    if json {
        print_json(&config)?;
        return Ok(());
    }
    println!("Config file:    {}", env.config_path.display());
    println!("Document:       {}", config.document_id);
    println!("Template sheet: {}", config.template_title);
    println!("API base:       {}", config.api.base_url);
    println!(
        "Access token:   {}",
        config.api.access_token.as_deref().unwrap_or("(none)")
    );
    println!("Claims dir:     {}", config.claims_dir.display());
    println!(
        "Template cols:  keys {}, values {}, checks {}",
        config.layout.key_column, config.layout.value_column, config.layout.check_value_column
    );
    println!("Legacy blocks:");
    for block in &config.layout.legacy_blocks {
        println!(
            "  {}{}:{}{} -> {}",
            block.key_column,
            block.rows.start(),
            block.key_column,
            block.rows.end(),
            block.value_column
        );
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// validate
// ---------------------------------------------------------------------------

fn validate(env: &Env, json: bool) -> anyhow::Result<()> {
    let config = env.load_config()?;
    let warnings = config.validate();

    if json {
        let value = serde_json::json!({
            "warnings": warnings,
        });
        print_json(&value)?;
    } else if warnings.is_empty() {
        println!("Config is valid. No warnings.");
    } else {
        for w in &warnings {
            let prefix = match w.level {
                WarnLevel::Warning => "warning",
                WarnLevel::Error => "error",
            };
            println!("[{prefix}] {}", w.message);
        }
    }

    if warnings.iter().any(|w| w.level == WarnLevel::Error) {
        anyhow::bail!("config validation found errors");
    }
    Ok(())
}
