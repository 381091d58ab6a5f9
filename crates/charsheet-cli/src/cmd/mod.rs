pub mod check;
pub mod claim;
pub mod config;
pub mod migrate;
pub mod roll;
pub mod sheets;
pub mod topology;

use anyhow::Context;
use charsheet_core::claim::ClaimStore;
use charsheet_core::config::Config;
use charsheet_core::sheets_api::SheetsApiClient;
use clap::Args;
use std::path::{Path, PathBuf};

/// Settings resolved from global flags and the environment.
pub struct Env {
    pub config_path: PathBuf,
    pub access_token: Option<String>,
    pub api_base: Option<String>,
}

impl Env {
    /// Load the config file and apply flag/env overrides on top.
    pub fn load_config(&self) -> anyhow::Result<Config> {
        let mut config = Config::load(&self.config_path)
            .with_context(|| format!("failed to load config {}", self.config_path.display()))?;
        if let Some(token) = &self.access_token {
            config.api.access_token = Some(token.clone());
        }
        if let Some(base) = &self.api_base {
            config.api.base_url = base.clone();
        }
        Ok(config)
    }

    pub fn client(&self, config: &Config) -> anyhow::Result<SheetsApiClient> {
        SheetsApiClient::new(&config.api).context("failed to build document API client")
    }

    /// Claims live next to the config file unless `claims_dir` is absolute.
    pub fn claim_store(&self, config: &Config) -> ClaimStore {
        let base = self.config_path.parent().unwrap_or(Path::new("."));
        ClaimStore::new(config.claims_dir_in(base))
    }
}

/// Who is asking, in chat terms.
#[derive(Args, Debug, Clone)]
pub struct Identity {
    /// Guild (server) id
    #[arg(long, env = "CHARSHEET_GUILD", default_value = "local")]
    pub guild: String,

    /// User id
    #[arg(long, env = "CHARSHEET_USER", default_value = "local")]
    pub user: String,
}
