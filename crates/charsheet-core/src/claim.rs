//! Which sheet a user plays, per guild.

use crate::document::{find_sheet, DocumentClient};
use crate::error::{Result, SheetError};
use crate::paths;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::info;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claim {
    pub sheet: String,
    pub claimed_at: DateTime<Utc>,
}

/// Claims stored as `{dir}/{guild}/{user}.yaml`.
#[derive(Debug, Clone)]
pub struct ClaimStore {
    dir: PathBuf,
}

impl ClaimStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn write(&self, guild: &str, user: &str, sheet: &str) -> Result<Claim> {
        let path = paths::claim_path(&self.dir, guild, user)?;
        let claim = Claim {
            sheet: sheet.to_string(),
            claimed_at: Utc::now(),
        };
        let data = serde_yaml::to_string(&claim)?;
        crate::io::atomic_write(&path, data.as_bytes())?;
        Ok(claim)
    }

    pub fn read(&self, guild: &str, user: &str) -> Result<Option<Claim>> {
        let path = paths::claim_path(&self.dir, guild, user)?;
        if !path.exists() {
            return Ok(None);
        }
        let data = std::fs::read_to_string(&path)?;
        Ok(Some(serde_yaml::from_str(&data)?))
    }

    /// Returns false when there was nothing to release.
    pub fn release(&self, guild: &str, user: &str) -> Result<bool> {
        let path = paths::claim_path(&self.dir, guild, user)?;
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}

/// Record that `user` plays `sheet`, which must exist in the document.
pub fn claim_sheet<C: DocumentClient>(
    client: &C,
    doc_id: &str,
    store: &ClaimStore,
    guild: &str,
    user: &str,
    sheet: &str,
) -> Result<Claim> {
    paths::validate_id(guild)?;
    paths::validate_id(user)?;
    let sheets = client.list_sheets(doc_id)?;
    if find_sheet(&sheets, sheet).is_none() {
        return Err(SheetError::SheetNotFound(sheet.to_string()));
    }
    let claim = store.write(guild, user, sheet)?;
    info!(guild, user, sheet, "claimed sheet");
    Ok(claim)
}
