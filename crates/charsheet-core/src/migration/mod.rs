//! Moving a character from the legacy sheet layout onto the current template.
//!
//! The workflow is a straight line of blocking calls against the document:
//!
//! ```text
//! MigrationConfig::check ─▶ list sheets ─▶ topology::resolve
//!   ─▶ extract (source sheet)
//!   ─▶ staging (template copy as `{name}_new`)
//!   ─▶ read staging key column ─▶ coalesce::write_plan
//!   ─▶ commit::submit_writes ─▶ commit::commit
//! ```
//!
//! Nothing is rolled back on failure. Every step either runs before any
//! mutation or only touches the staging sheet until the final rename batch,
//! and the staging sheet is always recreated from scratch, so running the
//! migration again is the recovery path. Runs for the same character must be
//! serialized by the caller.

pub mod coalesce;
pub mod commit;
pub mod extract;
pub mod staging;
pub mod topology;

pub use coalesce::{write_plan, RangeWrite};
pub use extract::AbilityXpMap;
pub use topology::{resolve, MigrationTitles, SheetTopology, Topology, TopologyState};

use crate::config::{self, Config, LayoutConfig};
use crate::document::{DocumentClient, SheetId};
use crate::error::{MigrationError, SheetError};
use crate::range::ColumnRange;
use serde::Serialize;
use staging::StagingRequest;
use tracing::info;

/// Everything the workflow needs besides the client and the character name.
#[derive(Debug, Clone)]
pub struct MigrationConfig {
    pub document_id: String,
    pub template_title: String,
    pub layout: LayoutConfig,
}

impl MigrationConfig {
    /// Reject a config that would write to the wrong cells.
    pub fn check(&self) -> Result<(), MigrationError> {
        let errors =
            config::structural_errors(&self.document_id, &self.template_title, &self.layout);
        if errors.is_empty() {
            Ok(())
        } else {
            Err(MigrationError::InvalidConfig(errors))
        }
    }
}

impl From<&Config> for MigrationConfig {
    fn from(cfg: &Config) -> Self {
        Self {
            document_id: cfg.document_id.clone(),
            template_title: cfg.template_title.clone(),
            layout: cfg.layout.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct MigrationReport {
    pub character: String,
    pub state: TopologyState,
    pub source_sheet: String,
    pub archive_sheet: String,
    pub abilities: usize,
    pub ranges_written: usize,
    pub cells_written: usize,
    pub sheet_id: SheetId,
}

/// Classify `name` without touching the document.
pub fn inspect<C: DocumentClient>(
    client: &C,
    config: &MigrationConfig,
    name: &str,
) -> Result<Topology, MigrationError> {
    let sheets = client
        .list_sheets(&config.document_id)
        .map_err(MigrationError::MetadataUnavailable)?;
    resolve(name, &sheets)
}

pub fn migrate<C: DocumentClient>(
    client: &C,
    config: &MigrationConfig,
    name: &str,
) -> Result<MigrationReport, MigrationError> {
    config.check()?;
    let doc_id = config.document_id.as_str();
    let topology = inspect(client, config, name)?;
    let titles = topology.titles().clone();
    info!(
        character = %name,
        state = %topology.state,
        source = %topology.source.title,
        "classified document"
    );

    let abilities = extract::extract(
        client,
        doc_id,
        &topology.source.title,
        &config.layout.legacy_blocks,
    )?;

    let template = topology
        .snapshot
        .properties(&config.template_title)
        .ok_or_else(|| MigrationError::StagingFailed {
            sheet: titles.staging.clone(),
            source: SheetError::SheetNotFound(config.template_title.clone()),
        })?;
    let sheet_id = staging::prepare_staging_sheet(
        client,
        doc_id,
        &StagingRequest {
            template,
            insert_after_index: topology.source.index,
            new_title: &titles.staging,
            existing: topology.stale_staging.as_ref(),
        },
    )?;

    let keys = read_key_column(client, doc_id, &titles.staging, config).map_err(|source| {
        MigrationError::WriteFailed {
            sheet: titles.staging.clone(),
            source,
        }
    })?;
    let plan = write_plan(&keys, &abilities, config.layout.value_column);
    commit::submit_writes(client, doc_id, &titles.staging, &plan)?;
    commit::commit(client, doc_id, topology.state, &titles)?;

    let report = MigrationReport {
        character: name.to_string(),
        state: topology.state,
        source_sheet: topology.source.title.clone(),
        archive_sheet: titles.old.clone(),
        abilities: abilities.len(),
        ranges_written: plan.len(),
        cells_written: plan.iter().map(|w| w.values.len()).sum(),
        sheet_id,
    };
    info!(character = %name, ranges = report.ranges_written, "migration complete");
    Ok(report)
}

/// The staging sheet's key column, top to bottom, blanks as empty strings.
fn read_key_column<C: DocumentClient>(
    client: &C,
    doc_id: &str,
    staging_title: &str,
    config: &MigrationConfig,
) -> crate::error::Result<Vec<String>> {
    let range = ColumnRange::whole(staging_title, config.layout.key_column);
    let results = client.batch_get_values(doc_id, std::slice::from_ref(&range))?;
    let column = results
        .into_iter()
        .next()
        .ok_or_else(|| SheetError::UnexpectedResponse(format!("no values for {range}")))?;
    Ok(column
        .first_column()
        .into_iter()
        .map(|k| k.unwrap_or_default().to_string())
        .collect())
}
