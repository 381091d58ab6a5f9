use std::fmt;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SheetError {
    #[error("config not found: run 'charsheet config init' or pass --config")]
    ConfigNotFound,

    #[error("sheet not found: {0}")]
    SheetNotFound(String),

    #[error("invalid id '{0}': must be alphanumeric, '_', '-' or '.'")]
    InvalidId(String),

    #[error("invalid range: {0}")]
    InvalidRange(String),

    #[error("remote API error (HTTP {status}): {message}")]
    Api { status: u16, message: String },

    #[error("value '{value}' of '{key}' is not an integer")]
    InvalidValue { key: String, value: String },

    #[error("unexpected response from document API: {0}")]
    UnexpectedResponse(String),

    #[error("'{0}' is not a valid dice roll expression")]
    InvalidDiceTerm(String),

    #[error("'{0}' is not a valid separator, expected '+' or '-'")]
    InvalidSeparator(String),

    #[error("expression cannot end with separator '{0}'")]
    TrailingSeparator(String),

    #[error("nothing to roll")]
    EmptyExpression,

    #[error("no ability matches '{0}'")]
    AbilityNotFound(String),

    #[error("multiple abilities ({candidates}) match '{query}', please be more specific")]
    AmbiguousAbility { query: String, candidates: String },

    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, SheetError>;

// ---------------------------------------------------------------------------
// Migration taxonomy
// ---------------------------------------------------------------------------

/// The workflow step a migration failure happened in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MigrationStage {
    Config,
    Topology,
    Extraction,
    Staging,
    Write,
    Commit,
}

impl MigrationStage {
    pub fn as_str(self) -> &'static str {
        match self {
            MigrationStage::Config => "config",
            MigrationStage::Topology => "topology",
            MigrationStage::Extraction => "extraction",
            MigrationStage::Staging => "staging",
            MigrationStage::Write => "write",
            MigrationStage::Commit => "commit",
        }
    }
}

impl fmt::Display for MigrationStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Terminal failure of a single migration run. None of these are retried
/// internally; re-running the whole migration is the recovery path.
#[derive(Debug, Error)]
pub enum MigrationError {
    /// The layout or ids would send values to the wrong cells. Checked before
    /// the document is read.
    #[error("invalid migration config: {}", .0.join("; "))]
    InvalidConfig(Vec<String>),

    #[error("cannot migrate '{name}': either sheet '{name}' or '{old}' must exist")]
    NoSourceSheet { name: String, old: String },

    #[error("cannot migrate '{name}': '{name}' and '{old}' both exist, already migrated")]
    AlreadyMigrated { name: String, old: String },

    /// The sheet list could not be fetched; nothing was classified.
    #[error("failed to read sheet list of the document")]
    MetadataUnavailable(#[source] SheetError),

    #[error("failed to read legacy values from '{sheet}'")]
    ExtractionFailed {
        sheet: String,
        #[source]
        source: SheetError,
    },

    #[error("failed to prepare staging sheet '{sheet}'")]
    StagingFailed {
        sheet: String,
        #[source]
        source: SheetError,
    },

    #[error("failed to write values into staging sheet '{sheet}'")]
    WriteFailed {
        sheet: String,
        #[source]
        source: SheetError,
    },

    #[error("failed to promote staging sheet '{sheet}', its values are intact; re-run the migration")]
    CommitFailed {
        sheet: String,
        #[source]
        source: SheetError,
    },
}

impl MigrationError {
    pub fn stage(&self) -> MigrationStage {
        match self {
            MigrationError::InvalidConfig(_) => MigrationStage::Config,
            MigrationError::NoSourceSheet { .. }
            | MigrationError::AlreadyMigrated { .. }
            | MigrationError::MetadataUnavailable(_) => MigrationStage::Topology,
            MigrationError::ExtractionFailed { .. } => MigrationStage::Extraction,
            MigrationError::StagingFailed { .. } => MigrationStage::Staging,
            MigrationError::WriteFailed { .. } => MigrationStage::Write,
            MigrationError::CommitFailed { .. } => MigrationStage::Commit,
        }
    }

    /// The sheet title the failure is about.
    pub fn sheet(&self) -> Option<&str> {
        match self {
            MigrationError::NoSourceSheet { name, .. }
            | MigrationError::AlreadyMigrated { name, .. } => Some(name),
            MigrationError::InvalidConfig(_) | MigrationError::MetadataUnavailable(_) => None,
            MigrationError::ExtractionFailed { sheet, .. }
            | MigrationError::StagingFailed { sheet, .. }
            | MigrationError::WriteFailed { sheet, .. }
            | MigrationError::CommitFailed { sheet, .. } => Some(sheet),
        }
    }

    /// Errors the operator has to resolve by hand before a re-run can succeed.
    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            MigrationError::InvalidConfig(_)
                | MigrationError::NoSourceSheet { .. }
                | MigrationError::AlreadyMigrated { .. }
        )
    }

    /// Whether the document may have been mutated before the failure.
    pub fn document_mutated(&self) -> bool {
        matches!(
            self,
            MigrationError::StagingFailed { .. }
                | MigrationError::WriteFailed { .. }
                | MigrationError::CommitFailed { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_errors_do_not_mutate() {
        let err = MigrationError::AlreadyMigrated {
            name: "Hero".into(),
            old: "Hero_old".into(),
        };
        assert!(err.is_user_error());
        assert!(!err.document_mutated());
        assert_eq!(err.stage(), MigrationStage::Topology);
        assert_eq!(err.sheet(), Some("Hero"));
    }

    #[test]
    fn invalid_config_lists_every_problem() {
        let err = MigrationError::InvalidConfig(vec![
            "document_id is empty".into(),
            "layout.legacy_blocks is empty".into(),
        ]);
        assert_eq!(err.stage(), MigrationStage::Config);
        assert!(err.is_user_error());
        assert!(!err.document_mutated());
        assert_eq!(
            err.to_string(),
            "invalid migration config: document_id is empty; layout.legacy_blocks is empty"
        );
    }

    #[test]
    fn commit_failure_reports_staging_sheet() {
        let err = MigrationError::CommitFailed {
            sheet: "Hero_new".into(),
            source: SheetError::Api {
                status: 500,
                message: "backend error".into(),
            },
        };
        assert_eq!(err.stage(), MigrationStage::Commit);
        assert!(err.document_mutated());
        assert!(err.to_string().contains("Hero_new"));
    }
}
