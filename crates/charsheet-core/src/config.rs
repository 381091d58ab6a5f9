use crate::error::{Result, SheetError};
use crate::paths;
use crate::range::{Column, RowSpan};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// ConfigWarning / WarnLevel
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigWarning {
    pub level: WarnLevel,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarnLevel {
    Warning,
    Error,
}

// ---------------------------------------------------------------------------
// ApiConfig
// ---------------------------------------------------------------------------

pub const DEFAULT_API_BASE: &str = "https://sheets.googleapis.com/v4";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// OAuth bearer token. Usually supplied through `CHARSHEET_ACCESS_TOKEN`
    /// rather than written to disk.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_base_url() -> String {
    DEFAULT_API_BASE.to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            access_token: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

// ---------------------------------------------------------------------------
// LayoutConfig
// ---------------------------------------------------------------------------

/// One key/value column pair of the legacy sheet layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LegacyBlock {
    pub key_column: Column,
    pub value_column: Column,
    pub rows: RowSpan,
}

impl LegacyBlock {
    fn new(start: u32, end: u32) -> Self {
        Self {
            key_column: Column::A,
            value_column: Column::C,
            rows: RowSpan::new_unchecked(start, end),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayoutConfig {
    #[serde(default = "default_legacy_blocks")]
    pub legacy_blocks: Vec<LegacyBlock>,
    /// Ability names on the template (and therefore the staging sheet).
    #[serde(default = "default_key_column")]
    pub key_column: Column,
    /// Experience values on the template.
    #[serde(default = "default_value_column")]
    pub value_column: Column,
    /// Column read by ability checks on a migrated sheet.
    #[serde(default = "default_check_value_column")]
    pub check_value_column: Column,
}

fn default_legacy_blocks() -> Vec<LegacyBlock> {
    vec![
        LegacyBlock::new(2, 6),
        LegacyBlock::new(8, 26),
        LegacyBlock::new(28, 39),
        LegacyBlock::new(42, 44),
        LegacyBlock::new(47, 55),
    ]
}

fn default_key_column() -> Column {
    Column::A
}

fn default_value_column() -> Column {
    Column::D
}

fn default_check_value_column() -> Column {
    Column::G
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            legacy_blocks: default_legacy_blocks(),
            key_column: default_key_column(),
            value_column: default_value_column(),
            check_value_column: default_check_value_column(),
        }
    }
}

// ---------------------------------------------------------------------------
// Config (top-level)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_version")]
    pub version: u32,
    pub document_id: String,
    #[serde(default = "default_template_title")]
    pub template_title: String,
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub layout: LayoutConfig,
    #[serde(default = "default_claims_dir")]
    pub claims_dir: PathBuf,
}

fn default_version() -> u32 {
    1
}

fn default_template_title() -> String {
    "Blanko".to_string()
}

fn default_claims_dir() -> PathBuf {
    PathBuf::from(paths::DEFAULT_CLAIMS_DIR)
}

impl Config {
    pub fn new(document_id: impl Into<String>) -> Self {
        Self {
            version: default_version(),
            document_id: document_id.into(),
            template_title: default_template_title(),
            api: ApiConfig::default(),
            layout: LayoutConfig::default(),
            claims_dir: default_claims_dir(),
        }
    }

    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(SheetError::ConfigNotFound);
        }
        let data = std::fs::read_to_string(path)?;
        let cfg: Config = serde_yaml::from_str(&data)?;
        Ok(cfg)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let data = serde_yaml::to_string(self)?;
        crate::io::atomic_write(path, data.as_bytes())
    }

    /// Write the config unless a file already exists. Returns true if written.
    pub fn save_new(&self, path: &Path) -> Result<bool> {
        let data = serde_yaml::to_string(self)?;
        crate::io::write_if_missing(path, data.as_bytes())
    }

    /// Claims directory, resolved against the directory holding the config.
    pub fn claims_dir_in(&self, base: &Path) -> PathBuf {
        base.join(&self.claims_dir)
    }

    /// Copy of the config safe to print.
    pub fn redacted(&self) -> Self {
        let mut cfg = self.clone();
        if cfg.api.access_token.is_some() {
            cfg.api.access_token = Some("<redacted>".to_string());
        }
        cfg
    }

    // -----------------------------------------------------------------------
    // Validation
    // -----------------------------------------------------------------------

    pub fn validate(&self) -> Vec<ConfigWarning> {
        let mut warnings: Vec<ConfigWarning> =
            structural_errors(&self.document_id, &self.template_title, &self.layout)
                .into_iter()
                .map(|message| ConfigWarning {
                    level: WarnLevel::Error,
                    message,
                })
                .collect();

        if self.api.access_token.as_deref().map_or(true, str::is_empty) {
            warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: "no api.access_token set; requests will be unauthenticated \
                          unless CHARSHEET_ACCESS_TOKEN is exported"
                    .to_string(),
            });
        }
        if self.api.timeout_secs == 0 {
            warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: "api.timeout_secs is 0, requests never time out".to_string(),
            });
        }

        warnings
    }
}

/// Mistakes that make a migration write to the wrong cells. Any of these
/// is an error, never a warning.
pub fn structural_errors(
    document_id: &str,
    template_title: &str,
    layout: &LayoutConfig,
) -> Vec<String> {
    let mut errors = Vec::new();
    if document_id.trim().is_empty() {
        errors.push("document_id is empty".to_string());
    }
    if template_title.trim().is_empty() {
        errors.push("template_title is empty".to_string());
    }
    if layout.key_column == layout.value_column {
        errors.push(format!(
            "layout.key_column and layout.value_column are both {}",
            layout.key_column
        ));
    }
    if layout.legacy_blocks.is_empty() {
        errors.push("layout.legacy_blocks is empty".to_string());
    }

    let blocks = &layout.legacy_blocks;
    for (i, block) in blocks.iter().enumerate() {
        if block.key_column == block.value_column {
            errors.push(format!(
                "legacy block {} reads keys and values from the same column {}",
                i + 1,
                block.key_column
            ));
        }
        for (j, other) in blocks.iter().enumerate().skip(i + 1) {
            if block.key_column == other.key_column && block.rows.overlaps(&other.rows) {
                errors.push(format!(
                    "legacy blocks {} and {} overlap in column {}",
                    i + 1,
                    j + 1,
                    block.key_column
                ));
            }
        }
    }
    errors
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn default_config_roundtrip() {
        let cfg = Config::new("doc-123");
        let yaml = serde_yaml::to_string(&cfg).unwrap();
        let parsed: Config = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(parsed.document_id, "doc-123");
        assert_eq!(parsed.template_title, "Blanko");
        assert_eq!(parsed.layout.legacy_blocks.len(), 5);
        assert_eq!(parsed.layout.value_column, Column::D);
    }

    #[test]
    fn minimal_yaml_fills_defaults() {
        let cfg: Config = serde_yaml::from_str("document_id: abc\n").unwrap();
        assert_eq!(cfg.version, 1);
        assert_eq!(cfg.api.base_url, DEFAULT_API_BASE);
        assert_eq!(cfg.api.timeout_secs, 30);
        assert_eq!(cfg.layout.key_column, Column::A);
        assert_eq!(cfg.layout.check_value_column, Column::G);
        assert_eq!(cfg.layout.legacy_blocks[1].rows, RowSpan::new(8, 26).unwrap());
        assert_eq!(cfg.claims_dir, PathBuf::from(".charsheet/claims"));
    }

    #[test]
    fn columns_are_letters_in_yaml() {
        let yaml = "document_id: abc\nlayout:\n  value_column: E\n";
        let cfg: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(cfg.layout.value_column, "E".parse().unwrap());
        let out = serde_yaml::to_string(&cfg).unwrap();
        assert!(out.contains("value_column: E"));
    }

    #[test]
    fn load_missing_is_config_not_found() {
        let dir = TempDir::new().unwrap();
        let err = Config::load(&dir.path().join("charsheet.yaml")).unwrap_err();
        assert!(matches!(err, SheetError::ConfigNotFound));
    }

    #[test]
    fn save_new_keeps_existing_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("charsheet.yaml");
        assert!(Config::new("first").save_new(&path).unwrap());
        assert!(!Config::new("second").save_new(&path).unwrap());
        assert_eq!(Config::load(&path).unwrap().document_id, "first");
    }

    #[test]
    fn save_then_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("charsheet.yaml");
        let mut cfg = Config::new("doc-1");
        cfg.template_title = "Template".to_string();
        cfg.save(&path).unwrap();
        let loaded = Config::load(&path).unwrap();
        assert_eq!(loaded.template_title, "Template");
    }

    #[test]
    fn validate_flags_empty_document_and_overlap() {
        let mut cfg = Config::new("");
        cfg.api.access_token = Some("tok".to_string());
        cfg.layout.legacy_blocks.push(LegacyBlock::new(5, 9));
        let warnings = cfg.validate();
        let errors: Vec<_> = warnings
            .iter()
            .filter(|w| w.level == WarnLevel::Error)
            .collect();
        assert_eq!(errors.len(), 3, "{warnings:?}");
        assert!(errors.iter().any(|w| w.message.contains("document_id")));
        assert!(errors.iter().any(|w| w.message.contains("overlap")));
    }

    #[test]
    fn inverted_legacy_rows_fail_to_load() {
        let yaml = "document_id: abc\nlayout:\n  legacy_blocks:\n    - key_column: A\n      value_column: C\n      rows: { start: 9, end: 2 }\n";
        let err = serde_yaml::from_str::<Config>(yaml).unwrap_err();
        assert!(err.to_string().contains("rows 9..2"), "{err}");
    }

    #[test]
    fn structural_errors_catch_shared_key_column() {
        let mut layout = LayoutConfig::default();
        layout.value_column = Column::A;
        let errors = structural_errors("doc", "Blanko", &layout);
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("both A"));
        assert!(structural_errors("doc", "Blanko", &LayoutConfig::default()).is_empty());
    }

    #[test]
    fn validate_warns_on_missing_token() {
        let cfg = Config::new("doc");
        let warnings = cfg.validate();
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].level, WarnLevel::Warning);
    }

    #[test]
    fn redacted_hides_token() {
        let mut cfg = Config::new("doc");
        cfg.api.access_token = Some("secret".to_string());
        let yaml = serde_yaml::to_string(&cfg.redacted()).unwrap();
        assert!(!yaml.contains("secret"));
    }
}
