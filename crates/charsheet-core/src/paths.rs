use crate::error::{Result, SheetError};
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

pub const CONFIG_FILE: &str = "charsheet.yaml";
pub const DEFAULT_CLAIMS_DIR: &str = ".charsheet/claims";

pub fn config_path(root: &Path) -> PathBuf {
    root.join(CONFIG_FILE)
}

/// `{claims_dir}/{guild}/{user}.yaml`
pub fn claim_path(claims_dir: &Path, guild: &str, user: &str) -> Result<PathBuf> {
    validate_id(guild)?;
    validate_id(user)?;
    Ok(claims_dir.join(guild).join(format!("{user}.yaml")))
}

static ID_RE: OnceLock<Regex> = OnceLock::new();

fn id_re() -> &'static Regex {
    ID_RE.get_or_init(|| Regex::new(r"^[A-Za-z0-9_\-][A-Za-z0-9_.\-]*$").unwrap())
}

/// Guild and user ids end up as path components.
pub fn validate_id(id: &str) -> Result<()> {
    if id.is_empty() || id.len() > 64 || !id_re().is_match(id) {
        return Err(SheetError::InvalidId(id.to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_ids() {
        assert!(validate_id("123456789").is_ok());
        assert!(validate_id("some_user-1").is_ok());
        assert!(validate_id("a.b").is_ok());
    }

    #[test]
    fn invalid_ids() {
        assert!(validate_id("").is_err());
        assert!(validate_id("..").is_err());
        assert!(validate_id(".hidden").is_err());
        assert!(validate_id("a/b").is_err());
        assert!(validate_id("a b").is_err());
        assert!(validate_id(&"x".repeat(65)).is_err());
    }

    #[test]
    fn claim_path_layout() {
        let p = claim_path(Path::new("/claims"), "42", "7").unwrap();
        assert_eq!(p, PathBuf::from("/claims/42/7.yaml"));
    }
}
