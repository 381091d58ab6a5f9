use super::Env;
use crate::output::print_json;
use anyhow::Context;
use charsheet_core::migration::{self, MigrationConfig};

pub fn run(env: &Env, name: &str, json: bool) -> anyhow::Result<()> {
    let config = env.load_config()?;
    let client = env.client(&config)?;

    let report = match migration::migrate(&client, &MigrationConfig::from(&config), name) {
        Ok(report) => report,
        Err(e) => {
            let stage = e.stage();
            if json {
                let value = serde_json::json!({
                    "character": name,
                    "stage": stage.as_str(),
                    "sheet": e.sheet(),
                    "user_error": e.is_user_error(),
                    "document_mutated": e.document_mutated(),
                });
                print_json(&value)?;
            } else if e.document_mutated() {
                eprintln!("note: the document was changed before the failure; re-run to finish");
            }
            return Err(e).with_context(|| format!("migration of '{name}' failed at {stage}"));
        }
    };

    if json {
        print_json(&report)?;
        return Ok(());
    }
    println!(
        "Migrated '{}' ({}): {} abilities from '{}', {} ranges / {} cells written",
        report.character,
        report.state,
        report.abilities,
        report.source_sheet,
        report.ranges_written,
        report.cells_written
    );
    println!("Legacy sheet kept as '{}'.", report.archive_sheet);
    Ok(())
}
