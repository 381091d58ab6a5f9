use super::Env;
use crate::output::{print_json, print_table};
use anyhow::Context;
use charsheet_core::document::DocumentClient;

pub fn run(env: &Env, json: bool) -> anyhow::Result<()> {
    let config = env.load_config()?;
    let client = env.client(&config)?;
    let sheets = client
        .list_sheets(&config.document_id)
        .with_context(|| format!("failed to list sheets of {}", config.document_id))?;

    if json {
        print_json(&sheets)?;
        return Ok(());
    }
    if sheets.is_empty() {
        println!("No sheets.");
        return Ok(());
    }
    let rows = sheets
        .iter()
        .map(|s| vec![s.index.to_string(), s.sheet_id.to_string(), s.title.clone()])
        .collect();
    print_table(&["INDEX", "ID", "TITLE"], rows);
    Ok(())
}
