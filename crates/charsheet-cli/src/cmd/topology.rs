use super::Env;
use crate::output::print_json;
use charsheet_core::migration::{self, MigrationConfig};

pub fn run(env: &Env, name: &str, json: bool) -> anyhow::Result<()> {
    let config = env.load_config()?;
    let client = env.client(&config)?;
    let topology = migration::inspect(&client, &MigrationConfig::from(&config), name)?;
    let titles = topology.titles();

    if json {
        let value = serde_json::json!({
            "character": name,
            "state": topology.state,
            "source": topology.source,
            "archive": titles.old,
            "staging": titles.staging,
            "stale_staging": topology.stale_staging,
        });
        print_json(&value)?;
        return Ok(());
    }

    println!("{name}: {}", topology.state.as_str().to_uppercase());
    println!("  source:   {}", topology.source.title);
    println!("  archive:  {}", titles.old);
    match &topology.stale_staging {
        Some(stale) => println!("  staging:  {} (stale, will be replaced)", stale.title),
        None => println!("  staging:  {}", titles.staging),
    }
    Ok(())
}
