use super::{Env, Identity};
use crate::output::print_json;
use charsheet_core::ability;

pub fn run(
    env: &Env,
    identity: &Identity,
    character: Option<&str>,
    abilities: &[String],
    json: bool,
) -> anyhow::Result<()> {
    let config = env.load_config()?;
    let character = match character {
        Some(c) => c.to_string(),
        None => env
            .claim_store(&config)
            .read(&identity.guild, &identity.user)?
            .map(|c| c.sheet)
            .ok_or_else(|| {
                anyhow::anyhow!(
                    "{} has not claimed a sheet; run 'charsheet claim set <SHEET>' or pass --character",
                    identity.user
                )
            })?,
    };
    let client = env.client(&config)?;
    let outcome = ability::check(
        &client,
        &config.document_id,
        &character,
        &config.layout,
        abilities,
        &mut rand::thread_rng(),
    )?;

    if json {
        print_json(&outcome)?;
    } else {
        println!("{}", outcome.describe());
    }
    Ok(())
}
