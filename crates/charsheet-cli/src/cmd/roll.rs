use super::{Env, Identity};
use crate::output::print_json;
use charsheet_core::dice::DiceExpr;

pub fn run(env: &Env, identity: &Identity, expression: &[String], json: bool) -> anyhow::Result<()> {
    let expr = DiceExpr::parse(expression)?;
    let roller = roller_name(env, identity)?;
    let outcome = expr.roll(&mut rand::thread_rng());

    if json {
        let value = serde_json::json!({
            "roller": roller,
            "expression": outcome.expression,
            "total": outcome.total,
        });
        print_json(&value)?;
    } else {
        println!("{roller} rolls {} = {}", outcome.expression, outcome.total);
    }
    Ok(())
}

/// The claimed character, or the user id when there is no config or no claim.
fn roller_name(env: &Env, identity: &Identity) -> anyhow::Result<String> {
    if !env.config_path.exists() {
        return Ok(identity.user.clone());
    }
    let config = env.load_config()?;
    let claim = env
        .claim_store(&config)
        .read(&identity.guild, &identity.user)?;
    Ok(claim.map_or_else(|| identity.user.clone(), |c| c.sheet))
}
