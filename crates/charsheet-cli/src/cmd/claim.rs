use super::{Env, Identity};
use crate::output::print_json;
use charsheet_core::claim;
use clap::Subcommand;

#[derive(Subcommand)]
pub enum ClaimSubcommand {
    /// Claim a sheet as your character
    Set {
        #[command(flatten)]
        identity: Identity,
        /// Sheet title
        sheet: String,
    },

    /// Show your current claim
    Show {
        #[command(flatten)]
        identity: Identity,
    },

    /// Drop your current claim
    Release {
        #[command(flatten)]
        identity: Identity,
    },
}

pub fn run(env: &Env, subcmd: ClaimSubcommand, json: bool) -> anyhow::Result<()> {
    let config = env.load_config()?;
    let store = env.claim_store(&config);

    match subcmd {
        ClaimSubcommand::Set { identity, sheet } => {
            let client = env.client(&config)?;
            let claim = claim::claim_sheet(
                &client,
                &config.document_id,
                &store,
                &identity.guild,
                &identity.user,
                &sheet,
            )?;
            if json {
                print_json(&claim)?;
            } else {
                println!("{} now plays '{}'.", identity.user, claim.sheet);
            }
        }
        ClaimSubcommand::Show { identity } => {
            let claim = store.read(&identity.guild, &identity.user)?;
            if json {
                print_json(&claim)?;
                return Ok(());
            }
            match claim {
                Some(c) => println!(
                    "{} plays '{}' (since {}).",
                    identity.user,
                    c.sheet,
                    c.claimed_at.format("%Y-%m-%d %H:%M UTC")
                ),
                None => println!("{} has not claimed a sheet.", identity.user),
            }
        }
        ClaimSubcommand::Release { identity } => {
            let released = store.release(&identity.guild, &identity.user)?;
            if json {
                print_json(&serde_json::json!({ "released": released }))?;
            } else if released {
                println!("Released claim of {}.", identity.user);
            } else {
                println!("{} had no claim.", identity.user);
            }
        }
    }
    Ok(())
}
