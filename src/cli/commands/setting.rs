//! `itree setting` command - Instance settings

use clap::Subcommand;
use console::style;
use miette::{IntoDiagnostic, Result};

use crate::cli::helpers::open_session;
use crate::cli::GlobalOpts;

#[derive(Subcommand, Debug)]
pub enum SettingCommands {
    /// Print a setting value
    Get {
        /// Setting key, e.g. INVENTREE_INSTANCE
        key: String,

        /// Value printed when the key is not set
        #[arg(long, default_value = "")]
        default: String,
    },

    /// Store a setting value
    Set {
        key: String,
        value: String,
    },
}

pub fn run(cmd: SettingCommands, global: &GlobalOpts) -> Result<()> {
    let mut session = open_session(global)?;

    match cmd {
        SettingCommands::Get { key, default } => {
            let value = session
                .store
                .get_setting(&key, &default)
                .into_diagnostic()?;
            println!("{}", value);
        }
        SettingCommands::Set { key, value } => {
            session.store.set_setting(&key, &value).into_diagnostic()?;
            if !global.quiet {
                println!(
                    "{} {} = {}",
                    style("✓").green(),
                    style(&key).cyan(),
                    value
                );
            }
        }
    }
    Ok(())
}
