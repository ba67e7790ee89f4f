//! `itree init` command - Initialize a new workspace

use console::style;
use miette::{IntoDiagnostic, Result};

use crate::core::store::{Store, INSTANCE_SETTING_KEY};
use crate::core::workspace::{Workspace, WorkspaceError};
use crate::core::Config;

#[derive(clap::Args, Debug)]
pub struct InitArgs {
    /// Directory to initialize (default: current directory)
    #[arg(default_value = ".")]
    pub path: std::path::PathBuf,

    /// Name of this instance, stored as a setting
    #[arg(long)]
    pub instance: Option<String>,

    /// Rewrite the workspace config even if .itree/ already exists
    #[arg(long)]
    pub force: bool,
}

pub fn run(args: InitArgs) -> Result<()> {
    let path = if args.path.as_os_str() == "." {
        std::env::current_dir().into_diagnostic()?
    } else {
        args.path.clone()
    };

    if !path.exists() {
        std::fs::create_dir_all(&path).into_diagnostic()?;
        println!(
            "{} Created directory {}",
            style("✓").green(),
            style(path.display()).cyan()
        );
    }

    let workspace = if args.force {
        Workspace::init_force(&path)
    } else {
        Workspace::init(&path)
    };

    let workspace = match workspace {
        Ok(ws) => ws,
        Err(WorkspaceError::AlreadyExists(path)) => {
            println!(
                "{} itree workspace already exists at {}",
                style("!").yellow(),
                style(path.display()).cyan()
            );
            println!();
            println!("Use {} to reinitialize", style("itree init --force").yellow());
            return Ok(());
        }
        Err(e) => return Err(miette::miette!("{}", e)),
    };

    let config = Config::load_for(Some(&workspace));
    let db_path = workspace.database_path(config.database.as_deref());
    let mut store = Store::open(&db_path).into_diagnostic()?;
    if let Some(name) = &args.instance {
        store
            .set_setting(INSTANCE_SETTING_KEY, name)
            .into_diagnostic()?;
    }

    println!(
        "{} Initialized itree workspace at {}",
        style("✓").green(),
        style(workspace.root().display()).cyan()
    );
    println!("  Database: {}", style(db_path.display()).dim());
    println!();
    println!("Next steps:");
    println!(
        "  {} Create a project category",
        style("itree category new <NAME>").yellow()
    );
    println!(
        "  {} Add a project to it",
        style("itree project new --name <NAME> --category <ID>").yellow()
    );

    Ok(())
}
