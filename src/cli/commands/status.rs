//! `itree status` command - Workspace and database summary

use console::style;
use miette::{IntoDiagnostic, Result};
use serde::Serialize;

use crate::cli::helpers::open_session;
use crate::cli::table::print_record;
use crate::cli::GlobalOpts;
use crate::core::store::{StoreStats, SCHEMA_VERSION};

#[derive(clap::Args, Debug)]
pub struct StatusArgs {}

#[derive(Serialize)]
struct Status {
    workspace: String,
    database: String,
    schema_version: i32,
    instance_name: String,
    #[serde(flatten)]
    stats: StoreStats,
}

pub fn run(_args: StatusArgs, global: &GlobalOpts) -> Result<()> {
    let session = open_session(global)?;
    let store = &session.store;

    let status = Status {
        workspace: session.workspace.root().display().to_string(),
        database: session
            .workspace
            .database_path(session.config.database.as_deref())
            .display()
            .to_string(),
        schema_version: SCHEMA_VERSION,
        instance_name: store.instance_name().into_diagnostic()?,
        stats: store.statistics().into_diagnostic()?,
    };

    print_record(session.format(global), &status, || {
        println!("{}", style("itree status").bold().underlined());
        println!("  Workspace: {}", style(&status.workspace).cyan());
        println!("  Database:  {}", status.database);
        println!(
            "  Schema:    v{} ({} KiB)",
            status.schema_version,
            status.stats.db_size_bytes / 1024
        );
        if !status.instance_name.is_empty() {
            println!("  Instance:  {}", status.instance_name);
        }
        println!();
        println!("  Categories:    {}", status.stats.categories);
        println!("  Projects:      {}", status.stats.projects);
        println!("  Parts:         {}", status.stats.parts);
        println!("  Project parts: {}", status.stats.project_parts);
        println!("  Runs:          {}", status.stats.runs);
        Ok(())
    })
}
