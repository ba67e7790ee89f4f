//! `itree part` command - Part management

use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;

use clap::Subcommand;
use console::style;
use csv::ReaderBuilder;
use miette::{IntoDiagnostic, Result};

use crate::cli::helpers::{confirm, open_session, parse_id, truncate_str};
use crate::cli::table::{print_record, Listing};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::identity::EntityPrefix;

#[derive(Subcommand, Debug)]
pub enum PartCommands {
    /// Create a new part
    New {
        /// Part name
        name: String,

        /// Description
        #[arg(long, short = 'd', default_value = "")]
        description: String,
    },

    /// List all parts
    List,

    /// Delete a part and its project associations
    Delete {
        /// Part ID
        id: String,

        /// Skip the confirmation prompt
        #[arg(long, short = 'y')]
        yes: bool,
    },

    /// Create parts from a CSV file with `name` and optional `description` columns
    Import {
        /// CSV file
        file: PathBuf,
    },
}

pub fn run(cmd: PartCommands, global: &GlobalOpts) -> Result<()> {
    match cmd {
        PartCommands::New { name, description } => run_new(&name, &description, global),
        PartCommands::List => run_list(global),
        PartCommands::Delete { id, yes } => run_delete(&id, yes, global),
        PartCommands::Import { file } => run_import(&file, global),
    }
}

fn run_new(name: &str, description: &str, global: &GlobalOpts) -> Result<()> {
    let mut session = open_session(global)?;
    let part = session
        .store
        .create_part(name, description)
        .into_diagnostic()?;

    match session.format(global) {
        OutputFormat::Id => println!("{}", part.id),
        format => print_record(format, &part, || {
            if !global.quiet {
                println!(
                    "{} Created part {} ({})",
                    style("✓").green(),
                    style(&part.id).cyan(),
                    part.name
                );
            }
            Ok(())
        })?,
    }
    Ok(())
}

fn run_list(global: &GlobalOpts) -> Result<()> {
    let session = open_session(global)?;
    let parts = session.store.list_parts().into_diagnostic()?;

    let rows = parts
        .iter()
        .map(|p| {
            vec![
                p.id.to_string(),
                p.name.clone(),
                truncate_str(&p.description, 50),
            ]
        })
        .collect();

    Listing {
        noun: "part",
        headers: &["ID", "NAME", "DESCRIPTION"],
        rows,
        items: &parts,
    }
    .print(session.format(global), global.quiet)
}

fn run_delete(id: &str, yes: bool, global: &GlobalOpts) -> Result<()> {
    let mut session = open_session(global)?;
    let id = parse_id(id, EntityPrefix::Part)?;
    let part = session.store.get_part(&id).into_diagnostic()?;

    if !confirm(
        &format!("Delete part '{}' and remove it from every project?", part.name),
        yes,
    )? {
        println!("{}", style("Aborted").yellow());
        return Ok(());
    }

    let removed = session.store.delete_part(&id).into_diagnostic()?;
    if !global.quiet {
        println!(
            "{} Deleted part {} ({} project association(s) removed)",
            style("✓").green(),
            part.name,
            removed
        );
    }
    Ok(())
}

fn run_import(file: &PathBuf, global: &GlobalOpts) -> Result<()> {
    let mut session = open_session(global)?;

    let reader = File::open(file).into_diagnostic()?;
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(BufReader::new(reader));

    let headers = rdr.headers().into_diagnostic()?.clone();
    let column = |name: &str| headers.iter().position(|h| h.eq_ignore_ascii_case(name));
    let name_col = column("name")
        .ok_or_else(|| miette::miette!("CSV file has no 'name' column"))?;
    let description_col = column("description");

    let mut rows = Vec::new();
    for (row_idx, record) in rdr.records().enumerate() {
        // header is line 1
        let row_num = row_idx + 2;
        let record =
            record.map_err(|e| miette::miette!("CSV parse error at row {}: {}", row_num, e))?;

        let name = record.get(name_col).unwrap_or_default();
        if name.is_empty() {
            return Err(miette::miette!("row {}: part name is empty", row_num));
        }
        let description = description_col
            .and_then(|i| record.get(i))
            .unwrap_or_default();
        rows.push((name.to_string(), description.to_string()));
    }

    let parts = session
        .store
        .import_parts(&rows)
        .map_err(|e| miette::miette!("import aborted, no parts written: {}", e))?;

    if global.format == OutputFormat::Id {
        for part in &parts {
            println!("{}", part.id);
        }
    } else if !global.quiet {
        println!("{} Imported {} part(s)", style("✓").green(), parts.len());
    }
    Ok(())
}
