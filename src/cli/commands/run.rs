//! `itree run` command - Production runs

use clap::Subcommand;
use console::style;
use miette::{IntoDiagnostic, Result};
use serde::Serialize;

use crate::cli::helpers::{open_session, parse_id};
use crate::cli::table::{print_record, Listing};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::identity::EntityPrefix;
use crate::core::store::{ProjectRun, StockDelta};

#[derive(Subcommand, Debug)]
pub enum RunCommands {
    /// Record that a project was run today
    Record {
        /// Project ID
        project: String,

        /// How many times the project was run
        #[arg(long, short = 'n', default_value_t = 1)]
        quantity: u32,
    },

    /// List runs, newest first
    List {
        /// Only runs of this project
        #[arg(long, short = 'p')]
        project: Option<String>,
    },

    /// Show a run and the stock movement it implies
    Show {
        /// Run ID
        id: String,
    },
}

#[derive(Serialize)]
struct RunDetail<'a> {
    #[serde(flatten)]
    run: &'a ProjectRun,
    deltas: &'a [StockDelta],
}

pub fn run(cmd: RunCommands, global: &GlobalOpts) -> Result<()> {
    match cmd {
        RunCommands::Record { project, quantity } => run_record(&project, quantity, global),
        RunCommands::List { project } => run_list(project.as_deref(), global),
        RunCommands::Show { id } => run_show(&id, global),
    }
}

fn run_record(project: &str, quantity: u32, global: &GlobalOpts) -> Result<()> {
    let mut session = open_session(global)?;
    let project = parse_id(project, EntityPrefix::Prj)?;
    let run = session
        .store
        .record_run(&project, quantity)
        .into_diagnostic()?;

    match session.format(global) {
        OutputFormat::Id => println!("{}", run.id),
        format => print_record(format, &run, || {
            if global.quiet {
                return Ok(());
            }
            println!(
                "{} Recorded run {} ({} x {} on {})",
                style("✓").green(),
                style(&run.id).cyan(),
                run.quantity,
                project,
                run.run_date
            );
            Ok(())
        })?,
    }
    Ok(())
}

fn run_list(project: Option<&str>, global: &GlobalOpts) -> Result<()> {
    let session = open_session(global)?;
    let project = project
        .map(|p| parse_id(p, EntityPrefix::Prj))
        .transpose()?;
    let runs = session
        .store
        .list_runs(project.as_ref())
        .into_diagnostic()?;

    let mut rows = Vec::with_capacity(runs.len());
    for run in &runs {
        let name = session
            .store
            .get_project(&run.project)
            .into_diagnostic()?
            .name;
        rows.push(vec![
            run.id.to_string(),
            run.run_date.to_string(),
            name,
            run.quantity.to_string(),
        ]);
    }

    Listing {
        noun: "run",
        headers: &["ID", "DATE", "PROJECT", "QTY"],
        rows,
        items: &runs,
    }
    .print(session.format(global), global.quiet)
}

fn run_show(id: &str, global: &GlobalOpts) -> Result<()> {
    let session = open_session(global)?;
    let id = parse_id(id, EntityPrefix::Run)?;

    let run = session.store.get_run(&id).into_diagnostic()?;
    let project = session.store.get_project(&run.project).into_diagnostic()?;
    let deltas = session.store.run_stock_deltas(&id).into_diagnostic()?;

    let detail = RunDetail {
        run: &run,
        deltas: &deltas,
    };
    print_record(session.format(global), &detail, || {
        println!("{}", style(format!("Run {}", run.id)).bold());
        println!("{}", style("─".repeat(40)).dim());
        println!("  Project:  {} {}", project.name, style(&project.id).dim());
        println!("  Date:     {}", run.run_date);
        println!("  Quantity: {}", run.quantity);

        println!();
        println!("  {}", style("Stock movement").bold());
        if deltas.is_empty() {
            println!("    {}", style("(project has no parts)").dim());
        }
        for delta in &deltas {
            let amount = format!("{:+}", delta.delta);
            let amount = if delta.delta < 0 {
                style(amount).red()
            } else {
                style(amount).green()
            };
            println!("    {:>8}  {}", amount, delta.part_name);
        }
        Ok(())
    })
}
