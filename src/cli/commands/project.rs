//! `itree project` command - Projects and their part associations

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
use crate::core::store::{NewProjectPart, ProjectUpdate};

#[derive(Subcommand, Debug)]
pub enum ProjectCommands {
    /// Create a new project
    New {
        /// Project name
        #[arg(long, short = 'n')]
        name: String,

        /// Category ID the project is filed under
        #[arg(long, short = 'c')]
        category: String,

        /// Description
        #[arg(long, short = 'd', default_value = "")]
        description: String,
    },

    /// List projects
    List {
        /// Only projects filed directly under this category
        #[arg(long, short = 'c')]
        category: Option<String>,
    },

    /// Show a project with its parts and recent runs
    Show {
        /// Project ID
        id: String,
    },

    /// Change a project's name, description or category
    Edit {
        /// Project ID
        id: String,

        #[arg(long, short = 'n')]
        name: Option<String>,

        #[arg(long, short = 'd')]
        description: Option<String>,

        #[arg(long, short = 'c')]
        category: Option<String>,
    },

    /// Delete a project with its part associations and runs
    Delete {
        /// Project ID
        id: String,

        /// Skip the confirmation prompt
        #[arg(long, short = 'y')]
        yes: bool,
    },

    /// Associate a part with a project (an existing association is kept as is)
    AddPart {
        /// Project ID
        project: String,

        /// Part ID or unique part name
        part: String,

        /// Units per run
        #[arg(long, short = 'n', default_value_t = 1)]
        quantity: u32,

        /// The project produces this part instead of consuming it
        #[arg(long)]
        output: bool,
    },

    /// Change an association's quantity or direction
    EditPart {
        /// Project part ID
        id: String,

        #[arg(long, short = 'n')]
        quantity: Option<u32>,

        /// Mark as produced (true) or consumed (false)
        #[arg(long)]
        output: Option<bool>,
    },

    /// Remove a part association
    RemovePart {
        /// Project part ID
        id: String,
    },

    /// List the parts a project consumes and produces
    Parts {
        /// Project ID
        project: String,
    },

    /// Add part associations from a CSV file with `part`, `quantity`, `output` columns
    ImportBom {
        /// Project ID
        project: String,

        /// CSV file
        file: PathBuf,
    },
}

pub fn run(cmd: ProjectCommands, global: &GlobalOpts) -> Result<()> {
    match cmd {
        ProjectCommands::New {
            name,
            category,
            description,
        } => run_new(&name, &category, &description, global),
        ProjectCommands::List { category } => run_list(category.as_deref(), global),
        ProjectCommands::Show { id } => run_show(&id, global),
        ProjectCommands::Edit {
            id,
            name,
            description,
            category,
        } => run_edit(&id, name, description, category.as_deref(), global),
        ProjectCommands::Delete { id, yes } => run_delete(&id, yes, global),
        ProjectCommands::AddPart {
            project,
            part,
            quantity,
            output,
        } => run_add_part(&project, &part, quantity, output, global),
        ProjectCommands::EditPart {
            id,
            quantity,
            output,
        } => run_edit_part(&id, quantity, output, global),
        ProjectCommands::RemovePart { id } => run_remove_part(&id, global),
        ProjectCommands::Parts { project } => run_parts(&project, global),
        ProjectCommands::ImportBom { project, file } => run_import_bom(&project, &file, global),
    }
}

fn run_new(name: &str, category: &str, description: &str, global: &GlobalOpts) -> Result<()> {
    let mut session = open_session(global)?;
    let category = parse_id(category, EntityPrefix::Cat)?;

    let project = session
        .store
        .create_project(name, description, &category)
        .into_diagnostic()?;

    match session.format(global) {
        OutputFormat::Id => println!("{}", project.id),
        format => print_record(format, &project, || {
            if !global.quiet {
                println!(
                    "{} Created project {} ({})",
                    style("✓").green(),
                    style(&project.id).cyan(),
                    project.name
                );
            }
            Ok(())
        })?,
    }
    Ok(())
}

fn run_list(category: Option<&str>, global: &GlobalOpts) -> Result<()> {
    let session = open_session(global)?;
    let category = category
        .map(|c| parse_id(c, EntityPrefix::Cat))
        .transpose()?;

    let projects = match &category {
        Some(category) => session.store.category_projects(category),
        None => session.store.list_projects(None),
    }
    .into_diagnostic()?;

    let mut rows = Vec::with_capacity(projects.len());
    for project in &projects {
        rows.push(vec![
            project.id.to_string(),
            project.name.clone(),
            session
                .store
                .category_pathstring(&project.category)
                .into_diagnostic()?,
            truncate_str(&project.description, 40),
        ]);
    }

    Listing {
        noun: "project",
        headers: &["ID", "NAME", "CATEGORY", "DESCRIPTION"],
        rows,
        items: &projects,
    }
    .print(session.format(global), global.quiet)
}

fn run_show(id: &str, global: &GlobalOpts) -> Result<()> {
    let session = open_session(global)?;
    let id = parse_id(id, EntityPrefix::Prj)?;
    let store = &session.store;

    let project = store.get_project(&id).into_diagnostic()?;
    let category = store
        .category_pathstring(&project.category)
        .into_diagnostic()?;
    let inputs = store.project_inputs(&id).into_diagnostic()?;
    let outputs = store.project_outputs(&id).into_diagnostic()?;
    let runs = store.list_runs(Some(&id)).into_diagnostic()?;

    print_record(session.format(global), &project, || {
        println!("{}", style(&project.name).bold());
        println!("{}", style("─".repeat(40)).dim());
        println!("  ID:          {}", style(&project.id).cyan());
        println!("  Category:    {}", category);
        if !project.description.is_empty() {
            println!("  Description: {}", project.description);
        }

        println!();
        println!("  {} ({})", style("Consumes").bold(), inputs.len());
        for pp in &inputs {
            println!("    {}  {}", style(&pp.id).dim(), pp);
        }
        println!();
        println!("  {} ({})", style("Produces").bold(), outputs.len());
        for pp in &outputs {
            println!("    {}  {}", style(&pp.id).dim(), pp);
        }

        println!();
        println!("  {} ({})", style("Runs").bold(), runs.len());
        for run in runs.iter().take(5) {
            println!(
                "    {}  {} x{}",
                style(&run.id).dim(),
                run.run_date,
                run.quantity
            );
        }
        Ok(())
    })
}

fn run_edit(
    id: &str,
    name: Option<String>,
    description: Option<String>,
    category: Option<&str>,
    global: &GlobalOpts,
) -> Result<()> {
    let mut session = open_session(global)?;
    let id = parse_id(id, EntityPrefix::Prj)?;
    let category = category
        .map(|c| parse_id(c, EntityPrefix::Cat))
        .transpose()?;

    let project = session
        .store
        .update_project(
            &id,
            ProjectUpdate {
                name,
                description,
                category,
            },
        )
        .into_diagnostic()?;

    print_record(session.format(global), &project, || {
        if !global.quiet {
            println!(
                "{} Updated project {} ({})",
                style("✓").green(),
                style(&project.id).cyan(),
                project.name
            );
        }
        Ok(())
    })
}

fn run_delete(id: &str, yes: bool, global: &GlobalOpts) -> Result<()> {
    let mut session = open_session(global)?;
    let id = parse_id(id, EntityPrefix::Prj)?;
    let project = session.store.get_project(&id).into_diagnostic()?;

    if !confirm(
        &format!("Delete project '{}' with its parts list and runs?", project.name),
        yes,
    )? {
        println!("{}", style("Aborted").yellow());
        return Ok(());
    }

    let report = session.store.delete_project(&id).into_diagnostic()?;
    print_record(session.format(global), &report, || {
        if !global.quiet {
            println!(
                "{} Deleted project {} ({} part association(s), {} run(s))",
                style("✓").green(),
                project.name,
                report.project_parts,
                report.runs
            );
        }
        Ok(())
    })
}

fn run_add_part(
    project: &str,
    part: &str,
    quantity: u32,
    output: bool,
    global: &GlobalOpts,
) -> Result<()> {
    let mut session = open_session(global)?;
    let project = parse_id(project, EntityPrefix::Prj)?;
    let part = session.store.resolve_part(part).into_diagnostic()?;

    let (association, created) = session
        .store
        .get_or_create_project_part(
            NewProjectPart::new(project, part.id)
                .quantity(quantity)
                .output(output),
        )
        .into_diagnostic()?;

    match session.format(global) {
        OutputFormat::Id => println!("{}", association.id),
        format => print_record(format, &association, || {
            if global.quiet {
                return Ok(());
            }
            if created {
                println!(
                    "{} Added {} {}",
                    style("✓").green(),
                    association,
                    style(&association.id).dim()
                );
            } else {
                println!(
                    "{} Part already on project, keeping {} {}",
                    style("!").yellow(),
                    association,
                    style(&association.id).dim()
                );
            }
            Ok(())
        })?,
    }
    Ok(())
}

fn run_edit_part(
    id: &str,
    quantity: Option<u32>,
    output: Option<bool>,
    global: &GlobalOpts,
) -> Result<()> {
    let mut session = open_session(global)?;
    let id = parse_id(id, EntityPrefix::Pp)?;
    let association = session
        .store
        .update_project_part(&id, quantity, output)
        .into_diagnostic()?;

    print_record(session.format(global), &association, || {
        if !global.quiet {
            println!("{} Updated {}", style("✓").green(), association);
        }
        Ok(())
    })
}

fn run_remove_part(id: &str, global: &GlobalOpts) -> Result<()> {
    let mut session = open_session(global)?;
    let id = parse_id(id, EntityPrefix::Pp)?;
    let association = session.store.get_project_part(&id).into_diagnostic()?;
    session.store.delete_project_part(&id).into_diagnostic()?;

    if !global.quiet {
        println!("{} Removed {}", style("✓").green(), association);
    }
    Ok(())
}

fn run_parts(project: &str, global: &GlobalOpts) -> Result<()> {
    let session = open_session(global)?;
    let project = parse_id(project, EntityPrefix::Prj)?;
    let parts = session.store.project_parts(&project).into_diagnostic()?;

    let rows = parts
        .iter()
        .map(|pp| {
            vec![
                pp.id.to_string(),
                pp.part.to_string(),
                pp.part_name.clone(),
                pp.quantity.to_string(),
                if pp.output { "output" } else { "input" }.to_string(),
            ]
        })
        .collect();

    Listing {
        noun: "project part",
        headers: &["ID", "PART", "NAME", "QTY", "ROLE"],
        rows,
        items: &parts,
    }
    .print(session.format(global), global.quiet)
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "" | "0" | "false" | "no" | "n" | "input" => Some(false),
        "1" | "true" | "yes" | "y" | "output" => Some(true),
        _ => None,
    }
}

fn run_import_bom(project: &str, file: &PathBuf, global: &GlobalOpts) -> Result<()> {
    let mut session = open_session(global)?;
    let project = parse_id(project, EntityPrefix::Prj)?;
    session.store.get_project(&project).into_diagnostic()?;

    let reader = File::open(file).into_diagnostic()?;
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(BufReader::new(reader));

    let headers = rdr.headers().into_diagnostic()?.clone();
    let column = |name: &str| headers.iter().position(|h| h.eq_ignore_ascii_case(name));
    let part_col = column("part")
        .ok_or_else(|| miette::miette!("CSV file has no 'part' column"))?;
    let quantity_col = column("quantity");
    let output_col = column("output");

    // Resolve every row before touching the database
    let mut requests = Vec::new();
    for (row_idx, record) in rdr.records().enumerate() {
        let row_num = row_idx + 2;
        let record =
            record.map_err(|e| miette::miette!("CSV parse error at row {}: {}", row_num, e))?;

        let part_ref = record.get(part_col).unwrap_or_default();
        let quantity = match quantity_col.and_then(|i| record.get(i)) {
            Some(q) if !q.is_empty() => q
                .parse::<u32>()
                .ok()
                .filter(|q| *q > 0)
                .ok_or_else(|| miette::miette!("row {}: invalid quantity '{}'", row_num, q))?,
            _ => 1,
        };
        let output = match output_col.and_then(|i| record.get(i)) {
            Some(flag) => parse_flag(flag)
                .ok_or_else(|| miette::miette!("row {}: invalid output flag '{}'", row_num, flag))?,
            None => false,
        };

        let part = session
            .store
            .resolve_part(part_ref)
            .map_err(|e| miette::miette!("row {}: {}", row_num, e))?;
        requests.push(
            NewProjectPart::new(project.clone(), part.id)
                .quantity(quantity)
                .output(output),
        );
    }

    let (added, kept) = session
        .store
        .import_project_parts(&requests)
        .map_err(|e| miette::miette!("import aborted, nothing written: {}", e))?;

    if !global.quiet {
        println!(
            "{} Imported parts list: {} added, {} already present",
            style("✓").green(),
            added,
            kept
        );
    }
    Ok(())
}
