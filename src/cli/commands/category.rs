//! `itree category` command - Project category tree management

use clap::{ArgGroup, Subcommand};
use console::style;
use miette::{IntoDiagnostic, Result};

use crate::cli::helpers::{confirm, open_session, parse_id, truncate_str};
use crate::cli::table::{print_record, Listing};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::identity::EntityPrefix;

#[derive(Subcommand, Debug)]
pub enum CategoryCommands {
    /// Create a new category
    New {
        /// Category name (unique among its siblings)
        name: String,

        /// Parent category ID (default: new root)
        #[arg(long)]
        parent: Option<String>,

        /// Description
        #[arg(long, short = 'd', default_value = "")]
        description: String,
    },

    /// List all categories
    List,

    /// Show a category with its path, children and projects
    Show {
        /// Category ID
        id: String,
    },

    /// Print the category tree
    Tree,

    /// Rename a category or change its description
    Edit {
        /// Category ID
        id: String,

        #[arg(long)]
        name: Option<String>,

        #[arg(long, short = 'd')]
        description: Option<String>,
    },

    /// Move a category under another parent
    Move(MoveArgs),

    /// Delete a category, its subcategories, and all their projects
    Delete {
        /// Category ID
        id: String,

        /// Skip the confirmation prompt
        #[arg(long, short = 'y')]
        yes: bool,
    },
}

#[derive(clap::Args, Debug)]
#[command(group(ArgGroup::new("target").required(true).args(["parent", "root"])))]
pub struct MoveArgs {
    /// Category ID
    pub id: String,

    /// New parent category ID
    #[arg(long)]
    pub parent: Option<String>,

    /// Make the category a root
    #[arg(long)]
    pub root: bool,
}

pub fn run(cmd: CategoryCommands, global: &GlobalOpts) -> Result<()> {
    match cmd {
        CategoryCommands::New {
            name,
            parent,
            description,
        } => run_new(&name, parent.as_deref(), &description, global),
        CategoryCommands::List => run_list(global),
        CategoryCommands::Show { id } => run_show(&id, global),
        CategoryCommands::Tree => run_tree(global),
        CategoryCommands::Edit {
            id,
            name,
            description,
        } => run_edit(&id, name.as_deref(), description.as_deref(), global),
        CategoryCommands::Move(args) => run_move(args, global),
        CategoryCommands::Delete { id, yes } => run_delete(&id, yes, global),
    }
}

fn run_new(
    name: &str,
    parent: Option<&str>,
    description: &str,
    global: &GlobalOpts,
) -> Result<()> {
    let mut session = open_session(global)?;
    let parent = parent
        .map(|p| parse_id(p, EntityPrefix::Cat))
        .transpose()?;

    let category = session
        .store
        .create_category(name, description, parent.as_ref())
        .into_diagnostic()?;

    match session.format(global) {
        OutputFormat::Id => println!("{}", category.id),
        format => print_record(format, &category, || {
            if !global.quiet {
                println!(
                    "{} Created project category {} ({})",
                    style("✓").green(),
                    style(&category.id).cyan(),
                    category.name
                );
            }
            Ok(())
        })?,
    }
    Ok(())
}

fn run_list(global: &GlobalOpts) -> Result<()> {
    let session = open_session(global)?;
    let categories = session.store.list_categories().into_diagnostic()?;

    let mut rows = Vec::with_capacity(categories.len());
    for category in &categories {
        let path = session
            .store
            .category_pathstring(&category.id)
            .into_diagnostic()?;
        let projects = session
            .store
            .category_projects(&category.id)
            .into_diagnostic()?
            .len();
        rows.push(vec![
            category.id.to_string(),
            path,
            projects.to_string(),
            truncate_str(&category.description, 40),
        ]);
    }

    Listing {
        noun: "category",
        headers: &["ID", "PATH", "PROJECTS", "DESCRIPTION"],
        rows,
        items: &categories,
    }
    .print(session.format(global), global.quiet)
}

fn run_show(id: &str, global: &GlobalOpts) -> Result<()> {
    let session = open_session(global)?;
    let id = parse_id(id, EntityPrefix::Cat)?;
    let store = &session.store;

    let category = store.get_category(&id).into_diagnostic()?;
    let path = store.category_pathstring(&id).into_diagnostic()?;
    let children = store.children(&id).into_diagnostic()?;
    let projects = store.category_projects(&id).into_diagnostic()?;

    print_record(session.format(global), &category, || {
        println!("{}", style(&path).bold());
        println!("{}", style("─".repeat(40)).dim());
        println!("  ID:          {}", style(&category.id).cyan());
        if !category.description.is_empty() {
            println!("  Description: {}", category.description);
        }
        match &category.parent {
            Some(parent) => println!("  Parent:      {}", parent),
            None => println!("  Parent:      {}", style("(root)").dim()),
        }

        println!();
        println!("  {} ({})", style("Subcategories").bold(), children.len());
        for child in &children {
            println!("    {}  {}", style(&child.id).dim(), child.name);
        }

        println!();
        println!("  {} ({})", style("Projects").bold(), projects.len());
        for project in &projects {
            println!("    {}  {}", style(&project.id).dim(), project);
        }
        Ok(())
    })
}

fn run_tree(global: &GlobalOpts) -> Result<()> {
    let session = open_session(global)?;
    let nodes = session.store.category_tree().into_diagnostic()?;

    print_record(session.format(global), &nodes, || {
        if nodes.is_empty() {
            if !global.quiet {
                println!("{}", style("No categories yet").dim());
            }
            return Ok(());
        }
        for node in &nodes {
            let projects = session
                .store
                .category_projects(&node.category.id)
                .into_diagnostic()?
                .len();
            println!(
                "{}{} {} {}",
                "  ".repeat(node.depth),
                if node.depth == 0 { "■" } else { "└─" },
                node.category.name,
                style(format!("[{}] ({} projects)", node.category.id, projects)).dim()
            );
        }
        Ok(())
    })
}

fn run_edit(
    id: &str,
    name: Option<&str>,
    description: Option<&str>,
    global: &GlobalOpts,
) -> Result<()> {
    let mut session = open_session(global)?;
    let id = parse_id(id, EntityPrefix::Cat)?;
    let category = session
        .store
        .update_category(&id, name, description)
        .into_diagnostic()?;

    print_record(session.format(global), &category, || {
        if !global.quiet {
            println!(
                "{} Updated project category {} ({})",
                style("✓").green(),
                style(&category.id).cyan(),
                category.name
            );
        }
        Ok(())
    })
}

fn run_move(args: MoveArgs, global: &GlobalOpts) -> Result<()> {
    let mut session = open_session(global)?;
    let id = parse_id(&args.id, EntityPrefix::Cat)?;
    let parent = match (&args.parent, args.root) {
        (Some(parent), false) => Some(parse_id(parent, EntityPrefix::Cat)?),
        _ => None,
    };

    session
        .store
        .move_category(&id, parent.as_ref())
        .into_diagnostic()?;
    let path = session.store.category_pathstring(&id).into_diagnostic()?;

    if !global.quiet {
        println!(
            "{} Moved {} to {}",
            style("✓").green(),
            style(&id).cyan(),
            style(path).bold()
        );
    }
    Ok(())
}

fn run_delete(id: &str, yes: bool, global: &GlobalOpts) -> Result<()> {
    let mut session = open_session(global)?;
    let id = parse_id(id, EntityPrefix::Cat)?;

    let path = session.store.category_pathstring(&id).into_diagnostic()?;
    let below = session.store.descendants(&id).into_diagnostic()?.len();
    let prompt = format!(
        "Delete '{}', {} subcategories, and every project filed under them?",
        path, below
    );
    if !confirm(&prompt, yes)? {
        println!("{}", style("Aborted").yellow());
        return Ok(());
    }

    let report = session.store.delete_category(&id).into_diagnostic()?;
    print_record(session.format(global), &report, || {
        if global.quiet {
            return Ok(());
        }
        println!("{} Deleted project category {}", style("✓").green(), path);
        println!("  Categories:    {}", report.categories);
        println!("  Projects:      {}", report.projects);
        println!("  Project parts: {}", report.project_parts);
        println!("  Runs:          {}", report.runs);
        Ok(())
    })
}
