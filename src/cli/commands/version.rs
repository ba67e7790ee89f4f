//! `itree version` command - Version and build information

use console::style;
use miette::{IntoDiagnostic, Result};
use tracing::debug;

use crate::cli::helpers::open_session;
use crate::cli::table::print_record;
use crate::cli::GlobalOpts;
use crate::core::{BuildInfo, Git};

#[derive(clap::Args, Debug)]
pub struct VersionArgs {}

pub fn run(_args: VersionArgs, global: &GlobalOpts) -> Result<()> {
    // Works outside a workspace too, just without an instance name.
    let session = match open_session(global) {
        Ok(session) => Some(session),
        Err(e) => {
            debug!("no workspace for version info: {}", e);
            None
        }
    };

    let repo_root = match &session {
        Some(session) => session.workspace.root().to_path_buf(),
        None => std::env::current_dir().into_diagnostic()?,
    };
    let git = Git::new(&repo_root);
    let git = if git.is_repo() && git.has_commits() {
        Some(&git)
    } else {
        debug!("{} is not a git checkout with commits", repo_root.display());
        None
    };
    let info = BuildInfo::collect(git, session.as_ref().map(|s| &s.store)).into_diagnostic()?;

    let format = match &session {
        Some(session) => session.format(global),
        None => global.format,
    };

    print_record(format, &info, || {
        println!("{} {}", style("itree").bold(), info.version);
        println!("  API version:    {}", info.api_version);
        println!("  Version number: {}", info.version_int);
        println!("  SQLite:         {}", info.framework_version);
        println!(
            "  Commit:         {}",
            info.commit_hash.as_deref().unwrap_or("-")
        );
        println!(
            "  Commit date:    {}",
            info.commit_date.as_deref().unwrap_or("-")
        );
        if !info.instance_name.is_empty() {
            println!("  Instance:       {}", info.instance_name);
        }
        Ok(())
    })
}
