use clap::Parser;
use itree::cli::commands::{
    category, completions, init, part, project, run, setting, status, version,
};
use itree::cli::helpers::find_workspace;
use itree::cli::{Cli, Commands, GlobalOpts};
use itree::core::Config;
use miette::Result;

/// Filter precedence: RUST_LOG, then --verbose, then the configured filter.
fn init_tracing(global: &GlobalOpts) {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let configured = || {
        let workspace = find_workspace(global).ok();
        Config::load_for(workspace.as_ref()).log_filter
    };
    let directive = std::env::var("RUST_LOG")
        .ok()
        .filter(|s| !s.trim().is_empty())
        .or_else(|| global.verbose.then(|| "itree=debug".to_string()))
        .or_else(configured)
        .unwrap_or_else(|| "itree=warn".to_string());

    let _ = tracing_subscriber::registry()
        .with(EnvFilter::new(directive))
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .try_init();
}

fn main() -> Result<()> {
    // Piping into `head` must end the process quietly, not panic on EPIPE.
    #[cfg(unix)]
    {
        unsafe {
            libc::signal(libc::SIGPIPE, libc::SIG_DFL);
        }
    }
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(2)
                .tab_width(4)
                .build(),
        )
    }))?;

    let cli = Cli::parse();
    let global = cli.global;
    init_tracing(&global);

    match cli.command {
        Commands::Init(args) => init::run(args),
        Commands::Version(args) => version::run(args, &global),
        Commands::Category(cmd) => category::run(cmd, &global),
        Commands::Part(cmd) => part::run(cmd, &global),
        Commands::Project(cmd) => project::run(cmd, &global),
        Commands::Run(cmd) => run::run(cmd, &global),
        Commands::Setting(cmd) => setting::run(cmd, &global),
        Commands::Status(args) => status::run(args, &global),
        Commands::Completions(args) => completions::run(args),
    }
}
