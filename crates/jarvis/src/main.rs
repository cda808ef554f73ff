mod cli;
mod commands;

use clap::Parser;
use cli::{Cli, Commands};

fn main() -> anyhow::Result<()> {
    // Initialize tracing (stderr, so command output stays machine-readable)
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Record {
            item,
            category,
            action,
            at,
        } => commands::record::run(&item, &category, action, at),
        Commands::Recompute => commands::recompute::run(),
        Commands::Recommend { limit, source } => commands::recommend::run(limit, source),
        Commands::Ingest { source, file } => commands::ingest::run(source, file.as_deref()),
        Commands::Status => commands::status::run(),
        Commands::Insights { top } => commands::insights::run(top),
        Commands::History {
            stats,
            limit,
            category,
            hours,
        } => commands::history::run(stats, limit, category, hours),
        Commands::Prune => commands::prune::run(),
        Commands::Reset => commands::reset::run(),
        Commands::Run { drop_dir } => commands::run::run(drop_dir.as_deref()),
        Commands::Version => commands::version::run(),
    }
}
