//!

use clap::Parser;
use tracing_subscriber::prelude::*;

mod demo;
mod report;

#[derive(Debug, clap::Parser)]
struct Args {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, clap::Subcommand)]
enum Commands {
    Report(self::report::Report),
    Demo(self::demo::Demo),
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer().without_time())
        .init();

    match args.command {
        Commands::Report(cmd) => cmd.run(),
        Commands::Demo(cmd) => cmd.run(),
    }
}
