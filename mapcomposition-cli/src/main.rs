//! MapComposition CLI - command-line interface.
//!
//! Runs the HTTP front-end (`serve`), executes one-shot compositions
//! (`compose`), and manages the configuration file (`config`).

mod commands;
mod error;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "mapcomposition",
    version = mapcomposition::VERSION,
    about = "On-the-fly project composition for geospatial servers"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP front-end
    Serve(commands::serve::ServeArgs),

    /// Compose a project once, without the HTTP front-end
    Compose(commands::compose::ComposeArgs),

    /// View and modify configuration settings
    Config {
        #[command(subcommand)]
        command: commands::config::ConfigCommands,
    },
}

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Serve(args) => commands::serve::run(args),
        Commands::Compose(args) => commands::compose::run(args),
        Commands::Config { command } => commands::config::run(command),
    };

    if let Err(e) = result {
        eprintln!("{} {}", console::style("error:").red().bold(), e);
        std::process::exit(1);
    }
}
