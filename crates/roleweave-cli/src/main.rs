//! Roleweave command-line driver
//!
//! Runs a binding session over parsed compilation units and reports the
//! problems found, and converts type descriptors between their binary and
//! JSON forms.
//!
//! Exit status: 0 when no error was reported, 1 when the checked units have
//! errors, 2 when the driver itself failed.

mod commands;
mod logging;
mod output;
mod provider;

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(name = "roleweave")]
#[command(about = "Binding resolution for team/role programs", long_about = None)]
#[command(version)]
struct Cli {
    /// Colored output: auto, always or never
    #[arg(long, global = true)]
    color: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

/// How `check` prints problems
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Format {
    /// Annotated terminal output
    Pretty,
    /// A JSON array on stdout
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve the bindings of a set of units and report problems
    Check {
        /// JSON file holding an array of compilation units
        #[arg(short, long)]
        units: PathBuf,
        /// Directory of compiled descriptors (`p/q/T.rwtd`)
        #[arg(short, long)]
        descriptors: Option<PathBuf>,
        /// Binder configuration (defaults to ./roleweave.toml when present)
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Output format
        #[arg(short, long, value_enum, default_value = "pretty")]
        format: Format,
    },

    /// Print a compiled descriptor as JSON
    Describe {
        /// Descriptor file
        file: PathBuf,
    },

    /// Encode a JSON descriptor into its binary form
    Encode {
        /// JSON descriptor
        file: PathBuf,
        /// Output file
        #[arg(short, long)]
        output: PathBuf,
    },
}

fn main() {
    let cli = Cli::parse();
    logging::init();
    let color = output::resolve_color_choice(cli.color.as_deref());

    let result = match cli.command {
        Commands::Check {
            units,
            descriptors,
            config,
            format,
        } => commands::check::execute(commands::check::CheckOptions {
            units,
            descriptors,
            config,
            format,
            color,
        }),
        Commands::Describe { file } => commands::describe::execute(&file).map(|()| 0),
        Commands::Encode { file, output } => commands::encode::execute(&file, &output).map(|()| 0),
    };

    match result {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(2);
        }
    }
}
