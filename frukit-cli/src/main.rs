mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "frukit")]
#[command(about = "Frukit - Generate and inspect IPMI FRU information images", long_about = None)]
#[command(version)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a FRU binary image from a JSON description
    Generate {
        /// Input JSON file describing the areas
        #[arg(short, long)]
        input: String,

        /// Output file for the FRU image
        #[arg(short, long)]
        output: String,

        /// Disable BCD-plus / 6-bit ASCII detection (text and binary only)
        #[arg(long)]
        no_autodetect: bool,
    },

    /// Inspect a FRU binary image
    Inspect {
        /// Input FRU image to inspect
        #[arg(short, long)]
        input: String,

        /// Optional JSON export of the decoded areas
        #[arg(long)]
        json: Option<String>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();

    // Execute command
    match cli.command {
        Commands::Generate {
            input,
            output,
            no_autodetect,
        } => commands::generate::execute(&input, &output, no_autodetect),

        Commands::Inspect { input, json } => commands::inspect::execute(&input, json.as_deref()),
    }
}
