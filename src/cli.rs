use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "voyage", version, about = "AI travel planner backed by a crew of LLM agents")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// Options shared by every subcommand.
#[derive(Args, Debug, Default, Clone)]
pub struct CommonArgs {
    /// Model name (e.g., "gpt-4o", "ollama::llama3.2")
    #[arg(short, long)]
    pub model: Option<String>,

    /// Directory the markdown reports are written to
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// Path to config file (overrides ./voyage.toml)
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Serve the trip planning form in the browser
    Serve {
        #[command(flatten)]
        common: CommonArgs,

        /// Address to bind
        #[arg(long)]
        bind: Option<String>,

        /// Port to listen on
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Plan a single trip without the browser form and print the itinerary
    Plan {
        #[command(flatten)]
        common: CommonArgs,

        /// City or country you travel from
        #[arg(long = "from")]
        origin: String,

        /// Destination city
        #[arg(long = "to")]
        destination: String,

        /// Departure date, free text (e.g., "1st March 2025")
        #[arg(long = "depart")]
        departure_date: String,

        /// Return date, free text
        #[arg(long = "return")]
        return_date: String,

        /// What you want to do there
        #[arg(long)]
        interests: String,
    },
}

impl Commands {
    pub fn common(&self) -> &CommonArgs {
        match self {
            Commands::Serve { common, .. } | Commands::Plan { common, .. } => common,
        }
    }
}
