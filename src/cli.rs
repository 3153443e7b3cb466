use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "lifecoach")]
#[command(about = "YouTube-driven lifestyle coaching reports")]
#[command(version = "0.1.0")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Force CLI mode (skip TUI)
    #[arg(long)]
    pub cli: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Analyse video URLs and produce a coaching report
    Coach {
        /// Video URLs
        urls: Vec<String>,

        /// Read newline-separated URLs from a file
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Produce a structured daily plan instead of a narrative report
        #[arg(long)]
        plan: bool,

        /// Also export the routine as an .ics calendar (implies --plan)
        #[arg(long)]
        calendar: bool,

        /// Generation model
        #[arg(short, long, default_value = "gpt-4.1-mini")]
        model: String,

        /// API credential; falls back to the backend's own environment key
        #[arg(long, env = "LIFECOACH_API_KEY", hide_env_values = true)]
        api_key: Option<String>,

        /// Override the generation backend base URL
        #[arg(long)]
        api_base: Option<String>,
    },

    /// Export a saved structured plan as an .ics calendar
    Export {
        /// Path to a plan JSON produced by `coach --plan`
        plan: PathBuf,
    },

    /// List saved reports, plans and calendars
    List,

    /// Open TUI interface
    Tui,
}
