mod cli;
mod core;
mod error;
mod tui;

use crate::cli::{Cli, Commands};
use crate::core::{
    BatchEvent, CoachingOutput, CoachingPlan, CoachingSession, GeneratorConfig, ReportMode,
    ReportService, SessionEvent, StorageService, TranscriptResolver, export_routine,
    format_plan_readable, split_urls,
};
use crate::error::{Error, Result};
use crate::tui::{App, EventHandler, init as tui_init, restore as tui_restore, ui};
use chrono::Local;
use clap::Parser;
use std::path::PathBuf;
use tokio::sync::mpsc;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Coach {
            urls,
            input,
            plan,
            calendar,
            model,
            api_key,
            api_base,
        }) => {
            init_tracing();
            run_cli_coach(urls, input, plan, calendar, model, api_key, api_base).await?;
        }
        Some(Commands::Export { plan }) => {
            init_tracing();
            run_cli_export(plan).await?;
        }
        Some(Commands::List) => {
            run_cli_list()?;
        }
        Some(Commands::Tui) | None => {
            if cli.cli {
                println!("Use 'lifecoach --help' for available commands");
            } else {
                run_tui().await?;
            }
        }
    }

    Ok(())
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("lifecoach=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[allow(clippy::too_many_arguments)]
async fn run_cli_coach(
    mut urls: Vec<String>,
    input: Option<PathBuf>,
    plan: bool,
    calendar: bool,
    model: String,
    api_key: Option<String>,
    api_base: Option<String>,
) -> Result<()> {
    if let Some(path) = input {
        let content = tokio::fs::read_to_string(&path).await?;
        urls.extend(split_urls(&content));
    }
    if urls.is_empty() {
        return Err(Error::custom(
            "no video URLs given; pass them as arguments or via --input",
        ));
    }

    let mode = if plan || calendar {
        ReportMode::Structured
    } else {
        ReportMode::Narrative
    };

    let resolver = TranscriptResolver::new()?;
    let generator = ReportService::new(GeneratorConfig {
        api_key,
        api_base,
        model,
    });
    let session = CoachingSession::new(resolver, generator);

    let outcome = session
        .run(&urls, mode, |event| match event {
            SessionEvent::Batch(BatchEvent::Started { index, total, url }) => {
                println!("[{index}/{total}] {url}");
            }
            SessionEvent::Batch(BatchEvent::Resolved {
                video_id,
                language_code,
                tier,
                ..
            }) => {
                println!("  resolved {video_id} ({language_code}, {} captions)", tier.label());
            }
            SessionEvent::Batch(BatchEvent::Skipped { url, reason, .. }) => {
                println!("  skipped {url}: {}", reason.describe());
            }
            SessionEvent::Generating { resolved_count } => {
                println!("Generating coaching output from {resolved_count} transcript(s)...");
            }
        })
        .await?;

    match &outcome.output {
        CoachingOutput::Narrative(text) => {
            println!();
            print_wrapped(text);
            let path = StorageService::save_report(text).await?;
            println!("\nReport saved to: {}", path.display());
        }
        CoachingOutput::Plan(coaching_plan) => {
            println!();
            print_wrapped(&format_plan_readable(coaching_plan));
            let path = StorageService::save_plan(coaching_plan).await?;
            println!("Plan saved to: {}", path.display());

            if calendar {
                let ics = export_routine(&coaching_plan.routine, Local::now());
                let path = StorageService::save_calendar(&ics).await?;
                println!("Calendar saved to: {}", path.display());
            }
        }
    }

    Ok(())
}

async fn run_cli_export(plan_path: PathBuf) -> Result<()> {
    let content = tokio::fs::read_to_string(&plan_path).await?;
    let plan: CoachingPlan = serde_json::from_str(&content)?;

    let ics = export_routine(&plan.routine, Local::now());
    let path = StorageService::save_calendar(&ics).await?;
    println!("Calendar saved to: {}", path.display());

    Ok(())
}

fn run_cli_list() -> Result<()> {
    let files = StorageService::list_files()?;

    if files.is_empty() {
        println!("No files found.");
        return Ok(());
    }

    println!("Found {} files:", files.len());
    println!();

    for file in files {
        let size_kb = file.size / 1024;
        let size_str = if size_kb < 1024 {
            format!("{size_kb}KB")
        } else {
            format!("{:.1}MB", size_kb as f64 / 1024.0)
        };

        println!("{:<10} {:<32} {}", file.file_type.label(), file.name, size_str);
    }

    Ok(())
}

fn print_wrapped(text: &str) {
    for line in text.lines() {
        if line.is_empty() {
            println!();
            continue;
        }
        for wrapped in textwrap::wrap(line, 100) {
            println!("{wrapped}");
        }
    }
}

async fn run_tui() -> Result<()> {
    // Initialize terminal
    let mut terminal = tui_init()?;

    // Create app
    let mut app = App::new();
    let event_handler = EventHandler::new();

    // Setup async communication channel for background tasks
    let (tx, rx) = mpsc::unbounded_channel();
    app.session_tx = Some(tx.clone());
    app.session_rx = Some(rx);

    // Main event loop
    loop {
        // Handle events
        let event = event_handler.next_event()?;
        app.handle_event(event)?;

        // Draw UI
        terminal.draw(|f| {
            ui::draw(f, &mut app);
        })?;

        // Check if we should quit
        if app.should_quit {
            break;
        }
    }

    // Restore terminal
    tui_restore()?;
    Ok(())
}
