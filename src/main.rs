//! Site Backup Tool
//!
//! Periodically dumps the database and archives uploaded media, mailing the
//! administrator a summary of each run.

// backuptool/src/main.rs
mod backup;
mod config;
mod errors;
mod notify;
mod utils;

use anyhow::{Context, Result};
use backup::RunOutcome;
use config::BackupConfig;
use std::env;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

/// Main entry point for the backup tool
#[tokio::main]
async fn main() -> ExitCode {
    dotenv::dotenv().ok();
    match run_app().await {
        Ok(_) => {
            println!("✅ Operation completed successfully.");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("❌ Error: {:?}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run_app() -> Result<()> {
    // Expects config.json next to the executable or in the project root when
    // running with `cargo run`.
    let config_path = PathBuf::from("config.json");
    let app_config = BackupConfig::load_from_json(&config_path).context(format!(
        "Failed to load application configuration from {}",
        config_path.display()
    ))?;

    let args: Vec<String> = env::args().collect();
    let choice = if args.len() > 1 {
        args[1].trim().to_string()
    } else {
        prompt_choice()?
    };

    match choice.as_str() {
        "1" | "run" => {
            println!("🚀 Starting manual backup run...");
            let outcome = backup::run_backup_flow(app_config).context("Backup run failed")?;
            report_outcome(outcome);
        }
        "2" | "schedule" => {
            println!(
                "⏰ Entering schedule mode (every {} hours)...",
                app_config.schedule_interval_hours
            );
            run_on_schedule(app_config).await?;
        }
        _ => {
            println!("❌ Invalid choice. Please enter '1' (run) or '2' (schedule).");
            anyhow::bail!("Invalid operation choice");
        }
    }
    Ok(())
}

/// Recurring-trigger adapter: fires the job immediately and then on every
/// interval tick. A failed run is reported and the loop keeps going; the
/// schedule must survive any single bad day.
async fn run_on_schedule(app_config: BackupConfig) -> Result<()> {
    let period = Duration::from_secs(app_config.schedule_interval_hours.max(1) * 3600);
    let mut interval = tokio::time::interval(period);

    loop {
        interval.tick().await;
        println!("⏰ Scheduled backup trigger fired.");
        match backup::run_backup_flow(app_config.clone()) {
            Ok(outcome) => report_outcome(outcome),
            Err(e) => eprintln!("❌ Scheduled backup run failed: {:?}", e),
        }
    }
}

fn report_outcome(outcome: RunOutcome) {
    match outcome {
        RunOutcome::Completed => println!("🎉 Backup run completed."),
        RunOutcome::Aborted => println!("⚠️ Backup run aborted. Check the backup log for details."),
    }
}

/// Prompts user to select an operation
///
/// Returns the user's choice as String
fn prompt_choice() -> Result<String> {
    use std::io::{Write, stdin, stdout};

    println!("Select an operation:");
    println!("1. Run Backup Now (or type 'run')");
    println!("2. Run On Schedule (or type 'schedule')");
    print!("Enter your choice: ");
    stdout().flush().context("Failed to flush stdout")?;

    let mut input = String::new();
    stdin()
        .read_line(&mut input)
        .context("Failed to read user input")?;
    Ok(input.trim().to_string())
}
