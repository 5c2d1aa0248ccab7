use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono::Utc;
use clap::{Parser, Subcommand};

mod api;
mod config;
mod engine;
mod error;
mod grading;
mod models;
mod report;
mod state;
mod storage;
mod table;
mod telemetry;
mod topics;

#[cfg(test)]
mod test_support;

use crate::config::Settings;
use crate::engine::GradeEngine;
use crate::state::AppState;
use crate::storage::UploadStore;
use crate::table::RawTable;
use crate::topics::TopicMap;

#[derive(Parser)]
#[command(name = "grade-advisor")]
#[command(about = "Grade evaluation and study planning for uploaded score sheets", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the grade advisor HTTP API
    Serve,
    /// Evaluate a score sheet and print grades with a course of action
    Evaluate {
        #[arg(long)]
        file: PathBuf,
        /// Study topics sheet (defaults to STUDY_TOPICS_PATH)
        #[arg(long)]
        topics: Option<PathBuf>,
    },
    /// Generate a markdown report for a score sheet
    Report {
        #[arg(long)]
        file: PathBuf,
        #[arg(long)]
        topics: Option<PathBuf>,
        #[arg(long, default_value = "report.md")]
        out: PathBuf,
    },
    /// Print the GPA band for a percentage
    Gpa { percentage: f64 },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    let settings = Settings::load().context("invalid configuration")?;
    telemetry::init_tracing(&settings)?;

    match cli.command {
        Commands::Serve => serve(settings).await?,
        Commands::Evaluate { file, topics } => {
            let engine = GradeEngine::new(load_topics(topics.as_deref(), &settings));
            load_sheet(&engine, &file)?;

            let snapshot = engine.snapshot();
            println!("Grades:");
            for record in snapshot.records.iter() {
                println!(
                    "- {} ({}) {:.2}% GPA {:.2}, target {}, weight {}",
                    record.student_name,
                    record.course,
                    record.current_grade,
                    record.gpa,
                    record.target_grade,
                    record.course_weight
                );
            }

            println!();
            println!("Course of action:");
            for message in engine.recommendation_messages() {
                println!("- {message}");
            }
        }
        Commands::Report { file, topics, out } => {
            let engine = GradeEngine::new(load_topics(topics.as_deref(), &settings));
            load_sheet(&engine, &file)?;

            let report = report::build_report(&engine, Utc::now());
            std::fs::write(&out, report)
                .with_context(|| format!("failed to write {}", out.display()))?;
            println!("Report written to {}.", out.display());
        }
        Commands::Gpa { percentage } => {
            println!("{:.2}", grading::gpa_for(percentage));
        }
    }

    Ok(())
}

async fn serve(settings: Settings) -> anyhow::Result<()> {
    let topics = TopicMap::load(&settings.topics_path);
    if topics.is_empty() {
        tracing::warn!("no study topics loaded; every course falls back to general review");
    }

    let uploads = UploadStore::new(&settings.upload_dir)?;
    let addr = settings.server_addr()?;
    tracing::info!(dir = %uploads.dir().display(), "retaining uploads");

    let state = AppState::new(settings, GradeEngine::new(topics), uploads);
    let app = api::router::router(state);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    tracing::info!(%addr, "grade advisor listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

/// Resolves on Ctrl+C, or SIGTERM on unix. A handler that fails to install is
/// logged and never fires.
async fn shutdown_signal() {
    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(err) => {
                tracing::warn!(error = %err, "SIGTERM handler unavailable");
                std::future::pending::<()>().await;
            }
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    let received = tokio::select! {
        Ok(()) = tokio::signal::ctrl_c() => "ctrl_c",
        () = terminate => "sigterm",
    };
    tracing::info!(signal = received, "stopping grade advisor");
}

fn load_topics(path: Option<&Path>, settings: &Settings) -> TopicMap {
    TopicMap::load(path.unwrap_or(settings.topics_path.as_path()))
}

fn load_sheet(engine: &GradeEngine, file: &Path) -> anyhow::Result<()> {
    let table = RawTable::from_path(file)
        .with_context(|| format!("failed to read {}", file.display()))?;
    let outcome = engine::evaluate_table(&table).context("score sheet rejected")?;

    for failure in outcome.failures.iter() {
        eprintln!("Skipped row {}: {}", failure.row_number, failure.error);
    }

    let source = file.display().to_string();
    let summary = engine
        .install(outcome, Some(source.as_str()))
        .context("score sheet has no valid rows")?;
    println!(
        "Loaded {} records ({} skipped) from {}.",
        summary.accepted,
        summary.skipped,
        file.display()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn shutdown_waits_for_a_signal() {
        let idle = async {
            for _ in 0..32 {
                tokio::task::yield_now().await;
            }
        };
        tokio::select! {
            biased;
            _ = shutdown_signal() => panic!("shutdown fired without a signal"),
            _ = idle => {}
        }
    }
}
