//! Entry point for the `agri-qa` binary.

use std::io::{self, Write};

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use agri_qa::QaEngine;
use agri_qa_cli::{render, render_samples, run_session, Cli};

fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_target(false).with_writer(io::stderr))
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();

    if cli.samples {
        print!("{}", render_samples());
        return Ok(());
    }

    let engine = QaEngine::from_config(cli.engine_config()?)?;

    match cli.question_text() {
        Some(question) => {
            let result = engine.answer(&question);
            let mut stdout = io::stdout().lock();
            write!(stdout, "{}", render(&result, cli.format)?)?;
            stdout.flush()?;
        }
        None => run_session(&engine, cli.format, io::stdin().lock(), io::stdout().lock())?,
    }
    Ok(())
}
