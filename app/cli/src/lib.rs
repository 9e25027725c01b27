//! # agri-qa-cli
//!
//! Terminal shell for the agricultural and climate Q&A engine. Answers a single
//! question passed on the command line, or reads questions from stdin until
//! `quit`.
//!
//! ## Configuration
//!
//! - `--config <path>` or `~/.config/agri-qa/config.json` - engine settings
//! - `--dataset <path>` or `AGRI_QA_DATASET` - JSON dataset instead of the built-in one
//! - `RUST_LOG` - log filter (default: `warn`)

use std::io::{BufRead, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use agri_qa::query::{format, sample_questions};
use agri_qa::{AnswerResult, EngineConfig, QaEngine};

const EXIT_WORDS: &[&str] = &["quit", "exit", "q"];

/// Ask questions about Indian crop production and rainfall statistics.
#[derive(Debug, Parser)]
#[command(name = "agri-qa")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Question to answer. Starts an interactive session when omitted.
    pub question: Vec<String>,

    /// JSON dataset to load instead of the built-in reference statistics.
    #[arg(long)]
    pub dataset: Option<PathBuf>,

    /// Engine config file (JSON).
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Output format.
    #[arg(long, default_value = "text")]
    pub format: OutputFormat,

    /// Print example questions and exit.
    #[arg(long)]
    pub samples: bool,
}

impl Cli {
    /// The question words joined back into one string, if any were given.
    pub fn question_text(&self) -> Option<String> {
        let text = self.question.join(" ");
        let text = text.trim();
        (!text.is_empty()).then(|| text.to_string())
    }

    /// Resolve engine settings: explicit config file, then the per-user file, then defaults.
    /// `--dataset` overrides whatever the config names.
    pub fn engine_config(&self) -> Result<EngineConfig> {
        let mut config = match &self.config {
            Some(path) => EngineConfig::from_file(path)
                .map_err(anyhow::Error::msg)
                .with_context(|| format!("Failed to load config {}", path.display()))?,
            None => match EngineConfig::default_path().filter(|p| p.exists()) {
                Some(path) => {
                    tracing::debug!(path = %path.display(), "Using per-user config");
                    EngineConfig::from_file(&path)
                        .map_err(anyhow::Error::msg)
                        .with_context(|| format!("Failed to load config {}", path.display()))?
                }
                None => EngineConfig::default(),
            },
        };
        if let Some(dataset) = &self.dataset {
            config.dataset_path = Some(dataset.clone());
        }
        Ok(config)
    }
}

/// Output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Heading, summary, table and sources.
    #[default]
    Text,
    /// The answer structure as JSON.
    Json,
}

pub fn render(result: &AnswerResult, output: OutputFormat) -> Result<String> {
    match output {
        OutputFormat::Text => Ok(format(result)),
        OutputFormat::Json => {
            serde_json::to_string_pretty(result).context("Failed to serialize answer")
        }
    }
}

pub fn render_samples() -> String {
    let mut out = String::from("Sample questions:\n");
    for (i, question) in sample_questions().iter().enumerate() {
        out.push_str(&format!("  {}. {}\n", i + 1, question));
    }
    out
}

/// Answer one question per input line until an exit word or end of input.
pub fn run_session<R: BufRead, W: Write>(
    engine: &QaEngine,
    output: OutputFormat,
    input: R,
    mut out: W,
) -> Result<()> {
    writeln!(out, "Agricultural & Climate Data Q&A")?;
    writeln!(out, "Data sources: data.gov.in (Ministry of Agriculture & IMD)")?;
    writeln!(out)?;
    write!(out, "{}", render_samples())?;

    let mut lines = input.lines();
    loop {
        write!(out, "\nYour question (or 'quit' to exit): ")?;
        out.flush()?;

        let Some(line) = lines.next() else {
            writeln!(out)?;
            break;
        };
        let question = line.context("Failed to read question")?;
        let question = question.trim();

        if EXIT_WORDS.contains(&question.to_lowercase().as_str()) {
            writeln!(out, "Goodbye.")?;
            break;
        }
        if question.is_empty() {
            continue;
        }

        let result = engine.answer(question);
        writeln!(out)?;
        write!(out, "{}", render(&result, output)?)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_flags() {
        let cli = Cli::parse_from([
            "agri-qa",
            "--dataset",
            "/tmp/data.json",
            "--format",
            "json",
            "Top",
            "3",
            "crops",
            "in",
            "Punjab",
        ]);
        assert_eq!(cli.question_text().as_deref(), Some("Top 3 crops in Punjab"));
        assert_eq!(cli.format, OutputFormat::Json);

        let config = cli.engine_config().unwrap();
        assert_eq!(config.dataset_path, Some(PathBuf::from("/tmp/data.json")));
    }

    #[test]
    fn test_no_question_means_session() {
        let cli = Cli::parse_from(["agri-qa"]);
        assert_eq!(cli.question_text(), None);
        assert!(!cli.samples);
    }

    #[test]
    fn test_missing_config_file_is_error() {
        let cli = Cli::parse_from(["agri-qa", "--config", "/nonexistent/agri-qa.json"]);
        let err = cli.engine_config().unwrap_err();
        assert!(err.to_string().contains("Failed to load config /nonexistent/agri-qa.json"));
    }

    #[test]
    fn test_json_render() {
        let engine = QaEngine::with_reference_data().unwrap();
        let json = render(&engine.answer("asdkjasd random text"), OutputFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["outcome"]["kind"], "not_understood");
    }

    #[test]
    fn test_session_answers_until_quit() {
        let engine = QaEngine::with_reference_data().unwrap();
        let input = "Top 3 crops in Maharashtra by production\n\nQUIT\nnever asked\n";
        let mut out = Vec::new();
        run_session(&engine, OutputFormat::Text, input.as_bytes(), &mut out).unwrap();

        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("Sample questions:"));
        assert!(text.contains("=== Top Crops by Production ==="));
        assert!(text.contains("Goodbye."));
        assert!(!text.contains("never asked"));
    }

    #[test]
    fn test_session_ends_at_eof() {
        let engine = QaEngine::with_reference_data().unwrap();
        let mut out = Vec::new();
        run_session(&engine, OutputFormat::Text, "".as_bytes(), &mut out).unwrap();
        assert!(!String::from_utf8(out).unwrap().contains("Goodbye."));
    }
}
