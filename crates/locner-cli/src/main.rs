//! locner CLI - Command-line interface
//!
//! Usage:
//!   locner analyze <text>
//!   locner interactive
//!   locner lexicon

use std::io::Write;
use std::path::PathBuf;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use locner_core::{AppConfig, Finding};
use locner_extractor::LocationNer;
use tokio::io::{AsyncBufReadExt, BufReader};

#[derive(Parser)]
#[command(name = "locner")]
#[command(about = "Location named-entity recognition")]
#[command(version)]
struct Cli {
    #[command(flatten)]
    overrides: Overrides,

    #[command(subcommand)]
    command: Commands,
}

/// Settings that take precedence over the config file and environment
#[derive(Args, Debug, Default)]
struct Overrides {
    /// TOML configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Gazetteer file (JSON array or one name per line)
    #[arg(long, global = true)]
    gazetteer: Option<PathBuf>,

    /// Type vocabulary file
    #[arg(long, global = true)]
    types: Option<PathBuf>,

    /// Token-classification model endpoint
    #[arg(long, global = true)]
    model_endpoint: Option<String>,

    /// Ignore case when matching lexicon entries
    #[arg(long, global = true)]
    case_insensitive: bool,

    /// Only match lexicon entries as whole words
    #[arg(long, global = true)]
    whole_word: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze a single text
    Analyze {
        /// Text to analyze
        text: String,
        /// Print findings as JSON
        #[arg(long)]
        json: bool,
    },
    /// Prompt for texts until 'quit'
    Interactive,
    /// Show loaded lexicon sizes
    Lexicon,
}

impl Overrides {
    fn load_config(&self) -> anyhow::Result<AppConfig> {
        let mut config = match &self.config {
            Some(path) => AppConfig::from_file(path)?.with_env_override()?,
            None => AppConfig::from_env()?,
        };
        self.apply(&mut config);
        Ok(config)
    }

    fn apply(&self, config: &mut AppConfig) {
        if let Some(path) = &self.gazetteer {
            config.lexicon.gazetteer_path = path.clone();
        }
        if let Some(path) = &self.types {
            config.lexicon.types_path = path.clone();
        }
        if let Some(endpoint) = &self.model_endpoint {
            config.model.endpoint = Some(endpoint.clone());
        }
        if self.case_insensitive {
            config.lexicon.case_insensitive = true;
        }
        if self.whole_word {
            config.lexicon.whole_word = true;
        }
    }
}

/// Numbered, one finding per line
fn format_findings(findings: &[Finding]) -> String {
    if findings.is_empty() {
        return "No locations or types found in the text.".to_string();
    }

    let mut out = String::from("Found entities:\n");
    for (i, finding) in findings.iter().enumerate() {
        let score = finding
            .score
            .map(|score| format!(", Score: {score:.2}"))
            .unwrap_or_default();
        out.push_str(&format!(
            "{}. {} - Type: {} (Source: {}{})\n",
            i + 1,
            finding.text,
            finding.entity_type,
            finding.source,
            score
        ));
    }
    out
}

async fn interactive(ner: &LocationNer) -> anyhow::Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        print!("\nEnter text to analyze (or 'quit' to exit): ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        if line.trim().eq_ignore_ascii_case("quit") {
            break;
        }

        println!("\nAnalyzing text: {}", line);
        match ner.extract(&line).await {
            Ok(findings) => println!("\n{}", format_findings(&findings)),
            Err(e) => eprintln!("Error: {e}"),
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .init();

    let cli = Cli::parse();
    let config = cli.overrides.load_config()?;
    let ner = LocationNer::from_config(&config).context("Failed to load NER system")?;

    match cli.command {
        Commands::Analyze { text, json } => {
            let findings = ner.extract(&text).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&findings)?);
            } else {
                print!("{}", format_findings(&findings));
            }
        }
        Commands::Interactive => interactive(&ner).await?,
        Commands::Lexicon => {
            println!(
                "Gazetteer: {} entries ({})",
                ner.gazetteer().len(),
                config.lexicon.gazetteer_path.display()
            );
            println!(
                "Type vocabulary: {} entries ({})",
                ner.types().len(),
                config.lexicon.types_path.display()
            );
            println!("Model: {}", ner.labeler_name());
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use locner_core::{EntityType, Source};

    #[test]
    fn test_format_findings() {
        let findings = vec![
            Finding {
                text: "Kathmandu".to_string(),
                start: 10,
                end: 19,
                entity_type: EntityType::Loc,
                source: Source::ExactMatch,
                score: None,
            },
            Finding {
                text: "hotel".to_string(),
                start: 49,
                end: 54,
                entity_type: EntityType::Type,
                source: Source::TypeMatch,
                score: None,
            },
            Finding {
                text: "Sarangkot".to_string(),
                start: 70,
                end: 79,
                entity_type: EntityType::Model("GPE".to_string()),
                source: Source::Model,
                score: Some(0.87),
            },
        ];

        let out = format_findings(&findings);
        assert!(out.contains("1. Kathmandu - Type: LOC (Source: exact_match)"));
        assert!(out.contains("2. hotel - Type: TYPE (Source: type_match)\n"));
        assert!(out.contains("3. Sarangkot - Type: GPE (Source: model, Score: 0.87)"));
    }

    #[test]
    fn test_format_no_findings() {
        assert_eq!(format_findings(&[]), "No locations or types found in the text.");
    }

    #[test]
    fn test_parse_global_overrides() {
        let cli = Cli::try_parse_from([
            "locner",
            "analyze",
            "Kathmandu",
            "--json",
            "--gazetteer",
            "places.txt",
            "--case-insensitive",
        ])
        .unwrap();

        assert!(matches!(cli.command, Commands::Analyze { json: true, .. }));

        let mut config = AppConfig::default();
        cli.overrides.apply(&mut config);
        assert_eq!(config.lexicon.gazetteer_path, PathBuf::from("places.txt"));
        assert!(config.lexicon.case_insensitive);
        assert!(!config.lexicon.whole_word);
    }
}
