//! Command-line argument parsing for stylerag
//!
//! Provides clap-based CLI with subcommands and verbosity control.

use clap::{Args as ClapArgs, Parser, Subcommand};
use std::path::PathBuf;

use crate::corpus::QueryFilters;
use crate::rag::retrieval::{RetrievalMode, RetrievalRequest};

/// stylerag - Retrieve UX style-guide lines for consistent drafting
#[derive(Parser, Debug)]
#[command(name = "stylerag")]
#[command(version)]
#[command(about = "Hybrid lexical/vector retrieval of UX style-guide lines", long_about = None)]
pub struct Args {
    /// Configuration file path (defaults to ~/.stylerag/config.toml)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Verbosity level: -q (errors only), default (warnings), -v (info), -vv (debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Subcommand
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Rank style-guide lines for a query and print the result as JSON
    Retrieve(RetrieveArgs),

    /// Display the effective configuration
    Config,
}

/// Arguments of `stylerag retrieve`
#[derive(ClapArgs, Debug, Clone)]
pub struct RetrieveArgs {
    /// Style-guide corpus, one JSON object per line
    #[arg(long, value_name = "JSONL")]
    pub corpus: PathBuf,

    /// Source text to find reference lines for
    #[arg(long, default_value = "")]
    pub query: String,

    #[arg(long)]
    pub device: Option<String>,

    /// Normalized feature name
    #[arg(long)]
    pub feature: Option<String>,

    #[arg(long)]
    pub style_tag: Option<String>,

    /// Desired tone (style mode only)
    #[arg(long)]
    pub tone: Option<String>,

    /// Extra filter as key=value; unknown keys are ignored
    #[arg(long = "filter", value_name = "KEY=VALUE", value_parser = parse_key_value)]
    pub filters: Vec<(String, String)>,

    /// Number of lines to return, clamped to the configured maximum
    #[arg(long, default_value_t = 5, allow_negative_numbers = true)]
    pub top_k: i64,

    /// Force a retrieval mode (feature or style)
    #[arg(long)]
    pub mode: Option<RetrievalMode>,

    /// Embed the corpus into an in-process vector index instead of Qdrant
    #[arg(long)]
    pub local_index: bool,

    /// Also print the reference-examples prompt block
    #[arg(long)]
    pub prompt_block: bool,
}

/// Verbosity level enum
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verbosity {
    Quiet,
    Normal,
    Verbose,
    VeryVerbose,
}

impl Args {
    /// Get verbosity level based on flags
    pub fn verbosity(&self) -> Verbosity {
        if self.quiet {
            Verbosity::Quiet
        } else {
            match self.verbose {
                0 => Verbosity::Normal,
                1 => Verbosity::Verbose,
                _ => Verbosity::VeryVerbose,
            }
        }
    }
}

impl RetrieveArgs {
    /// Merge `--filter` pairs with the named flags; named flags win
    pub fn query_filters(&self) -> QueryFilters {
        let mut pairs: Vec<(String, String)> = self.filters.clone();
        let named = [
            ("device", &self.device),
            ("feature_norm", &self.feature),
            ("style_tag", &self.style_tag),
            ("tone", &self.tone),
        ];
        for (key, value) in named {
            if let Some(value) = value {
                pairs.push((key.to_string(), value.clone()));
            }
        }
        QueryFilters::from_pairs(pairs)
    }

    pub fn to_request(&self) -> RetrievalRequest {
        let mut request = RetrievalRequest::new(self.query.clone())
            .with_filters(self.query_filters())
            .with_top_k(self.top_k);
        request.mode = self.mode;
        request
    }
}

fn parse_key_value(raw: &str) -> Result<(String, String), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got '{}'", raw))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("empty key in '{}'", raw));
    }
    Ok((key.to_string(), value.trim().to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(argv: &[&str]) -> Args {
        Args::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_verbosity_levels() {
        assert_eq!(parse(&["stylerag", "config"]).verbosity(), Verbosity::Normal);
        assert_eq!(parse(&["stylerag", "-q", "config"]).verbosity(), Verbosity::Quiet);
        assert_eq!(parse(&["stylerag", "-v", "config"]).verbosity(), Verbosity::Verbose);
        assert_eq!(parse(&["stylerag", "config", "-vv"]).verbosity(), Verbosity::VeryVerbose);
    }

    #[test]
    fn test_retrieve_args() {
        let args = parse(&[
            "stylerag",
            "retrieve",
            "--corpus",
            "lines.jsonl",
            "--query",
            "charging",
            "--device",
            "robot_vacuum",
            "--filter",
            "feature_norm=charging",
            "--filter",
            "color=blue",
            "--top-k",
            "3",
            "--mode",
            "style",
        ]);

        let Commands::Retrieve(retrieve) = args.command else {
            panic!("expected retrieve subcommand");
        };
        let request = retrieve.to_request();
        assert_eq!(request.query, "charging");
        assert_eq!(request.top_k, 3);
        assert_eq!(request.mode, Some(RetrievalMode::Style));
        assert_eq!(request.filters.device(), Some("robot_vacuum"));
        assert_eq!(request.filters.feature_norm(), Some("charging"));
        assert!(!retrieve.local_index);
    }

    #[test]
    fn test_named_flags_override_filter_pairs() {
        let args = parse(&[
            "stylerag",
            "retrieve",
            "--corpus",
            "lines.jsonl",
            "--filter",
            "device=washer",
            "--device",
            "robot_vacuum",
        ]);
        let Commands::Retrieve(retrieve) = args.command else {
            panic!("expected retrieve subcommand");
        };
        assert_eq!(retrieve.query_filters().device(), Some("robot_vacuum"));
    }

    #[test]
    fn test_bad_filter_and_mode_rejected() {
        assert!(Args::try_parse_from(["stylerag", "retrieve", "--corpus", "c", "--filter", "novalue"]).is_err());
        assert!(Args::try_parse_from(["stylerag", "retrieve", "--corpus", "c", "--mode", "hybrid"]).is_err());
        assert!(Args::try_parse_from(["stylerag", "retrieve"]).is_err());
    }

    #[test]
    fn test_parse_key_value() {
        assert_eq!(
            parse_key_value("tone = friendly").unwrap(),
            ("tone".to_string(), "friendly".to_string())
        );
        assert!(parse_key_value("=x").is_err());
    }
}
