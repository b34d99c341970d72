//! CLI argument parsing for clinistat

use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// Output format for comparison reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text summary (default)
    Text,
    /// JSON format for the presentation layer
    Json,
}

#[derive(Parser, Debug)]
#[command(name = "clinistat")]
#[command(version)]
#[command(about = "Statistical A/B comparison for healthcare experiments", long_about = None)]
pub struct Cli {
    /// Study configuration (group labels and metric specs) in TOML
    #[arg(short, long, value_name = "FILE")]
    pub config: PathBuf,

    /// Observations file: {"observations": [{"group", "metric", "value", "segment"?}]}
    #[arg(short, long, value_name = "FILE")]
    pub input: PathBuf,

    /// Output format (text or json)
    #[arg(long = "format", value_enum, default_value = "text")]
    pub format: OutputFormat,

    /// Compare each segment (e.g. department) separately
    #[arg(long = "by-segment")]
    pub by_segment: bool,

    /// Enable debug tracing output (to stderr)
    #[arg(long = "debug")]
    pub debug: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses_required_files() {
        let cli = Cli::parse_from(["clinistat", "--config", "study.toml", "--input", "obs.json"]);
        assert_eq!(cli.config, PathBuf::from("study.toml"));
        assert_eq!(cli.input, PathBuf::from("obs.json"));
        assert_eq!(cli.format, OutputFormat::Text);
        assert!(!cli.by_segment);
        assert!(!cli.debug);
    }

    #[test]
    fn test_cli_short_flags() {
        let cli = Cli::parse_from(["clinistat", "-c", "study.toml", "-i", "obs.json"]);
        assert_eq!(cli.config, PathBuf::from("study.toml"));
    }

    #[test]
    fn test_cli_json_format_and_segments() {
        let cli = Cli::parse_from([
            "clinistat",
            "--config",
            "study.toml",
            "--input",
            "obs.json",
            "--format",
            "json",
            "--by-segment",
            "--debug",
        ]);
        assert_eq!(cli.format, OutputFormat::Json);
        assert!(cli.by_segment);
        assert!(cli.debug);
    }

    #[test]
    fn test_cli_requires_input() {
        let result = Cli::try_parse_from(["clinistat", "--config", "study.toml"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_cli_rejects_unknown_format() {
        let result = Cli::try_parse_from([
            "clinistat", "-c", "study.toml", "-i", "obs.json", "--format", "csv",
        ]);
        assert!(result.is_err());
    }
}
