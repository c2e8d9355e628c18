//! CLI command definitions

use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// Output format for consensus results
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Only the synthesized verdict
    Synthesis,
    /// Every individual response followed by the verdict
    Full,
    /// JSON output
    Json,
    /// The markdown report
    Markdown,
}

impl From<OutputFormat> for consensus_domain::OutputFormat {
    fn from(format: OutputFormat) -> Self {
        match format {
            OutputFormat::Synthesis => consensus_domain::OutputFormat::Synthesis,
            OutputFormat::Full => consensus_domain::OutputFormat::Full,
            OutputFormat::Json => consensus_domain::OutputFormat::Json,
            OutputFormat::Markdown => consensus_domain::OutputFormat::Markdown,
        }
    }
}

/// CLI arguments for llm-consensus
#[derive(Parser, Debug)]
#[command(name = "llm-consensus")]
#[command(author, version, about = "Ask several LLMs the same question and let a judge reconcile their answers")]
#[command(long_about = r#"
llm-consensus asks several models the same question and synthesizes one verdict.

The process has two phases:
1. Divergent collection: every model answers independently and in parallel
2. Convergent synthesis: a judge model reconciles the answers, listing
   agreement points and disagreements

Configuration files are loaded from (in priority order):
1. --config <path>       Explicit config file
2. ./consensus.toml      Project-level config
3. ~/.config/llm-consensus/config.toml   Global config

The API endpoint and key can also come from CONSENSUS_API_ENDPOINT and
CONSENSUS_API_KEY.

Example:
  llm-consensus -m openai/gpt-4o -m anthropic/claude-sonnet-4.5 -m google/gemini-2.5-pro \
      "What is the strongest argument for remote work?"
  llm-consensus --models-file models.txt -f question.md -o full
"#)]
pub struct Cli {
    /// The question to ask (or use --prompt-file)
    pub prompt: Option<String>,

    /// Read the question from a file
    #[arg(short = 'f', long, value_name = "PATH", conflicts_with = "prompt")]
    pub prompt_file: Option<PathBuf>,

    /// Models to query (can be specified multiple times)
    #[arg(short, long, value_name = "MODEL")]
    pub model: Vec<String>,

    /// File with one model per line
    #[arg(long, value_name = "PATH")]
    pub models_file: Option<PathBuf>,

    /// Model to use as judge (defaults to the first model)
    #[arg(long, value_name = "MODEL")]
    pub judge: Option<String>,

    /// Per-model timeout in seconds
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Domain tag (e.g. Psychology enables theoretical frameworks)
    #[arg(long, value_name = "TAG")]
    pub domain: Option<String>,

    /// Ask for the theoretical framework behind each answer (Psychology domain)
    #[arg(long)]
    pub theoretical_framework: bool,

    /// Use this run id instead of generating one
    #[arg(long, value_name = "ID")]
    pub run_id: Option<String>,

    /// Output format
    #[arg(short, long, value_enum)]
    pub output: Option<OutputFormat>,

    /// Directory for reports, intermediate responses and run logs
    #[arg(long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Do not write the markdown report
    #[arg(long)]
    pub no_save: bool,

    /// Disable colored output
    #[arg(long)]
    pub no_color: bool,

    /// Verbosity level (-v = info, -vv = debug, -vvv = trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress progress indicators
    #[arg(short, long)]
    pub quiet: bool,

    /// Path to configuration file
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Disable loading of configuration files
    #[arg(long, conflicts_with = "config")]
    pub no_config: bool,

    /// Show configuration file locations and the merged values, then exit
    #[arg(long)]
    pub show_config: bool,
}
