//! Renderers for consensus results

pub mod console;
pub mod formatter;
pub mod markdown;

use consensus_domain::{ConsensusResult, OutputFormat};
use formatter::OutputFormatter;

/// Render `result` in `format` with the given formatter
pub fn render(formatter: &dyn OutputFormatter, result: &ConsensusResult, format: OutputFormat) -> String {
    match format {
        OutputFormat::Full => formatter.format(result),
        OutputFormat::Synthesis => formatter.format_synthesis_only(result),
        OutputFormat::Json => formatter.format_json(result),
        OutputFormat::Markdown => markdown::MarkdownFormatter::format(result),
    }
}
