//! Output formatter trait

use consensus_domain::ConsensusResult;

/// Trait for formatting consensus results
pub trait OutputFormatter {
    /// Format the complete result, individual responses included
    fn format(&self, result: &ConsensusResult) -> String;

    /// Format as JSON
    fn format_json(&self, result: &ConsensusResult) -> String;

    /// Format the verdict only (concise output)
    fn format_synthesis_only(&self, result: &ConsensusResult) -> String;
}
