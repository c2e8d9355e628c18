//! Console output formatter for consensus results

use crate::output::formatter::OutputFormatter;
use colored::Colorize;
use consensus_domain::{ConsensusLevel, ConsensusResult};

/// Formats consensus results for console display
pub struct ConsoleFormatter;

impl ConsoleFormatter {
    /// Format the complete result
    pub fn format(result: &ConsensusResult) -> String {
        let mut output = String::new();

        // Header
        output.push_str(&Self::header("LLM Consensus Results"));
        output.push('\n');

        output.push_str(&format!(
            "{} {}\n\n",
            "Question:".cyan().bold(),
            result.original_prompt
        ));

        let models: Vec<&str> = result
            .individual_responses
            .iter()
            .map(|r| r.model_name.as_str())
            .collect();
        output.push_str(&format!(
            "{} {}\n",
            "Models:".cyan().bold(),
            models.join(", ")
        ));
        output.push_str(&format!(
            "{} {}\n",
            "Judge:".cyan().bold(),
            result.judge_model
        ));
        output.push_str(&format!(
            "{} {}\n",
            "Run:".cyan().bold(),
            result.run_id
        ));

        // Phase 1: Individual responses
        output.push_str(&Self::section_header("Phase 1: Divergent Responses"));
        for response in &result.individual_responses {
            let title = if response.has_confidence() {
                format!(
                    "── {} ({:.0}% confident) ──",
                    response.model_name,
                    response.confidence_score * 100.0
                )
            } else {
                format!("── {} ──", response.model_name)
            };
            output.push_str(&format!("\n{}\n{}\n", title.yellow().bold(), response.answer));
            if response.has_reasoning() {
                output.push_str(&format!(
                    "\n{}\n{}\n",
                    "Reasoning:".dimmed(),
                    Self::indent(&response.reasoning, "  ")
                ));
            }
        }

        // Phase 2: Synthesis
        output.push_str(&Self::section_header("Phase 2: Convergent Synthesis"));
        output.push_str(&format!(
            "\n{}\n\n{}\n",
            format!("Judge: {}", result.judge_model).yellow().bold(),
            result.synthesized_answer
        ));

        output.push_str(&format!("\n{}\n", Self::verdict_line(result)));

        if !result.synthesis_reasoning.is_empty() {
            output.push_str(&format!(
                "\n{}\n{}\n",
                "Reasoning:".cyan().bold(),
                Self::indent(&result.synthesis_reasoning, "  ")
            ));
        }

        if !result.agreement_points.is_empty() {
            output.push_str(&format!("\n{}\n", "Areas of Consensus:".green().bold()));
            for point in &result.agreement_points {
                if point.model_names.is_empty() {
                    output.push_str(&format!("  * {}\n", point.point));
                } else {
                    output.push_str(&format!(
                        "  * {} {}\n",
                        point.point,
                        format!("({})", point.model_names.join(", ")).dimmed()
                    ));
                }
            }
        }

        if !result.disagreements.is_empty() {
            output.push_str(&format!("\n{}\n", "Disagreements:".yellow().bold()));
            for disagreement in &result.disagreements {
                let marker = if disagreement.is_legitimate_theoretical {
                    " [theoretical]".dimmed().to_string()
                } else {
                    String::new()
                };
                output.push_str(&format!("  * {}{}\n", disagreement.topic.bold(), marker));
                for view in &disagreement.views {
                    output.push_str(&format!("      {}: {}\n", view.model_name, view.position));
                }
            }
        }

        output.push_str(&format!(
            "\n{} {:.1}s\n",
            "Processing time:".dimmed(),
            result.total_processing_time.as_secs_f64()
        ));
        output.push_str(&Self::footer());

        output
    }

    /// Format as JSON
    pub fn format_json(result: &ConsensusResult) -> String {
        serde_json::to_string_pretty(result).unwrap_or_else(|_| "{}".to_string())
    }

    /// Format the verdict only (concise output)
    pub fn format_synthesis_only(result: &ConsensusResult) -> String {
        let mut output = String::new();

        output.push_str(&format!(
            "{}\n\n",
            "=== LLM Consensus Verdict ===".cyan().bold()
        ));

        output.push_str(&format!("{} {}\n\n", "Q:".bold(), result.original_prompt));

        output.push_str(&format!(
            "{} {} (judge: {})\n\n",
            "Models consulted:".dimmed(),
            result.model_count(),
            result.judge_model
        ));

        output.push_str(&result.synthesized_answer);
        output.push('\n');
        output.push_str(&format!("\n{}\n", Self::verdict_line(result)));

        output
    }

    fn verdict_line(result: &ConsensusResult) -> String {
        let level = result.consensus_level.display_name();
        let level = match result.consensus_level {
            ConsensusLevel::StrongConsensus => level.green().bold(),
            ConsensusLevel::ModerateConsensus => level.cyan().bold(),
            ConsensusLevel::WeakConsensus => level.yellow().bold(),
            ConsensusLevel::Conflicted => level.red().bold(),
        };
        format!(
            "{} {} | {} {:.0}%",
            "Consensus:".bold(),
            level,
            "Confidence:".bold(),
            result.overall_confidence * 100.0
        )
    }

    fn header(title: &str) -> String {
        let line = "=".repeat(60);
        format!("{}\n{:^60}\n{}", line.cyan(), title.bold(), line.cyan())
    }

    fn section_header(title: &str) -> String {
        format!("\n{}\n{}\n", title.cyan().bold(), "-".repeat(40))
    }

    fn footer() -> String {
        format!("\n{}\n", "=".repeat(60).cyan())
    }

    /// Indent a multi-line string
    pub fn indent(text: &str, prefix: &str) -> String {
        text.lines()
            .map(|line| format!("{}{}", prefix, line))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl OutputFormatter for ConsoleFormatter {
    fn format(&self, result: &ConsensusResult) -> String {
        Self::format(result)
    }

    fn format_json(&self, result: &ConsensusResult) -> String {
        Self::format_json(result)
    }

    fn format_synthesis_only(&self, result: &ConsensusResult) -> String {
        Self::format_synthesis_only(result)
    }
}
