//! Markdown report rendering

use chrono::{DateTime, Local};
use consensus_domain::{ConsensusResult, NO_SUMMARY_PROVIDED};
use std::fmt::Write;

/// Renders the saved `consensus-<run_id>.md` report
pub struct MarkdownFormatter;

impl MarkdownFormatter {
    /// Render with the current local time as the generation date
    pub fn format(result: &ConsensusResult) -> String {
        Self::format_at(result, Local::now())
    }

    pub fn format_at(result: &ConsensusResult, generated: DateTime<Local>) -> String {
        let mut out = String::new();

        out.push_str("# Consensus Report\n\n");
        let _ = writeln!(out, "- **Generated:** {}", generated.format("%Y-%m-%d %H:%M:%S"));
        let _ = writeln!(out, "- **Run ID:** {}", result.run_id);
        let _ = writeln!(out, "- **Models:** {}", result.model_count());
        let _ = writeln!(out, "- **Judge:** {}", result.judge_model);
        let _ = writeln!(
            out,
            "- **Processing Time:** {:.2}s",
            result.total_processing_time.as_secs_f64()
        );
        let _ = writeln!(out, "- **Consensus Level:** {}", result.consensus_level);
        let _ = writeln!(out, "- **Overall Confidence:** {}", percent(result.overall_confidence));

        let _ = write!(out, "\n## Question\n\n{}\n", result.original_prompt.trim());
        let _ = write!(out, "\n## Synthesized Answer\n\n{}\n", result.synthesized_answer.trim());

        if !result.summary.is_empty() && result.summary != NO_SUMMARY_PROVIDED {
            let _ = write!(out, "\n## Summary\n\n{}\n", result.summary.trim());
        }

        if !result.synthesis_reasoning.trim().is_empty() {
            let _ = write!(
                out,
                "\n## Synthesis Reasoning\n\n{}\n",
                result.synthesis_reasoning.trim()
            );
        }

        if !result.agreement_points.is_empty() {
            out.push_str("\n## Agreement Points\n\n");
            for point in &result.agreement_points {
                if point.model_names.is_empty() {
                    let _ = writeln!(out, "- {}", point.point);
                } else {
                    let _ = writeln!(out, "- {} ({})", point.point, point.model_names.join(", "));
                }
            }
        }

        if !result.disagreements.is_empty() {
            out.push_str("\n## Disagreements\n");
            for disagreement in &result.disagreements {
                let _ = write!(out, "\n### {}\n\n", disagreement.topic);
                if disagreement.is_legitimate_theoretical {
                    out.push_str("_Legitimate theoretical difference._\n\n");
                }
                for view in &disagreement.views {
                    let _ = writeln!(out, "- **{}**: {}", view.model_name, view.position);
                    if !view.reasoning.is_empty() {
                        let _ = writeln!(out, "  - Reasoning: {}", view.reasoning);
                    }
                }
            }
        }

        out.push_str("\n## Individual Responses\n");
        for response in &result.individual_responses {
            let _ = write!(
                out,
                "\n### {} (Confidence: {})\n\n{}\n",
                response.model_name,
                percent(response.confidence_score),
                response.answer.trim()
            );
            if response.has_reasoning() {
                let _ = write!(out, "\n**Reasoning:** {}\n", response.reasoning.trim());
            }
        }

        out
    }
}

fn percent(score: f64) -> String {
    format!("{:.0}%", score * 100.0)
}
