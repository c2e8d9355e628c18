//! Parsing of the judge model's synthesis.
//!
//! Judges are asked for a `<synthesis>` tag envelope, but older prompts (and
//! forgetful models) produce `LABEL: content` sections instead. Decoders are
//! tried in order and the first that accepts the text wins. The last one
//! takes the raw text as-is, so parsing never fails.

use super::markup::{Element, Markup};
use super::text::{find_summary, normalize_confidence, strip_list_marker};
use crate::consensus::{
    ConsensusLevel, ConsensusPoint, ConsensusResult, Disagreement, DissentingView, ModelResponse,
};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;
use std::time::Duration;

/// Which decoder produced a [`ParsedSynthesis`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SynthesisFormat {
    /// `<synthesis>` tag envelope
    Structured,
    /// `SYNTHESIZED ANSWER:` style sections
    Legacy,
    /// Unrecognized layout, whole text kept
    Raw,
}

impl SynthesisFormat {
    pub fn as_str(&self) -> &str {
        match self {
            SynthesisFormat::Structured => "structured",
            SynthesisFormat::Legacy => "legacy",
            SynthesisFormat::Raw => "raw",
        }
    }
}

impl std::fmt::Display for SynthesisFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Judge verdict before it is joined with the collected responses
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedSynthesis {
    pub format: SynthesisFormat,
    pub synthesized_answer: String,
    pub reasoning: String,
    pub summary: String,
    pub confidence: f64,
    pub consensus_level: ConsensusLevel,
    pub agreement_points: Vec<ConsensusPoint>,
    pub disagreements: Vec<Disagreement>,
}

impl ParsedSynthesis {
    /// Combine the verdict with the run context into a [`ConsensusResult`].
    ///
    /// `total_processing_time` is left at zero for the caller to fill in.
    pub fn into_result(
        self,
        original_prompt: impl Into<String>,
        individual_responses: Vec<ModelResponse>,
        judge_model: impl Into<String>,
        run_id: impl Into<String>,
    ) -> ConsensusResult {
        ConsensusResult {
            synthesized_answer: self.synthesized_answer,
            synthesis_reasoning: self.reasoning,
            summary: self.summary,
            overall_confidence: self.confidence.clamp(0.0, 1.0),
            consensus_level: self.consensus_level,
            individual_responses,
            agreement_points: self.agreement_points,
            disagreements: self.disagreements,
            total_processing_time: Duration::ZERO,
            original_prompt: original_prompt.into(),
            judge_model: judge_model.into(),
            run_id: run_id.into(),
        }
    }
}

type Decoder = fn(&str) -> Option<ParsedSynthesis>;

const DECODERS: &[Decoder] = &[decode_structured, decode_legacy];

/// Parse a judge response. Never fails; see the module docs for the order.
pub fn parse_synthesis(raw: &str) -> ParsedSynthesis {
    DECODERS
        .iter()
        .find_map(|decode| decode(raw))
        .unwrap_or_else(|| decode_raw(raw))
}

// ==================== structured ====================

fn decode_structured(raw: &str) -> Option<ParsedSynthesis> {
    let doc = Markup::parse(raw);
    let envelope = doc.find("synthesis");
    if envelope.is_some_and(|e| !e.closed) {
        return None;
    }
    let fields: &[Element] = match envelope {
        Some(element) => &element.children,
        None => &doc.roots,
    };
    let field = |name: &str| fields.iter().find(|e| e.name == name);

    let answer_element = field("synthesized_answer")?;
    if !answer_element.closed {
        return None;
    }
    let synthesized_answer = doc.text(answer_element);
    if synthesized_answer.is_empty() {
        return None;
    }

    let summary = field("summary")
        .map(|e| doc.text(e))
        .or_else(|| find_summary(raw).map(|(summary, _)| summary))
        .unwrap_or_default();

    let agreement_points = field("agreement_points")
        .map(|list| {
            list.children_named("point")
                .filter_map(|point| structured_point(&doc, point))
                .collect()
        })
        .unwrap_or_default();

    let disagreements = field("disagreements")
        .map(|list| {
            list.children_named("disagreement")
                .map(|d| structured_disagreement(&doc, d))
                .filter(|d| !d.views.is_empty())
                .collect()
        })
        .unwrap_or_default();

    Some(ParsedSynthesis {
        format: SynthesisFormat::Structured,
        synthesized_answer,
        reasoning: field("reasoning").map(|e| doc.text(e)).unwrap_or_default(),
        summary,
        confidence: field("confidence")
            .map(|e| normalize_confidence(&doc.text(e)))
            .unwrap_or(0.0),
        consensus_level: field("consensus_level")
            .map(|e| ConsensusLevel::from_label(&doc.text(e)))
            .unwrap_or_default(),
        agreement_points,
        disagreements,
    })
}

fn structured_point(doc: &Markup<'_>, element: &Element) -> Option<ConsensusPoint> {
    let text = doc.text(element);
    if text.is_empty() {
        return None;
    }
    let point = ConsensusPoint::new(text);
    let models: Vec<String> = element
        .attr("models")
        .map(|list| {
            list.split(',')
                .map(str::trim)
                .filter(|m| !m.is_empty())
                .map(String::from)
                .collect()
        })
        .unwrap_or_default();
    Some(if models.is_empty() {
        point
    } else {
        point.with_models(models)
    })
}

fn structured_disagreement(doc: &Markup<'_>, element: &Element) -> Disagreement {
    let topic = element.child("topic").map(|t| doc.text(t)).unwrap_or_default();
    let mut disagreement = Disagreement::new(topic);
    disagreement.is_legitimate_theoretical = element
        .attr("theoretical")
        .is_some_and(|v| v.eq_ignore_ascii_case("true"));

    if let Some(views) = element.child("views") {
        for view in views.children_named("view") {
            let model = view.child("model").map(|m| doc.text(m)).unwrap_or_default();
            let position = view.child("position").map(|p| doc.text(p)).unwrap_or_default();
            if model.is_empty() && position.is_empty() {
                continue;
            }
            let mut dissent = DissentingView::new(model, position);
            if let Some(reasoning) = view.child("reasoning") {
                dissent = dissent.with_reasoning(doc.text(reasoning));
            }
            disagreement = disagreement.with_view(dissent);
        }
    }
    disagreement
}

// ==================== legacy ====================

#[derive(Debug, Clone, Copy)]
enum Section {
    SynthesizedAnswer,
    Reasoning,
    Confidence,
    ConsensusLevel,
    AgreementPoints,
    Disagreements,
}

const SECTIONS: [Section; 6] = [
    Section::SynthesizedAnswer,
    Section::Reasoning,
    Section::Confidence,
    Section::ConsensusLevel,
    Section::AgreementPoints,
    Section::Disagreements,
];

impl Section {
    fn label(self) -> &'static str {
        match self {
            Section::SynthesizedAnswer => "SYNTHESIZED ANSWER",
            Section::Reasoning => "REASONING",
            Section::Confidence => "CONFIDENCE",
            Section::ConsensusLevel => "CONSENSUS LEVEL",
            Section::AgreementPoints => "AGREEMENT POINTS",
            Section::Disagreements => "DISAGREEMENTS",
        }
    }

    fn patterns(self) -> &'static SectionPatterns {
        &SECTION_PATTERNS[self as usize]
    }

    /// Content of the first occurrence of this section, trimmed
    fn extract(self, raw: &str) -> Option<String> {
        let patterns = self.patterns();
        if let Some(m) = patterns.inline.find(raw) {
            let end = section_end(raw, m.end(), false);
            return Some(clean_section(&raw[m.end()..end]));
        }
        let m = patterns.header.find(raw)?;
        let end = section_end(raw, m.end(), true);
        Some(clean_section(&raw[m.end()..end]))
    }
}

struct SectionPatterns {
    /// `LABEL: content`, optionally bold
    inline: Regex,
    /// `## LABEL` on its own line
    header: Regex,
}

static SECTION_PATTERNS: LazyLock<Vec<SectionPatterns>> = LazyLock::new(|| {
    SECTIONS
        .iter()
        .map(|section| {
            let label = section.label().replace(' ', r"\s+");
            SectionPatterns {
                inline: Regex::new(&format!(
                    r"(?im)^[ \t]*(?:\*\*)?{label}(?:\*\*)?[ \t]*:(?:\*\*)?"
                ))
                .expect("section regex is valid"),
                header: Regex::new(&format!(
                    r"(?im)^#{{1,6}}[ \t]*(?:\*\*)?{label}(?:\*\*)?[ \t]*:?[ \t]*$"
                ))
                .expect("section header regex is valid"),
            }
        })
        .collect()
});

/// A line that opens some `LABEL:`; filtered further in [`section_end`]
static LABEL_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^[ \t]*(?:#{1,6}[ \t]*)?(?:\*\*)?([A-Za-z][A-Za-z ]*[A-Za-z])(?:\*\*)?[ \t]*:")
        .expect("label line regex is valid")
});

static HEADER_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^#{1,6}[ \t]").expect("header line regex is valid"));

/// Keywords of the disagreement grammar; never section boundaries
const DISAGREEMENT_KEYWORDS: [&str; 3] = ["MODEL", "TOPIC", "POSITION"];

static TOPIC_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(?:[-*\u{2022}][ \t]*)?topic[ \t]*:[ \t]*(.*)$").expect("topic regex is valid")
});

static MODEL_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(?:[-*\u{2022}][ \t]*)?model[ \t]*:[ \t]*(.*)$").expect("model regex is valid")
});

static POSITION_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(?:[-*\u{2022}][ \t]*)?position[ \t]*:[ \t]*(.*)$")
        .expect("position regex is valid")
});

/// End offset of a section whose content starts at `start`.
///
/// Inline sections run to the next known label (any case), the next
/// all-caps `LABEL:` line, or the next Markdown header. Header sections
/// run to the next Markdown header.
fn section_end(raw: &str, start: usize, header_section: bool) -> usize {
    let rest = &raw[start..];
    // offset 0 is the remainder of the label's own line, not a new line
    let next_header = HEADER_LINE
        .find_iter(rest)
        .find(|m| m.start() > 0)
        .map(|m| m.start());
    if header_section {
        return start + next_header.unwrap_or(rest.len());
    }

    let next_label = LABEL_LINE
        .captures_iter(rest)
        .filter(|caps| caps.get(0).is_some_and(|m| m.start() > 0))
        .find(|caps| {
            let word = caps[1].split_whitespace().collect::<Vec<_>>().join(" ");
            let known = SECTIONS.iter().any(|s| s.label().eq_ignore_ascii_case(&word));
            let shouting = word.chars().all(|c| !c.is_ascii_lowercase());
            let grammar = DISAGREEMENT_KEYWORDS.contains(&word.as_str());
            known || (shouting && !grammar)
        })
        .and_then(|caps| caps.get(0).map(|m| m.start()));

    let end = match (next_label, next_header) {
        (Some(a), Some(b)) => a.min(b),
        (a, b) => a.or(b).unwrap_or(rest.len()),
    };
    start + end
}

fn clean_section(text: &str) -> String {
    let text = text.trim();
    let text = text
        .strip_prefix("**")
        .and_then(|t| t.strip_suffix("**"))
        .unwrap_or(text);
    text.trim().to_string()
}

fn decode_legacy(raw: &str) -> Option<ParsedSynthesis> {
    let answer = Section::SynthesizedAnswer.extract(raw)?;
    let synthesized_answer = match find_summary(&answer) {
        Some((_, range)) => {
            let mut stripped = answer.clone();
            stripped.replace_range(range, "");
            stripped.trim().to_string()
        }
        None => answer,
    };
    if synthesized_answer.is_empty() {
        return None;
    }

    Some(ParsedSynthesis {
        format: SynthesisFormat::Legacy,
        synthesized_answer,
        reasoning: Section::Reasoning.extract(raw).unwrap_or_default(),
        summary: find_summary(raw).map(|(s, _)| s).unwrap_or_default(),
        confidence: Section::Confidence
            .extract(raw)
            .map(|c| normalize_confidence(&c))
            .unwrap_or(0.0),
        consensus_level: Section::ConsensusLevel
            .extract(raw)
            .map(|l| ConsensusLevel::from_label(&l))
            .unwrap_or_default(),
        agreement_points: Section::AgreementPoints
            .extract(raw)
            .map(|s| legacy_agreement_points(&s))
            .unwrap_or_default(),
        disagreements: Section::Disagreements
            .extract(raw)
            .map(|s| legacy_disagreements(&s))
            .unwrap_or_default(),
    })
}

fn legacy_agreement_points(section: &str) -> Vec<ConsensusPoint> {
    section
        .lines()
        .map(strip_list_marker)
        .filter(|line| !line.is_empty() && !line.eq_ignore_ascii_case("none"))
        .map(ConsensusPoint::new)
        .collect()
}

/// `- TOPIC: x` opens a disagreement, `MODEL: name - position` adds a view
/// to it, `POSITION: text` replaces the last view's position.
fn legacy_disagreements(section: &str) -> Vec<Disagreement> {
    if section.trim().eq_ignore_ascii_case("none") {
        return Vec::new();
    }

    let mut disagreements = Vec::new();
    let mut current: Option<Disagreement> = None;

    for line in section.lines().map(str::trim).filter(|l| !l.is_empty()) {
        if let Some(caps) = TOPIC_LINE.captures(line) {
            if let Some(done) = current.take() {
                disagreements.push(done);
            }
            current = Some(Disagreement::new(caps[1].trim()));
        } else if let Some(caps) = MODEL_LINE.captures(line) {
            let Some(disagreement) = current.as_mut() else {
                continue;
            };
            let body = caps[1].trim();
            let (model, position) = body.split_once(" - ").unwrap_or((body, ""));
            disagreement
                .views
                .push(DissentingView::new(model.trim(), position.trim()));
        } else if let Some(caps) = POSITION_LINE.captures(line)
            && let Some(view) = current.as_mut().and_then(|d| d.views.last_mut())
        {
            view.position = caps[1].trim().to_string();
        }
    }
    if let Some(done) = current {
        disagreements.push(done);
    }

    disagreements.retain(|d| !d.views.is_empty());
    disagreements
}

// ==================== raw ====================

fn decode_raw(raw: &str) -> ParsedSynthesis {
    ParsedSynthesis {
        format: SynthesisFormat::Raw,
        synthesized_answer: raw.trim().to_string(),
        reasoning: String::new(),
        summary: find_summary(raw).map(|(s, _)| s).unwrap_or_default(),
        confidence: 0.0,
        consensus_level: ConsensusLevel::Conflicted,
        agreement_points: Vec::new(),
        disagreements: Vec::new(),
    }
}
