//! Parsing of a single model's divergent-phase answer.
//!
//! Models are asked for a `<confidence>` tag, an optional `Reasoning:`
//! section and a `<summary>` tag, but many answer in their own layout.
//! The parser pulls out whatever it recognizes and keeps the rest as the
//! answer. It never fails.

use super::text::{find_summary, floor_char_boundary, remove_ranges};
use crate::consensus::ModelResponse;
use chrono::{DateTime, Utc};
use regex::{Captures, Regex};
use std::ops::Range;
use std::sync::LazyLock;

/// Standalone percentages are only trusted near the end of an answer.
const TAIL_WINDOW: usize = 500;

static CONFIDENCE_TAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<confidence>\s*(.*?)\s*</confidence>").expect("confidence tag regex is valid")
});

/// `Confidence: 85%`, `**Confidence level:** 85`
static CONFIDENCE_LABEL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)(?:\*\*)?confidence(?:\s+level)?(?:\*\*)?[ \t]*:(?:\*\*)?[ \t]*(\d{1,3}(?:\.\d+)?)[ \t]*%?(?:\*\*)?",
    )
    .expect("confidence label regex is valid")
});

/// `3. Your Confidence Level` heading with the number on a later line
static CONFIDENCE_HEADING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?im)^[ \t]*(?:\d+\.|#{1,6})[ \t]*(?:\*\*)?(?:your\s+)?confidence\s+level[^\n]*\n+[ \t]*\*{0,2}(\d{1,3})%?\*{0,2}",
    )
    .expect("confidence heading regex is valid")
});

/// A line holding nothing but a percentage
static STANDALONE_PERCENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^[ \t]*\*{0,2}(\d{1,3})%\*{0,2}[ \t]*$").expect("percent line regex is valid")
});

/// `confidence (85%)`, `I am confident: 90%`
static CONFIDENCE_INLINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:confidence|confident)(?:\s+is|\s+level)?[:\s(]+(\d{1,3})%\)?")
        .expect("inline confidence regex is valid")
});

static REASONING_LABEL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?im)^[ \t]*(?:#{1,6}[ \t]*)?(?:\*\*)?(?:my\s+reasoning|reasoning|step-by-step)(?:\*\*)?[ \t]*:(?:\*\*)?",
    )
    .expect("reasoning label regex is valid")
});

/// Anything that starts a new part of the answer after a reasoning section
static REASONING_END: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?im)<confidence>|<summary>|\bconfidence(?:\s+level)?[ \t]*:|^[ \t]*(?:#{1,6}[ \t]*|\d+\.[ \t]*)?(?:\*\*)?(?:your\s+)?(?:confidence(?:\s+level)?|summary|final\s+answer|answer|my\s+reasoning|reasoning)(?:\*\*)?[ \t]*(?::|$)",
    )
    .expect("reasoning end regex is valid")
});

/// Parse raw model output into a [`ModelResponse`].
///
/// Recognized parts are removed from the answer:
/// - `<summary>…</summary>` becomes the summary
/// - `<confidence>X</confidence>` (or, without a tag, one of the common
///   prose forms such as `Confidence: 85%`) becomes the confidence score
/// - a `Reasoning:` / `My reasoning:` / `Step-by-step:` section becomes
///   the reasoning
///
/// If nothing is left after stripping, the trimmed raw text is the answer.
pub fn parse_model_response(model_name: &str, raw: &str, timestamp: DateTime<Utc>) -> ModelResponse {
    let mut removals: Vec<Range<usize>> = Vec::new();

    let summary = match find_summary(raw) {
        Some((summary, range)) => {
            removals.push(range);
            summary
        }
        None => String::new(),
    };

    let confidence = match CONFIDENCE_TAG.captures(raw) {
        Some(caps) => {
            if let Some(whole) = caps.get(0) {
                removals.push(whole.range());
            }
            caps.get(1).and_then(|m| tagged_confidence(m.as_str()))
        }
        None => legacy_confidence(raw).map(|(value, range)| {
            removals.push(range);
            value
        }),
    };

    let reasoning = match find_reasoning(raw) {
        Some((reasoning, range)) => {
            removals.push(range);
            reasoning
        }
        None => String::new(),
    };

    let mut answer = remove_ranges(raw, removals);
    if answer.is_empty() {
        answer = raw.trim().to_string();
    }

    let response = ModelResponse::new(model_name, answer, timestamp)
        .with_reasoning(reasoning)
        .with_confidence(confidence.unwrap_or(0.0));
    if summary.is_empty() {
        response
    } else {
        response.with_summary(summary)
    }
}

/// Value of a `<confidence>` tag: fractions as-is, percentages divided.
fn tagged_confidence(text: &str) -> Option<f64> {
    let value: f64 = text.trim().trim_end_matches('%').trim().parse().ok()?;
    if (0.0..=1.0).contains(&value) {
        Some(value)
    } else if value > 1.0 && value <= 100.0 {
        Some(value / 100.0)
    } else {
        None
    }
}

/// Prose confidence forms, tried in order; the first in-range match wins.
fn legacy_confidence(raw: &str) -> Option<(f64, Range<usize>)> {
    if let Some(found) = first_percentage(&CONFIDENCE_LABEL, raw, 0) {
        return Some(found);
    }
    if let Some(found) = first_percentage(&CONFIDENCE_HEADING, raw, 0) {
        return Some(found);
    }

    let tail_start = floor_char_boundary(raw, raw.len().saturating_sub(TAIL_WINDOW));
    if let Some(found) = first_percentage(&STANDALONE_PERCENT, &raw[tail_start..], tail_start) {
        return Some(found);
    }

    first_percentage(&CONFIDENCE_INLINE, raw, 0)
}

fn first_percentage(pattern: &Regex, text: &str, offset: usize) -> Option<(f64, Range<usize>)> {
    pattern.captures_iter(text).find_map(|caps: Captures<'_>| {
        let value: f64 = caps.get(1)?.as_str().parse().ok()?;
        if !(0.0..=100.0).contains(&value) {
            return None;
        }
        let whole = caps.get(0)?;
        Some((value / 100.0, whole.start() + offset..whole.end() + offset))
    })
}

fn find_reasoning(raw: &str) -> Option<(String, Range<usize>)> {
    let label = REASONING_LABEL.find(raw)?;
    let body_start = label.end();
    let body_end = REASONING_END
        .find(&raw[body_start..])
        .map(|m| body_start + m.start())
        .unwrap_or(raw.len());

    let reasoning = raw[body_start..body_end].trim().to_string();
    Some((reasoning, label.start()..body_end))
}
