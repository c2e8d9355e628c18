//! Small text helpers shared by the response parsers

use regex::Regex;
use std::ops::Range;
use std::sync::LazyLock;

static FIRST_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d+(?:\.\d+)?").expect("number regex is valid"));

static SUMMARY_TAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<summary>(.*?)(?:</summary>|\z)").expect("summary regex is valid")
});

static LIST_MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(?:(?:[-+\u{2022}]|\*\s|\d+[.)])\s*)*").expect("list marker regex is valid")
});

static BLANK_RUNS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n[ \t]*\n(?:[ \t]*\n)+").expect("blank run regex is valid"));

/// Normalize a free-form confidence value into `[0, 1]`.
///
/// The first numeric token is used; values above 1 are read as percentages.
/// Text without any number yields `0.0`.
///
/// ```
/// use consensus_domain::parsing::normalize_confidence;
///
/// assert_eq!(normalize_confidence("85%"), 0.85);
/// assert_eq!(normalize_confidence("0.4 (moderate)"), 0.4);
/// assert_eq!(normalize_confidence("n/a"), 0.0);
/// ```
pub fn normalize_confidence(text: &str) -> f64 {
    let Some(value) = FIRST_NUMBER
        .find(text)
        .and_then(|m| m.as_str().parse::<f64>().ok())
    else {
        return 0.0;
    };
    let value = if value > 1.0 { value / 100.0 } else { value };
    value.clamp(0.0, 1.0)
}

/// First `<summary>` tag: trimmed content and the byte range of the whole tag.
///
/// An unclosed tag runs to the end of the text.
pub(crate) fn find_summary(text: &str) -> Option<(String, Range<usize>)> {
    let caps = SUMMARY_TAG.captures(text)?;
    let whole = caps.get(0)?;
    let content = caps.get(1).map(|m| m.as_str().trim()).unwrap_or_default();
    Some((content.to_string(), whole.range()))
}

/// Strip bullet and numbering prefixes (`- `, `* `, `•`, `1.`, `2)`)
pub(crate) fn strip_list_marker(line: &str) -> &str {
    let end = LIST_MARKER.find(line).map(|m| m.end()).unwrap_or(0);
    line[end..].trim()
}

/// Remove byte ranges from `text` (overlaps allowed) and tidy the result.
pub(crate) fn remove_ranges(text: &str, mut ranges: Vec<Range<usize>>) -> String {
    ranges.sort_by_key(|r| r.start);

    let mut out = String::with_capacity(text.len());
    let mut cursor = 0;
    for range in ranges {
        if range.end <= cursor {
            continue;
        }
        if range.start > cursor {
            out.push_str(&text[cursor..range.start]);
        }
        cursor = range.end;
    }
    if cursor < text.len() {
        out.push_str(&text[cursor..]);
    }

    BLANK_RUNS.replace_all(&out, "\n\n").trim().to_string()
}

/// Largest char boundary not after `index`
pub(crate) fn floor_char_boundary(text: &str, index: usize) -> usize {
    if index >= text.len() {
        return text.len();
    }
    let mut i = index;
    while !text.is_char_boundary(i) {
        i -= 1;
    }
    i
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_confidence() {
        assert_eq!(normalize_confidence("0.85"), 0.85);
        assert_eq!(normalize_confidence("85"), 0.85);
        assert_eq!(normalize_confidence("High, about 70 percent"), 0.7);
        assert_eq!(normalize_confidence("1"), 1.0);
        assert_eq!(normalize_confidence("250"), 1.0);
        assert_eq!(normalize_confidence(""), 0.0);
    }

    #[test]
    fn test_find_summary() {
        let (summary, range) = find_summary("Body <SUMMARY> Short. </summary> tail").unwrap();
        assert_eq!(summary, "Short.");
        assert_eq!(range, 5..32);

        let (summary, _) = find_summary("Body <summary>cut off").unwrap();
        assert_eq!(summary, "cut off");

        assert!(find_summary("no tag here").is_none());
    }

    #[test]
    fn test_strip_list_marker() {
        assert_eq!(strip_list_marker("- point"), "point");
        assert_eq!(strip_list_marker("  * point"), "point");
        assert_eq!(strip_list_marker("\u{2022} point"), "point");
        assert_eq!(strip_list_marker("12. point"), "point");
        assert_eq!(strip_list_marker("3) point"), "point");
        assert_eq!(strip_list_marker("3D printing"), "3D printing");
        assert_eq!(strip_list_marker("**Bold** point"), "**Bold** point");
    }

    #[test]
    fn test_remove_ranges_merges_overlaps() {
        let text = "keep [drop] keep [drop more] end";
        let out = remove_ranges(text, vec![17..28, 5..11, 20..24]);
        assert_eq!(out, "keep  keep  end");
    }

    #[test]
    fn test_remove_ranges_collapses_blank_runs() {
        let text = "a\n\nX\n\nb";
        assert_eq!(remove_ranges(text, vec![3..4]), "a\n\nb");
    }

    #[test]
    fn test_floor_char_boundary() {
        let text = "aé";
        assert_eq!(floor_char_boundary(text, 2), 1);
        assert_eq!(floor_char_boundary(text, 10), 3);
    }
}
