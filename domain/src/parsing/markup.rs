//! Lenient tag-tree reader for XML-like model output.
//!
//! Models wrap structured answers in tags but rarely produce well-formed
//! XML: answers contain bare `&`, `a < b`, generic types such as
//! `Vec<String>`, or forget a closing tag. This reader never fails. It
//! builds a tree of elements and records, for each one, whether it was
//! explicitly closed. Element content is kept as a byte range into the
//! source so callers see the original text, nested tags included.
//!
//! Recovery rules:
//! - `<` not followed by a tag name is text.
//! - A closing tag pops the nearest open element with the same name;
//!   anything opened above it is implicitly closed at that point (and
//!   flagged as unclosed). Closing tags matching nothing are ignored.
//! - Elements still open at end of input extend to the end and are
//!   flagged as unclosed.

use regex::Regex;
use std::ops::Range;
use std::sync::LazyLock;

static ATTRIBUTE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"([A-Za-z_:][A-Za-z0-9_:.\-]*)\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'>]+))"#)
        .expect("attribute regex is valid")
});

/// One element of the tree
#[derive(Debug, Clone)]
pub(crate) struct Element {
    /// Lowercased tag name
    pub name: String,
    attrs: Vec<(String, String)>,
    /// Byte range of the element content in the source
    pub inner: Range<usize>,
    pub children: Vec<Element>,
    /// Whether an explicit closing tag (or `/>`) was seen
    pub closed: bool,
}

impl Element {
    fn open(name: String, attrs: Vec<(String, String)>, content_start: usize) -> Self {
        Self {
            name,
            attrs,
            inner: content_start..content_start,
            children: Vec::new(),
            closed: false,
        }
    }

    /// First direct child with the given (case-insensitive) name
    pub fn child(&self, name: &str) -> Option<&Element> {
        self.children.iter().find(|c| c.name.eq_ignore_ascii_case(name))
    }

    /// All direct children with the given (case-insensitive) name
    pub fn children_named<'s>(&'s self, name: &'s str) -> impl Iterator<Item = &'s Element> + 's {
        self.children
            .iter()
            .filter(move |c| c.name.eq_ignore_ascii_case(name))
    }

    /// Attribute value by (case-insensitive) name
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    fn find(&self, name: &str) -> Option<&Element> {
        if self.name.eq_ignore_ascii_case(name) {
            return Some(self);
        }
        self.children.iter().find_map(|c| c.find(name))
    }
}

/// Parsed tag tree over a borrowed source
#[derive(Debug)]
pub(crate) struct Markup<'a> {
    source: &'a str,
    /// Top-level elements in document order
    pub roots: Vec<Element>,
}

impl<'a> Markup<'a> {
    pub fn parse(source: &'a str) -> Self {
        let mut stack: Vec<Element> = Vec::new();
        let mut roots: Vec<Element> = Vec::new();
        let mut pos = 0;

        while let Some(offset) = source[pos..].find('<') {
            let start = pos + offset;
            let rest = &source[start..];

            if rest.starts_with("<![CDATA[") {
                match rest.find("]]>") {
                    Some(end) => {
                        pos = start + end + 3;
                        continue;
                    }
                    None => break,
                }
            }
            if rest.starts_with("<!--") {
                match rest.find("-->") {
                    Some(end) => {
                        pos = start + end + 3;
                        continue;
                    }
                    None => break,
                }
            }

            if let Some(name_part) = rest.strip_prefix("</") {
                let name_len = tag_name_len(name_part);
                let after_name = &name_part[name_len..];
                let trimmed = after_name.trim_start();
                if name_len == 0 || !trimmed.starts_with('>') {
                    pos = start + 1;
                    continue;
                }
                let tag_end = start + 2 + name_len + (after_name.len() - trimmed.len()) + 1;
                let name = name_part[..name_len].to_ascii_lowercase();
                close_element(&mut stack, &mut roots, &name, start);
                pos = tag_end;
                continue;
            }

            let name_part = &rest[1..];
            let name_len = tag_name_len(name_part);
            let starts_with_letter = name_part
                .chars()
                .next()
                .is_some_and(|c| c.is_ascii_alphabetic() || c == '_');
            if name_len == 0 || !starts_with_letter {
                pos = start + 1;
                continue;
            }
            let after_name = &name_part[name_len..];
            let boundary_ok = after_name
                .chars()
                .next()
                .is_some_and(|c| c == '>' || c == '/' || c.is_whitespace());
            let Some(close_offset) = find_tag_end(after_name).filter(|_| boundary_ok) else {
                pos = start + 1;
                continue;
            };

            let attr_text = &after_name[..close_offset];
            let self_closing = attr_text.trim_end().ends_with('/');
            let content_start = start + 1 + name_len + close_offset + 1;
            let name = name_part[..name_len].to_ascii_lowercase();
            let mut element = Element::open(name, parse_attributes(attr_text), content_start);

            if self_closing {
                element.closed = true;
                attach(&mut stack, &mut roots, element);
            } else {
                stack.push(element);
            }
            pos = content_start;
        }

        while let Some(mut element) = stack.pop() {
            element.inner.end = source.len();
            attach(&mut stack, &mut roots, element);
        }

        Self { source, roots }
    }

    /// Depth-first search for the first element with the given name
    pub fn find(&self, name: &str) -> Option<&Element> {
        self.roots.iter().find_map(|e| e.find(name))
    }

    /// First top-level element with the given name
    #[cfg(test)]
    pub fn root(&self, name: &str) -> Option<&Element> {
        self.roots.iter().find(|e| e.name.eq_ignore_ascii_case(name))
    }

    /// Element content with CDATA markers removed, entities decoded, trimmed
    pub fn text(&self, element: &Element) -> String {
        let raw = &self.source[element.inner.clone()];
        decode_entities(&raw.replace("<![CDATA[", "").replace("]]>", ""))
            .trim()
            .to_string()
    }
}

fn tag_name_len(s: &str) -> usize {
    s.char_indices()
        .find(|(_, c)| !(c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | ':' | '.')))
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}

/// Offset of the `>` ending an opening tag, honoring quoted attribute values.
/// Returns `None` if another `<` shows up first (then it was not a tag).
fn find_tag_end(s: &str) -> Option<usize> {
    let mut quote: Option<char> = None;
    for (i, c) in s.char_indices() {
        match quote {
            Some(q) if c == q => quote = None,
            Some(_) => {}
            None => match c {
                '"' | '\'' => quote = Some(c),
                '>' => return Some(i),
                '<' => return None,
                _ => {}
            },
        }
    }
    None
}

fn parse_attributes(text: &str) -> Vec<(String, String)> {
    ATTRIBUTE
        .captures_iter(text)
        .map(|caps| {
            let value = caps
                .get(2)
                .or_else(|| caps.get(3))
                .or_else(|| caps.get(4))
                .map(|m| decode_entities(m.as_str()))
                .unwrap_or_default();
            (caps[1].to_ascii_lowercase(), value)
        })
        .collect()
}

fn attach(stack: &mut [Element], roots: &mut Vec<Element>, element: Element) {
    match stack.last_mut() {
        Some(parent) => parent.children.push(element),
        None => roots.push(element),
    }
}

fn close_element(stack: &mut Vec<Element>, roots: &mut Vec<Element>, name: &str, at: usize) {
    let Some(index) = stack.iter().rposition(|e| e.name == name) else {
        return;
    };
    while stack.len() > index + 1 {
        if let Some(mut dangling) = stack.pop() {
            dangling.inner.end = at;
            attach(stack, roots, dangling);
        }
    }
    if let Some(mut element) = stack.pop() {
        element.inner.end = at;
        element.closed = true;
        attach(stack, roots, element);
    }
}

fn decode_entities(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nested_elements() {
        let src = "<synthesis><answer>Paris</answer><points><point>a</point><point>b</point></points></synthesis>";
        let doc = Markup::parse(src);
        let synthesis = doc.root("synthesis").unwrap();
        assert!(synthesis.closed);
        assert_eq!(doc.text(synthesis.child("answer").unwrap()), "Paris");
        let points: Vec<String> = synthesis
            .child("points")
            .unwrap()
            .children_named("point")
            .map(|p| doc.text(p))
            .collect();
        assert_eq!(points, vec!["a", "b"]);
    }

    #[test]
    fn test_text_with_angle_brackets_and_ampersands() {
        let src = "<answer>Use Vec<String> when a < b & c > d</answer>";
        let doc = Markup::parse(src);
        let answer = doc.root("answer").unwrap();
        assert!(answer.closed);
        assert_eq!(doc.text(answer), "Use Vec<String> when a < b & c > d");
    }

    #[test]
    fn test_unclosed_element_is_flagged() {
        let doc = Markup::parse("<synthesis><answer>cut off mid");
        let synthesis = doc.root("synthesis").unwrap();
        assert!(!synthesis.closed);
        assert!(!synthesis.child("answer").unwrap().closed);
        assert_eq!(doc.text(synthesis.child("answer").unwrap()), "cut off mid");
    }

    #[test]
    fn test_attributes_and_self_closing() {
        let doc = Markup::parse(r#"<point models="a, b" weight='2'>x</point><br/>"#);
        let point = doc.root("point").unwrap();
        assert_eq!(point.attr("models"), Some("a, b"));
        assert_eq!(point.attr("WEIGHT"), Some("2"));
        assert!(doc.root("br").unwrap().closed);
    }

    #[test]
    fn test_case_insensitive_names_and_entities() {
        let doc = Markup::parse("<Confidence>85</CONFIDENCE><t>&lt;b&gt; &amp; <![CDATA[raw]]></t>");
        assert_eq!(doc.text(doc.root("confidence").unwrap()), "85");
        assert_eq!(doc.text(doc.root("t").unwrap()), "<b> & raw");
    }

    #[test]
    fn test_find_searches_depth_first() {
        let doc = Markup::parse("Here you go:\n<response><synthesis><x>1</x></synthesis></response>");
        let synthesis = doc.find("synthesis").unwrap();
        assert_eq!(doc.text(synthesis.child("x").unwrap()), "1");
        assert!(doc.root("synthesis").is_none());
    }

    #[test]
    fn test_plain_text_has_no_elements() {
        let doc = Markup::parse("The answer is 2 < 3 and <= 4.");
        assert!(doc.roots.is_empty());
    }
}
