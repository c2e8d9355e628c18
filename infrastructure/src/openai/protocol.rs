//! Wire types for the chat-completions API

use consensus_domain::{Message, Role};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
pub(crate) struct ChatRequest<'a> {
    pub model: &'a str,
    pub messages: Vec<ChatMessage<'a>>,
}

#[derive(Debug, Serialize)]
pub(crate) struct ChatMessage<'a> {
    pub role: Role,
    pub content: &'a str,
}

impl<'a> ChatRequest<'a> {
    pub fn new(model: &'a str, messages: &'a [Message]) -> Self {
        Self {
            model,
            messages: messages
                .iter()
                .map(|m| ChatMessage {
                    role: m.role,
                    content: &m.content,
                })
                .collect(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct ChatResponse {
    #[serde(default)]
    pub choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Choice {
    pub message: Option<ChoiceMessage>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ChoiceMessage {
    pub content: Option<Content>,
}

/// Plain string, or the array-of-parts form some providers return
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum Content {
    Text(String),
    Parts(Vec<ContentPart>),
}

#[derive(Debug, Deserialize)]
pub(crate) struct ContentPart {
    pub text: Option<String>,
}

impl Content {
    fn text(&self) -> String {
        match self {
            Content::Text(text) => text.clone(),
            Content::Parts(parts) => parts
                .iter()
                .filter_map(|p| p.text.as_deref())
                .collect::<Vec<_>>()
                .join(""),
        }
    }
}

impl ChatResponse {
    /// Message content of every choice, joined by newlines
    pub fn joined_content(&self) -> String {
        self.choices
            .iter()
            .filter_map(|c| c.message.as_ref()?.content.as_ref())
            .map(Content::text)
            .filter(|text| !text.trim().is_empty())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_shape() {
        let messages = [Message::system("be brief"), Message::user("hi")];
        let json = serde_json::to_value(ChatRequest::new("openai/gpt-4o", &messages)).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "model": "openai/gpt-4o",
                "messages": [
                    {"role": "system", "content": "be brief"},
                    {"role": "user", "content": "hi"}
                ]
            })
        );
    }

    #[test]
    fn test_joined_content() {
        let response: ChatResponse = serde_json::from_str(
            r#"{"id":"x","choices":[
                {"index":0,"message":{"role":"assistant","content":"first"}},
                {"index":1,"message":{"role":"assistant","content":[{"type":"text","text":"sec"},{"type":"text","text":"ond"}]}},
                {"index":2,"message":{"role":"assistant","content":null}}
            ]}"#,
        )
        .unwrap();
        assert_eq!(response.joined_content(), "first\nsecond");
    }

    #[test]
    fn test_missing_choices() {
        let response: ChatResponse = serde_json::from_str(r#"{"error":"nope"}"#).unwrap();
        assert!(response.joined_content().is_empty());
    }
}
