//! OpenAI-compatible chat-completions adapter
//!
//! Any backend that speaks `POST {endpoint}/chat/completions` (OpenAI,
//! OpenRouter, vLLM, ...) can serve every model of a run.

pub mod gateway;
mod protocol;

pub use gateway::OpenAiGateway;
