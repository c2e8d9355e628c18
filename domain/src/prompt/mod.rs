//! Prompt domain
//!
//! Templates for the divergent and judge prompts of a consensus run.

mod template;

pub use template::PromptTemplate;
