//! Presentation layer for llm-consensus
//!
//! This crate contains CLI definitions, output formatters
//! and progress reporters.

pub mod cli;
pub mod output;
pub mod progress;

// Re-export commonly used types
pub use cli::commands::{Cli, OutputFormat};
pub use output::console::ConsoleFormatter;
pub use output::formatter::OutputFormatter;
pub use output::markdown::MarkdownFormatter;
pub use output::render;
pub use progress::reporter::{ProgressReporter, SimpleProgress};
