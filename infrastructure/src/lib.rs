//! Infrastructure layer for llm-consensus
//!
//! This crate contains adapters that implement the ports defined
//! in the application layer, plus configuration file loading.

pub mod config;
pub mod logging;
pub mod openai;
pub mod persistence;
pub mod report;

// Re-export commonly used types
pub use config::{
    ConfigError, ConfigLoader, FileApiConfig, FileConfig, FileConsensusConfig, FileOutputConfig,
    load_models_file,
};
pub use logging::{ChannelRunLogger, LogEntry, LogFileWriter};
pub use openai::OpenAiGateway;
pub use persistence::{FileResponseStore, sanitize_file_name};
pub use report::ReportWriter;
