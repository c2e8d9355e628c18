//! Intermediate response persistence between the two phases

mod file_store;

pub use file_store::{FileResponseStore, sanitize_file_name};
