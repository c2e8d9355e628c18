//! Progress output for consensus runs

pub mod reporter;
