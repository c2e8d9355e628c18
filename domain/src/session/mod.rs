//! Chat session domain.
//!
//! - [`entities::Message`]: a single turn sent to a model backend
//! - [`entities::Role`]: who authored the turn

pub mod entities;
