//! Core domain concepts shared across all subdomains.
//!
//! - [`model::Model`]: identifier of a model backend
//! - [`question::Question`]: a validated prompt to pose to the models
//! - [`error::DomainError`]: domain-level errors

pub mod error;
pub mod model;
pub mod question;
