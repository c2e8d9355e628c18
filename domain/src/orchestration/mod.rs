//! Orchestration domain
//!
//! Run-level concepts: the two [`Phase`](entities::Phase)s of a consensus
//! run and the [`RunId`](entities::RunId) that ties together persistence
//! and logging for one run.

pub mod entities;

pub use entities::{Phase, RunId};
