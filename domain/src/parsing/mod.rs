//! Parsing of free-form model output.
//!
//! Both parsers are total: malformed or unexpected text degrades to a
//! best-effort value instead of an error.
//!
//! - [`parse_model_response`]: one model's divergent answer
//! - [`parse_synthesis`]: the judge's verdict, via an ordered decoder chain

mod markup;
mod model_response;
mod synthesis;
mod text;

pub use model_response::parse_model_response;
pub use synthesis::{ParsedSynthesis, SynthesisFormat, parse_synthesis};
pub use text::normalize_confidence;
