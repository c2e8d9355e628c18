//! Saving rendered reports

mod writer;

pub use writer::ReportWriter;
