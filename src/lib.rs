//! Xcode test-result bundles to HTML/PDF reports.
//!
//! The library is one synchronous pipeline: run the extraction tool
//! ([`tool::invoker`]), parse its JSON into a normalized tree
//! ([`results::parser`]), count and flatten it ([`results::aggregate`]) and
//! build the [`report::report_model::ReportModel`] every renderer consumes.
//! [`pipeline::pipeline::generate_report`] chains the steps.

pub mod cli;
pub mod pipeline;
pub mod report;
pub mod results;
pub mod tool;
pub mod trace;
