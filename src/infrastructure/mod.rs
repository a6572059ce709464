// src/infrastructure/mod.rs
//
// Infrastructure Layer
//
// Contains implementation details that support the domain
// but are not part of the domain itself.

pub mod logging;
pub mod unmatched_report;

pub use unmatched_report::UnmatchedReport;
