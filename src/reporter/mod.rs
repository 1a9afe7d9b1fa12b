//! Reporting module for aggregated device statistics.
//!
//! `Reporter` turns store snapshots into `Report`s; a `ReportRenderer`
//! decides what they look like.

mod console_reporter;
mod report;

pub use console_reporter::ConsoleRenderer;
pub use report::{Report, ReportFilter, ReportRow, ReportTotals, Reporter};

use std::time::Duration;

/// Output side of the reporter.
///
/// Kept minimal: it only presents reports, it never filters or
/// aggregates. Implementations can target a terminal, a log, a file, etc.
pub trait ReportRenderer: Send {
    /// Present one report.
    fn render(&self, report: &Report);

    /// Called when the reporter starts.
    fn on_start(&self, interval: Duration);

    /// Called after the final report.
    fn on_stop(&self);
}
