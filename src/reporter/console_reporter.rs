//! Console-based report renderer.

use std::io::{self, Write};
use std::time::Duration;

use crate::reporter::{Report, ReportRenderer, ReportRow};

/// ANSI: clear screen and move the cursor home
const CLEAR_SCREEN: &str = "\x1b[2J\x1b[1;1H";

/// Renders reports as a markdown table on stdout.
pub struct ConsoleRenderer {
    /// Whether to clear the terminal before each report
    clear_screen: bool,
    /// Whether to show the full address and interface columns
    verbose: bool,
}

impl ConsoleRenderer {
    /// Create a new console renderer.
    pub fn new() -> Self {
        Self {
            clear_screen: true,
            verbose: false,
        }
    }

    /// Enable or disable clearing the screen between reports.
    pub fn with_clear_screen(mut self, clear_screen: bool) -> Self {
        self.clear_screen = clear_screen;
        self
    }

    /// Enable or disable verbose output.
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    fn format_row(&self, row: &ReportRow) -> String {
        let ip = row.ip.map(|ip| ip.to_string()).unwrap_or_default();

        if self.verbose {
            format!(
                "| {} | {:15} | {:04x} | {:6} | {:>10} | {:8} | {:30} |",
                row.hardware_address,
                ip,
                row.ethertype,
                row.packet_count,
                row.byte_count,
                row.network,
                row.vendor
            )
        } else {
            format!(
                "| {} | {:15} | {:04x} | {:6} | {:30} |",
                row.prefix, ip, row.ethertype, row.packet_count, row.vendor
            )
        }
    }

    fn format_report(&self, report: &Report) -> String {
        let mut output = String::new();

        if self.clear_screen {
            output.push_str(CLEAR_SCREEN);
        }

        output.push_str(&format!("Elapsed: {}s\n\n", report.totals.elapsed.as_secs()));

        if self.verbose {
            output.push_str("| MAC | IP | Type | Packets | Bytes | Network | Vendor |\n");
            output.push_str("|-|-|-|-|-|-|-|\n");
        } else {
            output.push_str("| MAC | IP | Type | Packets | Vendor |\n");
            output.push_str("|-|-|-|-|-|\n");
        }

        for row in &report.rows {
            output.push_str(&self.format_row(row));
            output.push('\n');
        }

        let totals = &report.totals;
        output.push_str(&format!(
            "\n{} devices ({} shown) | {} packets | {} | {}/s\n",
            totals.devices,
            totals.shown,
            totals.packets,
            format_bytes(totals.bytes as f64),
            format_bytes(totals.throughput)
        ));

        output
    }
}

impl Default for ConsoleRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportRenderer for ConsoleRenderer {
    fn render(&self, report: &Report) {
        let output = self.format_report(report);
        let mut stdout = io::stdout().lock();
        let _ = stdout.write_all(output.as_bytes());
        let _ = stdout.flush();
    }

    fn on_start(&self, interval: Duration) {
        println!("Reporting every {:?}. Press Ctrl+C to stop.\n", interval);
    }

    fn on_stop(&self) {
        println!("\nStopped.");
    }
}

/// Human-readable byte count (B, KB, MB, GB; powers of 1024).
fn format_bytes(bytes: f64) -> String {
    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];

    let mut value = bytes;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }

    if unit == 0 {
        format!("{:.0} {}", value, UNITS[unit])
    } else {
        format!("{:.1} {}", value, UNITS[unit])
    }
}
