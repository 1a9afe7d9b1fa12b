//! Periodic report construction.

use std::net::Ipv4Addr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use tracing::debug;

use super::ReportRenderer;
use crate::store::{DeviceStore, StoreSnapshot};
use crate::vendor::VendorRegistry;

/// Longest single sleep between stop-flag checks.
const SLEEP_SLICE: Duration = Duration::from_millis(100);

/// Characters of a canonical address shown as the vendor prefix (`aa:bb:cc`)
const PREFIX_DISPLAY_LEN: usize = 8;

/// Which rows make it into a report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ReportFilter {
    /// Every device ever seen
    #[default]
    ShowAll,
    /// Drop devices with neither a known IP nor a resolved vendor
    /// (mostly broadcast/multicast and randomized addresses)
    HideUnresolved,
}

impl ReportFilter {
    pub fn keeps(&self, row: &ReportRow) -> bool {
        match self {
            ReportFilter::ShowAll => true,
            ReportFilter::HideUnresolved => row.ip.is_some() || !row.vendor.is_empty(),
        }
    }
}

/// One device line of a report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportRow {
    pub hardware_address: String,
    /// First three octets, the part the vendor is derived from
    pub prefix: String,
    pub ip: Option<Ipv4Addr>,
    pub ethertype: u16,
    pub network: String,
    pub packet_count: usize,
    pub byte_count: usize,
    /// Empty when the prefix is not in the registry
    pub vendor: String,
}

/// Totals printed under the table.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportTotals {
    /// Devices in the store
    pub devices: usize,
    /// Rows left after filtering
    pub shown: usize,
    /// Frames captured across all interfaces
    pub packets: usize,
    pub bytes: usize,
    /// Bytes per second since the previous report
    pub throughput: f64,
    /// Time since the reporter started
    pub elapsed: Duration,
}

/// A rendered-ready view of the store.
#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    /// Ordered by hardware address
    pub rows: Vec<ReportRow>,
    pub totals: ReportTotals,
}

/// Snapshots the store on a fixed interval and hands reports to a renderer.
pub struct Reporter {
    store: Arc<DeviceStore>,
    registry: Arc<VendorRegistry>,
    filter: ReportFilter,
    interval: Duration,
    started: Instant,
    /// Time and byte total of the previous report
    previous: Option<(Instant, usize)>,
}

impl Reporter {
    pub fn new(store: Arc<DeviceStore>, registry: Arc<VendorRegistry>, interval: Duration) -> Self {
        Self {
            store,
            registry,
            filter: ReportFilter::default(),
            interval,
            started: Instant::now(),
            previous: None,
        }
    }

    /// Set the row filter.
    pub fn with_filter(mut self, filter: ReportFilter) -> Self {
        self.filter = filter;
        self
    }

    /// Build a report from the current store contents.
    pub fn build_report(&mut self, now: Instant) -> Report {
        let snapshot = self.store.snapshot();

        let (since, bytes_before) = self.previous.unwrap_or((self.started, 0));
        let throughput = throughput(
            snapshot.totals.bytes.saturating_sub(bytes_before),
            now.saturating_duration_since(since),
        );
        self.previous = Some((now, snapshot.totals.bytes));

        let devices = snapshot.devices.len();
        let StoreSnapshot { devices: records, totals } = snapshot;

        let rows: Vec<ReportRow> = records
            .into_iter()
            .map(|(mac, record)| ReportRow {
                prefix: mac.get(..PREFIX_DISPLAY_LEN).unwrap_or(&mac).to_string(),
                vendor: self.registry.lookup(&mac).to_string(),
                hardware_address: mac,
                ip: record.last_ip,
                ethertype: record.last_ethertype,
                network: record.network,
                packet_count: record.packet_count,
                byte_count: record.byte_count,
            })
            .filter(|row| self.filter.keeps(row))
            .collect();

        Report {
            totals: ReportTotals {
                devices,
                shown: rows.len(),
                packets: totals.frames,
                bytes: totals.bytes,
                throughput,
                elapsed: now.saturating_duration_since(self.started),
            },
            rows,
        }
    }

    /// Render a report every interval until `running` is cleared, then once more.
    pub fn run<R: ReportRenderer + ?Sized>(&mut self, renderer: &R, running: &AtomicBool) {
        renderer.on_start(self.interval);

        while sleep_while_running(self.interval, running) {
            let report = self.build_report(Instant::now());
            debug!("Rendering report with {} rows", report.rows.len());
            renderer.render(&report);
        }

        let report = self.build_report(Instant::now());
        renderer.render(&report);
        renderer.on_stop();
    }
}

/// Sleep for `duration` in short slices; returns `false` as soon as `running` clears.
fn sleep_while_running(duration: Duration, running: &AtomicBool) -> bool {
    let deadline = Instant::now() + duration;

    loop {
        if !running.load(Ordering::SeqCst) {
            return false;
        }
        let now = Instant::now();
        if now >= deadline {
            return true;
        }
        thread::sleep((deadline - now).min(SLEEP_SLICE));
    }
}

fn throughput(bytes: usize, elapsed: Duration) -> f64 {
    let secs = elapsed.as_secs_f64();
    if secs <= 0.0 {
        return 0.0;
    }
    bytes as f64 / secs
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Observation;
    use std::sync::Mutex;

    fn observation(ip: Option<Ipv4Addr>, length: usize) -> Observation {
        Observation {
            ip,
            ethertype: 0x0800,
            interface: "eth0".to_string(),
            length,
        }
    }

    fn registry() -> Arc<VendorRegistry> {
        Arc::new(VendorRegistry::parse(
            "3C-22-FB   (hex)\t\tApple, Inc.\n00-00-0C   (hex)\t\tCisco Systems, Inc\n",
        ))
    }

    fn populated_store() -> Arc<DeviceStore> {
        let store = Arc::new(DeviceStore::new());
        store.merge("ff:ff:ff:ff:ff:ff", &observation(None, 60));
        store.merge("3c:22:fb:01:02:03", &observation(Some(Ipv4Addr::new(10, 0, 0, 5)), 60));
        store.merge("00:00:0c:0a:0b:0c", &observation(None, 60));
        store.merge("02:11:22:33:44:55", &observation(None, 60));
        store
    }

    #[test]
    fn test_rows_are_ordered_and_resolved() {
        let mut reporter = Reporter::new(populated_store(), registry(), Duration::from_secs(1));

        let report = reporter.build_report(Instant::now());

        let macs: Vec<_> = report.rows.iter().map(|r| r.hardware_address.as_str()).collect();
        assert_eq!(
            macs,
            vec![
                "00:00:0c:0a:0b:0c",
                "02:11:22:33:44:55",
                "3c:22:fb:01:02:03",
                "ff:ff:ff:ff:ff:ff"
            ]
        );

        let apple = &report.rows[2];
        assert_eq!(apple.prefix, "3c:22:fb");
        assert_eq!(apple.vendor, "Apple, Inc.");
        assert_eq!(apple.ip, Some(Ipv4Addr::new(10, 0, 0, 5)));
        assert_eq!(report.rows[0].vendor, "Cisco Systems, Inc");
        assert_eq!(report.rows[1].vendor, "");
        assert_eq!(report.totals.devices, 4);
        assert_eq!(report.totals.shown, 4);
    }

    #[test]
    fn test_hide_unresolved_filter() {
        let mut reporter = Reporter::new(populated_store(), registry(), Duration::from_secs(1))
            .with_filter(ReportFilter::HideUnresolved);

        let report = reporter.build_report(Instant::now());

        let macs: Vec<_> = report.rows.iter().map(|r| r.hardware_address.as_str()).collect();
        // Cisco has a vendor, the Apple host has both; broadcast and random go
        assert_eq!(macs, vec!["00:00:0c:0a:0b:0c", "3c:22:fb:01:02:03"]);
        assert_eq!(report.totals.devices, 4);
        assert_eq!(report.totals.shown, 2);
    }

    #[test]
    fn test_throughput_uses_previous_report() {
        use crate::domain::{DecodedPacket, Endpoint};

        let store = Arc::new(DeviceStore::new());
        let mut reporter = Reporter::new(store.clone(), registry(), Duration::from_secs(1));
        let packet = DecodedPacket {
            interface: "eth0".to_string(),
            source: Endpoint::new("3c:22:fb:01:02:03", None),
            destination: Endpoint::new("00:00:0c:0a:0b:0c", None),
            ethertype: 0x0806,
            length: 500,
            info: None,
        };

        let start = reporter.started;
        store.merge_packet(&packet);
        store.merge_packet(&packet);
        let first = reporter.build_report(start + Duration::from_secs(2));
        assert_eq!(first.totals.packets, 2);
        assert_eq!(first.totals.bytes, 1000);
        assert!((first.totals.throughput - 500.0).abs() < f64::EPSILON);

        store.merge_packet(&packet);
        let second = reporter.build_report(start + Duration::from_secs(4));
        assert_eq!(second.totals.bytes, 1500);
        assert!((second.totals.throughput - 250.0).abs() < f64::EPSILON);
        assert_eq!(second.totals.elapsed, Duration::from_secs(4));
    }

    #[test]
    fn test_throughput_zero_elapsed() {
        assert_eq!(throughput(100, Duration::ZERO), 0.0);
        assert_eq!(throughput(100, Duration::from_millis(500)), 200.0);
    }

    /// Counts callbacks; stops the run after the first periodic render.
    struct CountingRenderer {
        renders: Mutex<usize>,
        events: Mutex<Vec<&'static str>>,
        running: Arc<AtomicBool>,
    }

    impl ReportRenderer for CountingRenderer {
        fn render(&self, _report: &Report) {
            *self.renders.lock().unwrap() += 1;
            self.running.store(false, Ordering::SeqCst);
        }

        fn on_start(&self, _interval: Duration) {
            self.events.lock().unwrap().push("start");
        }

        fn on_stop(&self) {
            self.events.lock().unwrap().push("stop");
        }
    }

    #[test]
    fn test_run_renders_until_stopped_then_once_more() {
        let running = Arc::new(AtomicBool::new(true));
        let renderer = CountingRenderer {
            renders: Mutex::new(0),
            events: Mutex::new(Vec::new()),
            running: running.clone(),
        };
        let mut reporter = Reporter::new(populated_store(), registry(), Duration::from_millis(10));

        reporter.run(&renderer, &running);

        assert_eq!(*renderer.renders.lock().unwrap(), 2);
        assert_eq!(*renderer.events.lock().unwrap(), vec!["start", "stop"]);
    }

    #[test]
    fn test_sleep_while_running_stops_early() {
        let running = AtomicBool::new(false);
        let started = Instant::now();

        assert!(!sleep_while_running(Duration::from_secs(30), &running));
        assert!(started.elapsed() < Duration::from_secs(1));
    }
}
