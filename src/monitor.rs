//! Pipeline orchestration.
//!
//! Spawns one aggregator thread per capture target plus the reporter thread,
//! waits for the time budget or a stop request, then clears the shared
//! running flag and joins every thread. Threads are never killed; each one
//! notices the flag within one read timeout (aggregators) or one sleep slice
//! (reporter).

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use tracing::{error, info, warn};

use crate::aggregator::{Aggregator, AggregatorStats};
use crate::capture::{self, CaptureTarget, FrameSource, PnetFrameReader};
use crate::config::Config;
use crate::error::CaptureError;
use crate::reporter::{ReportRenderer, Reporter};
use crate::store::DeviceStore;
use crate::vendor::VendorRegistry;

/// How often the orchestrating thread checks the stop flag and deadline.
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Outcome of a monitoring run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MonitorSummary {
    /// Aggregator threads started
    pub workers: usize,
    /// Workers whose capture could not be opened
    pub failed_opens: usize,
    /// Counters summed over all workers
    pub stats: AggregatorStats,
    /// Distinct devices at shutdown
    pub devices: usize,
}

/// Result of one aggregator thread.
enum WorkerExit {
    Finished(AggregatorStats),
    OpenFailed,
}

/// Owns the shared state of one monitoring session.
pub struct Monitor {
    config: Config,
    store: Arc<DeviceStore>,
    registry: Arc<VendorRegistry>,
    running: Arc<AtomicBool>,
}

impl Monitor {
    pub fn new(config: Config, registry: VendorRegistry) -> Self {
        Self {
            config,
            store: Arc::new(DeviceStore::new()),
            registry: Arc::new(registry),
            running: Arc::new(AtomicBool::new(true)),
        }
    }

    /// Get a handle to stop the monitor.
    pub fn running_flag(&self) -> Arc<AtomicBool> {
        self.running.clone()
    }

    /// The shared device store.
    pub fn store(&self) -> Arc<DeviceStore> {
        self.store.clone()
    }

    /// Capture on the configured interfaces using pnet.
    pub fn run<R>(&self, renderer: R) -> Result<MonitorSummary>
    where
        R: ReportRenderer + 'static,
    {
        let (active, default) = capture::active_interfaces();
        let targets = self.config.selection.targets(&active, default.as_deref());

        if targets.is_empty() {
            warn!("No usable network interfaces found; nothing will be captured");
        }

        self.run_targets(targets, renderer, open_pnet)
    }

    /// Capture on explicit targets, opening each with `open`.
    ///
    /// Each reader is opened inside its own worker thread and never leaves
    /// it. A target that fails to open is logged and its worker ends; the
    /// rest of the pipeline keeps running.
    pub fn run_targets<R, F>(
        &self,
        targets: Vec<CaptureTarget>,
        renderer: R,
        open: F,
    ) -> Result<MonitorSummary>
    where
        R: ReportRenderer + 'static,
        F: Fn(&CaptureTarget, Duration) -> Result<Box<dyn FrameSource>, CaptureError>
            + Send
            + Sync
            + 'static,
    {
        let open = Arc::new(open);
        let mut workers: Vec<(String, JoinHandle<WorkerExit>)> = Vec::new();

        for target in targets {
            let name = target.name().to_string();
            let open = open.clone();
            let store = self.store.clone();
            let running = self.running.clone();
            let read_timeout = self.config.read_timeout;

            let handle = thread::Builder::new()
                .name(format!("capture-{}", name))
                .spawn(move || {
                    let mut reader = match (*open)(&target, read_timeout) {
                        Ok(reader) => reader,
                        Err(e) => {
                            warn!("Cannot capture on {}: {}", target.name(), e);
                            return WorkerExit::OpenFailed;
                        }
                    };
                    WorkerExit::Finished(Aggregator::new(store).run(reader.as_mut(), &running))
                })
                .with_context(|| format!("Failed to spawn capture thread for {}", name))?;

            workers.push((name, handle));
        }

        let mut reporter = Reporter::new(
            self.store.clone(),
            self.registry.clone(),
            self.config.report_interval,
        )
        .with_filter(self.config.filter);
        let running = self.running.clone();
        let reporter_handle = thread::Builder::new()
            .name("reporter".to_string())
            .spawn(move || reporter.run(&renderer, &running))
            .context("Failed to spawn reporter thread")?;

        info!(
            "Monitoring {} interface(s){}",
            workers.len(),
            match self.config.duration {
                Some(d) => format!(" for {:?}", d),
                None => String::new(),
            }
        );

        self.wait_for_stop();

        let mut summary = MonitorSummary {
            workers: workers.len(),
            ..MonitorSummary::default()
        };

        for (name, handle) in workers {
            match handle.join() {
                Ok(WorkerExit::Finished(stats)) => {
                    summary.stats.merged += stats.merged;
                    summary.stats.discarded += stats.discarded;
                    summary.stats.read_errors += stats.read_errors;
                }
                Ok(WorkerExit::OpenFailed) => summary.failed_opens += 1,
                Err(_) => error!("Capture thread for {} panicked", name),
            }
        }

        if reporter_handle.join().is_err() {
            error!("Reporter thread panicked");
        }

        summary.devices = self.store.len();
        info!(
            "Monitor stopped: {} devices, {} frames merged",
            summary.devices, summary.stats.merged
        );

        Ok(summary)
    }

    /// Block until the time budget runs out or someone clears the running flag,
    /// then make sure the flag is cleared for every thread.
    fn wait_for_stop(&self) {
        let deadline = self.config.duration.map(|d| Instant::now() + d);

        while self.running.load(Ordering::SeqCst) {
            if let Some(deadline) = deadline {
                let now = Instant::now();
                if now >= deadline {
                    info!("Time budget elapsed, stopping");
                    break;
                }
                thread::sleep((deadline - now).min(POLL_INTERVAL));
            } else {
                thread::sleep(POLL_INTERVAL);
            }
        }

        self.running.store(false, Ordering::SeqCst);
    }
}

fn open_pnet(target: &CaptureTarget, read_timeout: Duration) -> Result<Box<dyn FrameSource>, CaptureError> {
    match target {
        CaptureTarget::Interface(name) => Ok(Box::new(PnetFrameReader::open(name, read_timeout)?)),
        CaptureTarget::CatchAll => Ok(Box::new(PnetFrameReader::open_catch_all(read_timeout)?)),
    }
}
