//! Periodic reporting trigger on a background thread.
//!
//! The thread sleeps in short slices so `stop()` returns promptly even with a
//! long interval.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use crate::aggregator::StatisticsOutcome;
use crate::lifecycle::ReportingLifecycle;

const POLL_SLICE: Duration = Duration::from_millis(20);

pub struct ReportScheduler {
    shutdown: Arc<AtomicBool>,
    cycles: Arc<AtomicU64>,
    handle: Option<JoinHandle<()>>,
}

impl ReportScheduler {
    /// Start running `lifecycle.run_report_cycle()` every `interval`.
    pub fn spawn(lifecycle: Arc<ReportingLifecycle>, interval: Duration) -> std::io::Result<Self> {
        let shutdown = Arc::new(AtomicBool::new(false));
        let cycles = Arc::new(AtomicU64::new(0));

        let handle = {
            let shutdown = Arc::clone(&shutdown);
            let cycles = Arc::clone(&cycles);
            thread::Builder::new()
                .name("report-scheduler".into())
                .spawn(move || run_loop(&lifecycle, interval, &shutdown, &cycles))?
        };

        Ok(Self {
            shutdown,
            cycles,
            handle: Some(handle),
        })
    }

    /// Number of cycles completed so far.
    pub fn cycles(&self) -> u64 {
        self.cycles.load(Ordering::SeqCst)
    }

    /// Signal the thread and wait for it to exit.
    pub fn stop(mut self) -> u64 {
        self.shutdown_and_join();
        self.cycles()
    }

    fn shutdown_and_join(&mut self) {
        self.shutdown.store(true, Ordering::SeqCst);
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                warn!("report scheduler thread panicked");
            }
        }
    }
}

impl Drop for ReportScheduler {
    fn drop(&mut self) {
        self.shutdown_and_join();
    }
}

fn run_loop(
    lifecycle: &ReportingLifecycle,
    interval: Duration,
    shutdown: &AtomicBool,
    cycles: &AtomicU64,
) {
    let mut next = Instant::now() + interval;
    while !shutdown.load(Ordering::SeqCst) {
        let now = Instant::now();
        if now < next {
            thread::sleep(POLL_SLICE.min(next - now));
            continue;
        }
        next = now + interval;

        let cycle = lifecycle.run_report_cycle();
        let n = cycles.fetch_add(1, Ordering::SeqCst) + 1;
        match cycle.outcome {
            StatisticsOutcome::Computed(_) => debug!(cycle = n, "periodic report computed"),
            StatisticsOutcome::NotReady { missing } => {
                debug!(cycle = n, ?missing, "periodic report skipped")
            }
            StatisticsOutcome::Failed { reason } => {
                warn!(cycle = n, %reason, "periodic report failed")
            }
        }
    }
}
