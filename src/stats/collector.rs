use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::task::JoinHandle;

use super::store::{Sample, StatsWriter};

// ─── Sampling source ─────────────────────────────────────────────

/// Summary metrics read from the pool on each tick.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct PoolSummary {
    pub tx_count: u64,
    pub dynamic_memory_usage: u64,
    pub min_fee_per_k: u64,
}

/// Anything the collector can sample.  `None` means the metrics are
/// momentarily unavailable (pool still warming up) — the tick is skipped
/// and sampling resumes on the next one.
pub trait SampleSource: Send + Sync {
    fn poll(&self) -> Option<PoolSummary>;
}

// ─── Collector ───────────────────────────────────────────────────

/// Background sampling task.
///
/// One dedicated tokio task ticks on a fixed interval, polls the source,
/// and appends at most one sample per tick through the exclusive
/// `StatsWriter`.  Sampling failures are never fatal.  Shutdown clears
/// the run flag first and then joins the task, so by the time
/// [`StatsCollector::shutdown`] returns no further appends can happen.
pub struct StatsCollector {
    running: Arc<AtomicBool>,
    ticks_skipped: Arc<AtomicU64>,
    handle: JoinHandle<()>,
}

impl StatsCollector {
    /// Arms the sampling timer and transitions the subsystem to Running.
    pub fn start(
        source: Arc<dyn SampleSource>,
        writer: StatsWriter,
        interval: Duration,
    ) -> StatsCollector {
        let running = Arc::new(AtomicBool::new(true));
        let ticks_skipped = Arc::new(AtomicU64::new(0));

        let run_flag = running.clone();
        let skipped = ticks_skipped.clone();
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                ticker.tick().await;
                if !run_flag.load(Ordering::Relaxed) {
                    break;
                }
                if !collect_once(source.as_ref(), &writer, epoch_now()) {
                    skipped.fetch_add(1, Ordering::Relaxed);
                }
            }
        });

        StatsCollector {
            running,
            ticks_skipped,
            handle,
        }
    }

    /// Ticks skipped so far because the source was unavailable.
    pub fn ticks_skipped(&self) -> u64 {
        self.ticks_skipped.load(Ordering::Relaxed)
    }

    /// Disarms the timer and waits for the task to exit.  The store must
    /// only be torn down after this returns.
    pub async fn shutdown(self) {
        self.running.store(false, Ordering::SeqCst);
        // Ignore JoinError — an aborted runtime means no more appends anyway.
        let _ = self.handle.await;
    }
}

/// One tick: poll the source and append a single timestamped sample.
/// Returns false when the tick was skipped.
fn collect_once(source: &dyn SampleSource, writer: &StatsWriter, now: u64) -> bool {
    match source.poll() {
        Some(summary) => {
            writer.append(Sample {
                timestamp: now,
                tx_count: summary.tx_count,
                dynamic_memory_usage: summary.dynamic_memory_usage,
                min_fee_per_k: summary.min_fee_per_k,
            });
            true
        }
        None => false,
    }
}

fn epoch_now() -> u64 {
    chrono::Utc::now().timestamp().max(0) as u64
}

// ─── Tests ───────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::store::{RetentionPolicy, SampleStore};

    /// Source that is unavailable for the first `warmup_polls` polls.
    struct StubSource {
        polls: AtomicU64,
        warmup_polls: u64,
    }

    impl StubSource {
        fn new(warmup_polls: u64) -> Self {
            Self {
                polls: AtomicU64::new(0),
                warmup_polls,
            }
        }
    }

    impl SampleSource for StubSource {
        fn poll(&self) -> Option<PoolSummary> {
            let n = self.polls.fetch_add(1, Ordering::SeqCst);
            if n < self.warmup_polls {
                return None;
            }
            Some(PoolSummary {
                tx_count: 7,
                dynamic_memory_usage: 4_096,
                min_fee_per_k: 1_000,
            })
        }
    }

    #[test]
    fn tick_appends_exactly_one_sample() {
        let (store, writer) = SampleStore::with_policy(RetentionPolicy::by_count(8));
        let source = StubSource::new(0);

        assert!(collect_once(&source, &writer, 1_000));
        assert_eq!(store.len(), 1);

        let got = store.newest().unwrap();
        assert_eq!(got.timestamp, 1_000);
        assert_eq!(got.tx_count, 7);
        assert_eq!(got.dynamic_memory_usage, 4_096);
        assert_eq!(got.min_fee_per_k, 1_000);
    }

    #[test]
    fn unavailable_source_skips_the_tick() {
        let (store, writer) = SampleStore::with_policy(RetentionPolicy::by_count(8));
        let source = StubSource::new(2);

        assert!(!collect_once(&source, &writer, 1));
        assert!(!collect_once(&source, &writer, 2));
        assert_eq!(store.len(), 0);

        // Sampling resumes once the source recovers.
        assert!(collect_once(&source, &writer, 3));
        assert_eq!(store.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn collector_samples_until_shutdown() {
        let (store, writer) = SampleStore::with_policy(RetentionPolicy::by_count(1_024));
        let source = Arc::new(StubSource::new(0));

        let collector =
            StatsCollector::start(source.clone(), writer, Duration::from_secs(1));

        tokio::time::sleep(Duration::from_millis(3_500)).await;
        assert!(store.len() >= 1);

        collector.shutdown().await;
        let frozen = store.len();

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(store.len(), frozen);
    }

    #[tokio::test(start_paused = true)]
    async fn skipped_ticks_are_counted_not_fatal() {
        let (store, writer) = SampleStore::with_policy(RetentionPolicy::by_count(1_024));
        let source = Arc::new(StubSource::new(u64::MAX));

        let collector =
            StatsCollector::start(source.clone(), writer, Duration::from_secs(1));

        tokio::time::sleep(Duration::from_millis(3_500)).await;
        assert_eq!(store.len(), 0);
        assert!(collector.ticks_skipped() >= 1);

        collector.shutdown().await;
    }
}
