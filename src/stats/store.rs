use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;
use serde::Serialize;

// ─── Sample ──────────────────────────────────────────────────────

/// One point-in-time observation of the mempool.
/// Value type — copied around freely, never shared mutably.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Sample {
    /// Seconds since the Unix epoch, non-decreasing in store order.
    pub timestamp: u64,
    /// Transactions in the pool at sample time.
    pub tx_count: u64,
    /// Dynamic memory usage of the pool, bytes.
    pub dynamic_memory_usage: u64,
    /// Minimum fee rate for acceptance, per kilo-vbyte.
    pub min_fee_per_k: u64,
}

// ─── Retention policy ────────────────────────────────────────────

/// How long samples are kept before eviction.
///
/// The count bound always applies: an append that would exceed it evicts
/// exactly the single oldest sample, atomically with the insert.  The age
/// bound is optional and prunes head samples older than `max_age` relative
/// to the newest sample.
#[derive(Debug, Clone, Copy)]
pub struct RetentionPolicy {
    pub max_samples: usize,
    pub max_age: Option<Duration>,
}

impl RetentionPolicy {
    pub fn by_count(max_samples: usize) -> Self {
        Self {
            max_samples,
            max_age: None,
        }
    }

    pub fn with_max_age(mut self, max_age: Duration) -> Self {
        self.max_age = Some(max_age);
        self
    }
}

// ─── Query result ────────────────────────────────────────────────

/// The contiguous slice of history selected by a range query.
/// `time_from`/`time_to` are the timestamps of the first and last
/// returned sample, or both zero when the result is empty.
#[derive(Debug, Clone)]
pub struct StatsRange {
    pub time_from: u64,
    pub time_to: u64,
    pub samples: Vec<Sample>,
}

impl StatsRange {
    fn empty() -> Self {
        Self {
            time_from: 0,
            time_to: 0,
            samples: Vec::new(),
        }
    }
}

// ─── SampleStore ─────────────────────────────────────────────────

/// Bounded, time-ordered history of mempool samples.
///
/// Single-writer / multi-reader: the one `StatsWriter` returned by
/// [`SampleStore::with_policy`] is the only handle that can append, so
/// the write path never contends with another writer.  Readers query
/// through the shared `Arc` and only ever see a store where an append
/// and its triggering eviction are both visible or neither is.
pub struct SampleStore {
    policy: RetentionPolicy,
    inner: RwLock<VecDeque<Sample>>,
}

/// Exclusive append handle, owned by the collector.
pub struct StatsWriter {
    store: Arc<SampleStore>,
}

impl SampleStore {
    /// Builds the store and splits it into a shared read handle and the
    /// single write handle.
    pub fn with_policy(policy: RetentionPolicy) -> (Arc<SampleStore>, StatsWriter) {
        let store = Arc::new(SampleStore {
            policy,
            inner: RwLock::new(VecDeque::with_capacity(policy.max_samples + 1)),
        });
        let writer = StatsWriter {
            store: store.clone(),
        };
        (store, writer)
    }

    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    /// Most recent sample, if any.
    pub fn newest(&self) -> Option<Sample> {
        self.inner.read().back().copied()
    }

    /// Returns the retained samples with `from <= timestamp <= to`.
    ///
    /// `(0, 0)` selects everything.  Any other `to < from`, and any range
    /// with no overlap, yields an empty result with zeroed bounds rather
    /// than an error.  Samples are sorted, so selection is two binary
    /// searches plus a copy of the hits: O(log n + k).
    pub fn query_range(&self, from: u64, to: u64) -> StatsRange {
        let (from, to) = if from == 0 && to == 0 {
            (u64::MIN, u64::MAX)
        } else {
            (from, to)
        };
        if to < from {
            return StatsRange::empty();
        }

        let samples = self.inner.read();
        let lo = samples.partition_point(|s| s.timestamp < from);
        let hi = samples.partition_point(|s| s.timestamp <= to);
        if lo >= hi {
            return StatsRange::empty();
        }

        let hits: Vec<Sample> = samples.range(lo..hi).copied().collect();
        StatsRange {
            time_from: hits[0].timestamp,
            time_to: hits[hits.len() - 1].timestamp,
            samples: hits,
        }
    }

    /// Tail insert plus head evictions, all under one write lock so
    /// readers never observe a half-applied append.
    fn append(&self, mut sample: Sample) {
        let mut samples = self.inner.write();

        // A backwards clock step must not break store ordering.
        if let Some(last) = samples.back() {
            if sample.timestamp < last.timestamp {
                sample.timestamp = last.timestamp;
            }
        }

        samples.push_back(sample);
        if samples.len() > self.policy.max_samples {
            samples.pop_front();
        }

        if let Some(max_age) = self.policy.max_age {
            let cutoff = sample.timestamp.saturating_sub(max_age.as_secs());
            while samples.front().map_or(false, |s| s.timestamp < cutoff) {
                samples.pop_front();
            }
        }
    }
}

impl StatsWriter {
    pub fn append(&self, sample: Sample) {
        self.store.append(sample);
    }
}

// ─── Tests ───────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(ts: u64) -> Sample {
        Sample {
            timestamp: ts,
            tx_count: ts * 10,
            dynamic_memory_usage: ts * 1_000,
            min_fee_per_k: ts,
        }
    }

    fn filled(capacity: usize, timestamps: &[u64]) -> (Arc<SampleStore>, StatsWriter) {
        let (store, writer) = SampleStore::with_policy(RetentionPolicy::by_count(capacity));
        for &ts in timestamps {
            writer.append(sample(ts));
        }
        (store, writer)
    }

    #[test]
    fn append_evicts_single_oldest_at_capacity() {
        let (store, _writer) = filled(3, &[1, 2, 3, 4]);

        let all = store.query_range(0, 0);
        let timestamps: Vec<u64> = all.samples.iter().map(|s| s.timestamp).collect();
        assert_eq!(timestamps, vec![2, 3, 4]);
        assert_eq!(store.len(), 3);
        assert_eq!(all.time_from, 2);
        assert_eq!(all.time_to, 4);
    }

    #[test]
    fn size_never_exceeds_capacity() {
        let (store, writer) = SampleStore::with_policy(RetentionPolicy::by_count(5));
        for ts in 1..=100 {
            writer.append(sample(ts));
            assert!(store.len() <= 5);
        }
    }

    #[test]
    fn timestamps_stay_non_decreasing() {
        let (store, writer) = SampleStore::with_policy(RetentionPolicy::by_count(10));
        for &ts in &[5, 7, 3, 9, 2] {
            writer.append(sample(ts));
        }
        let all = store.query_range(0, 0).samples;
        for pair in all.windows(2) {
            assert!(pair[0].timestamp <= pair[1].timestamp);
        }
        // Backwards clock readings are clamped, not reordered.
        assert_eq!(all[2].timestamp, 7);
    }

    #[test]
    fn explicit_range_is_inclusive() {
        let (store, _writer) = filled(3, &[1, 2, 3, 4]);

        let range = store.query_range(2, 3);
        let timestamps: Vec<u64> = range.samples.iter().map(|s| s.timestamp).collect();
        assert_eq!(timestamps, vec![2, 3]);
        assert_eq!(range.time_from, 2);
        assert_eq!(range.time_to, 3);
    }

    #[test]
    fn empty_store_yields_zeroed_bounds() {
        let (store, _writer) = SampleStore::with_policy(RetentionPolicy::by_count(3));
        let range = store.query_range(0, 0);
        assert!(range.samples.is_empty());
        assert_eq!(range.time_from, 0);
        assert_eq!(range.time_to, 0);
    }

    #[test]
    fn inverted_range_yields_empty_result() {
        let (store, _writer) = filled(5, &[1, 2, 3]);
        let range = store.query_range(10, 1);
        assert!(range.samples.is_empty());
        assert_eq!(range.time_from, 0);
        assert_eq!(range.time_to, 0);
    }

    #[test]
    fn disjoint_range_yields_empty_result() {
        let (store, _writer) = filled(5, &[10, 20, 30]);
        for (from, to) in [(1, 5), (40, 100)] {
            let range = store.query_range(from, to);
            assert!(range.samples.is_empty());
            assert_eq!(range.time_from, 0);
            assert_eq!(range.time_to, 0);
        }
    }

    #[test]
    fn zero_from_with_bounded_to_is_a_closed_range() {
        let (store, _writer) = filled(5, &[10, 20, 30]);
        let range = store.query_range(0, 20);
        let timestamps: Vec<u64> = range.samples.iter().map(|s| s.timestamp).collect();
        assert_eq!(timestamps, vec![10, 20]);
    }

    #[test]
    fn sample_fields_survive_retrieval_exactly() {
        let (store, writer) = SampleStore::with_policy(RetentionPolicy::by_count(4));
        let original = Sample {
            timestamp: 1_700_000_000,
            tx_count: 4_821,
            dynamic_memory_usage: 73_400_320,
            min_fee_per_k: 1_413,
        };
        writer.append(original);

        let got = store.query_range(1_700_000_000, 1_700_000_000);
        assert_eq!(got.samples, vec![original]);
    }

    #[test]
    fn age_bound_prunes_expired_heads() {
        let policy = RetentionPolicy::by_count(100).with_max_age(Duration::from_secs(10));
        let (store, writer) = SampleStore::with_policy(policy);
        for &ts in &[100, 105, 109, 120] {
            writer.append(sample(ts));
        }
        // Cutoff is 120 - 10 = 110: everything before it is gone.
        let timestamps: Vec<u64> = store
            .query_range(0, 0)
            .samples
            .iter()
            .map(|s| s.timestamp)
            .collect();
        assert_eq!(timestamps, vec![120]);
    }

    #[test]
    fn concurrent_readers_never_see_torn_state() {
        use std::sync::atomic::{AtomicBool, Ordering};
        use std::thread;

        const CAPACITY: usize = 64;
        let (store, writer) = SampleStore::with_policy(RetentionPolicy::by_count(CAPACITY));
        let done = Arc::new(AtomicBool::new(false));

        let readers: Vec<_> = (0..4)
            .map(|_| {
                let store = store.clone();
                let done = done.clone();
                thread::spawn(move || {
                    while !done.load(Ordering::Relaxed) {
                        let range = store.query_range(0, 0);
                        assert!(range.samples.len() <= CAPACITY);
                        for s in &range.samples {
                            // Writer always derives fields from the
                            // timestamp, so a torn sample is detectable.
                            assert_eq!(s.tx_count, s.timestamp * 10);
                            assert_eq!(s.dynamic_memory_usage, s.timestamp * 1_000);
                        }
                        for pair in range.samples.windows(2) {
                            assert!(pair[0].timestamp <= pair[1].timestamp);
                        }
                    }
                })
            })
            .collect();

        for ts in 1..=10_000u64 {
            writer.append(sample(ts));
        }
        done.store(true, Ordering::Relaxed);

        for reader in readers {
            reader.join().expect("reader panicked");
        }
        assert_eq!(store.len(), CAPACITY);
    }
}
