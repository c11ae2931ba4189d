use serde::Serialize;

use super::store::StatsRange;

// ─── Wire format ─────────────────────────────────────────────────

/// The stats reply as it goes over the wire:
///
/// ```json
/// { "time_from": t0, "time_to": t1,
///   "samples": [ [delta_secs, tx_count, dynamic_memory_usage, min_fee_per_k], ... ] }
/// ```
///
/// Samples use flat positional arrays instead of objects — a deliberate
/// size optimization for large histories, and a compatibility surface:
/// the element order must never change.
#[derive(Debug, Clone, Serialize)]
pub struct StatsReply {
    pub time_from: u64,
    pub time_to: u64,
    pub samples: Vec<FlatSample>,
}

/// `(delta_secs, tx_count, dynamic_memory_usage, min_fee_per_k)` —
/// serde encodes the tuple struct as a 4-element JSON array.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct FlatSample(pub u64, pub u64, pub u64, pub u64);

impl From<StatsRange> for StatsReply {
    fn from(range: StatsRange) -> Self {
        let time_from = range.time_from;
        let samples = range
            .samples
            .iter()
            .map(|s| {
                FlatSample(
                    s.timestamp - time_from,
                    s.tx_count,
                    s.dynamic_memory_usage,
                    s.min_fee_per_k,
                )
            })
            .collect();

        StatsReply {
            time_from,
            time_to: range.time_to,
            samples,
        }
    }
}

// ─── Tests ───────────────────────────────────────────────────────
