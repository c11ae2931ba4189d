use std::collections::HashMap;

use parking_lot::RwLock;
use rand::rngs::StdRng;
use rand::Rng;
use serde::Serialize;

use crate::stats::{PoolSummary, SampleSource};

// ─── Constants ───────────────────────────────────────────────────

/// Bookkeeping bytes charged per entry on top of its vsize.
const ENTRY_OVERHEAD: u64 = 128;

/// How far above the best evicted fee rate the admission floor moves.
const FLOOR_INCREMENT: u64 = 1;

// ─── Types ───────────────────────────────────────────────────────

/// One transaction resident in the pool.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PoolTx {
    pub txid: String,
    /// Virtual size in vbytes.
    pub vsize: u64,
    /// Absolute fee in the base unit.
    pub fee: u64,
    pub added_at: u64,
}

impl PoolTx {
    /// Fee rate in base units per kilo-vbyte.
    pub fn fee_per_k(&self) -> u64 {
        self.fee.saturating_mul(1_000) / self.vsize.max(1)
    }
}

/// Point-in-time pool description for the HTTP surface.
#[derive(Debug, Clone, Serialize)]
pub struct PoolInfo {
    pub ready: bool,
    pub tx_count: u64,
    pub dynamic_memory_usage: u64,
    pub min_fee_per_k: u64,
    pub max_memory: u64,
}

#[derive(Debug, PartialEq, Eq)]
pub enum SubmitError {
    /// Pool still warming up — summary metrics and admission unavailable.
    NotReady,
    /// Fee rate below the current admission floor (value = required rate).
    FeeTooLow(u64),
    /// Zero-vsize transactions carry no meaningful fee rate.
    InvalidSize,
}

// ─── Mempool ─────────────────────────────────────────────────────

/// In-memory transaction pool.
///
/// Starts in a warming state where `poll()` and `submit()` are
/// unavailable; `seed()` populates it and flips it to ready.  Once the
/// memory budget is exceeded, the lowest-fee-rate entries are evicted
/// and the admission floor rises just above the best evicted rate, so
/// `min_fee_per_k` tracks congestion the way the sampled metric expects.
pub struct Mempool {
    max_memory: u64,
    base_fee_per_k: u64,
    inner: RwLock<Option<PoolInner>>,
}

struct PoolInner {
    txs: HashMap<String, PoolTx>,
    memory_usage: u64,
    min_fee_per_k: u64,
}

impl Mempool {
    pub fn new(max_memory: u64, base_fee_per_k: u64) -> Self {
        Self {
            max_memory,
            base_fee_per_k,
            inner: RwLock::new(None),
        }
    }

    /// Populates the pool with deterministic startup transactions and
    /// transitions it from warming to ready.
    pub fn seed(&self, rng: &mut StdRng, count: usize, now: u64) {
        let mut inner = PoolInner {
            txs: HashMap::with_capacity(count),
            memory_usage: 0,
            min_fee_per_k: self.base_fee_per_k,
        };

        for _ in 0..count {
            let vsize = rng.gen_range(140..=2_500u64);
            let rate = rng.gen_range(self.base_fee_per_k..=self.base_fee_per_k * 50);
            let fee = rate * vsize / 1_000;
            inner.insert(PoolTx {
                txid: new_txid(),
                vsize,
                fee,
                added_at: now,
            });
        }
        inner.evict_to_budget(self.max_memory);

        *self.inner.write() = Some(inner);
    }

    /// Admits one transaction.  Below-floor fee rates are rejected so the
    /// floor reported by `poll()` is a real admission bound.
    pub fn submit(&self, vsize: u64, fee: u64, now: u64) -> Result<PoolTx, SubmitError> {
        if vsize == 0 {
            return Err(SubmitError::InvalidSize);
        }

        let mut guard = self.inner.write();
        let inner = guard.as_mut().ok_or(SubmitError::NotReady)?;

        let tx = PoolTx {
            txid: new_txid(),
            vsize,
            fee,
            added_at: now,
        };
        if tx.fee_per_k() < inner.min_fee_per_k {
            return Err(SubmitError::FeeTooLow(inner.min_fee_per_k));
        }

        inner.insert(tx.clone());
        inner.evict_to_budget(self.max_memory);
        Ok(tx)
    }

    /// Simulated block: removes up to `max_txs` highest-fee-rate entries
    /// and returns how many were confirmed.
    pub fn confirm(&self, max_txs: usize) -> usize {
        let mut guard = self.inner.write();
        let inner = match guard.as_mut() {
            Some(inner) => inner,
            None => return 0,
        };

        let mut rates: Vec<(u64, String)> = inner
            .txs
            .values()
            .map(|tx| (tx.fee_per_k(), tx.txid.clone()))
            .collect();
        rates.sort_unstable_by(|a, b| b.0.cmp(&a.0));

        let mut confirmed = 0;
        for (_, txid) in rates.into_iter().take(max_txs) {
            if let Some(tx) = inner.txs.remove(&txid) {
                inner.memory_usage -= tx.vsize + ENTRY_OVERHEAD;
                confirmed += 1;
            }
        }
        confirmed
    }

    pub fn info(&self) -> PoolInfo {
        match self.inner.read().as_ref() {
            Some(inner) => PoolInfo {
                ready: true,
                tx_count: inner.txs.len() as u64,
                dynamic_memory_usage: inner.memory_usage,
                min_fee_per_k: inner.min_fee_per_k,
                max_memory: self.max_memory,
            },
            None => PoolInfo {
                ready: false,
                tx_count: 0,
                dynamic_memory_usage: 0,
                min_fee_per_k: 0,
                max_memory: self.max_memory,
            },
        }
    }

    /// Fee rates of every resident transaction, for the distribution
    /// endpoint.  `None` while warming.
    pub fn fee_rates(&self) -> Option<Vec<u64>> {
        self.inner
            .read()
            .as_ref()
            .map(|inner| inner.txs.values().map(PoolTx::fee_per_k).collect())
    }
}

impl SampleSource for Mempool {
    fn poll(&self) -> Option<PoolSummary> {
        self.inner.read().as_ref().map(|inner| PoolSummary {
            tx_count: inner.txs.len() as u64,
            dynamic_memory_usage: inner.memory_usage,
            min_fee_per_k: inner.min_fee_per_k,
        })
    }
}

impl PoolInner {
    fn insert(&mut self, tx: PoolTx) {
        self.memory_usage += tx.vsize + ENTRY_OVERHEAD;
        self.txs.insert(tx.txid.clone(), tx);
    }

    /// Evicts lowest-fee-rate entries until usage fits the budget and
    /// raises the admission floor above the best rate evicted.
    fn evict_to_budget(&mut self, max_memory: u64) {
        while self.memory_usage > max_memory {
            let victim = self
                .txs
                .values()
                .min_by_key(|tx| (tx.fee_per_k(), tx.added_at))
                .map(|tx| tx.txid.clone());
            let Some(txid) = victim else { break };

            let tx = self.txs.remove(&txid).expect("victim resident");
            self.memory_usage -= tx.vsize + ENTRY_OVERHEAD;
            self.min_fee_per_k = self.min_fee_per_k.max(tx.fee_per_k() + FLOOR_INCREMENT);
        }
    }
}

fn new_txid() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

// ─── Tests ───────────────────────────────────────────────────────
