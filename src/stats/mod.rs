pub mod collector;
pub mod encode;
pub mod store;

pub use collector::{PoolSummary, SampleSource, StatsCollector};
pub use encode::StatsReply;
pub use store::{RetentionPolicy, Sample, SampleStore, StatsWriter};
