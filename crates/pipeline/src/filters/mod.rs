//! Pool stages applied between normalization and reranking.

pub mod dedup;
pub mod pool_limit;

pub use dedup::DedupFilter;
pub use pool_limit::PoolLimitFilter;
