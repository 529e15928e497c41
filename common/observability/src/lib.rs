pub mod history;
pub mod metrics;

pub use history::{ErrorHistory, ErrorRecord, DEFAULT_HISTORY_LIMIT};
pub use metrics::ClientMetrics;
