pub mod local_file;
pub mod rate_limiter;

pub use local_file::{parse_price_records, LocalCsvRepository};
pub use rate_limiter::{RateLimitDecision, RateLimitStats, RateLimiter};
