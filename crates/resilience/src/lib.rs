// crates/resilience/src/lib.rs
//! Resilience patterns for remote data sources
//!
//! This module provides:
//! - Retry with exponential backoff
//! - Request timeouts
//!
//! The sync engine never retries on its own; a remote data source wraps its
//! requests with these helpers so that backoff stays invisible to callers.
//!
//! # Example
//!
//! ```rust
//! use showsync_resilience::{with_retry, RetryPolicy};
//! use std::time::Duration;
//!
//! # async fn fetch() -> Result<u32, std::io::Error> { Ok(7) }
//! # async fn run() -> Result<u32, std::io::Error> {
//! let policy = RetryPolicy::new(3).with_initial_delay(Duration::from_millis(100));
//! let value = with_retry(&policy, |_| true, || fetch()).await?;
//! # Ok(value)
//! # }
//! ```

mod error;
mod retry;
mod timeout;

pub use error::{ResilienceError, ResilienceResult};
pub use retry::{with_retry, RetryPolicy};
pub use timeout::{with_timeout, Timeout};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_exports_accessible() {
        let _: RetryPolicy = RetryPolicy::default();
        let _: Timeout = Timeout::new(std::time::Duration::from_secs(5));
    }
}
