//! # Resilience Module
//!
//! Throttling primitives that keep the migrator inside the remote APIs'
//! rate contracts.
//!
//! - **Rate limiting**: fixed-window budgets for the read and write tiers
//! - **Pacing**: explicit pauses between bursts of record creates
//!
//! ## Usage
//!
//! ```rust
//! use space_migrator::remote::ApiTier;
//! use space_migrator::resilience::{RateLimitConfig, RateLimiter};
//! use std::time::Duration;
//!
//! # tokio_test::block_on(async {
//! let limiter = RateLimiter::new(&RateLimitConfig {
//!     read_calls_per_window: 55,
//!     write_calls_per_window: 7,
//!     window: Duration::from_secs(60),
//! });
//!
//! limiter.acquire(ApiTier::Write).await;
//! // management API call goes here
//! assert_eq!(limiter.metrics().write.granted, 1);
//! # });
//! ```

pub mod pacing;
pub mod rate_limiter;

pub use pacing::RecordPacer;
pub use rate_limiter::{RateLimitConfig, RateLimiter, RateLimiterMetrics, TierMetrics};
