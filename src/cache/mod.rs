//! Mockup result cache.
//!
//! Rendering is slow and rate limited, so completed results are memoised under
//! a content-addressed key for a fixed time-to-live.
//!
//! ## Configuration
//!
//! ```toml
//! [cache]
//! ttl_seconds = 604800
//! capacity = 2048
//! ```

mod clock;
mod config;
mod keys;
mod lock;
mod store;

pub use clock::{Clock, SystemClock};
pub use config::CacheConfig;
pub use keys::{generate_key, request_key};
pub use store::{CacheEntry, MemoryResultCache, ResultCache};
