//! HTTP adapter for the external mockup rendering service.

mod client;
mod rate_limit;
mod retry;
mod transport;
mod wire;

pub use client::HttpMockupApi;
pub use rate_limit::{BudgetPermit, RequestBudget};
pub use retry::{RetryPolicy, parse_retry_hint, retry_after_header};
pub use transport::{ApiCredentials, RateLimitedTransport, TransportConfig};
