use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, OwnedSemaphorePermit, Semaphore};
use tokio::time::{Instant, sleep};
use tracing::debug;

use crate::application::error::MockupError;

/// Process-wide outbound request budget.
///
/// Enforces a rolling window ceiling, a minimum gap between request starts and
/// a cap on in-flight requests. Waiters sleep instead of failing.
#[derive(Debug)]
pub struct RequestBudget {
    window: Duration,
    max_requests: usize,
    min_spacing: Duration,
    in_flight: Arc<Semaphore>,
    starts: Mutex<StartLog>,
}

#[derive(Debug, Default)]
struct StartLog {
    recent: VecDeque<Instant>,
    last: Option<Instant>,
}

/// Held while a request is in flight; dropping it frees a concurrency slot.
#[derive(Debug)]
pub struct BudgetPermit {
    _slot: OwnedSemaphorePermit,
}

impl RequestBudget {
    pub fn new(
        window: Duration,
        max_requests: u32,
        max_concurrency: u32,
        min_spacing: Duration,
    ) -> Self {
        Self {
            window,
            max_requests: max_requests.max(1) as usize,
            min_spacing,
            in_flight: Arc::new(Semaphore::new(max_concurrency.max(1) as usize)),
            starts: Mutex::new(StartLog::default()),
        }
    }

    /// Wait until a request may start and reserve its slot.
    pub async fn acquire(&self) -> Result<BudgetPermit, MockupError> {
        let slot = Arc::clone(&self.in_flight)
            .acquire_owned()
            .await
            .map_err(|_| MockupError::transport("budget::acquire", "request budget closed"))?;

        loop {
            let mut starts = self.starts.lock().await;
            let now = Instant::now();
            let window = self.window;
            while starts
                .recent
                .front()
                .is_some_and(|started| now.duration_since(*started) >= window)
            {
                starts.recent.pop_front();
            }

            let mut wait = Duration::ZERO;
            if starts.recent.len() >= self.max_requests
                && let Some(oldest) = starts.recent.front()
            {
                wait = (*oldest + window).saturating_duration_since(now);
            }
            if let Some(last) = starts.last {
                wait = wait.max((last + self.min_spacing).saturating_duration_since(now));
            }

            if wait.is_zero() {
                starts.recent.push_back(now);
                starts.last = Some(now);
                return Ok(BudgetPermit { _slot: slot });
            }

            drop(starts);
            debug!(
                target = "infra::renderer::rate_limit",
                op = "budget::acquire",
                result = "waiting",
                wait_ms = wait.as_millis() as u64,
                "Outbound request budget exhausted; waiting"
            );
            sleep(wait).await;
        }
    }

    /// Request starts recorded inside the current window.
    pub async fn used(&self) -> usize {
        let starts = self.starts.lock().await;
        let now = Instant::now();
        starts
            .recent
            .iter()
            .filter(|started| now.duration_since(**started) < self.window)
            .count()
    }

    pub fn limit(&self) -> u32 {
        self.max_requests as u32
    }
}
