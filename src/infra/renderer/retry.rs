use std::time::Duration;

use reqwest::header::{HeaderMap, RETRY_AFTER};

use crate::config::TransportSettings;

const DEFAULT_MAX_ATTEMPTS: u32 = 3;
const DEFAULT_BACKOFF_BASE: Duration = Duration::from_secs(1);
const DEFAULT_BACKOFF_MAX: Duration = Duration::from_secs(30);

/// Retry budget for rate-limited and unreachable requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts including the first one.
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            base_delay: DEFAULT_BACKOFF_BASE,
            max_delay: DEFAULT_BACKOFF_MAX,
        }
    }
}

impl From<&TransportSettings> for RetryPolicy {
    fn from(settings: &TransportSettings) -> Self {
        Self {
            max_attempts: settings.max_attempts.get(),
            base_delay: settings.backoff_base,
            max_delay: settings.backoff_max,
        }
    }
}

impl RetryPolicy {
    /// `base * 2^(attempt-1)`, capped at `max_delay`. `attempt` is 1-based.
    pub fn backoff(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(31);
        self.base_delay
            .checked_mul(1u32 << exponent)
            .unwrap_or(self.max_delay)
            .min(self.max_delay)
    }

    /// Server hint when present, exponential backoff otherwise.
    pub fn delay_for(&self, attempt: u32, hint: Option<Duration>) -> Duration {
        hint.unwrap_or_else(|| self.backoff(attempt))
    }

    pub fn should_retry(&self, attempt: u32) -> bool {
        attempt < self.max_attempts
    }
}

/// Extract the wait from messages such as `Too Many Requests. Please try again
/// after 30 seconds.`
///
/// Every `after` is considered; the first one followed by a number and a time
/// unit wins, so counts like `after 120 requests` are skipped.
pub fn parse_retry_hint(message: &str) -> Option<Duration> {
    let lower = message.to_ascii_lowercase();
    lower
        .match_indices("after")
        .find_map(|(index, marker)| wait_after(&lower[index + marker.len()..]))
}

fn wait_after(rest: &str) -> Option<Duration> {
    let rest = rest.trim_start();
    let digits_len = rest.chars().take_while(char::is_ascii_digit).count();
    if digits_len == 0 {
        return None;
    }
    let value: u64 = rest[..digits_len].parse().ok()?;
    let unit: String = rest[digits_len..]
        .trim_start()
        .chars()
        .take_while(char::is_ascii_alphabetic)
        .collect();
    match unit.as_str() {
        "" | "s" | "sec" | "secs" | "second" | "seconds" => Some(Duration::from_secs(value)),
        "ms" | "millisecond" | "milliseconds" => Some(Duration::from_millis(value)),
        "m" | "min" | "mins" | "minute" | "minutes" => {
            Some(Duration::from_secs(value.saturating_mul(60)))
        }
        _ => None,
    }
}

/// Delta-seconds form of the `Retry-After` header.
pub fn retry_after_header(headers: &HeaderMap) -> Option<Duration> {
    headers
        .get(RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse::<u64>()
        .ok()
        .map(Duration::from_secs)
}
