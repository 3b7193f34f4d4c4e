use async_trait::async_trait;
use regex::Regex;
use std::{fmt::Debug, future::Future, sync::Arc, sync::OnceLock, time::Duration};
use tracing::{debug, warn};

use crate::error::{PlannerError, Result};

pub const DEFAULT_MAX_RETRIES: u32 = 4;
pub const DEFAULT_BASE_DELAY: Duration = Duration::from_millis(600);

const JITTER_MIN: f64 = 0.7;
const JITTER_SPAN: f64 = 0.6;

/// Bounded exponential backoff settings.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt; total attempts is `max_retries + 1`.
    pub max_retries: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            base_delay: DEFAULT_BASE_DELAY,
        }
    }
}

impl RetryPolicy {
    /// Delay before retrying after failed attempt `attempt` (0-based).
    ///
    /// `unit` is a uniform sample in `[0, 1)`; it scales the delay by a
    /// factor in `[0.7, 1.3)`.
    pub fn backoff_delay(&self, attempt: u32, unit: f64) -> Duration {
        let factor = JITTER_MIN + unit.clamp(0.0, 1.0) * JITTER_SPAN;
        let base_ms = self.base_delay.as_millis() as f64;
        let millis = (base_ms * 2f64.powi(attempt as i32) * factor).round();
        Duration::from_millis(millis as u64)
    }
}

/// Something that can wait. Swapped out in tests to record delays.
#[async_trait]
pub trait Sleeper: Send + Sync + Debug {
    async fn sleep(&self, duration: Duration);
}

#[derive(Debug, Default, Clone, Copy)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

fn overload_patterns() -> &'static [Regex; 3] {
    static PATTERNS: OnceLock<[Regex; 3]> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        [
            Regex::new(r"\b503\b").expect("status pattern is valid"),
            Regex::new(r"UNAVAILABLE").expect("status name pattern is valid"),
            Regex::new(r"(?i)model is overloaded").expect("overload pattern is valid"),
        ]
    })
}

/// Whether a provider message carries the transient-overload signature.
pub fn matches_overload_signature(message: &str) -> bool {
    overload_patterns()
        .iter()
        .any(|pattern| pattern.is_match(message))
}

/// Only upstream failures are ever treated as transient.
pub fn is_overload_error(err: &PlannerError) -> bool {
    match err {
        PlannerError::Upstream(message) => matches_overload_signature(message),
        _ => false,
    }
}

/// Runs a fallible async operation, retrying only on provider overload.
#[derive(Clone, Debug)]
pub struct RetryController {
    policy: RetryPolicy,
    sleeper: Arc<dyn Sleeper>,
}

impl Default for RetryController {
    fn default() -> Self {
        Self::new(RetryPolicy::default())
    }
}

impl RetryController {
    pub fn new(policy: RetryPolicy) -> Self {
        Self {
            policy,
            sleeper: Arc::new(TokioSleeper),
        }
    }

    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    /// Non-overload errors are returned unchanged on the spot. Overload on
    /// the final attempt becomes [`PlannerError::ServiceOverloaded`].
    pub async fn run<T, F, Fut>(&self, mut operation: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut attempt = 0;

        loop {
            let err = match operation().await {
                Ok(value) => {
                    if attempt > 0 {
                        debug!(
                            target: "trip_planner::retry",
                            attempt = attempt + 1,
                            "generation succeeded after retry"
                        );
                    }
                    return Ok(value);
                }
                Err(err) => err,
            };

            if !is_overload_error(&err) {
                return Err(err);
            }

            if attempt >= self.policy.max_retries {
                warn!(
                    target: "trip_planner::retry",
                    attempts = attempt + 1,
                    error = %err,
                    "model still overloaded, giving up"
                );
                return Err(PlannerError::ServiceOverloaded);
            }

            let delay = self.policy.backoff_delay(attempt, rand::random::<f64>());
            warn!(
                target: "trip_planner::retry",
                attempt = attempt + 1,
                max_retries = self.policy.max_retries,
                delay_ms = delay.as_millis() as u64,
                "model overloaded, retrying"
            );
            self.sleeper.sleep(delay).await;
            attempt += 1;
        }
    }
}
