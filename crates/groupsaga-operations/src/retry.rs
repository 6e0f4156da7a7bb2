use std::time::Duration;

use groupsaga_config::RetrySettings;

/// Bounded retry schedule for compensation jobs.
///
/// A job runs at most `max_retries + 1` times: attempt `0` is the first run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_retries: u32,
    delay: Duration,
}

impl RetryPolicy {
    #[must_use]
    pub fn new(max_retries: u32, delay: Duration) -> Self {
        Self { max_retries, delay }
    }

    /// The attempt to schedule after `attempt` failed, or `None` when
    /// retries are exhausted.
    #[must_use]
    pub fn next_attempt(&self, attempt: u32) -> Option<u32> {
        (attempt < self.max_retries).then(|| attempt + 1)
    }

    #[must_use]
    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    #[must_use]
    pub fn delay(&self) -> Duration {
        self.delay
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from(&RetrySettings::default())
    }
}

impl From<&RetrySettings> for RetryPolicy {
    fn from(settings: &RetrySettings) -> Self {
        Self::new(settings.max_retries, settings.delay())
    }
}
