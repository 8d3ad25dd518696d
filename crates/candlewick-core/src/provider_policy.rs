use std::time::Duration;

/// Request budget for one provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderPolicy {
    pub max_concurrency: usize,
    pub quota_window: Duration,
    pub quota_limit: u32,
}

/// Whole-run retry schedule applied by the scheduler, never per request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskRetryPolicy {
    pub max_retries: u32,
    pub delay: Duration,
}

impl ProviderPolicy {
    /// Alpha Vantage free tier: 5 requests per minute, one at a time.
    pub fn alphavantage_default() -> Self {
        Self {
            max_concurrency: 1,
            quota_window: Duration::from_secs(60),
            quota_limit: 5,
        }
    }

    pub fn with_requests_per_minute(mut self, limit: u32) -> Self {
        self.quota_window = Duration::from_secs(60);
        self.quota_limit = limit.max(1);
        self
    }

    pub fn with_max_concurrency(mut self, max_concurrency: usize) -> Self {
        self.max_concurrency = max_concurrency.max(1);
        self
    }
}

impl Default for TaskRetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            delay: Duration::from_secs(5 * 60),
        }
    }
}

impl TaskRetryPolicy {
    /// Delay before retry number `attempt` (1-based), or `None` once exhausted.
    pub fn delay_for(&self, attempt: u32) -> Option<Duration> {
        (attempt >= 1 && attempt <= self.max_retries).then_some(self.delay)
    }
}
