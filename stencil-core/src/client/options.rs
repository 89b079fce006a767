use crate::{
    logger::{Logger, TracingLogger},
    refresh::RefreshStrategy,
    transport::HttpOptions,
};
use std::{sync::Arc, time::Duration};

/// Default delay between two background refresh ticks.
pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(12 * 60 * 60);

/// Longest delay between two background ticks. Larger intervals are clamped to it.
pub const MAX_REFRESH_INTERVAL: Duration = Duration::from_secs(365 * 24 * 60 * 60);

/// Configuration of a [`Client`](super::Client).
#[derive(Debug, Clone)]
pub struct Options {
    /// Whether stores refresh their registry in the background. Defaults to `false`.
    pub auto_refresh: bool,
    /// Delay between two background ticks. A zero duration falls back to 12 hours, anything
    /// above [`MAX_REFRESH_INTERVAL`] is clamped.
    pub refresh_interval: Duration,
    pub refresh_strategy: RefreshStrategy,
    pub http: HttpOptions,
    /// Sink for background refresh events.
    pub logger: Arc<dyn Logger>,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            auto_refresh: false,
            refresh_interval: DEFAULT_REFRESH_INTERVAL,
            refresh_strategy: RefreshStrategy::default(),
            http: HttpOptions::default(),
            logger: Arc::new(TracingLogger),
        }
    }
}

impl Options {
    /// Enables background refresh every `interval`.
    pub fn with_auto_refresh(mut self, interval: Duration) -> Self {
        self.auto_refresh = true;
        self.refresh_interval = interval;
        self
    }

    pub fn with_refresh_strategy(mut self, strategy: RefreshStrategy) -> Self {
        self.refresh_strategy = strategy;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.http.timeout = timeout;
        self
    }

    /// Adds a header sent with every registry request.
    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.http.headers.insert(key.into(), value.into());
        self
    }

    pub fn with_logger(mut self, logger: Arc<dyn Logger>) -> Self {
        self.logger = logger;
        self
    }

    pub(crate) fn effective_refresh_interval(&self) -> Duration {
        if self.refresh_interval.is_zero() {
            DEFAULT_REFRESH_INTERVAL
        } else {
            self.refresh_interval.min(MAX_REFRESH_INTERVAL)
        }
    }
}
