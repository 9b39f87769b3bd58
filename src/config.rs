// Copyright 2024 litep2p developers
//
// Permission is hereby granted, free of charge, to any person obtaining a
// copy of this software and associated documentation files (the "Software"),
// to deal in the Software without restriction, including without limitation
// the rights to use, copy, modify, merge, publish, distribute, sublicense,
// and/or sell copies of the Software, and to permit persons to whom the
// Software is furnished to do so, subject to the following conditions:
//
// The above copyright notice and this permission notice shall be included in
// all copies or substantial portions of the Software.
//
// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS
// OR IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
// FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
// AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
// LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING
// FROM, OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER
// DEALINGS IN THE SOFTWARE.

//! [`LimitDialer`](`crate::LimitDialer`) configuration.

use crate::{
    executor::{DefaultExecutor, Executor},
    Error,
};

use std::{sync::Arc, time::Duration};

/// Default number of concurrent dial attempts per peer.
pub const DEFAULT_PER_PEER_LIMIT: usize = 8usize;

/// Default timeout for a single dial attempt.
pub const DEFAULT_DIAL_TIMEOUT: Duration = Duration::from_secs(30);

/// Default time an idle per-peer queue is kept before it can be evicted.
pub const DEFAULT_IDLE_QUEUE_TIMEOUT: Duration = Duration::from_secs(60);

/// Configuration builder for [`LimitDialer`](`crate::LimitDialer`).
pub struct ConfigBuilder {
    /// Maximum number of concurrent dial attempts per peer.
    per_peer_limit: usize,

    /// Timeout for a single dial attempt.
    dial_timeout: Duration,

    /// How long an idle per-peer queue is kept around.
    idle_queue_timeout: Option<Duration>,

    /// Executor for running dial attempts.
    executor: Option<Arc<dyn Executor>>,
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigBuilder {
    /// Create new empty [`ConfigBuilder`].
    pub fn new() -> Self {
        Self {
            per_peer_limit: DEFAULT_PER_PEER_LIMIT,
            dial_timeout: DEFAULT_DIAL_TIMEOUT,
            idle_queue_timeout: Some(DEFAULT_IDLE_QUEUE_TIMEOUT),
            executor: None,
        }
    }

    /// Set the maximum number of dial attempts that may run concurrently for one peer.
    pub fn with_per_peer_limit(mut self, per_peer_limit: usize) -> Self {
        self.per_peer_limit = per_peer_limit;
        self
    }

    /// Set the timeout of a single dial attempt.
    pub fn with_dial_timeout(mut self, dial_timeout: Duration) -> Self {
        self.dial_timeout = dial_timeout;
        self
    }

    /// Set how long an idle per-peer queue is kept before it may be evicted.
    ///
    /// `None` keeps queues for the lifetime of the dialer.
    pub fn with_idle_queue_timeout(mut self, idle_queue_timeout: Option<Duration>) -> Self {
        self.idle_queue_timeout = idle_queue_timeout;
        self
    }

    /// Add executor for running dial attempts.
    pub fn with_executor(mut self, executor: Arc<dyn Executor>) -> Self {
        self.executor = Some(executor);
        self
    }

    /// Build [`Config`].
    pub fn build(mut self) -> Config {
        Config {
            per_peer_limit: self.per_peer_limit,
            dial_timeout: self.dial_timeout,
            idle_queue_timeout: self.idle_queue_timeout,
            executor: self.executor.take().unwrap_or(Arc::new(DefaultExecutor {})),
        }
    }
}

/// Configuration for [`LimitDialer`](`crate::LimitDialer`).
#[derive(Debug, Clone)]
pub struct Config {
    /// Maximum number of concurrent dial attempts per peer.
    pub(crate) per_peer_limit: usize,

    /// Timeout for a single dial attempt.
    pub(crate) dial_timeout: Duration,

    /// How long an idle per-peer queue is kept around.
    pub(crate) idle_queue_timeout: Option<Duration>,

    /// Executor.
    pub(crate) executor: Arc<dyn Executor>,
}

impl Default for Config {
    fn default() -> Self {
        ConfigBuilder::new().build()
    }
}

impl Config {
    /// Get the per-peer concurrency limit.
    pub fn per_peer_limit(&self) -> usize {
        self.per_peer_limit
    }

    /// Get the timeout of a single dial attempt.
    pub fn dial_timeout(&self) -> Duration {
        self.dial_timeout
    }

    /// Get the idle queue timeout.
    pub fn idle_queue_timeout(&self) -> Option<Duration> {
        self.idle_queue_timeout
    }

    /// Check that the configured limits are usable.
    pub(crate) fn validate(&self) -> crate::Result<()> {
        if self.per_peer_limit == 0 {
            return Err(Error::InvalidConfiguration(
                "per-peer limit must be at least one".to_string(),
            ));
        }

        if self.dial_timeout.is_zero() {
            return Err(Error::InvalidConfiguration(
                "dial timeout must be non-zero".to_string(),
            ));
        }

        Ok(())
    }
}
