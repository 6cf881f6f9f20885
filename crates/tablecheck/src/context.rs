//! Run context and engine settings.
//!
//! One [`RunContext`] is built per run and handed to every table test. It
//! owns the browser session, the log sink, the engine settings and the
//! rendered-table contract.

use crate::driver::PageDriver;
use crate::locator::TableContract;
use crate::report::{LogSink, TracingSink};
use crate::result::{TableCheckError, TableCheckResult};
use crate::wait::{
    WaitOptions, DEFAULT_POLL_INTERVAL_MS, DEFAULT_SETTLE_DELAY_MS, DEFAULT_WAIT_TIMEOUT_MS,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Page-size options offered by the table's page-size control, ascending
pub const DEFAULT_PAGE_SIZE_OPTIONS: [usize; 7] = [10, 25, 50, 100, 250, 500, 1000];

/// Tunables of the verification engine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineSettings {
    /// Page-size options, strictly ascending
    pub page_size_options: Vec<usize>,
    /// Bound on explicit-condition waits
    pub wait_timeout_ms: u64,
    /// Polling interval of explicit-condition waits
    pub poll_interval_ms: u64,
    /// Fixed delay after page-size changes and before re-reads
    pub settle_delay_ms: u64,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            page_size_options: DEFAULT_PAGE_SIZE_OPTIONS.to_vec(),
            wait_timeout_ms: DEFAULT_WAIT_TIMEOUT_MS,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            settle_delay_ms: DEFAULT_SETTLE_DELAY_MS,
        }
    }
}

impl EngineSettings {
    /// Create settings with defaults
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set page-size options
    #[must_use]
    pub fn with_page_size_options(mut self, options: impl Into<Vec<usize>>) -> Self {
        self.page_size_options = options.into();
        self
    }

    /// Set the explicit-wait timeout
    #[must_use]
    pub const fn with_wait_timeout(mut self, timeout_ms: u64) -> Self {
        self.wait_timeout_ms = timeout_ms;
        self
    }

    /// Set the explicit-wait polling interval
    #[must_use]
    pub const fn with_poll_interval(mut self, poll_interval_ms: u64) -> Self {
        self.poll_interval_ms = poll_interval_ms;
        self
    }

    /// Set the settle delay
    #[must_use]
    pub const fn with_settle_delay(mut self, delay_ms: u64) -> Self {
        self.settle_delay_ms = delay_ms;
        self
    }

    /// Explicit-wait options
    #[must_use]
    pub const fn wait_options(&self) -> WaitOptions {
        WaitOptions {
            timeout_ms: self.wait_timeout_ms,
            poll_interval_ms: self.poll_interval_ms,
        }
    }

    /// Settle delay as Duration
    #[must_use]
    pub const fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    /// Reject settings the engine cannot work with
    pub fn validate(&self) -> TableCheckResult<()> {
        if self.page_size_options.is_empty() {
            return Err(TableCheckError::invalid_config(
                "page_size_options must not be empty",
            ));
        }
        if self.page_size_options.windows(2).any(|w| w[0] >= w[1]) {
            return Err(TableCheckError::invalid_config(format!(
                "page_size_options must be strictly ascending, got {:?}",
                self.page_size_options
            )));
        }
        if self.poll_interval_ms == 0 {
            return Err(TableCheckError::invalid_config(
                "poll_interval_ms must be greater than zero",
            ));
        }
        Ok(())
    }
}

/// Everything a table test needs from the surrounding run
pub struct RunContext {
    pub(crate) driver: Box<dyn PageDriver>,
    pub(crate) sink: Box<dyn LogSink>,
    pub(crate) settings: EngineSettings,
    pub(crate) contract: TableContract,
}

impl fmt::Debug for RunContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RunContext")
            .field("settings", &self.settings)
            .field("contract", &self.contract)
            .finish_non_exhaustive()
    }
}

impl RunContext {
    /// Create a context around a driver, logging through `tracing`
    #[must_use]
    pub fn new(driver: impl PageDriver + 'static) -> Self {
        Self {
            driver: Box::new(driver),
            sink: Box::new(TracingSink),
            settings: EngineSettings::default(),
            contract: TableContract::default(),
        }
    }

    /// Replace the log sink
    #[must_use]
    pub fn with_sink(mut self, sink: impl LogSink + 'static) -> Self {
        self.sink = Box::new(sink);
        self
    }

    /// Replace the engine settings
    #[must_use]
    pub fn with_settings(mut self, settings: EngineSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Replace the rendered-table contract
    #[must_use]
    pub fn with_contract(mut self, contract: TableContract) -> Self {
        self.contract = contract;
        self
    }

    /// Engine settings
    #[must_use]
    pub const fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    /// Rendered-table contract
    #[must_use]
    pub const fn contract(&self) -> &TableContract {
        &self.contract
    }

    /// The browser session
    pub fn driver(&mut self) -> &mut dyn PageDriver {
        self.driver.as_mut()
    }

    /// Release the browser session
    pub fn close(&mut self) -> TableCheckResult<()> {
        self.driver.close()
    }
}
