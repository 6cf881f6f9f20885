//! Wait Mechanisms
//!
//! Two tiers of synchronization with the page under test:
//!
//! - **Bounded waits** ([`Waiter`]): poll a predicate until it holds or the
//!   timeout expires. Expiry surfaces as [`TableCheckError::Timeout`], which
//!   the engine treats like a missing element.
//! - **Settle delays** ([`settle`]): fixed, unconditional sleeps used where
//!   the page renders asynchronously with nothing to poll for.

use crate::driver::PageDriver;
use crate::locator::Selector;
use crate::result::{TableCheckError, TableCheckResult};
use std::time::{Duration, Instant};

// =============================================================================
// CONSTANTS
// =============================================================================

/// Default timeout for explicit-condition waits (10 seconds)
pub const DEFAULT_WAIT_TIMEOUT_MS: u64 = 10_000;

/// Default polling interval (50ms)
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 50;

/// Default settle delay after page-size changes and before re-reads (2 seconds)
pub const DEFAULT_SETTLE_DELAY_MS: u64 = 2_000;

// =============================================================================
// WAIT OPTIONS
// =============================================================================

/// Options for bounded waits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitOptions {
    /// Timeout in milliseconds
    pub timeout_ms: u64,
    /// Polling interval in milliseconds
    pub poll_interval_ms: u64,
}

impl Default for WaitOptions {
    fn default() -> Self {
        Self {
            timeout_ms: DEFAULT_WAIT_TIMEOUT_MS,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
        }
    }
}

impl WaitOptions {
    /// Create new wait options with defaults
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set timeout in milliseconds
    #[must_use]
    pub const fn with_timeout(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    /// Set polling interval in milliseconds
    #[must_use]
    pub const fn with_poll_interval(mut self, poll_interval_ms: u64) -> Self {
        self.poll_interval_ms = poll_interval_ms;
        self
    }

    /// Get timeout as Duration
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Get poll interval as Duration
    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

// =============================================================================
// WAITER
// =============================================================================

/// Polls the page until a condition holds
#[derive(Debug, Clone, Copy, Default)]
pub struct Waiter {
    options: WaitOptions,
}

impl Waiter {
    /// Create a waiter with the given options
    #[must_use]
    pub const fn new(options: WaitOptions) -> Self {
        Self { options }
    }

    /// Options in effect
    #[must_use]
    pub const fn options(&self) -> &WaitOptions {
        &self.options
    }

    /// Poll `probe` until it yields a value.
    ///
    /// The probe runs at least once. Not-found errors from the probe count as
    /// "not yet"; any other error aborts the wait.
    pub fn until<T, F>(&self, waited_for: &str, mut probe: F) -> TableCheckResult<T>
    where
        F: FnMut() -> TableCheckResult<Option<T>>,
    {
        let start = Instant::now();
        loop {
            match probe() {
                Ok(Some(value)) => return Ok(value),
                Ok(None) => {}
                Err(e) if e.is_not_found() => {}
                Err(e) => return Err(e),
            }
            if start.elapsed() >= self.options.timeout() {
                return Err(TableCheckError::Timeout {
                    ms: self.options.timeout_ms,
                    waited_for: waited_for.to_string(),
                });
            }
            std::thread::sleep(self.options.poll_interval());
        }
    }

    /// Wait for an element to be present and return its text
    pub fn for_present(
        &self,
        driver: &dyn PageDriver,
        selector: &Selector,
    ) -> TableCheckResult<String> {
        self.until(&selector.to_string(), || {
            Ok(driver.texts(selector)?.into_iter().next())
        })
    }

    /// Wait for at least one match and return the text of all matches
    pub fn for_all_visible(
        &self,
        driver: &dyn PageDriver,
        selector: &Selector,
    ) -> TableCheckResult<Vec<String>> {
        self.until(&selector.to_string(), || {
            let texts = driver.texts(selector)?;
            Ok((!texts.is_empty()).then_some(texts))
        })
    }

    /// Wait until nothing matches
    pub fn for_absent(&self, driver: &dyn PageDriver, selector: &Selector) -> TableCheckResult<()> {
        self.until(&format!("{selector} to disappear"), || {
            Ok((driver.count(selector)? == 0).then_some(()))
        })
    }

    /// Wait until an attribute satisfies `accept`, returning its value
    pub fn for_attribute<P>(
        &self,
        driver: &dyn PageDriver,
        selector: &Selector,
        name: &str,
        accept: P,
    ) -> TableCheckResult<Option<String>>
    where
        P: Fn(Option<&str>) -> bool,
    {
        self.until(&format!("{name} on {selector}"), || {
            let value = driver.attribute(selector, name)?;
            Ok(accept(value.as_deref()).then_some(value))
        })
    }
}

/// Fixed, unconditional delay for asynchronous rendering
pub fn settle(delay: Duration) {
    if !delay.is_zero() {
        std::thread::sleep(delay);
    }
}
