//! PageDriver - Abstract Browser Automation Trait
//!
//! The engine talks to the page under test only through [`PageDriver`]. Every
//! call is synchronous and may block until the browser answers; bounded
//! waiting is layered on top in [`crate::wait`].
//!
//! # Implementations
//!
//! - `ChromiumDriver` - CDP via chromiumoxide (`browser` feature)
//! - [`SimulatedTablePage`](crate::SimulatedTablePage) - in-memory table for tests

use crate::locator::Selector;
use crate::result::{TableCheckError, TableCheckResult};

/// Abstract driver trait for browser automation.
///
/// Lookups return elements in document order. Single-element operations act
/// on the first match and fail with [`TableCheckError::ElementNotFound`] when
/// nothing matches.
pub trait PageDriver {
    /// Navigate to URL
    fn navigate(&mut self, url: &str) -> TableCheckResult<()>;

    /// Reload the current page
    fn refresh(&mut self) -> TableCheckResult<()>;

    /// Get current URL
    fn current_url(&self) -> TableCheckResult<String>;

    /// Full HTML source of the current page
    fn page_source(&self) -> TableCheckResult<String>;

    /// Rendered text of every matching element
    fn texts(&self, selector: &Selector) -> TableCheckResult<Vec<String>>;

    /// Attribute of the first matching element (`None` when absent)
    fn attribute(&self, selector: &Selector, name: &str) -> TableCheckResult<Option<String>>;

    /// Click the first matching element
    fn click(&mut self, selector: &Selector) -> TableCheckResult<()>;

    /// Release the browser session
    fn close(&mut self) -> TableCheckResult<()>;

    /// Number of matching elements
    fn count(&self, selector: &Selector) -> TableCheckResult<usize> {
        Ok(self.texts(selector)?.len())
    }

    /// Rendered text of the first matching element
    fn text(&self, selector: &Selector) -> TableCheckResult<String> {
        self.texts(selector)?
            .into_iter()
            .next()
            .ok_or_else(|| TableCheckError::ElementNotFound {
                selector: selector.to_string(),
            })
    }
}
