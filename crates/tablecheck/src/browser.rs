//! Browser session configuration and the Chromium driver.
//!
//! [`BrowserConfig`] is always available so configuration files can be
//! parsed and validated without a browser. `ChromiumDriver` drives a real
//! Chromium over the Chrome `DevTools` Protocol and is only compiled with the
//! `browser` feature.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Browser launch configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserConfig {
    /// Run without a visible window
    pub headless: bool,
    /// Keep the Chromium sandbox (disable inside containers)
    pub sandbox: bool,
    /// Path to the chromium binary (None = auto-detect)
    pub chromium_path: Option<PathBuf>,
    /// Window width
    pub window_width: u32,
    /// Window height
    pub window_height: u32,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            headless: true,
            sandbox: true,
            chromium_path: None,
            window_width: 1920,
            window_height: 1080,
        }
    }
}

impl BrowserConfig {
    /// Set headless mode
    #[must_use]
    pub const fn with_headless(mut self, headless: bool) -> Self {
        self.headless = headless;
        self
    }

    /// Disable sandbox (for containers/CI)
    #[must_use]
    pub const fn with_no_sandbox(mut self) -> Self {
        self.sandbox = false;
        self
    }

    /// Set chromium path
    #[must_use]
    pub fn with_chromium_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.chromium_path = Some(path.into());
        self
    }

    /// Set window dimensions
    #[must_use]
    pub const fn with_window(mut self, width: u32, height: u32) -> Self {
        self.window_width = width;
        self.window_height = height;
        self
    }
}

// ============================================================================
// Real CDP Implementation (when `browser` feature is enabled)
// ============================================================================

#[cfg(feature = "browser")]
mod cdp {
    use super::BrowserConfig;
    use crate::driver::PageDriver;
    use crate::locator::{Query, Selector};
    use crate::result::{TableCheckError, TableCheckResult};
    use chromiumoxide::browser::{Browser, BrowserConfig as CdpConfig};
    use chromiumoxide::element::Element;
    use chromiumoxide::error::CdpError;
    use chromiumoxide::page::Page;
    use futures::StreamExt;
    use std::fmt;
    use tokio::runtime::Runtime;
    use tokio::task::JoinHandle;

    fn driver_error(e: impl fmt::Display) -> TableCheckError {
        TableCheckError::driver(e.to_string())
    }

    fn launch_error(e: impl fmt::Display) -> TableCheckError {
        TableCheckError::BrowserLaunchError {
            message: e.to_string(),
        }
    }

    /// XPath searches without a hit come back as a protocol error on the
    /// empty result range
    pub(super) fn is_no_match(e: &CdpError) -> bool {
        match e {
            CdpError::NotFound => true,
            CdpError::Chrome(err) => err.message.contains("search"),
            _ => false,
        }
    }

    fn not_found(selector: &Selector) -> TableCheckError {
        TableCheckError::ElementNotFound {
            selector: selector.to_string(),
        }
    }

    async fn find(page: &Page, selector: &Selector) -> TableCheckResult<Vec<Element>> {
        let elements = match selector.query() {
            Query::Css(css) => page.find_elements(css).await.map_err(driver_error)?,
            Query::XPath(xpath) => match page.find_xpaths(xpath).await {
                Ok(elements) => elements,
                Err(e) if is_no_match(&e) => Vec::new(),
                Err(e) => return Err(driver_error(e)),
            },
        };
        let Some(text) = selector.text_filter() else {
            return Ok(elements);
        };
        let mut matching = Vec::new();
        for element in elements {
            let inner = element.inner_text().await.map_err(driver_error)?;
            if inner.as_deref().map(str::trim) == Some(text) {
                matching.push(element);
            }
        }
        Ok(matching)
    }

    async fn find_first(page: &Page, selector: &Selector) -> TableCheckResult<Element> {
        find(page, selector)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| not_found(selector))
    }

    /// [`PageDriver`] over a Chromium session.
    ///
    /// Every call blocks on an owned tokio runtime.
    pub struct ChromiumDriver {
        runtime: Runtime,
        browser: Option<Browser>,
        page: Page,
        handler: JoinHandle<()>,
    }

    impl fmt::Debug for ChromiumDriver {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.debug_struct("ChromiumDriver")
                .field("open", &self.browser.is_some())
                .finish_non_exhaustive()
        }
    }

    impl ChromiumDriver {
        /// Launch Chromium and open a blank page
        ///
        /// # Errors
        ///
        /// Returns error if the runtime or the browser cannot be started
        pub fn launch(config: &BrowserConfig) -> TableCheckResult<Self> {
            let runtime = tokio::runtime::Builder::new_multi_thread()
                .enable_all()
                .build()?;

            let mut builder =
                CdpConfig::builder().window_size(config.window_width, config.window_height);
            if !config.headless {
                builder = builder.with_head();
            }
            if !config.sandbox {
                builder = builder.no_sandbox();
            }
            if let Some(path) = &config.chromium_path {
                builder = builder.chrome_executable(path);
            }
            let cdp_config = builder.build().map_err(launch_error)?;

            let (browser, page, handler) = runtime.block_on(async {
                let (browser, mut handler) =
                    Browser::launch(cdp_config).await.map_err(launch_error)?;
                let handle = tokio::spawn(async move {
                    while let Some(event) = handler.next().await {
                        if event.is_err() {
                            break;
                        }
                    }
                });
                let page = browser
                    .new_page("about:blank")
                    .await
                    .map_err(launch_error)?;
                Ok::<_, TableCheckError>((browser, page, handle))
            })?;
            tracing::debug!(headless = config.headless, "chromium launched");

            Ok(Self {
                runtime,
                browser: Some(browser),
                page,
                handler,
            })
        }
    }

    impl PageDriver for ChromiumDriver {
        fn navigate(&mut self, url: &str) -> TableCheckResult<()> {
            self.runtime
                .block_on(self.page.goto(url))
                .map(|_| ())
                .map_err(|e| TableCheckError::NavigationError {
                    url: url.to_string(),
                    message: e.to_string(),
                })
        }

        fn refresh(&mut self) -> TableCheckResult<()> {
            self.runtime
                .block_on(self.page.reload())
                .map(|_| ())
                .map_err(driver_error)
        }

        fn current_url(&self) -> TableCheckResult<String> {
            let url = self
                .runtime
                .block_on(self.page.url())
                .map_err(driver_error)?;
            Ok(url.unwrap_or_else(|| "about:blank".to_string()))
        }

        fn page_source(&self) -> TableCheckResult<String> {
            self.runtime
                .block_on(self.page.content())
                .map_err(driver_error)
        }

        fn texts(&self, selector: &Selector) -> TableCheckResult<Vec<String>> {
            self.runtime.block_on(async {
                let mut texts = Vec::new();
                for element in find(&self.page, selector).await? {
                    let text = element.inner_text().await.map_err(driver_error)?;
                    texts.push(text.unwrap_or_default());
                }
                Ok(texts)
            })
        }

        fn attribute(&self, selector: &Selector, name: &str) -> TableCheckResult<Option<String>> {
            self.runtime.block_on(async {
                let element = find_first(&self.page, selector).await?;
                element.attribute(name).await.map_err(driver_error)
            })
        }

        fn click(&mut self, selector: &Selector) -> TableCheckResult<()> {
            self.runtime.block_on(async {
                let element = find_first(&self.page, selector).await?;
                element.click().await.map_err(driver_error)?;
                Ok(())
            })
        }

        fn close(&mut self) -> TableCheckResult<()> {
            let Some(mut browser) = self.browser.take() else {
                return Ok(());
            };
            let result = self.runtime.block_on(async {
                browser.close().await.map_err(driver_error)?;
                browser.wait().await.map_err(driver_error)?;
                Ok(())
            });
            self.handler.abort();
            result
        }
    }
}

#[cfg(feature = "browser")]
pub use cdp::ChromiumDriver;
