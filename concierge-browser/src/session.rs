//! Browser session management wrapping thirtyfour WebDriver.

use crate::config::{BrowserConfig, BrowserType};
use concierge_core::{ConciergeError, Result};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use thirtyfour::prelude::*;
use tokio::sync::{RwLock, RwLockReadGuard};

/// A browser session that wraps thirtyfour's WebDriver.
///
/// The WebDriver connection is opened by [`start`](Self::start) and released
/// by [`stop`](Self::stop). Every other operation fails with a `Tool` error
/// while the session is not started.
pub struct BrowserSession {
    driver: RwLock<Option<WebDriver>>,
    config: BrowserConfig,
}

impl BrowserSession {
    pub fn new(config: BrowserConfig) -> Self {
        Self { driver: RwLock::new(None), config }
    }

    pub fn with_defaults() -> Self {
        Self::new(BrowserConfig::default())
    }

    /// Start the browser session by connecting to WebDriver. Starting an
    /// active session is a no-op.
    pub async fn start(&self) -> Result<()> {
        let mut driver_guard = self.driver.write().await;

        if driver_guard.is_some() {
            return Ok(());
        }

        let caps = self.build_capabilities()?;
        let driver = WebDriver::new(&self.config.webdriver_url, caps)
            .await
            .map_err(|e| ConciergeError::Tool(format!("Failed to start browser: {}", e)))?;

        if let Err(e) = self.apply_timeouts(&driver).await {
            // don't leak the remote browser
            let _ = driver.quit().await;
            return Err(e);
        }

        concierge_telemetry::debug!(
            webdriver = %self.config.webdriver_url,
            headless = self.config.headless,
            "Browser session started"
        );
        *driver_guard = Some(driver);
        Ok(())
    }

    async fn apply_timeouts(&self, driver: &WebDriver) -> Result<()> {
        driver
            .set_page_load_timeout(Duration::from_secs(self.config.page_load_timeout_secs))
            .await
            .map_err(|e| ConciergeError::Tool(format!("Failed to set page load timeout: {}", e)))?;

        driver
            .set_script_timeout(Duration::from_secs(self.config.script_timeout_secs))
            .await
            .map_err(|e| ConciergeError::Tool(format!("Failed to set script timeout: {}", e)))?;

        driver
            .set_implicit_wait_timeout(Duration::from_secs(self.config.implicit_wait_secs))
            .await
            .map_err(|e| ConciergeError::Tool(format!("Failed to set implicit wait: {}", e)))?;

        driver
            .set_window_rect(0, 0, self.config.viewport_width, self.config.viewport_height)
            .await
            .map_err(|e| ConciergeError::Tool(format!("Failed to set viewport: {}", e)))?;

        Ok(())
    }

    /// Stop the browser session. Stopping an inactive session is a no-op.
    pub async fn stop(&self) -> Result<()> {
        let mut driver_guard = self.driver.write().await;

        if let Some(driver) = driver_guard.take() {
            driver
                .quit()
                .await
                .map_err(|e| ConciergeError::Tool(format!("Failed to quit browser: {}", e)))?;
            concierge_telemetry::debug!("Browser session stopped");
        }

        Ok(())
    }

    pub async fn is_active(&self) -> bool {
        self.driver.read().await.is_some()
    }

    pub fn config(&self) -> &BrowserConfig {
        &self.config
    }

    async fn driver(&self) -> Result<RwLockReadGuard<'_, WebDriver>> {
        RwLockReadGuard::try_map(self.driver.read().await, Option::as_ref)
            .map_err(|_| ConciergeError::Tool("Browser session not started".to_string()))
    }

    pub async fn navigate(&self, url: &str) -> Result<()> {
        let driver = self.driver().await?;
        driver
            .goto(url)
            .await
            .map_err(|e| ConciergeError::Tool(format!("Navigation failed: {}", e)))
    }

    /// Give client-side rendering time to settle. Requires an active session
    /// so a stopped browser is reported instead of silently sleeping.
    pub async fn wait(&self, duration: Duration) -> Result<()> {
        if !self.is_active().await {
            return Err(ConciergeError::Tool("Browser session not started".to_string()));
        }
        tokio::time::sleep(duration).await;
        Ok(())
    }

    pub async fn find_elements(&self, selector: &str) -> Result<Vec<WebElement>> {
        let driver = self.driver().await?;
        driver
            .find_all(By::Css(selector))
            .await
            .map_err(|e| ConciergeError::Tool(format!("Elements query failed '{}': {}", selector, e)))
    }

    /// Text content of the first element matching `selector`.
    pub async fn get_text(&self, selector: &str) -> Result<String> {
        let driver = self.driver().await?;
        let element = driver
            .find(By::Css(selector))
            .await
            .map_err(|e| ConciergeError::Tool(format!("Element not found '{}': {}", selector, e)))?;
        element
            .text()
            .await
            .map_err(|e| ConciergeError::Tool(format!("Get text failed on '{}': {}", selector, e)))
    }

    pub async fn wait_for_element(&self, selector: &str, timeout_secs: u64) -> Result<WebElement> {
        let driver = self.driver().await?;
        driver
            .query(By::Css(selector))
            .wait(Duration::from_secs(timeout_secs), Duration::from_millis(100))
            .first()
            .await
            .map_err(|e| {
                ConciergeError::Tool(format!(
                    "Timeout waiting for '{}' after {}s: {}",
                    selector, timeout_secs, e
                ))
            })
    }

    pub async fn page_source(&self) -> Result<String> {
        let driver = self.driver().await?;
        driver
            .source()
            .await
            .map_err(|e| ConciergeError::Tool(format!("Failed to get page source: {}", e)))
    }

    /// Reads up to `limit` cards matching `card_selector`. For each card the
    /// text of the first child matching each `(field, selector)` pair is
    /// recorded under `field`; a missing child yields an empty string.
    pub async fn extract_cards(
        &self,
        card_selector: &str,
        fields: &[(&str, &str)],
        limit: usize,
    ) -> Result<Vec<HashMap<String, String>>> {
        let cards = self.find_elements(card_selector).await?;
        concierge_telemetry::debug!(selector = card_selector, found = cards.len(), "Cards located");

        let mut records = Vec::with_capacity(limit.min(cards.len()));
        for card in cards.into_iter().take(limit) {
            let mut texts = Vec::with_capacity(fields.len());
            for (_, selector) in fields {
                texts.push(child_text(&card, selector).await);
            }
            records.push(card_record(fields, texts));
        }
        Ok(records)
    }

    fn build_capabilities(&self) -> Result<Capabilities> {
        let arg_err = |arg: &str, e: WebDriverError| {
            ConciergeError::Tool(format!("Failed to add browser arg '{}': {}", arg, e))
        };

        let caps = match self.config.browser {
            BrowserType::Chrome => {
                let mut caps = DesiredCapabilities::chrome();
                for arg in self.chromium_args() {
                    caps.add_arg(&arg).map_err(|e| arg_err(&arg, e))?;
                }
                caps.into()
            }
            BrowserType::Edge => {
                let mut caps = DesiredCapabilities::edge();
                for arg in self.chromium_args() {
                    caps.add_arg(&arg).map_err(|e| arg_err(&arg, e))?;
                }
                caps.into()
            }
            BrowserType::Firefox => {
                let mut caps = DesiredCapabilities::firefox();
                if self.config.headless {
                    caps.add_arg("-headless").map_err(|e| arg_err("-headless", e))?;
                }
                caps.into()
            }
        };

        Ok(caps)
    }

    fn chromium_args(&self) -> Vec<String> {
        let mut args = Vec::new();
        if self.config.headless {
            args.push("--headless=new".to_string());
        }
        args.push("--no-sandbox".to_string());
        args.push("--disable-dev-shm-usage".to_string());
        if let Some(ua) = &self.config.user_agent {
            args.push(format!("--user-agent={}", ua));
        }
        args.extend(self.config.browser_args.iter().cloned());
        args
    }
}

impl Drop for BrowserSession {
    fn drop(&mut self) {
        // no async cleanup here; callers stop() explicitly
        concierge_telemetry::trace!("BrowserSession dropped");
    }
}

pub fn shared_session(config: BrowserConfig) -> Arc<BrowserSession> {
    Arc::new(BrowserSession::new(config))
}

async fn child_text(card: &WebElement, selector: &str) -> Option<String> {
    let children = card.find_all(By::Css(selector)).await.ok()?;
    let first = children.first()?;
    first.text().await.ok()
}

/// Builds one card record from the per-field lookups, in field order.
pub fn card_record(fields: &[(&str, &str)], texts: Vec<Option<String>>) -> HashMap<String, String> {
    fields
        .iter()
        .zip(texts.into_iter().chain(std::iter::repeat(None)))
        .map(|((field, _), text)| {
            (field.to_string(), text.map(|t| t.trim().to_string()).unwrap_or_default())
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIELDS: &[(&str, &str)] = &[
        ("airline", ".codeshares-airline-names"),
        ("price", ".price-text"),
        ("duration", ".duration-text"),
        ("stops", ".stops-text"),
    ];

    #[test]
    fn card_record_fills_missing_children_with_empty_strings() {
        let record = card_record(
            FIELDS,
            vec![Some(" Delta \n".to_string()), Some("$120".to_string()), None],
        );
        assert_eq!(record.len(), 4);
        assert_eq!(record["airline"], "Delta");
        assert_eq!(record["price"], "$120");
        assert_eq!(record["duration"], "");
        assert_eq!(record["stops"], "");
    }

    #[test]
    fn chromium_args_follow_config() {
        let session = BrowserSession::new(
            BrowserConfig::new().user_agent("concierge/0.1").add_arg("--lang=en-US"),
        );
        let args = session.chromium_args();
        assert_eq!(args[0], "--headless=new");
        assert!(args.contains(&"--user-agent=concierge/0.1".to_string()));
        assert_eq!(args.last().map(String::as_str), Some("--lang=en-US"));

        let visible = BrowserSession::new(BrowserConfig::new().headless(false));
        assert!(!visible.chromium_args().iter().any(|a| a.starts_with("--headless")));
    }

    #[tokio::test]
    async fn operations_fail_before_start() {
        let session = BrowserSession::with_defaults();
        assert!(!session.is_active().await);

        let err = session.navigate("https://www.kayak.com").await.unwrap_err();
        assert_eq!(err.to_string(), "Tool error: Browser session not started");
        assert!(session.wait(Duration::from_millis(1)).await.is_err());
        assert!(session.extract_cards(".resultWrapper", FIELDS, 5).await.is_err());
        assert!(session.page_source().await.is_err());
    }

    #[tokio::test]
    async fn stop_without_start_is_a_no_op() {
        let session = BrowserSession::with_defaults();
        assert!(session.stop().await.is_ok());
    }
}
