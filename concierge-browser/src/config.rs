//! Browser configuration options.

use serde::{Deserialize, Serialize};

/// Configuration for browser sessions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrowserConfig {
    /// WebDriver server URL, e.g. a local chromedriver on `http://localhost:4444`.
    pub webdriver_url: String,

    pub browser: BrowserType,

    /// Run without a visible window.
    pub headless: bool,

    pub viewport_width: u32,
    pub viewport_height: u32,

    pub page_load_timeout_secs: u64,
    pub script_timeout_secs: u64,

    /// Implicit wait applied to every element lookup. Card extraction probes
    /// for optional children, so a non-zero value slows each missing field.
    pub implicit_wait_secs: u64,

    pub user_agent: Option<String>,

    /// Extra command-line arguments for Chromium-based browsers.
    pub browser_args: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BrowserType {
    Chrome,
    Firefox,
    Edge,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            webdriver_url: "http://localhost:4444".to_string(),
            browser: BrowserType::Chrome,
            headless: true,
            viewport_width: 1920,
            viewport_height: 1080,
            page_load_timeout_secs: 60,
            script_timeout_secs: 30,
            implicit_wait_secs: 0,
            user_agent: None,
            browser_args: Vec::new(),
        }
    }
}

impl BrowserConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn webdriver_url(mut self, url: impl Into<String>) -> Self {
        self.webdriver_url = url.into();
        self
    }

    pub fn browser(mut self, browser: BrowserType) -> Self {
        self.browser = browser;
        self
    }

    pub fn headless(mut self, headless: bool) -> Self {
        self.headless = headless;
        self
    }

    pub fn viewport(mut self, width: u32, height: u32) -> Self {
        self.viewport_width = width;
        self.viewport_height = height;
        self
    }

    pub fn page_load_timeout(mut self, secs: u64) -> Self {
        self.page_load_timeout_secs = secs;
        self
    }

    pub fn script_timeout(mut self, secs: u64) -> Self {
        self.script_timeout_secs = secs;
        self
    }

    pub fn implicit_wait(mut self, secs: u64) -> Self {
        self.implicit_wait_secs = secs;
        self
    }

    /// Override the user agent. Some travel sites serve a bot wall to the
    /// default headless agent.
    pub fn user_agent(mut self, ua: impl Into<String>) -> Self {
        self.user_agent = Some(ua.into());
        self
    }

    pub fn add_arg(mut self, arg: impl Into<String>) -> Self {
        self.browser_args.push(arg.into());
        self
    }
}
