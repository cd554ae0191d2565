//! # concierge-browser
//!
//! Headless browser sessions over WebDriver (via thirtyfour) for scraping
//! rendered result pages.
//!
//! ```rust,ignore
//! use concierge_browser::{BrowserConfig, BrowserSession};
//! use std::time::Duration;
//!
//! async fn example() -> concierge_core::Result<()> {
//!     let browser = BrowserSession::new(BrowserConfig::new().headless(true));
//!     browser.start().await?;
//!     browser.navigate("https://www.kayak.com/flights/LA-Boston/2026-01-22").await?;
//!     browser.wait(Duration::from_secs(10)).await?;
//!     let cards = browser
//!         .extract_cards(".resultWrapper", &[("price", ".price-text")], 5)
//!         .await;
//!     browser.stop().await?;
//!     println!("{:?}", cards?);
//!     Ok(())
//! }
//! ```
//!
//! A WebDriver server (chromedriver, geckodriver or a Selenium container)
//! must be listening on [`BrowserConfig::webdriver_url`].

mod config;
mod session;

pub use config::{BrowserConfig, BrowserType};
pub use session::{BrowserSession, card_record, shared_session};

pub use thirtyfour::WebElement;
