//! Headless Chrome session management
//!
//! One session owns one Chrome process and one tab for the whole run. The
//! process is torn down when the session is dropped, on every exit path.
//! The CDP calls are blocking, so they run on the blocking thread pool.

use std::ffi::OsStr;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use headless_chrome::{Browser, LaunchOptions, Tab};
use tokio::task;
use tracing::{debug, instrument};

use crate::config::BrowserConfig;
use crate::extract::{ExtractError, PageSource};

use super::{BrowserError, RenderedPage};

/// Keep the browser alive across slow LLM round-trips between renders.
const IDLE_BROWSER_TIMEOUT: Duration = Duration::from_secs(600);

/// The single browser session for a run
pub struct BrowserSession {
    // Held to keep the Chrome process alive; killed on drop.
    _browser: Browser,
    tab: Arc<Tab>,
    url: String,
    wait_selector: Option<String>,
    settle_delay: Duration,
}

impl BrowserSession {
    /// Launch a headless Chrome pointed at `url`.
    ///
    /// `wait_selector` is the element whose appearance signals that the
    /// page has rendered; when it never shows up, rendering falls back to
    /// the configured fixed settle delay.
    #[instrument(skip(config, wait_selector), fields(url = %url))]
    pub async fn launch(
        config: &BrowserConfig,
        url: &str,
        wait_selector: Option<String>,
    ) -> Result<Self, BrowserError> {
        let config = config.clone();
        let url = url.to_string();

        task::spawn_blocking(move || {
            let options = LaunchOptions::default_builder()
                .headless(config.headless)
                .sandbox(false)
                .window_size(Some((config.viewport_width, config.viewport_height)))
                .idle_browser_timeout(IDLE_BROWSER_TIMEOUT)
                .args(vec![
                    OsStr::new("--disable-blink-features=AutomationControlled"),
                    OsStr::new("--disable-dev-shm-usage"),
                ])
                .build()
                .map_err(|err| BrowserError::Launch(err.to_string()))?;

            let browser =
                Browser::new(options).map_err(|err| BrowserError::Launch(err.to_string()))?;
            let tab = browser
                .new_tab()
                .map_err(|err| BrowserError::Tab(err.to_string()))?;
            tab.set_default_timeout(config.page_timeout);
            if !config.user_agent.is_empty() {
                if let Err(err) = tab.set_user_agent(&config.user_agent, None, None) {
                    debug!("failed to set user agent: {err}");
                }
            }

            Ok(Self {
                _browser: browser,
                tab,
                url,
                wait_selector,
                settle_delay: config.settle_delay,
            })
        })
        .await
        .map_err(|err| BrowserError::Task(err.to_string()))?
    }

    /// The URL this session is pointed at.
    pub fn target_url(&self) -> &str {
        &self.url
    }

    /// Navigate to the session URL and capture the rendered HTML.
    #[instrument(skip(self))]
    pub async fn render_page(&self) -> Result<RenderedPage, BrowserError> {
        let tab = Arc::clone(&self.tab);
        let url = self.url.clone();
        let wait_selector = self.wait_selector.clone();
        let settle_delay = self.settle_delay;

        let html = task::spawn_blocking(move || {
            tab.navigate_to(&url)
                .map_err(|err| BrowserError::Navigation(err.to_string()))?;
            tab.wait_until_navigated()
                .map_err(|err| BrowserError::Navigation(err.to_string()))?;

            match wait_selector.as_deref() {
                Some(selector) => {
                    if tab.wait_for_element(selector).is_err() {
                        debug!("'{selector}' did not appear; waiting a fixed delay instead");
                        std::thread::sleep(settle_delay);
                    }
                }
                None => std::thread::sleep(settle_delay),
            }

            tab.get_content()
                .map_err(|err| BrowserError::Content(err.to_string()))
        })
        .await
        .map_err(|err| BrowserError::Task(err.to_string()))??;

        debug!("captured {} bytes of rendered HTML", html.len());
        Ok(RenderedPage::new(&self.url, html))
    }
}

impl Drop for BrowserSession {
    fn drop(&mut self) {
        debug!("closing browser session for {}", self.url);
    }
}

#[async_trait]
impl PageSource for BrowserSession {
    async fn render(&self) -> Result<RenderedPage, ExtractError> {
        self.render_page()
            .await
            .map_err(|err| ExtractError::Page(err.to_string()))
    }
}
