//! Headless rendering sessions
//!
//! [`PageRenderer`] is the seam between the dynamic strategy and the browser.
//! [`ChromiumRenderer`] drives Chrome over CDP with chromiumoxide; the
//! browser is launched on first use and shared by every page.

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::network::SetUserAgentOverrideParams;
use chromiumoxide::Page;
use futures::StreamExt;
use tokio::sync::OnceCell;
use tracing::{debug, trace, warn};

use crate::config::{Readiness, RenderConfig};
use crate::utils::error::ExtractionError;

/// Interval between readiness-selector checks
const SELECTOR_POLL: Duration = Duration::from_millis(250);

/// Produces the rendered DOM of a page
///
/// Implementations wait for `readiness` but do not enforce an overall
/// deadline; the caller wraps the call in its own timeout.
#[async_trait]
pub trait PageRenderer: Send + Sync {
    async fn render(
        &self,
        url: &str,
        readiness: &Readiness,
        user_agent: &str,
    ) -> Result<String, ExtractionError>;
}

/// Closes the CDP target when dropped on early-return paths
struct PageSession {
    page: Option<Page>,
    url: String,
}

impl PageSession {
    fn new(page: Page, url: &str) -> Self {
        Self {
            page: Some(page),
            url: url.to_string(),
        }
    }

    fn page(&self) -> Result<&Page, ExtractionError> {
        self.page
            .as_ref()
            .ok_or_else(|| ExtractionError::RenderFailed("page already closed".to_string()))
    }

    async fn close(mut self) {
        if let Some(page) = self.page.take() {
            if let Err(e) = page.close().await {
                warn!(url = %self.url, error = %e, "Failed to close page");
            }
        }
    }
}

impl Drop for PageSession {
    fn drop(&mut self) {
        if let Some(page) = self.page.take() {
            let url = std::mem::take(&mut self.url);
            if let Ok(handle) = tokio::runtime::Handle::try_current() {
                handle.spawn(async move {
                    if let Err(e) = page.close().await {
                        trace!(url = %url, error = %e, "Deferred page close failed");
                    }
                });
            }
        }
    }
}

/// Chrome/Chromium renderer
pub struct ChromiumRenderer {
    browser: OnceCell<Browser>,
    chrome_executable: Option<PathBuf>,
    headless: bool,
    settle: Duration,
}

impl ChromiumRenderer {
    pub fn new(config: &RenderConfig) -> Self {
        Self {
            browser: OnceCell::new(),
            chrome_executable: config.chrome_executable.clone(),
            headless: config.headless,
            settle: Duration::from_millis(config.settle_ms),
        }
    }

    async fn browser(&self) -> Result<&Browser, ExtractionError> {
        self.browser
            .get_or_try_init(|| async {
                let mut builder = BrowserConfig::builder().no_sandbox();
                if !self.headless {
                    builder = builder.with_head();
                }
                if let Some(path) = &self.chrome_executable {
                    builder = builder.chrome_executable(path);
                }
                let config = builder.build().map_err(ExtractionError::RenderFailed)?;

                let (browser, mut handler) = Browser::launch(config)
                    .await
                    .map_err(|e| ExtractionError::RenderFailed(format!("launch failed: {e}")))?;

                tokio::spawn(async move {
                    while let Some(event) = handler.next().await {
                        if let Err(e) = event {
                            trace!(error = %e, "Browser handler event error");
                        }
                    }
                });

                debug!("Headless browser launched");
                Ok(browser)
            })
            .await
    }
}

#[async_trait]
impl PageRenderer for ChromiumRenderer {
    async fn render(
        &self,
        url: &str,
        readiness: &Readiness,
        user_agent: &str,
    ) -> Result<String, ExtractionError> {
        let browser = self.browser().await?;
        let cdp = |e: chromiumoxide::error::CdpError| ExtractionError::RenderFailed(e.to_string());

        let session = PageSession::new(browser.new_page("about:blank").await.map_err(cdp)?, url);
        let page = session.page()?;

        page.set_user_agent(SetUserAgentOverrideParams::new(user_agent))
            .await
            .map_err(cdp)?;
        page.goto(url).await.map_err(cdp)?;

        match readiness {
            Readiness::NetworkIdle => {
                page.wait_for_navigation().await.map_err(cdp)?;
                tokio::time::sleep(self.settle).await;
            }
            Readiness::Selector(selector) => loop {
                if page.find_element(selector.as_str()).await.is_ok() {
                    break;
                }
                tokio::time::sleep(SELECTOR_POLL).await;
            },
        }

        let html = page.content().await.map_err(cdp)?;
        session.close().await;
        Ok(html)
    }
}
