use std::ffi::OsStr;
use std::sync::Arc;
use std::thread;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use headless_chrome::browser::tab::{RequestInterceptor, RequestPausedDecision};
use headless_chrome::browser::transport::{SessionId, Transport};
use headless_chrome::protocol::cdp::Fetch::{
    events::RequestPausedEvent, FailRequest, RequestPattern, RequestStage,
};
use headless_chrome::protocol::cdp::Network::{ErrorReason, ResourceType};
use headless_chrome::{Browser, LaunchOptions};
use tracing::{debug, info};

use crate::error::ScrapeError;
use crate::scrapers::limiter::RequestPacer;
use crate::scrapers::traits::{PageFetcher, RenderedPage};
use crate::scrapers::types::FetchOptions;

/// Browser-based page fetcher using headless Chrome.
///
/// Every fetch launches a fresh browser, so listings never share cookies,
/// cache or interception handlers, and dropping the session tears Chrome
/// down on every exit path. The owned pacer spaces page loads process-wide.
pub struct ChromeFetcher {
    options: FetchOptions,
    pacer: RequestPacer,
}

impl ChromeFetcher {
    pub fn new(options: FetchOptions) -> Self {
        let pacer = RequestPacer::new(options.min_request_interval);
        Self { options, pacer }
    }

    /// Share an external pacer, e.g. when several fetchers must observe one
    /// process-wide interval.
    pub fn with_pacer(options: FetchOptions, pacer: RequestPacer) -> Self {
        Self { options, pacer }
    }

    pub fn pacer(&self) -> &RequestPacer {
        &self.pacer
    }
}

#[async_trait]
impl PageFetcher for ChromeFetcher {
    async fn fetch(&self, url: &str) -> Result<RenderedPage, ScrapeError> {
        self.pacer.wait_turn().await;
        info!("Fetching {}", url);

        let target = url.to_string();
        let options = self.options.clone();
        // Chrome automation is a blocking API; keep it off the async threads.
        let html = tokio::task::spawn_blocking(move || render_page(&target, &options))
            .await
            .map_err(|e| ScrapeError::fetch(url, anyhow!(e)))?
            .map_err(|e| ScrapeError::fetch(url, e))?;

        debug!("Captured {} bytes of HTML from {}", html.len(), url);
        Ok(RenderedPage::new(url, html))
    }
}

/// Drive one isolated Chrome session through navigate, settle and capture.
fn render_page(url: &str, options: &FetchOptions) -> Result<String> {
    debug!("Launching headless Chrome for {}", url);

    let launch = LaunchOptions::default_builder()
        .headless(true)
        .window_size(Some(options.viewport))
        .args(vec![OsStr::new("--disable-blink-features=AutomationControlled")])
        .build()
        .context("Failed to build launch options")?;

    // Dropping `browser` kills the Chrome process, which covers every early
    // return below as well as the happy path.
    let browser = Browser::new(launch).context("Failed to launch Chrome browser")?;
    let tab = browser.new_tab().context("Failed to open tab")?;

    tab.set_default_timeout(options.nav_timeout);
    tab.set_user_agent(&options.user_agent, None, None)
        .context("Failed to set user agent")?;

    // Abort requests for resources the extractor never reads.
    let patterns = [RequestPattern {
        url_pattern: None,
        resource_Type: None,
        request_stage: Some(RequestStage::Request),
    }];
    tab.enable_fetch(Some(&patterns), None)
        .context("Failed to enable fetch interception")?;
    let interceptor: Arc<dyn RequestInterceptor + Send + Sync> = Arc::new(
        |_transport: Arc<Transport>, _session_id: SessionId, event: RequestPausedEvent| {
            if essential_resource(&event.params.resource_Type) {
                RequestPausedDecision::Continue(None)
            } else {
                RequestPausedDecision::Fail(FailRequest {
                    request_id: event.params.request_id,
                    error_reason: ErrorReason::BlockedByClient,
                })
            }
        },
    );
    tab.enable_request_interception(interceptor)
        .context("Failed to install request interceptor")?;

    tab.navigate_to(url).context("Navigation failed")?;
    // Waits for the DOM to be parsed, not for the network to go idle.
    tab.wait_until_navigated()
        .context("Page did not finish loading")?;

    // Galleries and agent cards render client-side after the DOM parse.
    thread::sleep(options.settle_delay);

    let result = tab
        .evaluate("document.documentElement.outerHTML", false)
        .context("Failed to capture page HTML")?;
    let html = result
        .value
        .as_ref()
        .and_then(|value| value.as_str())
        .map(|s| s.to_string())
        .ok_or_else(|| anyhow!("Page returned no HTML"))?;

    Ok(html)
}

/// Resource categories the extractor actually reads. Everything else
/// (fonts, media, websockets, trackers) is aborted at the network layer.
fn essential_resource(kind: &ResourceType) -> bool {
    matches!(
        kind,
        ResourceType::Document
            | ResourceType::Script
            | ResourceType::Stylesheet
            | ResourceType::Image
            | ResourceType::Xhr
            | ResourceType::Fetch
    )
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[tokio::test]
    async fn fetchers_sharing_a_pacer_share_its_schedule() {
        let options = FetchOptions {
            min_request_interval: Duration::from_millis(40),
            ..FetchOptions::default()
        };
        let pacer = RequestPacer::new(options.min_request_interval);
        let first = ChromeFetcher::with_pacer(options.clone(), pacer.clone());
        let second = ChromeFetcher::with_pacer(options, pacer);

        let started = first.pacer().wait_turn().await;
        let followed = second.pacer().wait_turn().await;
        assert!(followed.duration_since(started) >= first.pacer().min_interval());
    }

    #[test]
    fn keeps_resources_the_extractor_reads() {
        assert!(essential_resource(&ResourceType::Document));
        assert!(essential_resource(&ResourceType::Script));
        assert!(essential_resource(&ResourceType::Xhr));
    }

    #[test]
    fn aborts_fonts_media_and_sockets() {
        assert!(!essential_resource(&ResourceType::Font));
        assert!(!essential_resource(&ResourceType::Media));
        assert!(!essential_resource(&ResourceType::WebSocket));
        assert!(!essential_resource(&ResourceType::Ping));
    }
}
