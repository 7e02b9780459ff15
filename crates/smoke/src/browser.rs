//! Headless browser automation

use std::fmt;
use std::future::Future;
use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::Page;
use futures::{Stream, StreamExt};
use tokio::task::JoinHandle;
use tokio::time::{sleep, Instant};
use tracing::{debug, info, warn};

use crate::error::{SmokeError, SmokeResult};

/// How long a closing Chrome gets to exit before it is killed
const CLOSE_GRACE: Duration = Duration::from_secs(10);

/// Condition a waited-for element must reach
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementState {
    /// Attached, rendered and with a non-empty box
    Visible,
    /// Visible and not disabled
    Clickable,
}

impl ElementState {
    fn as_str(&self) -> &'static str {
        match self {
            ElementState::Visible => "visible",
            ElementState::Clickable => "clickable",
        }
    }
}

/// The operations the checks need from a browser
#[async_trait]
pub trait BrowserDriver: Send {
    /// Navigate the current tab
    async fn goto(&mut self, url: &str) -> SmokeResult<()>;

    /// Title of the loaded document, empty when there is none
    async fn title(&mut self) -> SmokeResult<String>;

    /// Serialized DOM of the loaded document
    async fn page_source(&mut self) -> SmokeResult<String>;

    /// Wait until `selector` reaches `state`, or fail with
    /// [`SmokeError::Timeout`] after `timeout`.
    async fn wait_for(&mut self, selector: &str, state: ElementState, timeout: Duration) -> SmokeResult<()>;

    /// Focus the element and type `text` into it
    async fn type_text(&mut self, selector: &str, text: &str) -> SmokeResult<()>;

    /// Dispatch a real mouse click on the element
    async fn click(&mut self, selector: &str) -> SmokeResult<()>;

    /// Shut the browser down
    async fn close(&mut self) -> SmokeResult<()>;
}

/// Launch options for [`ChromeSession`]
#[derive(Debug, Clone)]
pub struct ChromeConfig {
    /// Chrome/Chromium executable (None = auto-detect)
    pub executable: Option<PathBuf>,

    /// Poll interval for element waits
    pub poll_interval: Duration,

    /// Timeout for a single CDP request
    pub request_timeout: Duration,
}

impl Default for ChromeConfig {
    fn default() -> Self {
        Self {
            executable: None,
            poll_interval: Duration::from_millis(250),
            request_timeout: Duration::from_secs(30),
        }
    }
}

/// A headless Chrome process with a single tab.
///
/// Call [`BrowserDriver::close`] on every exit path; `Drop` only stops the
/// event loop and leaves killing the child process to chromiumoxide.
pub struct ChromeSession {
    browser: Browser,
    page: Page,
    handler: Option<JoinHandle<()>>,
    poll_interval: Duration,
    closed: bool,
}

impl ChromeSession {
    /// Launch headless Chrome and open a blank tab
    pub async fn launch(config: ChromeConfig) -> SmokeResult<Self> {
        let mut builder = BrowserConfig::builder()
            .no_sandbox()
            .arg("--disable-dev-shm-usage")
            .arg("--ignore-certificate-errors")
            .request_timeout(config.request_timeout);

        if let Some(path) = &config.executable {
            builder = builder.chrome_executable(path);
        }

        let browser_config = builder.build().map_err(SmokeError::BrowserLaunch)?;

        let (browser, mut handler) = Browser::launch(browser_config)
            .await
            .map_err(|e| SmokeError::BrowserLaunch(e.to_string()))?;

        let handler = tokio::spawn(async move {
            drive_events(&mut handler).await;
        });

        let page = browser.new_page("about:blank").await?;
        info!("Headless Chrome started");

        Ok(Self {
            browser,
            page,
            handler: Some(handler),
            poll_interval: config.poll_interval,
            closed: false,
        })
    }

    /// Kill the child process, logging rather than failing
    async fn kill(&mut self) {
        if let Some(Err(e)) = self.browser.kill().await {
            warn!("Failed to kill Chrome: {}", e);
        }
    }
}

/// Poll the CDP event stream until it ends. Item errors (for example an
/// event the pinned protocol cannot decode) are logged and skipped; the
/// stream stays usable after them. Returns the number of skipped errors.
pub async fn drive_events<S, E>(events: &mut S) -> usize
where
    S: Stream<Item = Result<(), E>> + Unpin,
    E: fmt::Display,
{
    let mut errors = 0;
    while let Some(event) = events.next().await {
        if let Err(e) = event {
            errors += 1;
            debug!("CDP event error: {}", e);
        }
    }
    debug!("CDP event stream ended");
    errors
}

/// Run `check` every `interval` until it returns true or `timeout` has
/// passed. A single slow check is cut off at the deadline too.
pub async fn poll_until<F, Fut>(timeout: Duration, interval: Duration, mut check: F) -> bool
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    let deadline = Instant::now() + timeout;

    loop {
        let remaining = deadline.saturating_duration_since(Instant::now());
        if let Ok(true) = tokio::time::timeout(remaining, check()).await {
            return true;
        }
        if Instant::now() >= deadline {
            return false;
        }
        sleep(interval.min(deadline.saturating_duration_since(Instant::now()))).await;
    }
}

async fn element_state(page: &Page, selector: &str, state: ElementState) -> SmokeResult<bool> {
    let script = state_script(selector, state)?;
    let reached: bool = page.evaluate(script).await?.into_value()?;
    Ok(reached)
}

/// JS expression that is true once `selector` reaches `state`
fn state_script(selector: &str, state: ElementState) -> SmokeResult<String> {
    let selector = serde_json::to_string(selector)?;
    let clickable = state == ElementState::Clickable;

    Ok(format!(
        r#"(() => {{
  const el = document.querySelector({selector});
  if (!el) return false;
  const style = window.getComputedStyle(el);
  if (style.visibility === 'hidden' || style.display === 'none') return false;
  const rect = el.getBoundingClientRect();
  if (rect.width === 0 || rect.height === 0) return false;
  return {clickable} ? !el.disabled : true;
}})()"#
    ))
}

#[async_trait]
impl BrowserDriver for ChromeSession {
    async fn goto(&mut self, url: &str) -> SmokeResult<()> {
        debug!("Navigating to {}", url);
        self.page.goto(url).await?;
        Ok(())
    }

    async fn title(&mut self) -> SmokeResult<String> {
        Ok(self.page.get_title().await?.unwrap_or_default())
    }

    async fn page_source(&mut self) -> SmokeResult<String> {
        Ok(self.page.content().await?)
    }

    async fn wait_for(&mut self, selector: &str, state: ElementState, timeout: Duration) -> SmokeResult<()> {
        let page = &self.page;
        let reached = poll_until(timeout, self.poll_interval, || async move {
            // Evaluation fails while a navigation swaps the document out.
            match element_state(page, selector, state).await {
                Ok(reached) => reached,
                Err(e) => {
                    debug!("State check for {} failed: {}", selector, e);
                    false
                }
            }
        })
        .await;

        if reached {
            debug!("{} is {}", selector, state.as_str());
            Ok(())
        } else {
            Err(SmokeError::Timeout(format!(
                "{} to be {} after {:?}",
                selector,
                state.as_str(),
                timeout
            )))
        }
    }

    async fn type_text(&mut self, selector: &str, text: &str) -> SmokeResult<()> {
        self.page
            .find_element(selector)
            .await?
            .focus()
            .await?
            .type_str(text)
            .await?;
        Ok(())
    }

    async fn click(&mut self, selector: &str) -> SmokeResult<()> {
        self.page.find_element(selector).await?.click().await?;
        Ok(())
    }

    async fn close(&mut self) -> SmokeResult<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;

        info!("Closing headless Chrome");
        if let Err(e) = self.browser.close().await {
            // Nobody will act on CloseBrowser; waiting alone would hang.
            warn!("Browser close failed, killing Chrome: {}", e);
            self.kill().await;
        }

        match tokio::time::timeout(CLOSE_GRACE, self.browser.wait()).await {
            Ok(status) => {
                status?;
            }
            Err(_) => {
                warn!("Chrome still running after {:?}, killing it", CLOSE_GRACE);
                self.kill().await;
                self.browser.wait().await?;
            }
        }

        if let Some(handler) = self.handler.take() {
            handler.abort();
        }
        Ok(())
    }
}

impl Drop for ChromeSession {
    fn drop(&mut self) {
        if let Some(handler) = self.handler.take() {
            handler.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_script_quotes_selector() {
        let script = state_script("[aria-label='username_input']", ElementState::Visible).unwrap();
        assert!(script.contains(r#"document.querySelector("[aria-label='username_input']")"#));
        assert!(script.contains("return false ? !el.disabled : true;"));
    }

    #[test]
    fn test_state_script_clickable() {
        let script = state_script("[class=\"euiForm\"]", ElementState::Clickable).unwrap();
        assert!(script.contains(r#"document.querySelector("[class=\"euiForm\"]")"#));
        assert!(script.contains("return true ? !el.disabled : true;"));
    }

    #[tokio::test]
    async fn test_event_errors_do_not_stop_the_loop() {
        let mut events = futures::stream::iter(vec![
            Ok(()),
            Err("Failed to deserialize WS response".to_string()),
            Ok(()),
            Err("unknown event".to_string()),
            Ok(()),
        ]);

        assert_eq!(drive_events(&mut events).await, 2);
        // Every item, including the ones after the errors, was consumed.
        assert!(events.next().await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_poll_until_cuts_off_a_hung_check() {
        let start = Instant::now();
        let reached = poll_until(Duration::from_secs(10), Duration::from_millis(250), || async {
            sleep(Duration::from_secs(30)).await;
            true
        })
        .await;

        assert!(!reached);
        assert_eq!(start.elapsed(), Duration::from_secs(10));
    }

    #[tokio::test(start_paused = true)]
    async fn test_poll_until_retries_until_true() {
        let mut calls = 0;
        let reached = poll_until(Duration::from_secs(10), Duration::from_millis(250), || {
            calls += 1;
            let done = calls >= 3;
            async move { done }
        })
        .await;

        assert!(reached);
        assert_eq!(calls, 3);
    }

    #[test]
    fn test_default_chrome_config() {
        let config = ChromeConfig::default();
        assert!(config.executable.is_none());
        assert_eq!(config.poll_interval, Duration::from_millis(250));
    }
}
