//! Chrome-backed session via chromiumoxide (CDP)

use std::path::Path;

use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig as ChromeConfig};
use chromiumoxide::cdp::browser_protocol::input::{DispatchKeyEventParams, DispatchKeyEventType};
use chromiumoxide::cdp::browser_protocol::page::CaptureScreenshotFormat;
use chromiumoxide::element::Element;
use chromiumoxide::page::{Page, ScreenshotParams};
use futures::StreamExt;
use log::{debug, info, warn};
use tokio::task::JoinHandle;

use super::{BrowserError, BrowserSession, SessionLauncher};
use crate::config::BrowserConfig;

/// Returns true when the element exists, has a box and is not hidden by CSS
const VISIBILITY_SCRIPT: &str = r#"((selector) => {
    const el = document.querySelector(selector);
    if (!el) return false;
    const style = window.getComputedStyle(el);
    if (style.display === 'none' || style.visibility === 'hidden') return false;
    const rect = el.getBoundingClientRect();
    return rect.width > 0 && rect.height > 0;
})"#;

/// One Chrome process driving one page
pub struct ChromeSession {
    browser: Browser,
    page: Page,
    /// Background task driving the CDP WebSocket handler
    handler_task: HandlerGuard,
}

impl ChromeSession {
    pub async fn launch(config: &BrowserConfig) -> Result<Self, BrowserError> {
        let mut builder = ChromeConfig::builder()
            .no_sandbox()
            .window_size(config.window_width, config.window_height);

        if !config.headless {
            builder = builder.with_head();
        }

        if let Some(path) = &config.executable_path {
            builder = builder.chrome_executable(path);
        }

        let chrome_config = builder.build().map_err(BrowserError::Launch)?;

        info!(
            "Launching chrome (headless: {}, executable: {:?})",
            config.headless, config.executable_path
        );

        let (browser, mut handler) = Browser::launch(chrome_config)
            .await
            .map_err(|e| BrowserError::Launch(e.to_string()))?;

        let handler_task = HandlerGuard::new(tokio::spawn(async move {
            while handler.next().await.is_some() {}
        }));

        let opened = browser.new_page("about:blank").await;
        let page = match opened {
            Ok(page) => page,
            Err(e) => {
                let mut browser = browser;
                if let Err(close_err) = browser.close().await {
                    warn!("Failed to close browser after page error: {}", close_err);
                }
                // handler_task is aborted as it drops here
                return Err(BrowserError::Launch(format!("failed to open page: {}", e)));
            }
        };

        Ok(Self {
            browser,
            page,
            handler_task,
        })
    }

    async fn find(&self, selector: &str) -> Result<Element, BrowserError> {
        self.page
            .find_element(selector)
            .await
            .map_err(|_| BrowserError::ElementNotFound {
                selector: selector.to_string(),
            })
    }

    /// Raw keyDown/keyUp pair when nothing has focus
    async fn dispatch_key(&self, key: &str) -> Result<(), BrowserError> {
        for event_type in [DispatchKeyEventType::KeyDown, DispatchKeyEventType::KeyUp] {
            let params = DispatchKeyEventParams::builder()
                .r#type(event_type)
                .key(key)
                .build()
                .map_err(BrowserError::Protocol)?;
            self.page.execute(params).await.map_err(protocol)?;
        }
        Ok(())
    }
}

/// Owns the CDP handler task and aborts it on drop
struct HandlerGuard(JoinHandle<()>);

impl HandlerGuard {
    fn new(task: JoinHandle<()>) -> Self {
        Self(task)
    }

    fn abort(&self) {
        self.0.abort();
    }
}

impl Drop for HandlerGuard {
    fn drop(&mut self) {
        self.abort();
    }
}

fn protocol(err: impl std::fmt::Display) -> BrowserError {
    BrowserError::Protocol(err.to_string())
}

#[async_trait]
impl BrowserSession for ChromeSession {
    async fn goto(&mut self, url: &str) -> Result<(), BrowserError> {
        debug!("goto {}", url);
        self.page
            .goto(url)
            .await
            .map_err(|e| BrowserError::Navigation {
                url: url.to_string(),
                message: e.to_string(),
            })?;
        Ok(())
    }

    async fn click(&mut self, selector: &str) -> Result<(), BrowserError> {
        self.find(selector).await?.click().await.map_err(protocol)?;
        Ok(())
    }

    async fn type_text(&mut self, selector: &str, text: &str) -> Result<(), BrowserError> {
        let element = self.find(selector).await?;
        element.click().await.map_err(protocol)?;
        element.type_str(text).await.map_err(protocol)?;
        Ok(())
    }

    async fn is_visible(&mut self, selector: &str) -> Result<bool, BrowserError> {
        let arg = serde_json::to_string(selector).map_err(protocol)?;
        let expression = format!("{}({})", VISIBILITY_SCRIPT, arg);
        self.page
            .evaluate(expression)
            .await
            .map_err(protocol)?
            .into_value::<bool>()
            .map_err(protocol)
    }

    async fn content(&mut self) -> Result<String, BrowserError> {
        self.page.content().await.map_err(protocol)
    }

    async fn current_url(&mut self) -> Result<String, BrowserError> {
        let url = self.page.url().await.map_err(protocol)?;
        Ok(url.unwrap_or_else(|| "about:blank".to_string()))
    }

    async fn screenshot(&mut self, path: &Path) -> Result<(), BrowserError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        let params = ScreenshotParams::builder()
            .format(CaptureScreenshotFormat::Png)
            .full_page(true)
            .build();
        let bytes = self.page.save_screenshot(params, path).await.map_err(protocol)?;
        debug!("screenshot saved to {} ({} bytes)", path.display(), bytes.len());
        Ok(())
    }

    async fn press_key(&mut self, key: &str) -> Result<(), BrowserError> {
        match self.page.find_element(":focus").await {
            Ok(focused) => {
                focused.press_key(key).await.map_err(protocol)?;
                Ok(())
            }
            Err(_) => self.dispatch_key(key).await,
        }
    }

    async fn close(&mut self) -> Result<(), BrowserError> {
        if let Err(e) = self.browser.close().await {
            warn!("browser close returned error: {}", e);
        }
        self.handler_task.abort();
        info!("browser closed");
        Ok(())
    }
}

/// Launches a `ChromeSession` from config when the agent first needs one
#[derive(Debug, Clone, Default)]
pub struct ChromeLauncher {
    config: BrowserConfig,
}

impl ChromeLauncher {
    pub fn new(config: BrowserConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl SessionLauncher for ChromeLauncher {
    async fn launch(&self) -> Result<Box<dyn BrowserSession>, BrowserError> {
        let session = ChromeSession::launch(&self.config).await?;
        Ok(Box::new(session))
    }
}
