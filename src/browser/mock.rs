//! In-memory browser session for tests

use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;

use super::{BrowserError, BrowserSession, SessionLauncher};

/// A fake page: a URL → HTML map plus the selectors that exist on it.
///
/// Clones share the operation log, so a test can keep one copy and hand the
/// other to the agent.
#[derive(Debug, Clone, Default)]
pub struct MockSession {
    current_url: String,
    pages: HashMap<String, String>,
    visible: HashSet<String>,
    hidden: HashSet<String>,
    log: Arc<Mutex<Vec<String>>>,
}

impl MockSession {
    pub fn new() -> Self {
        Self {
            current_url: "about:blank".to_string(),
            ..Default::default()
        }
    }

    /// Make `url` navigable, serving `html`
    pub fn with_page(mut self, url: impl Into<String>, html: impl Into<String>) -> Self {
        self.pages.insert(url.into(), html.into());
        self
    }

    /// An element that exists and is rendered
    pub fn with_visible(mut self, selector: impl Into<String>) -> Self {
        self.visible.insert(selector.into());
        self
    }

    /// An element that exists but is not rendered
    pub fn with_hidden(mut self, selector: impl Into<String>) -> Self {
        self.hidden.insert(selector.into());
        self
    }

    /// Every operation performed so far, e.g. `"click #go"`
    pub fn operations(&self) -> Vec<String> {
        self.log.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    fn record(&self, op: String) {
        self.log.lock().unwrap_or_else(PoisonError::into_inner).push(op);
    }

    fn exists(&self, selector: &str) -> bool {
        self.visible.contains(selector) || self.hidden.contains(selector)
    }

    fn require(&self, selector: &str) -> Result<(), BrowserError> {
        if self.exists(selector) {
            Ok(())
        } else {
            Err(BrowserError::ElementNotFound {
                selector: selector.to_string(),
            })
        }
    }
}

#[async_trait]
impl BrowserSession for MockSession {
    async fn goto(&mut self, url: &str) -> Result<(), BrowserError> {
        self.record(format!("goto {}", url));
        if !self.pages.contains_key(url) {
            return Err(BrowserError::Navigation {
                url: url.to_string(),
                message: "net::ERR_NAME_NOT_RESOLVED".to_string(),
            });
        }
        self.current_url = url.to_string();
        Ok(())
    }

    async fn click(&mut self, selector: &str) -> Result<(), BrowserError> {
        self.record(format!("click {}", selector));
        self.require(selector)
    }

    async fn type_text(&mut self, selector: &str, text: &str) -> Result<(), BrowserError> {
        self.record(format!("type {} {}", selector, text));
        self.require(selector)
    }

    async fn is_visible(&mut self, selector: &str) -> Result<bool, BrowserError> {
        Ok(self.visible.contains(selector))
    }

    async fn content(&mut self) -> Result<String, BrowserError> {
        Ok(self.pages.get(&self.current_url).cloned().unwrap_or_default())
    }

    async fn current_url(&mut self) -> Result<String, BrowserError> {
        Ok(self.current_url.clone())
    }

    async fn screenshot(&mut self, path: &Path) -> Result<(), BrowserError> {
        self.record(format!("screenshot {}", path.display()));
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(path, b"\x89PNG\r\n").await?;
        Ok(())
    }

    async fn press_key(&mut self, key: &str) -> Result<(), BrowserError> {
        self.record(format!("key {}", key));
        Ok(())
    }

    async fn close(&mut self) -> Result<(), BrowserError> {
        self.record("close".to_string());
        Ok(())
    }
}

/// Hands out clones of a template session, or fails every launch
#[derive(Debug, Clone)]
pub struct MockLauncher {
    template: Option<MockSession>,
    launches: Arc<AtomicUsize>,
}

impl MockLauncher {
    pub fn new(template: MockSession) -> Self {
        Self {
            template: Some(template),
            launches: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// A launcher whose every launch fails
    pub fn failing() -> Self {
        Self {
            template: None,
            launches: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn launch_count(&self) -> usize {
        self.launches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SessionLauncher for MockLauncher {
    async fn launch(&self) -> Result<Box<dyn BrowserSession>, BrowserError> {
        self.launches.fetch_add(1, Ordering::SeqCst);
        match &self.template {
            Some(session) => Ok(Box::new(session.clone())),
            None => Err(BrowserError::Launch("chrome executable not found".to_string())),
        }
    }
}
