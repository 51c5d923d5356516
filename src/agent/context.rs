//! Session context - everything one agent owns across tasks

use log::info;

use crate::browser::{BrowserSession, SessionLauncher};
use crate::conversation::Conversation;
use crate::error::Result;

/// The browser session (acquired lazily), how to acquire it, and the
/// conversation. Owned by exactly one agent; nothing in here is shared.
pub struct SessionContext {
    session: Option<Box<dyn BrowserSession>>,
    launcher: Box<dyn SessionLauncher>,
    pub conversation: Conversation,
}

impl SessionContext {
    pub fn new(launcher: Box<dyn SessionLauncher>, conversation: Conversation) -> Self {
        Self {
            session: None,
            launcher,
            conversation,
        }
    }

    /// Use `session` instead of launching one
    pub fn with_session(mut self, session: Box<dyn BrowserSession>) -> Self {
        self.session = Some(session);
        self
    }

    pub fn has_session(&self) -> bool {
        self.session.is_some()
    }

    /// Launch a session if there is none yet
    pub async fn ensure_session(&mut self) -> Result<()> {
        if self.session.is_none() {
            info!("No browser session yet, launching one");
            self.session = Some(self.launcher.launch().await?);
        }
        Ok(())
    }

    /// Both halves at once, for the loop. `None` before `ensure_session`.
    pub fn parts(&mut self) -> Option<(&mut dyn BrowserSession, &mut Conversation)> {
        let session: &mut dyn BrowserSession = self.session.as_deref_mut()?;
        Some((session, &mut self.conversation))
    }

    /// Close and drop the session, if any
    pub async fn close(&mut self) -> Result<()> {
        if let Some(mut session) = self.session.take() {
            session.close().await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::browser::{MockLauncher, MockSession};
    use crate::error::SurfrError;
    use crate::llm::MockLlmClient;
    use std::sync::Arc;

    fn conversation() -> Conversation {
        Conversation::new(Arc::new(MockLlmClient::default()), "sys", vec![])
    }

    #[tokio::test]
    async fn test_ensure_session_launches_once() {
        let launcher = MockLauncher::new(MockSession::new());
        let mut ctx = SessionContext::new(Box::new(launcher.clone()), conversation());
        assert!(!ctx.has_session());
        assert!(ctx.parts().is_none());

        ctx.ensure_session().await.unwrap();
        ctx.ensure_session().await.unwrap();
        assert!(ctx.has_session());
        assert!(ctx.parts().is_some());
        assert_eq!(launcher.launch_count(), 1);
    }

    #[tokio::test]
    async fn test_injected_session_skips_launch() {
        let launcher = MockLauncher::new(MockSession::new());
        let mut ctx = SessionContext::new(Box::new(launcher.clone()), conversation())
            .with_session(Box::new(MockSession::new()));

        ctx.ensure_session().await.unwrap();
        assert_eq!(launcher.launch_count(), 0);
    }

    #[tokio::test]
    async fn test_launch_failure_is_browser_error() {
        let mut ctx = SessionContext::new(Box::new(MockLauncher::failing()), conversation());
        let err = ctx.ensure_session().await.unwrap_err();
        assert!(matches!(err, SurfrError::Browser(_)));
    }

    #[tokio::test]
    async fn test_close_drops_session() {
        let session = MockSession::new();
        let mut ctx = SessionContext::new(Box::new(MockLauncher::failing()), conversation())
            .with_session(Box::new(session.clone()));
        ctx.close().await.unwrap();
        assert!(!ctx.has_session());
        assert_eq!(session.operations(), vec!["close"]);
    }
}
