//! Visibility polling shared by the element actions

use std::time::Duration;

use tokio::time::{Instant, sleep};

use crate::browser::{BrowserError, BrowserSession};

/// Poll until `selector` is visible or `timeout` passes.
///
/// Returns `Ok(true)` as soon as the element is visible and `Ok(false)` on
/// deadline. Session errors end the wait immediately.
pub async fn wait_until_visible(
    session: &mut dyn BrowserSession,
    selector: &str,
    timeout: Duration,
    poll: Duration,
) -> Result<bool, BrowserError> {
    let deadline = Instant::now() + timeout;
    loop {
        if session.is_visible(selector).await? {
            return Ok(true);
        }
        let now = Instant::now();
        if now >= deadline {
            return Ok(false);
        }
        sleep(poll.min(deadline - now)).await;
    }
}
