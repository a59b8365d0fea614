use std::time::Duration;

use tokio::task::AbortHandle;
use tokio_util::sync::CancellationToken;

/// Debounce timer plus the cancellation token of the outstanding suggestion
/// fetch.
///
/// Holds at most one armed timer and one live token. Arming a timer or
/// starting a fetch invalidates whatever was there before.
#[derive(Debug, Default)]
pub struct Scheduler {
    timer: Option<AbortHandle>,
    token: Option<CancellationToken>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drops the armed timer (if it has not fired) and cancels the
    /// outstanding fetch token.
    pub fn cancel_pending(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
        if let Some(token) = self.token.take() {
            token.cancel();
        }
    }

    /// Runs `on_fire` once `delay` passes without the timer being replaced or
    /// cancelled. Must be called from within a tokio runtime.
    pub fn arm<F>(&mut self, delay: Duration, on_fire: F)
    where
        F: FnOnce() + Send + 'static,
    {
        if let Some(prev) = self.timer.take() {
            prev.abort();
        }
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            on_fire();
        });
        self.timer = Some(handle.abort_handle());
    }

    /// Mints the token for a new fetch, cancelling the previous one.
    pub fn begin_fetch(&mut self) -> CancellationToken {
        if let Some(prev) = self.token.take() {
            prev.cancel();
        }
        let token = CancellationToken::new();
        self.token = Some(token.clone());
        token
    }

    #[cfg(test)]
    fn is_armed(&self) -> bool {
        self.timer.as_ref().is_some_and(|t| !t.is_finished())
    }

    #[cfg(test)]
    fn has_live_token(&self) -> bool {
        self.token.as_ref().is_some_and(|t| !t.is_cancelled())
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        self.cancel_pending();
    }
}
