//! Presence announcer: "currently playing" status with timed revert.
//!
//! A single process-wide slot holds the pending revert. A new announcement
//! cancels the previous timer before arming its own, and the revert itself
//! runs under the slot lock after a generation check, so a timer that lost
//! the race never overwrites a newer title.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Status surface (bot activity, overlay, …)
pub trait PresenceSink: Send + Sync {
    fn set_status(&self, text: &str);
}

struct PendingRevert {
    generation: u64,
    title: String,
    cancel: CancellationToken,
}

struct AnnouncerInner {
    sink: Arc<dyn PresenceSink>,
    timeout: Duration,
    suffix: Option<String>,
    ambient: RwLock<String>,
    slot: Mutex<Option<PendingRevert>>,
    generation: AtomicU64,
}

impl AnnouncerInner {
    fn format(&self, text: &str) -> String {
        match &self.suffix {
            Some(suffix) => format!("{} | {}", text, suffix),
            None => text.to_string(),
        }
    }

    fn ambient_text(&self) -> String {
        let ambient = self.ambient.read().unwrap_or_else(PoisonError::into_inner);
        self.format(&ambient)
    }

    fn revert_if_current(&self, generation: u64) {
        let mut slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
        let current = slot
            .as_ref()
            .is_some_and(|p| p.generation == generation && !p.cancel.is_cancelled());
        if current {
            if let Some(pending) = slot.take() {
                debug!(title = %pending.title, "Status timeout reached, reverting");
            }
            self.sink.set_status(&self.ambient_text());
        }
    }
}

/// Shared "currently playing" announcer. Cloning shares the same slot.
#[derive(Clone)]
pub struct Announcer {
    inner: Arc<AnnouncerInner>,
}

impl Announcer {
    /// * `timeout` - delay before reverting to the ambient status
    /// * `suffix` - appended as `"<text> | <suffix>"` (typically the chat command)
    /// * `ambient` - default status text (typically the channel title)
    pub fn new(
        sink: Arc<dyn PresenceSink>,
        timeout: Duration,
        suffix: Option<String>,
        ambient: impl Into<String>,
    ) -> Self {
        Self {
            inner: Arc::new(AnnouncerInner {
                sink,
                timeout,
                suffix,
                ambient: RwLock::new(ambient.into()),
                slot: Mutex::new(None),
                generation: AtomicU64::new(0),
            }),
        }
    }

    /// Shows `title` and arms a revert timer, cancelling any pending one.
    ///
    /// Must be called from within a tokio runtime.
    pub fn announce(&self, title: &str) {
        let generation = self.inner.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let cancel = CancellationToken::new();

        {
            let mut slot = self.inner.slot.lock().unwrap_or_else(PoisonError::into_inner);
            if let Some(previous) = slot.take() {
                previous.cancel.cancel();
                debug!(previous = %previous.title, "Pending status revert cancelled");
            }
            info!(title = %title, "🎵 Setting status");
            self.inner.sink.set_status(&self.inner.format(title));
            *slot = Some(PendingRevert {
                generation,
                title: title.to_string(),
                cancel: cancel.clone(),
            });
        }

        let inner = self.inner.clone();
        let timeout = self.inner.timeout;
        tokio::spawn(async move {
            tokio::select! {
                _ = cancel.cancelled() => {}
                _ = tokio::time::sleep(timeout) => inner.revert_if_current(generation),
            }
        });
    }

    /// Cancels any pending timer and shows the ambient status now.
    pub fn show_ambient(&self) {
        let mut slot = self.inner.slot.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(previous) = slot.take() {
            previous.cancel.cancel();
        }
        self.inner.sink.set_status(&self.inner.ambient_text());
    }

    /// Changes the ambient text.
    ///
    /// Shown immediately when nothing is currently announced.
    pub fn set_ambient(&self, ambient: impl Into<String>) {
        {
            let mut current = self
                .inner
                .ambient
                .write()
                .unwrap_or_else(PoisonError::into_inner);
            *current = ambient.into();
        }
        let slot = self.inner.slot.lock().unwrap_or_else(PoisonError::into_inner);
        if slot.is_none() {
            self.inner.sink.set_status(&self.inner.ambient_text());
        }
    }

    /// Title currently announced, `None` when the ambient status is shown
    pub fn current_title(&self) -> Option<String> {
        let slot = self.inner.slot.lock().unwrap_or_else(PoisonError::into_inner);
        slot.as_ref().map(|p| p.title.clone())
    }

    pub fn timeout(&self) -> Duration {
        self.inner.timeout
    }
}
