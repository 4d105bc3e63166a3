use crate::error::{RagError, RagResult};
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;

/// A cloneable cancellation flag.
///
/// The caller keeps one clone and hands another to the pipeline, which races
/// every external call against [`CancellationToken::cancelled`]. Cancelling
/// is sticky: once set, the token never resets.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    inner: Arc<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    cancelled: AtomicBool,
    notify: Notify,
}

impl CancellationToken {
    /// Create a fresh, un-cancelled token.
    pub fn new() -> Self {
        Self::default()
    }

    /// Signal cancellation to every holder of this token.
    pub fn cancel(&self) {
        self.inner.cancelled.store(true, Ordering::SeqCst);
        self.inner.notify.notify_waiters();
    }

    /// Whether [`cancel`](Self::cancel) has been called.
    pub fn is_cancelled(&self) -> bool {
        self.inner.cancelled.load(Ordering::SeqCst)
    }

    /// Resolves once the token is cancelled.
    pub async fn cancelled(&self) {
        loop {
            // Register before checking the flag so a concurrent cancel() is not lost.
            let notified = self.inner.notify.notified();
            if self.is_cancelled() {
                return;
            }
            notified.await;
        }
    }

    /// Run `fut` unless the token fires first.
    ///
    /// Returns [`RagError::Cancelled`] tagged with `stage` when cancellation
    /// wins, including when the token was already cancelled before the call.
    pub async fn run<F, T>(&self, stage: &str, fut: F) -> RagResult<T>
    where
        F: Future<Output = RagResult<T>>,
    {
        if self.is_cancelled() {
            return Err(RagError::Cancelled {
                stage: stage.to_string(),
            });
        }
        tokio::select! {
            biased;
            _ = self.cancelled() => Err(RagError::Cancelled { stage: stage.to_string() }),
            out = fut => out,
        }
    }
}
