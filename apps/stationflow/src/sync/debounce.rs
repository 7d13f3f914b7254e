//! # Debouncer
//!
//! Coalesces bursts of triggers into one trailing-edge action.
//!
//! The window opens at the first trigger of a burst. Triggers that arrive
//! while it is open are absorbed; when it closes the action runs once.
//! Triggers that arrive while the action is running start the next burst.

use std::future::Future;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{Instant, sleep_until};

/// Trailing-edge coalescing over an mpsc trigger channel.
#[derive(Debug, Clone, Copy)]
pub struct Debouncer {
    window: Duration,
}

impl Debouncer {
    #[must_use]
    pub fn new(window: Duration) -> Self {
        Self { window }
    }

    #[must_use]
    pub fn window(&self) -> Duration {
        self.window
    }

    /// Run until every trigger sender is dropped.
    ///
    /// A burst still pending when the channel closes is flushed. Returns the
    /// number of times `action` ran.
    pub async fn run<T, F, Fut>(&self, mut triggers: mpsc::Receiver<T>, mut action: F) -> u64
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = ()>,
    {
        let mut fired = 0u64;
        while triggers.recv().await.is_some() {
            let deadline = sleep_until(Instant::now() + self.window);
            tokio::pin!(deadline);

            let mut closed = false;
            let mut absorbed = 0u64;
            loop {
                tokio::select! {
                    () = &mut deadline => break,
                    msg = triggers.recv() => match msg {
                        Some(_) => absorbed += 1,
                        None => {
                            closed = true;
                            break;
                        }
                    },
                }
            }

            tracing::trace!(absorbed, "Debounce window closed");
            action().await;
            fired += 1;
            if closed {
                break;
            }
        }
        fired
    }
}
