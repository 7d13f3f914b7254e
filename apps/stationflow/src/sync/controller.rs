//! # Override Sync Controller
//!
//! Keeps the admin override snapshot current: fetch on mount, refetch on
//! `roadmap-updated` invalidations (debounced), publish only on change.

use super::bus::{Invalidation, ROADMAP_UPDATED};
use super::debounce::Debouncer;
use crate::error::ClientError;
use stationflow_core::{CacheUpdate, OverrideCache, OverrideSnapshot, TeamId};
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{broadcast, mpsc, watch};

/// Where admin overrides come from.
pub trait OverrideSource: Send + Sync + 'static {
    fn fetch_overrides(
        &self,
        team: Option<TeamId>,
    ) -> impl Future<Output = Result<OverrideSnapshot, ClientError>> + Send;
}

/// Owns the override cache and publishes its snapshot through a
/// `watch` channel.
#[derive(Debug)]
pub struct OverrideSyncController<S> {
    source: S,
    cache: Mutex<OverrideCache>,
    published: watch::Sender<OverrideSnapshot>,
    window: Duration,
}

impl<S: OverrideSource> OverrideSyncController<S> {
    pub fn new(source: S, context: Option<TeamId>, window: Duration) -> Self {
        let (published, _) = watch::channel(OverrideSnapshot::default());
        Self {
            source,
            cache: Mutex::new(OverrideCache::new(context)),
            published,
            window,
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Receiver that is notified whenever the snapshot content changes.
    pub fn subscribe(&self) -> watch::Receiver<OverrideSnapshot> {
        self.published.subscribe()
    }

    /// Last published snapshot. Empty until the first successful fetch.
    pub fn current(&self) -> OverrideSnapshot {
        self.published.borrow().clone()
    }

    pub fn context(&self) -> Option<TeamId> {
        self.lock_cache().context()
    }

    fn lock_cache(&self) -> MutexGuard<'_, OverrideCache> {
        self.cache.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Fetch once and apply the result.
    ///
    /// Failures are logged and leave the previous snapshot in place.
    pub async fn refresh(&self) -> CacheUpdate {
        let ticket = self.lock_cache().begin_fetch();
        let result = self.source.fetch_overrides(ticket.context()).await;
        if let Err(e) = &result {
            tracing::warn!(
                error = %e,
                team = ?ticket.context(),
                "Override refresh failed; keeping last snapshot"
            );
        }

        // Publish under the cache lock so the watch value follows apply order.
        let update = {
            let mut cache = self.lock_cache();
            let update = cache.apply(ticket, result);
            if update.is_republished() {
                self.publish(cache.snapshot().clone());
            }
            update
        };
        tracing::debug!(?update, seq = ticket.seq(), "Override refresh applied");
        update
    }

    /// Move to another team. The new team starts from an empty snapshot and
    /// late results for the old one are dropped. Call [`Self::refresh`]
    /// afterwards.
    pub fn switch_context(&self, team: Option<TeamId>) -> bool {
        let changed = {
            let mut cache = self.lock_cache();
            let changed = cache.switch_context(team);
            if changed {
                self.publish(OverrideSnapshot::default());
            }
            changed
        };
        if changed {
            tracing::info!(team = ?team, "Override context switched");
        }
        changed
    }

    fn publish(&self, snapshot: OverrideSnapshot) -> bool {
        self.published.send_if_modified(|current| {
            if *current == snapshot {
                false
            } else {
                *current = snapshot;
                true
            }
        })
    }

    fn wants(&self, event: &Invalidation) -> bool {
        event.event == ROADMAP_UPDATED && event.applies_to(self.context())
    }

    /// Fetch on mount, then [`Self::listen`].
    pub async fn run(self: Arc<Self>, events: broadcast::Receiver<Invalidation>) -> u64 {
        self.refresh().await;
        self.listen(events).await
    }

    /// Refresh on every debounced burst of matching invalidations until the
    /// bus closes. Returns the number of refreshes it triggered.
    pub async fn listen(self: Arc<Self>, mut events: broadcast::Receiver<Invalidation>) -> u64 {
        let (tx, rx) = mpsc::channel::<()>(1);
        let filter = Arc::clone(&self);
        let forward = tokio::spawn(async move {
            loop {
                let trigger = match events.recv().await {
                    Ok(event) => filter.wants(&event),
                    Err(broadcast::error::RecvError::Lagged(missed)) => {
                        tracing::warn!(missed, "Invalidation bus lagged; refreshing");
                        true
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                };
                // A full channel already holds a pending refresh.
                if trigger && matches!(tx.try_send(()), Err(TrySendError::Closed(()))) {
                    break;
                }
            }
        });

        let this = Arc::clone(&self);
        let fired = Debouncer::new(self.window)
            .run(rx, move || {
                let this = Arc::clone(&this);
                async move {
                    this.refresh().await;
                }
            })
            .await;

        if let Err(e) = forward.await {
            tracing::warn!(error = %e, "Invalidation forwarder stopped abnormally");
        }
        fired
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sync::InvalidationBus;
    use stationflow_core::OverrideMap;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct Scripted {
        responses: Mutex<VecDeque<Result<OverrideSnapshot, ()>>>,
        calls: AtomicUsize,
        delay: Duration,
    }

    impl Scripted {
        fn new(responses: Vec<Result<OverrideSnapshot, ()>>) -> Self {
            Self {
                responses: Mutex::new(responses.into()),
                ..Self::default()
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl OverrideSource for Scripted {
        async fn fetch_overrides(
            &self,
            _team: Option<TeamId>,
        ) -> Result<OverrideSnapshot, ClientError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            let next = self
                .responses
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .pop_front();
            match next {
                Some(Ok(snapshot)) => Ok(snapshot),
                _ => Err(ClientError::ConnectionFailed("scripted".into())),
            }
        }
    }

    fn unlocked(key: &str) -> OverrideSnapshot {
        OverrideSnapshot::new(OverrideMap::new(), OverrideMap::new().with(key, true))
    }

    #[tokio::test]
    async fn change_aware_publishing() {
        let controller = OverrideSyncController::new(
            Scripted::new(vec![Ok(unlocked("mvp")), Ok(unlocked("mvp"))]),
            Some(TeamId(1)),
            Duration::from_secs(2),
        );
        let mut rx = controller.subscribe();

        assert_eq!(controller.refresh().await, CacheUpdate::Republished);
        assert!(rx.has_changed().expect("open"));
        rx.borrow_and_update();

        assert_eq!(controller.refresh().await, CacheUpdate::Unchanged);
        assert!(!rx.has_changed().expect("open"));
    }

    #[tokio::test]
    async fn failure_keeps_stale_snapshot() {
        let controller = OverrideSyncController::new(
            Scripted::new(vec![Ok(unlocked("mvp")), Err(())]),
            None,
            Duration::from_secs(2),
        );
        controller.refresh().await;
        assert_eq!(controller.refresh().await, CacheUpdate::Stale);
        assert!(controller.current().unlocks.is_set("mvp"));
    }

    #[tokio::test(start_paused = true)]
    async fn late_result_for_old_team_is_discarded() {
        let source = Scripted {
            delay: Duration::from_secs(1),
            ..Scripted::new(vec![Ok(unlocked("legal"))])
        };
        let controller = Arc::new(OverrideSyncController::new(
            source,
            Some(TeamId(1)),
            Duration::from_secs(2),
        ));

        let inflight = tokio::spawn({
            let controller = Arc::clone(&controller);
            async move { controller.refresh().await }
        });
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(controller.switch_context(Some(TeamId(2))));

        assert_eq!(inflight.await.expect("join"), CacheUpdate::Discarded);
        assert_eq!(controller.current(), OverrideSnapshot::default());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_refreshes_publish_the_cached_snapshot() {
        let responses = (0..400)
            .map(|i| Ok(unlocked(if i % 2 == 0 { "mvp" } else { "legal" })))
            .collect();
        let controller = Arc::new(OverrideSyncController::new(
            Scripted::new(responses),
            Some(TeamId(1)),
            Duration::from_secs(2),
        ));

        for _ in 0..200 {
            let a = tokio::spawn({
                let controller = Arc::clone(&controller);
                async move { controller.refresh().await }
            });
            let b = tokio::spawn({
                let controller = Arc::clone(&controller);
                async move { controller.refresh().await }
            });
            a.await.expect("join");
            b.await.expect("join");
            let cached = controller.lock_cache().snapshot().clone();
            assert_eq!(controller.current(), cached);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn invalidation_burst_coalesces_into_one_fetch() {
        let bus = InvalidationBus::default();
        let controller = Arc::new(OverrideSyncController::new(
            Scripted::new(vec![Ok(unlocked("mvp")), Ok(unlocked("traction"))]),
            Some(TeamId(1)),
            Duration::from_secs(2),
        ));
        let task = tokio::spawn(Arc::clone(&controller).run(bus.subscribe()));

        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(controller.source().calls(), 1);

        for _ in 0..10 {
            bus.publish(Invalidation::roadmap_updated(Some(TeamId(1))));
        }
        bus.publish(Invalidation::roadmap_updated(Some(TeamId(9))));
        bus.publish(Invalidation::new("profile-updated", None));
        tokio::time::sleep(Duration::from_secs(3)).await;

        assert_eq!(controller.source().calls(), 2);
        assert!(controller.current().unlocks.is_set("traction"));

        drop(bus);
        assert_eq!(task.await.expect("join"), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn unrelated_events_trigger_nothing() {
        let bus = InvalidationBus::default();
        let controller = Arc::new(OverrideSyncController::new(
            Scripted::new(vec![Ok(unlocked("mvp"))]),
            Some(TeamId(1)),
            Duration::from_secs(2),
        ));
        let task = tokio::spawn(Arc::clone(&controller).run(bus.subscribe()));

        bus.publish(Invalidation::roadmap_updated(Some(TeamId(2))));
        tokio::time::sleep(Duration::from_secs(5)).await;
        drop(bus);

        assert_eq!(task.await.expect("join"), 0);
        assert_eq!(controller.source().calls(), 1);
    }
}
