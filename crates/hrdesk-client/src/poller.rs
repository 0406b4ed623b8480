//! Polling Synchronizer
//!
//! One loop per view. Each tick fetches the complete list for the view's
//! scope and replaces the displayed state wholesale.
//!
//! - At most one fetch is outstanding per view. A tick that comes due
//!   while a fetch is in flight is delayed, never stacked.
//! - [`ViewHandle::refresh_now`] supersedes an in-flight fetch: the old
//!   request is dropped and its response can never be published.
//! - Filter and sort changes are applied to the last snapshot at once,
//!   without a fetch.
//! - A failed fetch is logged and recorded on the state; the loop keeps
//!   its schedule.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::{watch, Notify};
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::api::ApiError;
use crate::scope::ViewScope;
use crate::sources::SnapshotSource;
use crate::view::{rebuild, ViewSpec};

/// What a view currently displays
#[derive(Clone, Debug)]
pub struct ViewState<T> {
    pub items: Vec<T>,
    /// Fetch that produced `items`. 0 until the first successful sync.
    pub sequence: u64,
    pub synced_at: Option<DateTime<Utc>>,
    pub last_error: Option<ApiError>,
    pub consecutive_failures: u32,
}

impl<T> Default for ViewState<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            sequence: 0,
            synced_at: None,
            last_error: None,
            consecutive_failures: 0,
        }
    }
}

impl<T> ViewState<T> {
    pub fn is_synced(&self) -> bool {
        self.synced_at.is_some()
    }
}

/// Caller side of a running view loop
pub struct ViewHandle<S: ViewSpec> {
    state: watch::Receiver<ViewState<S::Item>>,
    spec: watch::Sender<S>,
    refresh: Arc<Notify>,
}

impl<S: ViewSpec> ViewHandle<S> {
    /// Clone of the current state
    pub fn current(&self) -> ViewState<S::Item> {
        self.state.borrow().clone()
    }

    /// Independent subscription to state changes
    pub fn subscribe(&self) -> watch::Receiver<ViewState<S::Item>> {
        self.state.clone()
    }

    /// Wait for the next published state. `None` once the loop has stopped.
    pub async fn changed(&mut self) -> Option<ViewState<S::Item>> {
        self.state.changed().await.ok()?;
        Some(self.state.borrow_and_update().clone())
    }

    pub fn set_spec(&self, spec: S) {
        self.spec.send_replace(spec);
    }

    pub fn update_spec(&self, f: impl FnOnce(&mut S)) {
        self.spec.send_modify(f);
    }

    /// Fetch now, abandoning any fetch in flight
    pub fn refresh_now(&self) {
        self.refresh.notify_one();
    }
}

pub struct PollingSynchronizer;

impl PollingSynchronizer {
    /// Start polling `source` every `period` inside `scope`. The first
    /// fetch is issued immediately.
    pub fn spawn<Src, S>(scope: &ViewScope, source: Arc<Src>, spec: S, period: Duration) -> ViewHandle<S>
    where
        Src: SnapshotSource<Item = S::Item>,
        S: ViewSpec,
    {
        let (state_tx, state_rx) = watch::channel(ViewState::default());
        let (spec_tx, spec_rx) = watch::channel(spec);
        let refresh = Arc::new(Notify::new());

        let view = scope.name().to_string();
        let notify = refresh.clone();
        scope.spawn(move |token| async move {
            let poll = Poll {
                view,
                source,
                spec: spec_rx,
                state: state_tx,
                refresh: notify,
            };
            poll.run(period, token).await;
        });

        ViewHandle {
            state: state_rx,
            spec: spec_tx,
            refresh,
        }
    }
}

struct Poll<Src, S: ViewSpec> {
    view: String,
    source: Arc<Src>,
    spec: watch::Receiver<S>,
    state: watch::Sender<ViewState<S::Item>>,
    refresh: Arc<Notify>,
}

impl<Src, S> Poll<Src, S>
where
    Src: SnapshotSource<Item = S::Item>,
    S: ViewSpec,
{
    async fn run(mut self, period: Duration, token: CancellationToken) {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let mut snapshot: Vec<S::Item> = Vec::new();
        let mut sequence = 0u64;
        let mut failures = 0u32;
        let mut spec_closed = false;
        let source = Arc::clone(&self.source);

        debug!(view = %self.view, source = source.name(), period_secs = period.as_secs(), "poll loop started");

        loop {
            tokio::select! {
                biased;
                _ = token.cancelled() => break,
                _ = ticker.tick() => {}
                _ = self.refresh.notified() => {}
                changed = self.spec.changed(), if !spec_closed => {
                    match changed {
                        Ok(()) => self.reapply(&snapshot),
                        Err(_) => spec_closed = true,
                    }
                    continue;
                }
            }

            sequence += 1;
            debug!(view = %self.view, sequence, "poll tick");
            let fetch = source.fetch();
            tokio::pin!(fetch);

            let result = loop {
                tokio::select! {
                    biased;
                    _ = token.cancelled() => {
                        debug!(view = %self.view, sequence, "in-flight fetch cancelled");
                        return;
                    }
                    _ = self.refresh.notified() => {
                        sequence += 1;
                        debug!(view = %self.view, sequence, "superseding in-flight fetch");
                        fetch.set(source.fetch());
                    }
                    changed = self.spec.changed(), if !spec_closed => {
                        match changed {
                            Ok(()) => self.reapply(&snapshot),
                            Err(_) => spec_closed = true,
                        }
                    }
                    result = &mut fetch => break result,
                }
            };

            match result {
                Ok(items) => {
                    snapshot = items;
                    failures = 0;
                    let items = rebuild(&snapshot, &*self.spec.borrow());
                    debug!(view = %self.view, sequence, shown = items.len(), total = snapshot.len(), "view synced");
                    self.state.send_replace(ViewState {
                        items,
                        sequence,
                        synced_at: Some(Utc::now()),
                        last_error: None,
                        consecutive_failures: 0,
                    });
                }
                Err(e) => {
                    failures += 1;
                    warn!(view = %self.view, sequence, attempt = failures, error = %e, "poll failed, keeping last snapshot");
                    self.state.send_modify(|s| {
                        s.last_error = Some(e);
                        s.consecutive_failures = failures;
                    });
                }
            }
            // Next tick is a full period after this fetch finished
            ticker.reset();
        }

        debug!(view = %self.view, "poll loop stopped");
    }

    /// Rebuild from the last snapshot under the new filter and sort
    fn reapply(&mut self, snapshot: &[S::Item]) {
        let items = rebuild(snapshot, &*self.spec.borrow_and_update());
        self.state.send_modify(|s| s.items = items);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedSource;
    use std::cmp::Ordering;

    /// Numbers at or above `min`, ascending or descending
    #[derive(Clone, Debug)]
    struct Numbers {
        min: u32,
        descending: bool,
    }

    impl ViewSpec for Numbers {
        type Item = u32;

        fn matches(&self, item: &u32) -> bool {
            *item >= self.min
        }

        fn compare(&self, a: &u32, b: &u32) -> Ordering {
            if self.descending {
                b.cmp(a)
            } else {
                a.cmp(b)
            }
        }
    }

    fn all() -> Numbers {
        Numbers {
            min: 0,
            descending: false,
        }
    }

    const PERIOD: Duration = Duration::from_secs(5);

    #[tokio::test(start_paused = true)]
    async fn test_each_tick_replaces_the_list() {
        let scope = ViewScope::new("tickets");
        let source = Arc::new(ScriptedSource::new(vec![Ok(vec![3, 1, 2]), Ok(vec![5, 2])]));
        let mut handle = PollingSynchronizer::spawn(&scope, source.clone(), all(), PERIOD);

        let first = handle.changed().await.unwrap();
        assert_eq!(first.items, vec![1, 2, 3]);
        assert_eq!(first.sequence, 1);

        // 1 and 3 vanished server-side and must not linger
        let second = handle.changed().await.unwrap();
        assert_eq!(second.items, vec![2, 5]);
        assert_eq!(second.sequence, 2);
        assert_eq!(source.calls(), 2);

        scope.close().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_is_swallowed_and_loop_recovers() {
        let scope = ViewScope::new("bell");
        let source = Arc::new(ScriptedSource::new(vec![
            Ok(vec![1]),
            Err(ApiError::TransientNetwork("offline".into())),
            Err(ApiError::TransientNetwork("offline".into())),
            Ok(vec![1, 4]),
        ]));
        let mut handle = PollingSynchronizer::spawn(&scope, source, all(), PERIOD);

        assert_eq!(handle.changed().await.unwrap().items, vec![1]);

        let failed = handle.changed().await.unwrap();
        assert_eq!(failed.items, vec![1]);
        assert_eq!(failed.consecutive_failures, 1);
        assert!(failed.last_error.as_ref().is_some_and(ApiError::is_transient));

        assert_eq!(handle.changed().await.unwrap().consecutive_failures, 2);

        let recovered = handle.changed().await.unwrap();
        assert_eq!(recovered.items, vec![1, 4]);
        assert_eq!(recovered.consecutive_failures, 0);
        assert!(recovered.last_error.is_none());

        scope.close().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_single_flight_with_slow_source() {
        let scope = ViewScope::new("queue");
        let source = Arc::new(ScriptedSource::new(vec![Ok(vec![1])]).slow(Duration::from_secs(12)));
        let _handle = PollingSynchronizer::spawn(&scope, source.clone(), all(), PERIOD);

        tokio::time::sleep(Duration::from_secs(120)).await;
        assert_eq!(source.max_in_flight(), 1);
        // Each cycle is 12s of fetch plus a full 5s period
        assert!((6..=8).contains(&source.calls()), "calls = {}", source.calls());

        scope.close().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_refresh_supersedes_in_flight_fetch() {
        let scope = ViewScope::new("tickets");
        let source = Arc::new(
            ScriptedSource::new(vec![Ok(vec![1, 2, 3]), Ok(vec![7])]).slow(Duration::from_secs(4)),
        );
        let mut handle = PollingSynchronizer::spawn(&scope, source.clone(), all(), PERIOD);

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(source.in_flight(), 1);
        handle.refresh_now();

        // The stale answer from the first request is never shown
        let state = handle.changed().await.unwrap();
        assert_eq!(state.items, vec![7]);
        assert_eq!(state.sequence, 2);
        assert_eq!(source.calls(), 2);
        assert_eq!(source.max_in_flight(), 1);

        scope.close().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_spec_change_reapplies_without_fetch() {
        let scope = ViewScope::new("tickets");
        let source = Arc::new(ScriptedSource::new(vec![Ok(vec![4, 9, 1, 6])]));
        let mut handle = PollingSynchronizer::spawn(&scope, source.clone(), all(), Duration::from_secs(15));

        assert_eq!(handle.changed().await.unwrap().items, vec![1, 4, 6, 9]);

        handle.set_spec(Numbers {
            min: 5,
            descending: true,
        });
        let state = handle.changed().await.unwrap();
        assert_eq!(state.items, vec![9, 6]);
        assert_eq!(state.sequence, 1);
        assert_eq!(source.calls(), 1);

        handle.update_spec(|s| s.min = 0);
        assert_eq!(handle.changed().await.unwrap().items, vec![9, 6, 4, 1]);

        scope.close().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_closing_scope_stops_polling() {
        let scope = ViewScope::new("tickets");
        let source = Arc::new(ScriptedSource::new(vec![Ok(vec![1])]).slow(Duration::from_secs(3)));
        let mut handle = PollingSynchronizer::spawn(&scope, source.clone(), all(), PERIOD);

        handle.changed().await.unwrap();
        tokio::time::sleep(Duration::from_secs(6)).await;
        assert_eq!(source.in_flight(), 1);

        scope.close().await;
        assert_eq!(source.in_flight(), 0);
        let calls = source.calls();

        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(source.calls(), calls);
        assert!(handle.changed().await.is_none());
    }
}
