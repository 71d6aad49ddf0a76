use crate::error::Result;
use crate::services::change_feed_service::{ChangeFeed, Subscription};
use crate::services::dashboard_service::Dashboard;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, Instant};
use tokio_util::sync::CancellationToken;

/// Keeps a [`Dashboard`] in sync with the candidate change feed.
///
/// The listener owns its subscription. Stopping it, or just dropping it,
/// releases the subscription.
pub struct RealtimeListener {
    cancel: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl RealtimeListener {
    pub async fn start(
        dashboard: Dashboard,
        feed: &dyn ChangeFeed,
        window: Duration,
    ) -> Result<Self> {
        let subscription = feed.subscribe().await?;
        Ok(Self::spawn(dashboard, subscription, window))
    }

    /// Subscribes first, then runs the initial load, so a change landing
    /// between the two still reaches the dashboard.
    pub async fn mount(
        dashboard: Dashboard,
        feed: &dyn ChangeFeed,
        window: Duration,
    ) -> Result<Self> {
        let listener = Self::start(dashboard.clone(), feed, window).await?;
        dashboard.refresh(true).await;
        Ok(listener)
    }

    pub fn spawn(dashboard: Dashboard, subscription: Subscription, window: Duration) -> Self {
        let cancel = CancellationToken::new();
        let task = tokio::spawn(listen(dashboard, subscription, window, cancel.clone()));
        Self {
            cancel,
            task: Some(task),
        }
    }

    pub fn is_finished(&self) -> bool {
        self.task.as_ref().map_or(true, |t| t.is_finished())
    }

    /// Cancels the listener and waits until the subscription is released.
    pub async fn stop(mut self) {
        self.cancel.cancel();
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                tracing::error!(error = ?e, "realtime listener task failed");
            }
        }
    }
}

impl Drop for RealtimeListener {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// Events arm a refresh `window` ahead; events arriving while armed are
/// folded into that same refresh.
async fn listen(
    dashboard: Dashboard,
    mut subscription: Subscription,
    window: Duration,
    cancel: CancellationToken,
) {
    let mut deadline: Option<Instant> = None;
    let mut coalesced = 0usize;

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            event = subscription.next() => match event {
                Some(event) => {
                    tracing::trace!(?event, "change event");
                    coalesced += 1;
                    deadline.get_or_insert_with(|| Instant::now() + window);
                }
                None => {
                    tracing::warn!("Change feed closed, stopping realtime listener");
                    if deadline.is_some() {
                        dashboard.refresh(false).await;
                    }
                    break;
                }
            },
            _ = sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {
                tracing::debug!(events = coalesced, "Refreshing after change burst");
                deadline = None;
                coalesced = 0;
                dashboard.refresh(false).await;
            }
        }
    }

    drop(subscription);
    tracing::info!("Realtime listener stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::models::candidate::{Candidate, CandidateStatus};
    use crate::models::change_event::{ChangeEvent, ChangeOp};
    use crate::services::candidate_service::CandidateStore;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use tokio::sync::mpsc;
    use uuid::Uuid;

    const WINDOW: Duration = Duration::from_millis(1000);

    #[derive(Default)]
    struct CountingStore {
        fetches: AtomicUsize,
    }

    #[async_trait]
    impl CandidateStore for CountingStore {
        async fn list_candidates(&self) -> crate::error::Result<Vec<Candidate>> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            Ok(Vec::new())
        }

        async fn update_status(
            &self,
            _id: Uuid,
            _status: CandidateStatus,
        ) -> crate::error::Result<()> {
            Ok(())
        }
    }

    struct ChannelFeed(Mutex<Option<mpsc::Receiver<ChangeEvent>>>);

    #[async_trait]
    impl ChangeFeed for ChannelFeed {
        async fn subscribe(&self) -> crate::error::Result<Subscription> {
            self.0
                .lock()
                .unwrap()
                .take()
                .map(Subscription::from_channel)
                .ok_or_else(|| Error::Subscription("already subscribed".into()))
        }
    }

    /// Records whether the feed was already subscribed at each fetch.
    struct WatchingStore {
        subscribed: Arc<AtomicBool>,
        seen: Mutex<Vec<bool>>,
        rows: Vec<Candidate>,
    }

    #[async_trait]
    impl CandidateStore for WatchingStore {
        async fn list_candidates(&self) -> crate::error::Result<Vec<Candidate>> {
            self.seen
                .lock()
                .unwrap()
                .push(self.subscribed.load(Ordering::SeqCst));
            Ok(self.rows.clone())
        }

        async fn update_status(
            &self,
            _id: Uuid,
            _status: CandidateStatus,
        ) -> crate::error::Result<()> {
            Ok(())
        }
    }

    struct FlaggingFeed {
        subscribed: Arc<AtomicBool>,
        inner: ChannelFeed,
    }

    #[async_trait]
    impl ChangeFeed for FlaggingFeed {
        async fn subscribe(&self) -> crate::error::Result<Subscription> {
            let subscription = self.inner.subscribe().await?;
            self.subscribed.store(true, Ordering::SeqCst);
            Ok(subscription)
        }
    }

    fn update_event() -> ChangeEvent {
        ChangeEvent {
            op: Some(ChangeOp::Update),
            id: Some(Uuid::new_v4()),
        }
    }

    fn setup() -> (Arc<CountingStore>, Dashboard, mpsc::Sender<ChangeEvent>, Subscription) {
        let store = Arc::new(CountingStore::default());
        let dashboard = Dashboard::new(store.clone());
        let (tx, rx) = mpsc::channel(16);
        (store, dashboard, tx, Subscription::from_channel(rx))
    }

    #[tokio::test(start_paused = true)]
    async fn burst_of_events_triggers_one_refresh() {
        let (store, dashboard, tx, subscription) = setup();
        let _listener = RealtimeListener::spawn(dashboard, subscription, WINDOW);

        for _ in 0..5 {
            tx.send(update_event()).await.unwrap();
        }
        tokio::time::sleep(Duration::from_millis(500)).await;
        assert_eq!(store.fetches.load(Ordering::SeqCst), 0);

        tx.send(update_event()).await.unwrap();
        tokio::time::sleep(Duration::from_millis(600)).await;
        assert_eq!(store.fetches.load(Ordering::SeqCst), 1);

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(store.fetches.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn separate_bursts_refresh_separately() {
        let (store, dashboard, tx, subscription) = setup();
        let _listener = RealtimeListener::spawn(dashboard, subscription, WINDOW);

        tx.send(update_event()).await.unwrap();
        tokio::time::sleep(Duration::from_millis(1500)).await;
        tx.send(update_event()).await.unwrap();
        tokio::time::sleep(Duration::from_millis(1500)).await;

        assert_eq!(store.fetches.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn stop_releases_subscription() {
        let (store, dashboard, tx, subscription) = setup();
        let listener = RealtimeListener::spawn(dashboard, subscription, WINDOW);

        tx.send(update_event()).await.unwrap();
        listener.stop().await;

        assert!(tx.is_closed());
        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(store.fetches.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn drop_releases_subscription() {
        let (_store, dashboard, tx, subscription) = setup();
        let listener = RealtimeListener::spawn(dashboard, subscription, WINDOW);

        drop(listener);
        tokio::time::sleep(Duration::from_millis(10)).await;

        assert!(tx.is_closed());
    }

    #[tokio::test(start_paused = true)]
    async fn closed_feed_flushes_pending_refresh_and_stops() {
        let (store, dashboard, tx, subscription) = setup();
        let listener = RealtimeListener::spawn(dashboard, subscription, WINDOW);

        tx.send(update_event()).await.unwrap();
        drop(tx);
        tokio::time::sleep(Duration::from_millis(10)).await;

        assert!(listener.is_finished());
        assert_eq!(store.fetches.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn mount_subscribes_before_initial_load() {
        let subscribed = Arc::new(AtomicBool::new(false));
        let row = Candidate {
            id: Uuid::new_v4(),
            full_name: Some("Ana García".into()),
            applied_job_title: None,
            status: None,
            match_score: None,
            ai_analysis: None,
            resume_url: None,
            linkedin_url: None,
            created_at: chrono::Utc::now(),
        };
        let store = Arc::new(WatchingStore {
            subscribed: subscribed.clone(),
            seen: Mutex::new(Vec::new()),
            rows: vec![row.clone()],
        });
        let dashboard = Dashboard::new(store.clone());
        let (tx, rx) = mpsc::channel(4);
        let feed = FlaggingFeed {
            subscribed,
            inner: ChannelFeed(Mutex::new(Some(rx))),
        };

        let listener = RealtimeListener::mount(dashboard.clone(), &feed, WINDOW)
            .await
            .unwrap();

        assert_eq!(*store.seen.lock().unwrap(), vec![true]);
        let state = dashboard.snapshot().await;
        assert!(!state.loading);
        assert_eq!(state.selected.map(|c| c.id), Some(row.id));

        listener.stop().await;
        assert!(tx.is_closed());
    }

    #[tokio::test]
    async fn mount_fails_without_a_subscription() {
        let subscribed = Arc::new(AtomicBool::new(false));
        let store = Arc::new(WatchingStore {
            subscribed: subscribed.clone(),
            seen: Mutex::new(Vec::new()),
            rows: Vec::new(),
        });
        let dashboard = Dashboard::new(store.clone());
        let feed = FlaggingFeed {
            subscribed,
            inner: ChannelFeed(Mutex::new(None)),
        };

        assert!(RealtimeListener::mount(dashboard, &feed, WINDOW).await.is_err());
        assert!(store.seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn start_subscribes_through_the_feed() {
        let store = Arc::new(CountingStore::default());
        let dashboard = Dashboard::new(store);
        let (tx, rx) = mpsc::channel(4);
        let feed = ChannelFeed(Mutex::new(Some(rx)));

        let listener = RealtimeListener::start(dashboard.clone(), &feed, WINDOW)
            .await
            .unwrap();
        assert!(!listener.is_finished());
        assert!(RealtimeListener::start(dashboard, &feed, WINDOW).await.is_err());

        listener.stop().await;
        assert!(tx.is_closed());
    }
}
