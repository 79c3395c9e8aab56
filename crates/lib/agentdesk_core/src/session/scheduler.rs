// @awa-component: SESS-RevalidationScheduler
//
//! Expiry detection without a server push channel.
//!
//! The persisted credential is re-checked on a fixed cadence and whenever
//! the host reports the surface visible again. The interval and the
//! visibility listener share one cancellation token and stop together.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use super::manager::{Revalidation, SessionManager};

/// Default revalidation cadence: 30 seconds.
pub const DEFAULT_REVALIDATE_INTERVAL: Duration = Duration::from_secs(30);

/// Host-driven visibility of the authenticated surface.
#[derive(Debug, Clone)]
pub struct Visibility {
    tx: Arc<watch::Sender<bool>>,
}

impl Visibility {
    /// Starts visible.
    pub fn new() -> Self {
        let (tx, _) = watch::channel(true);
        Self { tx: Arc::new(tx) }
    }

    /// Report a visibility change; becoming visible triggers a check.
    pub fn set_visible(&self, visible: bool) {
        self.tx.send_if_modified(|current| {
            let changed = *current != visible;
            *current = visible;
            changed
        });
    }

    pub fn is_visible(&self) -> bool {
        *self.tx.borrow()
    }

    fn subscribe(&self) -> watch::Receiver<bool> {
        self.tx.subscribe()
    }
}

impl Default for Visibility {
    fn default() -> Self {
        Self::new()
    }
}

/// Handle to a running revalidation task.
///
/// Dropping the handle cancels the task.
pub struct RevalidationScheduler {
    cancel: CancellationToken,
    handle: Option<JoinHandle<()>>,
}

impl RevalidationScheduler {
    /// Spawn the revalidation loop. The first tick fires one `period` after
    /// spawning.
    pub fn spawn(manager: Arc<SessionManager>, visibility: &Visibility, period: Duration) -> Self {
        let cancel = CancellationToken::new();
        let handle = tokio::spawn(run(manager, visibility.subscribe(), period, cancel.clone()));
        info!(period_secs = period.as_secs(), "revalidation scheduler started");
        Self {
            cancel,
            handle: Some(handle),
        }
    }

    /// Token cancelled on shutdown; lets a host tie other work to the
    /// scheduler's lifetime.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Stop the interval and the visibility listener and wait for the task.
    pub async fn shutdown(mut self) {
        self.cancel.cancel();
        if let Some(handle) = self.handle.take() {
            let _ = handle.await;
        }
        debug!("revalidation scheduler stopped");
    }
}

impl Drop for RevalidationScheduler {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

async fn run(
    manager: Arc<SessionManager>,
    mut visible: watch::Receiver<bool>,
    period: Duration,
    cancel: CancellationToken,
) {
    let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut listening = true;

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {
                check(&manager, "interval").await;
            }
            changed = visible.changed(), if listening => {
                if changed.is_err() {
                    listening = false;
                    continue;
                }
                if *visible.borrow_and_update() {
                    check(&manager, "visible").await;
                }
            }
        }
    }
}

async fn check(manager: &SessionManager, trigger: &'static str) {
    match manager.revalidate().await {
        Revalidation::LoggedOut => info!(trigger, "session expired"),
        outcome => debug!(trigger, ?outcome, "revalidation check"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::Clock;
    use crate::models::auth::PersistedSession;
    use crate::session::guard::Navigation;
    use crate::session::machine::SessionPhase;
    use crate::session::storage::MemoryStorage;
    use crate::session::store::SessionStore;
    use crate::testing::{
        CountingStorage, FakeAuthService, FakeDirectory, RecordingNavigator, TEST_NOW, grant_for,
    };

    /// Epoch clock driven by tokio's (pausable) clock.
    struct TokioClock {
        epoch: i64,
        start: Instant,
    }

    impl Clock for TokioClock {
        fn now(&self) -> i64 {
            self.epoch + self.start.elapsed().as_secs() as i64
        }
    }

    struct Fixture {
        manager: Arc<SessionManager>,
        storage: Arc<CountingStorage<MemoryStorage>>,
        navigator: Arc<RecordingNavigator>,
    }

    async fn authenticated_for(secs: i64) -> Fixture {
        let storage = Arc::new(CountingStorage::new(MemoryStorage::new()));
        let navigator = Arc::new(RecordingNavigator::default());
        let store = SessionStore::new(storage.clone());
        let mut persisted = PersistedSession::from(grant_for("u1", TEST_NOW + secs));
        persisted.user = Some(FakeDirectory::collaborator("u1"));
        store.write_session(&persisted).unwrap();

        let manager = SessionManager::new(
            store,
            Arc::new(FakeAuthService::new()),
            Arc::new(FakeDirectory::new()),
            navigator.clone(),
        )
        .with_clock(Arc::new(TokioClock {
            epoch: TEST_NOW,
            start: Instant::now(),
        }));
        let manager = Arc::new(manager);
        assert!(manager.initialize().await.is_authenticated());
        Fixture {
            manager,
            storage,
            navigator,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn interval_detects_expiry_and_logs_out_once() {
        let f = authenticated_for(40).await;
        let visibility = Visibility::new();
        let scheduler =
            RevalidationScheduler::spawn(f.manager.clone(), &visibility, Duration::from_secs(30));

        tokio::time::sleep(Duration::from_secs(31)).await;
        assert!(f.manager.current().is_authenticated());
        assert_eq!(f.storage.sentinel_removals(), 0);

        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(f.manager.current().phase(), SessionPhase::Unauthenticated);
        assert_eq!(f.storage.sentinel_removals(), 1);

        tokio::time::sleep(Duration::from_secs(120)).await;
        assert_eq!(f.storage.sentinel_removals(), 1);
        assert_eq!(
            f.navigator.requests(),
            vec![Navigation::Login { return_to: None }]
        );

        scheduler.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn becoming_visible_triggers_a_check() {
        let f = authenticated_for(5).await;
        let visibility = Visibility::new();
        let _scheduler =
            RevalidationScheduler::spawn(f.manager.clone(), &visibility, Duration::from_secs(30));

        visibility.set_visible(false);
        tokio::time::sleep(Duration::from_secs(10)).await;
        assert!(f.manager.current().is_authenticated());

        visibility.set_visible(true);
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(f.manager.current().phase(), SessionPhase::Unauthenticated);
        assert_eq!(f.storage.sentinel_removals(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_releases_timer_and_listener() {
        let f = authenticated_for(5).await;
        let visibility = Visibility::new();
        let scheduler =
            RevalidationScheduler::spawn(f.manager.clone(), &visibility, Duration::from_secs(30));
        let token = scheduler.cancellation_token();
        assert!(scheduler.is_running());
        scheduler.shutdown().await;
        assert!(token.is_cancelled());

        visibility.set_visible(false);
        assert!(!visibility.is_visible());
        visibility.set_visible(true);
        assert!(visibility.is_visible());
        tokio::time::sleep(Duration::from_secs(90)).await;
        assert!(f.manager.current().is_authenticated());
        assert_eq!(f.storage.sentinel_removals(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_the_handle_cancels() {
        let f = authenticated_for(5).await;
        let visibility = Visibility::new();
        let scheduler =
            RevalidationScheduler::spawn(f.manager.clone(), &visibility, Duration::from_secs(30));
        let token = scheduler.cancellation_token();
        drop(scheduler);
        assert!(token.is_cancelled());

        tokio::time::sleep(Duration::from_secs(90)).await;
        assert!(f.manager.current().is_authenticated());
    }
}
