//! Shared current-user record.
//!
//! Fetched once when the application starts and re-fetched in full when a
//! `ProfileUpdated` event arrives. A failed fetch keeps whatever was loaded
//! before, so a network blip never looks like a sign-out.

use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use tokio::sync::watch;

use crate::client::ApiClient;
use crate::error::ApiError;
use crate::events::{AppEvent, EventObserver};
use crate::users::CurrentUser;

pub const PROFILE_ENDPOINT: &str = "/users/profile/";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheStatus {
    Loading,
    Loaded,
    /// Last fetch failed; `user` is whatever was loaded before, if anything
    Stale { error: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserSnapshot {
    pub user: Option<CurrentUser>,
    pub status: CacheStatus,
}

pub struct CurrentUserCache {
    client: ApiClient,
    state: watch::Sender<UserSnapshot>,
    /// Bumped by every fetch and by `reset`; a response from an older
    /// generation is dropped
    generation: AtomicU64,
}

impl CurrentUserCache {
    pub fn new(client: ApiClient) -> Self {
        let (state, _) = watch::channel(UserSnapshot {
            user: None,
            status: CacheStatus::Loading,
        });
        Self {
            client,
            state,
            generation: AtomicU64::new(0),
        }
    }

    /// Kick off the initial fetch in the background. Readers see
    /// `Loading` until it settles.
    pub fn start(self: &std::sync::Arc<Self>) -> tokio::task::JoinHandle<()> {
        let cache = std::sync::Arc::clone(self);
        tokio::spawn(async move {
            // Outcome is already recorded in the snapshot
            let _ = cache.refetch().await;
        })
    }

    pub fn snapshot(&self) -> UserSnapshot {
        self.state.borrow().clone()
    }

    pub fn user(&self) -> Option<CurrentUser> {
        self.state.borrow().user.clone()
    }

    pub fn is_loading(&self) -> bool {
        self.state.borrow().status == CacheStatus::Loading
    }

    /// Change feed for renderers that redraw on every update.
    pub fn watch(&self) -> watch::Receiver<UserSnapshot> {
        self.state.subscribe()
    }

    /// Re-fetch the whole record. The previous user stays visible while
    /// loading and after a failure. If another fetch started meanwhile,
    /// this result is returned but not cached.
    pub async fn refetch(&self) -> Result<CurrentUser, ApiError> {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        self.state.send_modify(|snapshot| snapshot.status = CacheStatus::Loading);

        let result = self.client.get::<CurrentUser>(PROFILE_ENDPOINT).await;

        // Checked under the channel lock so a newer fetch cannot commit in between
        let committed = self.state.send_if_modified(|snapshot| {
            if self.generation.load(Ordering::SeqCst) != generation {
                return false;
            }
            match &result {
                Ok(user) => {
                    *snapshot = UserSnapshot {
                        user: Some(user.clone()),
                        status: CacheStatus::Loaded,
                    }
                }
                Err(e) => {
                    snapshot.status = CacheStatus::Stale {
                        error: e.message().to_string(),
                    }
                }
            }
            true
        });

        match &result {
            _ if !committed => tracing::debug!("Dropping superseded current-user response"),
            Ok(user) => tracing::info!("Current user loaded: {}", user.username),
            Err(e) => tracing::error!("Failed to load current user: {}", e),
        }
        result
    }

    /// Resolves once the snapshot is no longer `Loading`.
    pub async fn wait_settled(&self) -> UserSnapshot {
        let mut rx = self.state.subscribe();
        let settled = match rx.wait_for(|s| s.status != CacheStatus::Loading).await {
            Ok(snapshot) => snapshot.clone(),
            // Sender lives in self, so this only happens during teardown
            Err(_) => self.snapshot(),
        };
        settled
    }

    /// Forget the user, e.g. after logout.
    pub fn reset(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        self.state.send_replace(UserSnapshot {
            user: None,
            status: CacheStatus::Loading,
        });
    }
}

#[async_trait]
impl EventObserver for CurrentUserCache {
    fn name(&self) -> &'static str {
        "current_user_cache"
    }

    fn applies_to(&self, event: AppEvent) -> bool {
        event == AppEvent::ProfileUpdated
    }

    async fn on_event(&self, _event: AppEvent) {
        let _ = self.refetch().await;
    }
}

impl std::fmt::Debug for CurrentUserCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CurrentUserCache")
            .field("snapshot", &*self.state.borrow())
            .finish()
    }
}
