//! Application context: one instance per running shell.
//!
//! Owns the shared pieces (session, client, event bus, current-user cache)
//! and hands out per-screen controllers and services wired to them.

use std::sync::Arc;

use crate::auth::{AuthError, AuthService};
use crate::client::ApiClient;
use crate::config::AppConfig;
use crate::dashboard::{self, Dashboard};
use crate::error::ApiError;
use crate::events::EventBus;
use crate::gate::{self, Screen, Target};
use crate::inventory::Product;
use crate::profile::ProfileService;
use crate::reports::{self, Report, ReportPeriod};
use crate::resource::{ListView, Resource, ResourceController};
use crate::session::{FileStorage, SessionStore};
use crate::user_cache::CurrentUserCache;

pub struct App {
    config: AppConfig,
    client: ApiClient,
    events: Arc<EventBus>,
    user: Arc<CurrentUserCache>,
}

impl App {
    pub fn new(config: AppConfig, session: Arc<SessionStore>) -> Result<Self, ApiError> {
        let client = ApiClient::new(&config, session)?;
        let events = Arc::new(EventBus::new());
        let user = Arc::new(CurrentUserCache::new(client.clone()));
        events.subscribe(user.clone());

        Ok(Self {
            config,
            client,
            events,
            user,
        })
    }

    /// Context backed by the session file in the configured directory.
    pub fn open(config: AppConfig) -> anyhow::Result<Self> {
        let dir = config.config_dir()?;
        tracing::debug!("Session storage at {}", dir.display());
        let session = Arc::new(SessionStore::open(FileStorage::new(dir)));
        Ok(Self::new(config, session)?)
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    pub fn session(&self) -> &Arc<SessionStore> {
        self.client.session()
    }

    pub fn events(&self) -> &Arc<EventBus> {
        &self.events
    }

    pub fn current_user(&self) -> &Arc<CurrentUserCache> {
        &self.user
    }

    /// Start the one-time current-user fetch when a session exists.
    pub fn start(&self) -> Option<tokio::task::JoinHandle<()>> {
        if self.session().get().is_authenticated() {
            Some(self.user.start())
        } else {
            None
        }
    }

    pub fn auth(&self) -> AuthService {
        AuthService::new(self.client.clone())
    }

    pub fn profile(&self) -> ProfileService {
        ProfileService::new(self.client.clone(), Arc::clone(&self.events))
    }

    pub async fn logout(&self) -> Result<(), AuthError> {
        self.auth().logout()?;
        self.user.reset();
        Ok(())
    }

    /// Fresh controller for one list screen; it is not loaded yet.
    pub fn controller<R: Resource>(&self) -> Arc<ResourceController<R>> {
        Arc::new(ResourceController::new(self.client.clone(), &self.config))
    }

    /// Product list pre-filtered by a search typed elsewhere.
    pub fn product_search(&self, term: &str) -> Arc<ResourceController<Product>> {
        let view = ListView::new(self.config.list.page_size).with_search(term);
        Arc::new(ResourceController::with_view(self.client.clone(), &self.config, view))
    }

    pub fn can_see(&self, target: impl Into<Target>) -> bool {
        gate::can_see(target, self.session().role())
    }

    pub fn resolve(&self, screen: Screen) -> Screen {
        gate::resolve(screen, &self.session().get())
    }

    pub fn menu(&self) -> Vec<Screen> {
        gate::menu(self.session().role())
    }

    pub async fn dashboard(&self) -> Result<Dashboard, ApiError> {
        dashboard::fetch(&self.client).await
    }

    pub async fn report(&self, period: ReportPeriod) -> Result<Report, ApiError> {
        reports::fetch(&self.client, period).await
    }
}

impl std::fmt::Debug for App {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("App")
            .field("client", &self.client)
            .field("events", &self.events)
            .finish()
    }
}
