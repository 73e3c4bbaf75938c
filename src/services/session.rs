//! Session lifecycle: login bootstrap, the liveness poller and the activity
//! heartbeat.
//!
//! Both timers live exactly as long as the authenticated session. Liveness
//! is polled, not pushed: an administrator revokes a user elsewhere, the
//! poller notices within one interval, warns, and forces a logout after a
//! short grace delay.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::interval;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::config::AppConfig;
use crate::errors::ServiceError;
use crate::gateway::{RemoteGateway, SharedAuthToken};
use crate::models::{NotificationKind, User};
use crate::services::{sync_collections, NotificationService};
use crate::state::StateStore;

#[derive(Clone)]
pub struct SessionService {
    store: StateStore,
    gateway: Arc<dyn RemoteGateway>,
    token: SharedAuthToken,
    notifications: NotificationService,
    config: AppConfig,
    tasks: Arc<Mutex<Vec<JoinHandle<()>>>>,
}

impl SessionService {
    pub fn new(
        store: StateStore,
        gateway: Arc<dyn RemoteGateway>,
        token: SharedAuthToken,
        notifications: NotificationService,
        config: AppConfig,
    ) -> Self {
        Self {
            store,
            gateway,
            token,
            notifications,
            config,
            tasks: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Establishes the session: stores the token and user, bootstraps every
    /// collection from the backend, and starts the two pollers. A failed
    /// bootstrap tears the half-built session back down.
    #[instrument(skip(self, user, token), fields(user_id = %user.id))]
    pub async fn login(&self, user: User, token: String) -> Result<(), ServiceError> {
        self.shutdown_pollers();
        self.token.set(Some(token));
        self.store
            .write(|state| state.current_user = Some(user.clone()))
            .await;

        if let Err(e) = sync_collections(&self.store, &self.gateway).await {
            warn!(error = %e, "login bootstrap failed");
            self.token.set(None);
            self.store.clear().await;
            return Err(e);
        }

        info!(user_id = %user.id, "session established");
        let liveness = tokio::spawn(Self::liveness_loop(self.clone()));
        let heartbeat = tokio::spawn(Self::heartbeat_loop(self.clone()));
        if let Ok(mut tasks) = self.tasks.lock() {
            tasks.push(liveness);
            tasks.push(heartbeat);
        }
        Ok(())
    }

    /// Ends the session: stops both pollers, drops the token and wipes all
    /// session state.
    #[instrument(skip(self))]
    pub async fn logout(&self) {
        self.shutdown_pollers();
        self.token.set(None);
        self.store.clear().await;
        info!("session cleared");
    }

    /// Records that an administrator invalidated `user_id`'s session. The
    /// liveness poller picks this up on its next tick.
    pub async fn revoke_user_session(&self, user_id: Uuid) {
        self.store
            .write(|state| state.revoked_user_ids.insert(user_id))
            .await;
    }

    /// Aborts both poller tasks. Safe to call from inside a poller: state
    /// cleanup happens before the abort, and nothing awaits after it.
    pub(crate) fn shutdown_pollers(&self) {
        if let Ok(mut tasks) = self.tasks.lock() {
            for task in tasks.drain(..) {
                task.abort();
            }
        }
    }

    async fn liveness_loop(service: SessionService) {
        let mut ticker = interval(Duration::from_secs(service.config.liveness_poll_secs));
        loop {
            ticker.tick().await;
            let revoked = service
                .store
                .read(|state| {
                    state
                        .current_user
                        .as_ref()
                        .map(|user| state.revoked_user_ids.contains(&user.id))
                })
                .await;
            match revoked {
                // Session already gone; nothing left to watch.
                None => break,
                Some(false) => {}
                Some(true) => {
                    warn!("current session has been revoked by an administrator");
                    service
                        .notifications
                        .push(
                            NotificationKind::Warning,
                            "Your session has been revoked by an administrator; \
                             you will be signed out shortly",
                        )
                        .await;
                    tokio::time::sleep(Duration::from_secs(
                        service.config.logout_grace_secs,
                    ))
                    .await;
                    service.token.set(None);
                    service.store.clear().await;
                    info!("forced logout after revocation");
                    service.shutdown_pollers();
                    break;
                }
            }
        }
    }

    async fn heartbeat_loop(service: SessionService) {
        // First tick fires immediately, so the server sees activity on login.
        let mut ticker = interval(Duration::from_secs(service.config.heartbeat_secs));
        loop {
            ticker.tick().await;
            if let Err(e) = service.gateway.ping_activity().await {
                warn!(error = %e, "activity heartbeat failed");
            }
        }
    }
}
