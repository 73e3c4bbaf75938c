//! Backup and restore passthrough.
//!
//! Both are bulk operations owned by the backend. A failed restore reports
//! and leaves every piece of local state untouched; a successful one is
//! followed by a full re-sync of all collections.

use std::sync::Arc;

use tracing::{info, instrument, warn};

use crate::errors::ServiceError;
use crate::gateway::{BackupReceipt, RemoteGateway, RestoreOutcome};
use crate::models::NotificationKind;
use crate::services::{sync_collections, NotificationService};
use crate::state::StateStore;

#[derive(Clone)]
pub struct BackupService {
    store: StateStore,
    gateway: Arc<dyn RemoteGateway>,
    notifications: NotificationService,
}

impl BackupService {
    pub fn new(
        store: StateStore,
        gateway: Arc<dyn RemoteGateway>,
        notifications: NotificationService,
    ) -> Self {
        Self {
            store,
            gateway,
            notifications,
        }
    }

    #[instrument(skip(self))]
    pub async fn create_backup(&self) -> Result<BackupReceipt, ServiceError> {
        let receipt = self.gateway.create_backup().await?;
        info!(file = %receipt.file, "backup created");
        self.notifications
            .push(NotificationKind::Success, receipt.message.clone())
            .await;
        Ok(receipt)
    }

    /// Restores from a previously created backup file. The session survives
    /// a failure; local state only changes after the backend reports
    /// success, via a full collection re-sync.
    #[instrument(skip(self))]
    pub async fn restore_backup(&self, file: String) -> Result<RestoreOutcome, ServiceError> {
        let outcome = match self.gateway.restore_backup(file).await {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!(error = %e, "restore request failed");
                self.notifications
                    .push(NotificationKind::Error, e.to_string())
                    .await;
                return Err(e.into());
            }
        };

        if !outcome.success {
            warn!(message = %outcome.message, "backend refused the restore");
            self.notifications
                .push(NotificationKind::Error, outcome.message.clone())
                .await;
            return Ok(outcome);
        }

        info!("restore succeeded, re-syncing collections");
        if let Err(e) = sync_collections(&self.store, &self.gateway).await {
            warn!(error = %e, "post-restore sync failed");
            self.notifications
                .push(
                    NotificationKind::Warning,
                    "Restore succeeded, but refreshing local data failed",
                )
                .await;
        } else {
            self.notifications
                .push(NotificationKind::Success, outcome.message.clone())
                .await;
        }
        Ok(outcome)
    }
}
