//! Customer inquiry desk.
//!
//! New inquiries raise a notification for staff; resolving one emails the
//! customer who asked.

use std::sync::Arc;

use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::errors::ServiceError;
use crate::gateway::RemoteGateway;
use crate::models::{
    EmailMessage, Inquiry, InquiryStatus, NewInquiry, NotificationKind,
};
use crate::services::NotificationService;
use crate::state::{EntityKind, StateStore};

#[derive(Clone)]
pub struct InquiryService {
    store: StateStore,
    gateway: Arc<dyn RemoteGateway>,
    notifications: NotificationService,
}

impl InquiryService {
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

    #[instrument(skip(self, inquiry), fields(customer = %inquiry.customer_name))]
    pub async fn create_inquiry(&self, inquiry: NewInquiry) -> Result<Inquiry, ServiceError> {
        let ticket = self.store.ticket(EntityKind::Inquiries);
        let created = self.gateway.create_inquiry(inquiry).await?;
        info!(inquiry_id = %created.id, "inquiry created");

        self.store
            .apply(ticket, |state| state.inquiries.push(created.clone()))
            .await;
        self.notifications
            .push(
                NotificationKind::Info,
                format!(
                    "New inquiry from {}: {}",
                    created.customer_name, created.subject
                ),
            )
            .await;
        Ok(created)
    }

    /// Moves an inquiry to a new status. Resolving sends the customer a
    /// closing email; an email failure degrades to an error notification.
    #[instrument(skip(self), fields(inquiry_id = %id))]
    pub async fn update_inquiry_status(
        &self,
        id: Uuid,
        status: InquiryStatus,
    ) -> Result<Inquiry, ServiceError> {
        let ticket = self.store.ticket(EntityKind::Inquiries);
        let updated = self.gateway.update_inquiry_status(id, status).await?;

        self.store
            .apply(ticket, |state| {
                if let Some(inquiry) = state.inquiries.iter_mut().find(|i| i.id == id) {
                    *inquiry = updated.clone();
                }
            })
            .await;

        if updated.status == InquiryStatus::Resolved {
            let email = EmailMessage {
                recipient: updated.email.clone(),
                subject: format!("Re: {}", updated.subject),
                body: format!(
                    "Hello {}, your inquiry \"{}\" has been resolved. \
                     Thank you for your patience.",
                    updated.customer_name, updated.subject
                ),
                attachment: None,
            };
            if let Err(e) = self.gateway.send_email(email).await {
                warn!(error = %e, inquiry_id = %id, "failed to send inquiry resolution email");
                self.notifications
                    .push(
                        NotificationKind::Error,
                        "Failed to email the customer about their resolved inquiry",
                    )
                    .await;
            }
        }

        Ok(updated)
    }
}
