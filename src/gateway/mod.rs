//! Remote Data Gateway: the async boundary to the backend REST API.
//!
//! The engine treats the backend as an opaque collaborator that can fail.
//! Every mutation round-trips through here before local state changes
//! (update-then-reconcile; never commit-then-sync).

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{
    CustomerDetails, Discount, EmailMessage, Inquiry, InquiryStatus, InventoryItem,
    NewDiscount, NewInquiry, NewInventoryItem, Order, OrderLine, OrderStatus, User,
};

mod http;

pub use http::{HttpGateway, SharedAuthToken};

/// Errors crossing the gateway boundary.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The backend answered with a non-success status. `message` is the
    /// server-provided description when the body carried one.
    #[error("{message}")]
    Api { status: u16, message: String },

    #[error("invalid response: {0}")]
    Decode(String),
}

impl GatewayError {
    /// The server-provided failure message, if the backend sent one.
    pub fn server_message(&self) -> Option<&str> {
        match self {
            GatewayError::Api { message, .. } => Some(message),
            _ => None,
        }
    }
}

/// Order-creation payload. The backend is the sole point of truth for the
/// stock decrement and the final total; the client only proposes a discount
/// percentage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateOrderRequest {
    pub customer: CustomerDetails,
    pub items: Vec<OrderLine>,
    pub discount_percent: Option<Decimal>,
    pub created_by: Uuid,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackupReceipt {
    pub message: String,
    pub file: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RestoreOutcome {
    pub success: bool,
    pub message: String,
}

/// Async REST client consumed by the engine, one method per backend
/// operation. Implementations must be safe to share across tasks.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RemoteGateway: Send + Sync {
    async fn fetch_inventory(&self) -> Result<Vec<InventoryItem>, GatewayError>;
    async fn create_inventory_item(
        &self,
        item: NewInventoryItem,
    ) -> Result<InventoryItem, GatewayError>;
    /// Returns the authoritative post-update state, used for low-stock
    /// crossing detection.
    async fn update_inventory_item(
        &self,
        item: InventoryItem,
    ) -> Result<InventoryItem, GatewayError>;
    async fn delete_inventory_item(&self, id: Uuid) -> Result<(), GatewayError>;

    async fn fetch_discounts(&self) -> Result<Vec<Discount>, GatewayError>;
    async fn create_discount(&self, discount: NewDiscount) -> Result<Discount, GatewayError>;
    async fn update_discount(&self, discount: Discount) -> Result<Discount, GatewayError>;
    async fn delete_discount(&self, id: Uuid) -> Result<(), GatewayError>;

    async fn fetch_orders(&self) -> Result<Vec<Order>, GatewayError>;
    async fn create_order(&self, request: CreateOrderRequest) -> Result<Order, GatewayError>;
    async fn update_order_status(
        &self,
        id: Uuid,
        status: OrderStatus,
    ) -> Result<Order, GatewayError>;

    async fn fetch_users(&self) -> Result<Vec<User>, GatewayError>;

    async fn fetch_inquiries(&self) -> Result<Vec<Inquiry>, GatewayError>;
    async fn create_inquiry(&self, inquiry: NewInquiry) -> Result<Inquiry, GatewayError>;
    async fn update_inquiry_status(
        &self,
        id: Uuid,
        status: InquiryStatus,
    ) -> Result<Inquiry, GatewayError>;

    /// Fire-and-forget from the caller's perspective; a failure degrades to
    /// a local error notification and never blocks the triggering action.
    async fn send_email(&self, email: EmailMessage) -> Result<(), GatewayError>;

    /// Heartbeat keeping the server-side session marked active.
    async fn ping_activity(&self) -> Result<(), GatewayError>;

    async fn create_backup(&self) -> Result<BackupReceipt, GatewayError>;
    async fn restore_backup(&self, file: String) -> Result<RestoreOutcome, GatewayError>;
}
