//! Engine assembly: the one object a dashboard embeds.
//!
//! Wires the state store, the services and the event processor together and
//! exposes the presentation boundary: snapshot reads, intent methods
//! returning `Result` or `bool`, and the notification feed. Everything
//! mutable lives behind the store; the presentation layer never holds state
//! of its own.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::config::AppConfig;
use crate::errors::ServiceError;
use crate::events::{Event, EventProcessor, EventSender};
use crate::gateway::{
    BackupReceipt, HttpGateway, RemoteGateway, RestoreOutcome, SharedAuthToken,
};
use crate::models::{
    CustomerDetails, Discount, Inquiry, InquiryStatus, InventoryItem, NewDiscount,
    NewInquiry, NewInventoryItem, Notification, Order, OrderStatus, User,
};
use crate::services::{
    BackupService, CartService, CheckoutService, DiscountService, InquiryService,
    InventoryService, NotificationService, OrderService, SessionService,
};
use crate::state::{SessionState, StateStore};

const EVENT_CHANNEL_CAPACITY: usize = 100;

pub struct Engine {
    store: StateStore,
    notifications: NotificationService,
    cart: CartService,
    checkout: CheckoutService,
    inventory: InventoryService,
    discounts: DiscountService,
    orders: OrderService,
    inquiries: InquiryService,
    backup: BackupService,
    session: SessionService,
    event_task: JoinHandle<()>,
}

impl Engine {
    /// Builds an engine over an injected gateway. The token handle must be
    /// the same one the gateway authenticates with.
    pub fn new(config: AppConfig, gateway: Arc<dyn RemoteGateway>, token: SharedAuthToken) -> Self {
        let store = StateStore::new();
        let notifications = NotificationService::new(store.clone());

        let (event_tx, event_rx) = mpsc::channel::<Event>(EVENT_CHANNEL_CAPACITY);
        let event_sender = Arc::new(EventSender::new(event_tx));
        let event_task =
            EventProcessor::new(store.clone(), gateway.clone(), notifications.clone())
                .spawn(event_rx);

        let inventory =
            InventoryService::new(store.clone(), gateway.clone(), Some(event_sender));
        let checkout = CheckoutService::new(
            store.clone(),
            gateway.clone(),
            inventory.clone(),
            notifications.clone(),
        );

        Self {
            cart: CartService::new(store.clone()),
            discounts: DiscountService::new(store.clone(), gateway.clone()),
            orders: OrderService::new(store.clone(), gateway.clone(), notifications.clone()),
            inquiries: InquiryService::new(
                store.clone(),
                gateway.clone(),
                notifications.clone(),
            ),
            backup: BackupService::new(store.clone(), gateway.clone(), notifications.clone()),
            session: SessionService::new(
                store.clone(),
                gateway,
                token,
                notifications.clone(),
                config,
            ),
            inventory,
            checkout,
            notifications,
            store,
            event_task,
        }
    }

    /// Convenience constructor building the production HTTP gateway from
    /// the configuration.
    pub fn from_config(config: AppConfig) -> Result<Self, ServiceError> {
        let token = SharedAuthToken::new();
        let gateway = HttpGateway::new(&config, token.clone())?;
        Ok(Self::new(config, Arc::new(gateway), token))
    }

    // Session

    pub async fn login(&self, user: User, token: String) -> Result<(), ServiceError> {
        self.session.login(user, token).await
    }

    pub async fn logout(&self) {
        self.session.logout().await;
    }

    pub async fn revoke_user_session(&self, user_id: Uuid) {
        self.session.revoke_user_session(user_id).await;
    }

    // Reads

    /// Full read-only copy of the session state for rendering.
    pub async fn snapshot(&self) -> SessionState {
        self.store.snapshot().await
    }

    pub async fn notifications(&self) -> Vec<Notification> {
        self.notifications.feed().await
    }

    pub async fn unread_count(&self) -> usize {
        self.notifications.unread_count().await
    }

    pub async fn mark_all_read(&self) {
        self.notifications.mark_all_read().await;
    }

    // Cart

    pub async fn add_to_cart(&self, item: InventoryItem, quantity: u32) -> bool {
        self.cart.add_to_cart(item, quantity).await
    }

    pub async fn update_cart_quantity(&self, item_id: Uuid, quantity: u32) -> bool {
        self.cart.update_quantity(item_id, quantity).await
    }

    pub async fn remove_from_cart(&self, item_id: Uuid) {
        self.cart.remove(item_id).await;
    }

    pub async fn clear_cart(&self) {
        self.cart.clear().await;
    }

    // Checkout

    pub async fn checkout(&self, customer: CustomerDetails) -> Result<Order, ServiceError> {
        self.checkout.checkout(customer).await
    }

    // Inventory

    pub async fn refresh_inventory(&self) -> Result<Vec<InventoryItem>, ServiceError> {
        self.inventory.refresh().await
    }

    pub async fn create_inventory_item(
        &self,
        item: NewInventoryItem,
    ) -> Result<InventoryItem, ServiceError> {
        self.inventory.create_item(item).await
    }

    pub async fn update_inventory_item(
        &self,
        item: InventoryItem,
    ) -> Result<InventoryItem, ServiceError> {
        self.inventory.update_item(item).await
    }

    pub async fn delete_inventory_item(&self, id: Uuid) -> Result<(), ServiceError> {
        self.inventory.delete_item(id).await
    }

    // Discounts

    pub async fn create_discount(&self, discount: NewDiscount) -> Result<Discount, ServiceError> {
        self.discounts.create_discount(discount).await
    }

    pub async fn update_discount(&self, discount: Discount) -> Result<Discount, ServiceError> {
        self.discounts.update_discount(discount).await
    }

    pub async fn delete_discount(&self, id: Uuid) -> Result<(), ServiceError> {
        self.discounts.delete_discount(id).await
    }

    // Orders

    pub async fn update_order_status(
        &self,
        id: Uuid,
        status: OrderStatus,
    ) -> Result<Order, ServiceError> {
        self.orders.update_order_status(id, status).await
    }

    // Inquiries

    pub async fn create_inquiry(&self, inquiry: NewInquiry) -> Result<Inquiry, ServiceError> {
        self.inquiries.create_inquiry(inquiry).await
    }

    pub async fn update_inquiry_status(
        &self,
        id: Uuid,
        status: InquiryStatus,
    ) -> Result<Inquiry, ServiceError> {
        self.inquiries.update_inquiry_status(id, status).await
    }

    // Backup

    pub async fn create_backup(&self) -> Result<BackupReceipt, ServiceError> {
        self.backup.create_backup().await
    }

    pub async fn restore_backup(&self, file: String) -> Result<RestoreOutcome, ServiceError> {
        self.backup.restore_backup(file).await
    }
}

impl Drop for Engine {
    fn drop(&mut self) {
        self.session.shutdown_pollers();
        self.event_task.abort();
    }
}
