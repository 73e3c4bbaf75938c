//! Shared test harness: a programmable in-memory backend and engine
//! builders.

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use uuid::Uuid;

use stockroom::config::AppConfig;
use stockroom::gateway::{
    BackupReceipt, CreateOrderRequest, GatewayError, RemoteGateway, RestoreOutcome,
    SharedAuthToken,
};
use stockroom::models::{
    CustomerDetails, Discount, DiscountKind, EmailMessage, Inquiry, InquiryStatus,
    InventoryItem, NewDiscount, NewInquiry, NewInventoryItem, Order, OrderStatus, User,
    UserRole,
};
use stockroom::Engine;

/// The backend's view of the world, shared behind the stub.
#[derive(Default)]
pub struct BackendState {
    pub inventory: Vec<InventoryItem>,
    pub discounts: Vec<Discount>,
    pub orders: Vec<Order>,
    pub users: Vec<User>,
    pub inquiries: Vec<Inquiry>,
}

/// In-memory `RemoteGateway` emulating the real backend: order creation
/// computes totals and decrements stock server-side, updates return the
/// authoritative post-state, and every email lands in `sent_emails`.
#[derive(Default)]
pub struct StubGateway {
    pub backend: Mutex<BackendState>,
    pub sent_emails: Mutex<Vec<EmailMessage>>,
    pub pings: AtomicUsize,
    pub create_order_calls: AtomicUsize,
    pub update_status_calls: AtomicUsize,
    /// When set, `create_order` fails with this server-provided message.
    pub reject_orders_with: Mutex<Option<String>>,
    /// When set, `create_order` fails without any server message.
    pub drop_order_requests: AtomicBool,
    pub fail_emails: AtomicBool,
    pub fail_restore: AtomicBool,
    order_counter: AtomicUsize,
}

impl StubGateway {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn seed(&self, f: impl FnOnce(&mut BackendState)) {
        f(&mut self.backend.lock().unwrap());
    }

    pub fn emails(&self) -> Vec<EmailMessage> {
        self.sent_emails.lock().unwrap().clone()
    }
}

#[async_trait]
impl RemoteGateway for StubGateway {
    async fn fetch_inventory(&self) -> Result<Vec<InventoryItem>, GatewayError> {
        Ok(self.backend.lock().unwrap().inventory.clone())
    }

    async fn create_inventory_item(
        &self,
        item: NewInventoryItem,
    ) -> Result<InventoryItem, GatewayError> {
        let created = InventoryItem {
            id: Uuid::new_v4(),
            sku: item.sku,
            name: item.name,
            quantity: item.quantity,
            threshold: item.threshold,
            price: item.price,
            category: item.category,
            image_url: item.image_url,
        };
        self.backend.lock().unwrap().inventory.push(created.clone());
        Ok(created)
    }

    async fn update_inventory_item(
        &self,
        item: InventoryItem,
    ) -> Result<InventoryItem, GatewayError> {
        let mut backend = self.backend.lock().unwrap();
        match backend.inventory.iter_mut().find(|i| i.id == item.id) {
            Some(existing) => {
                *existing = item.clone();
                Ok(item)
            }
            None => Err(GatewayError::Api {
                status: 404,
                message: "inventory item not found".to_string(),
            }),
        }
    }

    async fn delete_inventory_item(&self, id: Uuid) -> Result<(), GatewayError> {
        self.backend
            .lock()
            .unwrap()
            .inventory
            .retain(|i| i.id != id);
        Ok(())
    }

    async fn fetch_discounts(&self) -> Result<Vec<Discount>, GatewayError> {
        Ok(self.backend.lock().unwrap().discounts.clone())
    }

    async fn create_discount(&self, discount: NewDiscount) -> Result<Discount, GatewayError> {
        let created = Discount {
            id: Uuid::new_v4(),
            code: discount.code,
            kind: discount.kind,
            value: discount.value,
            min_spend: discount.min_spend,
            min_items: discount.min_items,
            is_active: discount.is_active,
            usage_count: 0,
        };
        self.backend.lock().unwrap().discounts.push(created.clone());
        Ok(created)
    }

    async fn update_discount(&self, discount: Discount) -> Result<Discount, GatewayError> {
        let mut backend = self.backend.lock().unwrap();
        if let Some(existing) = backend.discounts.iter_mut().find(|d| d.id == discount.id) {
            *existing = discount.clone();
        }
        Ok(discount)
    }

    async fn delete_discount(&self, id: Uuid) -> Result<(), GatewayError> {
        self.backend.lock().unwrap().discounts.retain(|d| d.id != id);
        Ok(())
    }

    async fn fetch_orders(&self) -> Result<Vec<Order>, GatewayError> {
        Ok(self.backend.lock().unwrap().orders.clone())
    }

    async fn create_order(&self, request: CreateOrderRequest) -> Result<Order, GatewayError> {
        self.create_order_calls.fetch_add(1, Ordering::SeqCst);

        if let Some(message) = self.reject_orders_with.lock().unwrap().clone() {
            return Err(GatewayError::Api {
                status: 409,
                message,
            });
        }
        if self.drop_order_requests.load(Ordering::SeqCst) {
            return Err(GatewayError::Decode("connection reset".to_string()));
        }

        let mut backend = self.backend.lock().unwrap();
        let subtotal: Decimal = request
            .items
            .iter()
            .map(|line| line.unit_price * Decimal::from(line.quantity))
            .sum();
        let discount_amount = request
            .discount_percent
            .map(|percent| subtotal * percent / dec!(100))
            .unwrap_or(Decimal::ZERO);

        for line in &request.items {
            if let Some(item) = backend.inventory.iter_mut().find(|i| i.id == line.item_id) {
                item.quantity = item.quantity.saturating_sub(line.quantity);
            }
        }

        let number = self.order_counter.fetch_add(1, Ordering::SeqCst) + 1;
        let order = Order {
            id: Uuid::new_v4(),
            order_number: format!("ORD-{number}"),
            items: request.items,
            subtotal,
            discount_amount,
            total: subtotal - discount_amount,
            status: OrderStatus::Processing,
            customer: request.customer,
            created_by: request.created_by,
            created_at: Utc::now(),
        };
        backend.orders.push(order.clone());
        Ok(order)
    }

    async fn update_order_status(
        &self,
        id: Uuid,
        status: OrderStatus,
    ) -> Result<Order, GatewayError> {
        self.update_status_calls.fetch_add(1, Ordering::SeqCst);
        let mut backend = self.backend.lock().unwrap();
        match backend.orders.iter_mut().find(|o| o.id == id) {
            Some(order) => {
                order.status = status;
                Ok(order.clone())
            }
            None => Err(GatewayError::Api {
                status: 404,
                message: "order not found".to_string(),
            }),
        }
    }

    async fn fetch_users(&self) -> Result<Vec<User>, GatewayError> {
        Ok(self.backend.lock().unwrap().users.clone())
    }

    async fn fetch_inquiries(&self) -> Result<Vec<Inquiry>, GatewayError> {
        Ok(self.backend.lock().unwrap().inquiries.clone())
    }

    async fn create_inquiry(&self, inquiry: NewInquiry) -> Result<Inquiry, GatewayError> {
        let created = Inquiry {
            id: Uuid::new_v4(),
            customer_name: inquiry.customer_name,
            email: inquiry.email,
            subject: inquiry.subject,
            message: inquiry.message,
            status: InquiryStatus::Open,
            created_at: Utc::now(),
        };
        self.backend.lock().unwrap().inquiries.push(created.clone());
        Ok(created)
    }

    async fn update_inquiry_status(
        &self,
        id: Uuid,
        status: InquiryStatus,
    ) -> Result<Inquiry, GatewayError> {
        let mut backend = self.backend.lock().unwrap();
        match backend.inquiries.iter_mut().find(|i| i.id == id) {
            Some(inquiry) => {
                inquiry.status = status;
                Ok(inquiry.clone())
            }
            None => Err(GatewayError::Api {
                status: 404,
                message: "inquiry not found".to_string(),
            }),
        }
    }

    async fn send_email(&self, email: EmailMessage) -> Result<(), GatewayError> {
        if self.fail_emails.load(Ordering::SeqCst) {
            return Err(GatewayError::Api {
                status: 502,
                message: "mail relay unavailable".to_string(),
            });
        }
        self.sent_emails.lock().unwrap().push(email);
        Ok(())
    }

    async fn ping_activity(&self) -> Result<(), GatewayError> {
        self.pings.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn create_backup(&self) -> Result<BackupReceipt, GatewayError> {
        Ok(BackupReceipt {
            message: "Backup created".to_string(),
            file: "backup-0001.json".to_string(),
        })
    }

    async fn restore_backup(&self, _file: String) -> Result<RestoreOutcome, GatewayError> {
        if self.fail_restore.load(Ordering::SeqCst) {
            return Ok(RestoreOutcome {
                success: false,
                message: "backup file is corrupt".to_string(),
            });
        }
        Ok(RestoreOutcome {
            success: true,
            message: "Restore complete".to_string(),
        })
    }
}

// Fixtures

pub fn widget(sku: &str, quantity: u32, threshold: u32, price: Decimal) -> InventoryItem {
    InventoryItem {
        id: Uuid::new_v4(),
        sku: sku.to_string(),
        name: format!("Widget {sku}"),
        quantity,
        threshold,
        price,
        category: "widgets".to_string(),
        image_url: None,
    }
}

pub fn staff_user(role: UserRole, email: &str) -> User {
    User {
        id: Uuid::new_v4(),
        name: email.split('@').next().unwrap_or("user").to_string(),
        email: email.to_string(),
        role,
    }
}

pub fn percent_discount(code: &str, value: Decimal) -> Discount {
    Discount {
        id: Uuid::new_v4(),
        code: code.to_string(),
        kind: DiscountKind::Percentage,
        value,
        min_spend: None,
        min_items: None,
        is_active: true,
        usage_count: 0,
    }
}

pub fn customer() -> CustomerDetails {
    CustomerDetails {
        name: "Ada Lovelace".to_string(),
        email: "ada@example.com".to_string(),
        phone: "+1-415-555-0101".to_string(),
        address: "123 Analytical Way".to_string(),
    }
}

/// Engine over a stub gateway, with short poll intervals for timer tests.
pub fn engine_over(gateway: Arc<StubGateway>) -> (Engine, SharedAuthToken) {
    let mut config = AppConfig::new("http://localhost:8080");
    config.liveness_poll_secs = 5;
    config.logout_grace_secs = 4;
    config.heartbeat_secs = 60;
    let token = SharedAuthToken::new();
    (
        Engine::new(config, gateway, token.clone()),
        token,
    )
}

/// Builds an engine and logs a user in against the seeded stub.
pub async fn logged_in_engine(
    gateway: Arc<StubGateway>,
    user: User,
) -> (Engine, SharedAuthToken) {
    let (engine, token) = engine_over(gateway);
    engine
        .login(user, "test-token".to_string())
        .await
        .expect("login bootstrap");
    (engine, token)
}

/// Polls `predicate` until it holds or a short deadline passes. Used where
/// a side effect runs on the event processor task.
pub async fn eventually<F, Fut>(predicate: F)
where
    F: Fn() -> Fut,
    Fut: std::future::Future<Output = bool>,
{
    for _ in 0..200 {
        if predicate().await {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("condition was not reached in time");
}
