use std::sync::{Arc, RwLock};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use tracing::instrument;
use uuid::Uuid;

use crate::config::AppConfig;
use crate::models::{
    Discount, EmailMessage, Inquiry, InquiryStatus, InventoryItem, NewDiscount,
    NewInquiry, NewInventoryItem, Order, OrderStatus, User,
};

use super::{
    BackupReceipt, CreateOrderRequest, GatewayError, RemoteGateway, RestoreOutcome,
};

/// Bearer token shared between the session service (which sets and clears
/// it) and the HTTP gateway (which attaches it to every request).
#[derive(Clone, Default)]
pub struct SharedAuthToken {
    inner: Arc<RwLock<Option<String>>>,
}

impl SharedAuthToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, token: Option<String>) {
        if let Ok(mut guard) = self.inner.write() {
            *guard = token;
        }
    }

    pub fn get(&self) -> Option<String> {
        self.inner.read().ok().and_then(|guard| guard.clone())
    }
}

/// Production `RemoteGateway` over the backend REST API.
pub struct HttpGateway {
    client: Client,
    base_url: String,
    token: SharedAuthToken,
}

impl HttpGateway {
    pub fn new(config: &AppConfig, token: SharedAuthToken) -> Result<Self, GatewayError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            token,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match self.token.get() {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn execute<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> Result<T, GatewayError> {
        let response = self.authorize(request).send().await?;
        let status = response.status();
        if status.is_success() {
            response
                .json::<T>()
                .await
                .map_err(|e| GatewayError::Decode(e.to_string()))
        } else {
            Err(api_error(status, response.text().await.ok()))
        }
    }

    /// Like `execute` but for endpoints whose body is only an ack.
    async fn execute_ack(&self, request: RequestBuilder) -> Result<(), GatewayError> {
        let response = self.authorize(request).send().await?;
        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(api_error(status, response.text().await.ok()))
        }
    }
}

fn api_error(status: StatusCode, body: Option<String>) -> GatewayError {
    let message = body
        .as_deref()
        .and_then(extract_message)
        .unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("request failed")
                .to_string()
        });
    GatewayError::Api {
        status: status.as_u16(),
        message,
    }
}

/// Pulls a human-readable message out of an error body, accepting both
/// `{"message": ...}` and `{"error": ...}` shapes.
fn extract_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    value
        .get("message")
        .or_else(|| value.get("error"))
        .and_then(|v| v.as_str())
        .map(str::to_string)
}

#[async_trait]
impl RemoteGateway for HttpGateway {
    #[instrument(skip(self))]
    async fn fetch_inventory(&self) -> Result<Vec<InventoryItem>, GatewayError> {
        self.execute(self.client.get(self.url("/api/inventory"))).await
    }

    #[instrument(skip(self, item))]
    async fn create_inventory_item(
        &self,
        item: NewInventoryItem,
    ) -> Result<InventoryItem, GatewayError> {
        self.execute(self.client.post(self.url("/api/inventory")).json(&item))
            .await
    }

    #[instrument(skip(self, item), fields(item_id = %item.id))]
    async fn update_inventory_item(
        &self,
        item: InventoryItem,
    ) -> Result<InventoryItem, GatewayError> {
        self.execute(
            self.client
                .put(self.url(&format!("/api/inventory/{}", item.id)))
                .json(&item),
        )
        .await
    }

    #[instrument(skip(self))]
    async fn delete_inventory_item(&self, id: Uuid) -> Result<(), GatewayError> {
        self.execute_ack(self.client.delete(self.url(&format!("/api/inventory/{id}"))))
            .await
    }

    #[instrument(skip(self))]
    async fn fetch_discounts(&self) -> Result<Vec<Discount>, GatewayError> {
        self.execute(self.client.get(self.url("/api/discounts"))).await
    }

    #[instrument(skip(self, discount))]
    async fn create_discount(&self, discount: NewDiscount) -> Result<Discount, GatewayError> {
        self.execute(self.client.post(self.url("/api/discounts")).json(&discount))
            .await
    }

    #[instrument(skip(self, discount), fields(discount_id = %discount.id))]
    async fn update_discount(&self, discount: Discount) -> Result<Discount, GatewayError> {
        self.execute(
            self.client
                .put(self.url(&format!("/api/discounts/{}", discount.id)))
                .json(&discount),
        )
        .await
    }

    #[instrument(skip(self))]
    async fn delete_discount(&self, id: Uuid) -> Result<(), GatewayError> {
        self.execute_ack(self.client.delete(self.url(&format!("/api/discounts/{id}"))))
            .await
    }

    #[instrument(skip(self))]
    async fn fetch_orders(&self) -> Result<Vec<Order>, GatewayError> {
        self.execute(self.client.get(self.url("/api/orders"))).await
    }

    #[instrument(skip(self, request))]
    async fn create_order(&self, request: CreateOrderRequest) -> Result<Order, GatewayError> {
        self.execute(self.client.post(self.url("/api/orders")).json(&request))
            .await
    }

    #[instrument(skip(self))]
    async fn update_order_status(
        &self,
        id: Uuid,
        status: OrderStatus,
    ) -> Result<Order, GatewayError> {
        self.execute(
            self.client
                .put(self.url(&format!("/api/orders/{id}/status")))
                .json(&serde_json::json!({ "status": status })),
        )
        .await
    }

    #[instrument(skip(self))]
    async fn fetch_users(&self) -> Result<Vec<User>, GatewayError> {
        self.execute(self.client.get(self.url("/api/users"))).await
    }

    #[instrument(skip(self))]
    async fn fetch_inquiries(&self) -> Result<Vec<Inquiry>, GatewayError> {
        self.execute(self.client.get(self.url("/api/inquiries"))).await
    }

    #[instrument(skip(self, inquiry))]
    async fn create_inquiry(&self, inquiry: NewInquiry) -> Result<Inquiry, GatewayError> {
        self.execute(self.client.post(self.url("/api/inquiries")).json(&inquiry))
            .await
    }

    #[instrument(skip(self))]
    async fn update_inquiry_status(
        &self,
        id: Uuid,
        status: InquiryStatus,
    ) -> Result<Inquiry, GatewayError> {
        self.execute(
            self.client
                .put(self.url(&format!("/api/inquiries/{id}/status")))
                .json(&serde_json::json!({ "status": status })),
        )
        .await
    }

    #[instrument(skip(self, email), fields(recipient = %email.recipient))]
    async fn send_email(&self, email: EmailMessage) -> Result<(), GatewayError> {
        self.execute_ack(self.client.post(self.url("/api/email/send")).json(&email))
            .await
    }

    #[instrument(skip(self))]
    async fn ping_activity(&self) -> Result<(), GatewayError> {
        self.execute_ack(self.client.post(self.url("/api/activity/ping"))).await
    }

    #[instrument(skip(self))]
    async fn create_backup(&self) -> Result<BackupReceipt, GatewayError> {
        self.execute(self.client.post(self.url("/api/backup"))).await
    }

    #[instrument(skip(self))]
    async fn restore_backup(&self, file: String) -> Result<RestoreOutcome, GatewayError> {
        self.execute(
            self.client
                .post(self.url("/api/backup/restore"))
                .json(&serde_json::json!({ "file": file })),
        )
        .await
    }
}
