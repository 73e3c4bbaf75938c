//! Wire-level contract of the HTTP gateway against a stubbed backend.

mod common;

use rust_decimal_macros::dec;
use serde_json::json;
use uuid::Uuid;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use stockroom::config::AppConfig;
use stockroom::gateway::{
    CreateOrderRequest, GatewayError, HttpGateway, RemoteGateway, SharedAuthToken,
};

use common::customer;

fn gateway_for(server: &MockServer, token: &SharedAuthToken) -> HttpGateway {
    HttpGateway::new(&AppConfig::new(server.uri()), token.clone()).expect("client")
}

#[tokio::test]
async fn fetch_inventory_decodes_the_backend_payload() {
    let server = MockServer::start().await;
    let id = Uuid::new_v4();
    Mock::given(method("GET"))
        .and(path("/api/inventory"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
            "id": id,
            "sku": "SKU-1",
            "name": "Widget",
            "quantity": 7,
            "threshold": 2,
            "price": "24.50",
            "category": "widgets",
            "image_url": null
        }])))
        .mount(&server)
        .await;

    let gateway = gateway_for(&server, &SharedAuthToken::new());
    let inventory = gateway.fetch_inventory().await.expect("fetch");

    assert_eq!(inventory.len(), 1);
    assert_eq!(inventory[0].id, id);
    assert_eq!(inventory[0].quantity, 7);
    assert_eq!(inventory[0].price, dec!(24.50));
}

#[tokio::test]
async fn requests_carry_the_bearer_token_once_set() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/activity/ping"))
        .and(header("authorization", "Bearer secret-token"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let token = SharedAuthToken::new();
    token.set(Some("secret-token".to_string()));
    let gateway = gateway_for(&server, &token);
    gateway.ping_activity().await.expect("ping");
}

#[tokio::test]
async fn rejected_order_surfaces_the_server_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/orders"))
        .respond_with(
            ResponseTemplate::new(409)
                .set_body_json(json!({"message": "Insufficient stock for SKU-1"})),
        )
        .mount(&server)
        .await;

    let gateway = gateway_for(&server, &SharedAuthToken::new());
    let result = gateway
        .create_order(CreateOrderRequest {
            customer: customer(),
            items: vec![],
            discount_percent: None,
            created_by: Uuid::new_v4(),
        })
        .await;

    let Err(error) = result else {
        panic!("expected an API error");
    };
    assert_eq!(
        error.server_message(),
        Some("Insufficient stock for SKU-1")
    );
    assert!(matches!(error, GatewayError::Api { status: 409, .. }));
}

#[tokio::test]
async fn error_bodies_without_a_message_fall_back_to_the_status_reason() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/discounts"))
        .respond_with(ResponseTemplate::new(502).set_body_string("<html>bad gateway</html>"))
        .mount(&server)
        .await;

    let gateway = gateway_for(&server, &SharedAuthToken::new());
    let Err(error) = gateway.fetch_discounts().await else {
        panic!("expected an API error");
    };
    assert!(error.server_message().is_some());
    assert!(error.to_string().to_lowercase().contains("bad gateway"));
}

#[tokio::test]
async fn restore_posts_the_backup_file_reference() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/backup/restore"))
        .and(body_json(json!({"file": "backup-0001.json"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "message": "Restore complete"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let gateway = gateway_for(&server, &SharedAuthToken::new());
    let outcome = gateway
        .restore_backup("backup-0001.json".to_string())
        .await
        .expect("restore");
    assert!(outcome.success);
    assert_eq!(outcome.message, "Restore complete");
}
