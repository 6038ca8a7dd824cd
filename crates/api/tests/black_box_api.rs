use std::time::Duration;

use chrono::{Duration as ChronoDuration, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use reqwest::StatusCode;
use serde_json::{Value, json};

use stockyard_api::config::AppConfig;
use stockyard_auth::{JwtClaims, PrincipalId, Role};
use stockyard_core::WarehouseId;

const SECRET: &str = "test-secret";

struct TestServer {
    base_url: String,
    client: reqwest::Client,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn() -> Self {
        // Same router as prod, seeded with demo data, on an ephemeral port.
        let config = AppConfig {
            bind_addr: "127.0.0.1:0".parse().unwrap(),
            jwt_secret: SECRET.to_string(),
            lock_timeout: Duration::from_millis(500),
            seed_demo_data: true,
        };
        let app = stockyard_api::app::build_app(&config).expect("failed to build app");
        let listener = tokio::net::TcpListener::bind(config.bind_addr)
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}", addr);

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url,
            client: reqwest::Client::new(),
            handle,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn send(&self, req: reqwest::RequestBuilder) -> (StatusCode, Value) {
        let res = req.send().await.unwrap();
        let status = res.status();
        let text = res.text().await.unwrap();
        let body = if text.is_empty() {
            Value::Null
        } else {
            serde_json::from_str(&text).unwrap_or_else(|_| panic!("non-json body: {text}"))
        };
        (status, body)
    }

    async fn get(&self, token: &str, path: &str) -> (StatusCode, Value) {
        self.send(self.client.get(self.url(path)).bearer_auth(token)).await
    }

    async fn post(&self, token: &str, path: &str, body: Value) -> (StatusCode, Value) {
        self.send(self.client.post(self.url(path)).bearer_auth(token).json(&body))
            .await
    }

    async fn put(&self, token: &str, path: &str, body: Option<Value>) -> (StatusCode, Value) {
        let mut req = self.client.put(self.url(path)).bearer_auth(token);
        if let Some(body) = body {
            req = req.json(&body);
        }
        self.send(req).await
    }

    async fn delete(&self, token: &str, path: &str) -> (StatusCode, Value) {
        self.send(self.client.delete(self.url(path)).bearer_auth(token))
            .await
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

fn mint_jwt(roles: &[&str], warehouses: &[u64]) -> String {
    let now = Utc::now();
    let claims = JwtClaims {
        sub: PrincipalId::new(),
        roles: roles.iter().map(|r| Role::new(r.to_string())).collect(),
        warehouse_ids: warehouses.iter().copied().map(WarehouseId::new).collect(),
        issued_at: now - ChronoDuration::seconds(5),
        expires_at: now + ChronoDuration::minutes(10),
    };

    jsonwebtoken::encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(SECRET.as_bytes()),
    )
    .expect("failed to encode jwt")
}

fn admin() -> String {
    mint_jwt(&["admin"], &[])
}

async fn stock(srv: &TestServer, token: &str, warehouse: u64, sku: &str) -> (i64, i64) {
    let (status, body) = srv
        .get(token, &format!("/inventory?warehouse_id={warehouse}&sku={sku}"))
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let record = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .find(|r| r["sku"] == sku)
        .unwrap_or_else(|| panic!("no record for {sku}: {body}"));
    (
        record["available_qty"].as_i64().unwrap(),
        record["locked_qty"].as_i64().unwrap(),
    )
}

async fn create_outbound(srv: &TestServer, token: &str, warehouse: u64, items: Value) -> String {
    let (status, body) = srv
        .post(token, "/outbound", json!({ "warehouse_id": warehouse, "items": items }))
        .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(body["data"]["status"], "CREATED");
    body["data"]["id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn health_is_public_and_enveloped() {
    let srv = TestServer::spawn().await;
    let (status, body) = srv.send(srv.client.get(srv.url("/health"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["code"], "OK");
    assert_eq!(body["data"]["status"], "ok");
}

#[tokio::test]
async fn auth_required_for_protected_endpoints() {
    let srv = TestServer::spawn().await;

    let (status, body) = srv.send(srv.client.get(srv.url("/whoami"))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "UNAUTHORIZED");

    let (status, _) = srv.get("garbage", "/whoami").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn scope_is_derived_from_token() {
    let srv = TestServer::spawn().await;

    let (status, body) = srv.get(&admin(), "/whoami").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["scope"]["kind"], "all");
    assert!(body["data"]["roles"].as_array().unwrap().iter().any(|r| r == "admin"));

    let (_, body) = srv.get(&mint_jwt(&["clerk"], &[2]), "/whoami").await;
    assert_eq!(body["data"]["scope"], json!({ "kind": "only", "warehouse_ids": [2] }));
}

#[tokio::test]
async fn outbound_pick_and_ship_flow() {
    let srv = TestServer::spawn().await;
    let token = admin();

    let id = create_outbound(&srv, &token, 1, json!([{ "sku": "SKU-001", "quantity": 5 }])).await;
    assert_eq!(stock(&srv, &token, 1, "SKU-001").await, (50, 0));

    let (status, body) = srv.put(&token, &format!("/outbound/{id}/start-pick"), None).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"]["status"], "PICKING");
    assert_eq!(stock(&srv, &token, 1, "SKU-001").await, (45, 5));

    let (status, body) = srv
        .put(&token, &format!("/outbound/{id}/ship"), None)
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "INVALID_STATE");

    let (status, body) = srv
        .put(&token, &format!("/outbound/{id}/pick"), Some(json!({ "sku": "SKU-001" })))
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"]["status"], "PICKED");
    assert_eq!(body["data"]["items"][0]["scanned"], true);

    let (status, body) = srv.put(&token, &format!("/outbound/{id}/ship"), None).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"]["status"], "SHIPPED");
    assert_eq!(stock(&srv, &token, 1, "SKU-001").await, (45, 0));

    let (_, body) = srv.get(&token, "/outbound?status=shipped").await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn start_pick_shortage_reports_every_sku() {
    let srv = TestServer::spawn().await;
    let token = admin();

    let id = create_outbound(
        &srv,
        &token,
        2,
        json!([
            { "sku": "SKU-001", "quantity": 1 },
            { "sku": "SKU-002", "quantity": 21 },
            { "sku": "SKU-003", "quantity": "30" }
        ]),
    )
    .await;

    let (status, body) = srv.put(&token, &format!("/outbound/{id}/start-pick"), None).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "INSUFFICIENT_STOCK");
    assert_eq!(body["data"]["retryable"], false);
    let shortages = body["data"]["shortages"].as_array().unwrap();
    assert_eq!(shortages.len(), 2);
    assert_eq!(shortages[0]["sku"], "SKU-002");
    assert_eq!(shortages[1]["requested"], 30);

    assert_eq!(stock(&srv, &token, 2, "SKU-001").await, (20, 0));
    let (_, body) = srv.get(&token, &format!("/outbound/{id}")).await;
    assert_eq!(body["data"]["status"], "CREATED");
}

#[tokio::test]
async fn inbound_normalizes_numbers_and_confirms_once() {
    let srv = TestServer::spawn().await;
    let token = admin();

    let (status, body) = srv
        .post(
            &token,
            "/inbound",
            json!({
                "warehouse_id": 1,
                "items": [
                    { "sku": "SKU-001", "quantity": "3", "unit_price": "1.5" },
                    { "sku": "SKU-002", "quantity": 2, "unit_price": 2.0 }
                ]
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(body["data"]["total_quantity"], 5);
    assert_eq!(body["data"]["total_amount"], "7.50");
    let id = body["data"]["id"].as_str().unwrap().to_string();

    let (status, body) = srv.put(&token, &format!("/inbound/{id}/confirm"), None).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"]["status"], "CONFIRMED");
    assert_eq!(body["data"]["newly_confirmed"], true);

    let (status, body) = srv.put(&token, &format!("/inbound/{id}/confirm"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["newly_confirmed"], false);

    assert_eq!(stock(&srv, &token, 1, "SKU-001").await, (53, 0));
    assert_eq!(stock(&srv, &token, 1, "SKU-002").await, (52, 0));

    let (status, body) = srv
        .put(
            &token,
            &format!("/inbound/{id}"),
            Some(json!({ "items": [{ "sku": "SKU-003", "quantity": 1, "unit_price": 1 }] })),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "INVALID_STATE");
}

#[tokio::test]
async fn warehouse_scope_blocks_other_warehouses() {
    let srv = TestServer::spawn().await;
    let clerk = mint_jwt(&["clerk"], &[2]);

    let (status, body) = srv.get(&clerk, "/inventory?warehouse_id=1").await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "FORBIDDEN");

    let (status, body) = srv.get(&clerk, "/inventory").await;
    assert_eq!(status, StatusCode::OK);
    let records = body["data"].as_array().unwrap();
    assert_eq!(records.len(), 3);
    assert!(records.iter().all(|r| r["warehouse_id"] == 2));

    let (status, _) = srv
        .post(
            &clerk,
            "/outbound",
            json!({ "warehouse_id": 1, "items": [{ "sku": "SKU-001", "quantity": 1 }] }),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // An order in warehouse 1 is invisible to the warehouse-2 clerk.
    let id = create_outbound(&srv, &admin(), 1, json!([{ "sku": "SKU-001", "quantity": 1 }])).await;
    let (status, _) = srv.get(&clerk, &format!("/outbound/{id}")).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (_, body) = srv.get(&clerk, "/outbound").await;
    assert!(body["data"].as_array().unwrap().is_empty());

    let (_, body) = srv.get(&clerk, "/warehouses").await;
    assert_eq!(body["data"], json!([{ "id": 2, "name": "WH-B" }]));
}

#[tokio::test]
async fn malformed_input_is_a_validation_error() {
    let srv = TestServer::spawn().await;
    let token = admin();

    let res = srv
        .client
        .post(srv.url("/outbound"))
        .bearer_auth(&token)
        .header("content-type", "application/json")
        .body("{\"warehouse_id\": 1, \"items\": [")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["code"], "VALIDATION_ERROR");

    let (status, body) = srv
        .post(
            &token,
            "/outbound",
            json!({ "warehouse_id": 1, "items": [{ "sku": "SKU-001", "quantity": 0 }] }),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["code"], "VALIDATION_ERROR");

    let (status, _) = srv.get(&token, "/outbound/not-a-uuid").await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, body) = srv
        .post(
            &token,
            "/outbound",
            json!({ "warehouse_id": 1, "items": [{ "sku": "SKU-404", "quantity": 1 }] }),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "NOT_FOUND");
}

#[tokio::test]
async fn delete_requires_terminal_order() {
    let srv = TestServer::spawn().await;
    let token = admin();
    let id = create_outbound(&srv, &token, 1, json!([{ "sku": "SKU-002", "quantity": 2 }])).await;

    let (status, body) = srv.delete(&token, &format!("/outbound/{id}")).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "INVALID_STATE");

    let (status, body) = srv.put(&token, &format!("/outbound/{id}/cancel"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "CANCELLED");

    let (status, body) = srv.delete(&token, &format!("/outbound/{id}")).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert_eq!(body, Value::Null);

    let (status, _) = srv.get(&token, &format!("/outbound/{id}")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn ship_many_reports_each_order() {
    let srv = TestServer::spawn().await;
    let token = admin();

    let ready = create_outbound(&srv, &token, 1, json!([{ "sku": "SKU-003", "quantity": 1 }])).await;
    srv.put(&token, &format!("/outbound/{ready}/start-pick"), None).await;
    srv.put(&token, &format!("/outbound/{ready}/pick"), Some(json!({ "sku": "SKU-003" })))
        .await;
    let idle = create_outbound(&srv, &token, 1, json!([{ "sku": "SKU-003", "quantity": 1 }])).await;

    let (status, body) = srv
        .post(&token, "/outbound/ship", json!({ "order_ids": [ready, idle] }))
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let results = body["data"].as_array().unwrap();
    assert_eq!(results.len(), 2);
    assert_eq!(results[0]["order_id"], ready.as_str());
    assert_eq!(results[0]["ok"], true);
    assert_eq!(results[0]["order"]["status"], "SHIPPED");
    assert_eq!(results[1]["ok"], false);
    assert_eq!(results[1]["error"]["code"], "INVALID_STATE");
}

#[tokio::test]
async fn stocktake_and_thresholds() {
    let srv = TestServer::spawn().await;
    let token = admin();

    let (status, body) = srv
        .put(
            &token,
            "/inventory/warning-threshold",
            Some(json!({ "warehouse_id": 2, "sku": "SKU-002", "warning_threshold": "25" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"]["warning_threshold"], 25);

    let (_, body) = srv.get(&token, "/inventory/warnings?warehouse_id=2").await;
    let warnings = body["data"].as_array().unwrap();
    assert_eq!(warnings.len(), 1);
    assert_eq!(warnings[0]["sku"], "SKU-002");

    let (status, body) = srv
        .post(
            &token,
            "/inventory/stocktake",
            json!({ "warehouse_id": 2, "entries": [{ "sku": "SKU-002", "counted_qty": 30 }] }),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"]["stocktake"]["entries"][0]["delta"], 10);
    assert_eq!(body["data"]["records"][0]["available_qty"], 30);

    let (_, body) = srv.get(&token, "/inventory/warnings?warehouse_id=2").await;
    assert!(body["data"].as_array().unwrap().is_empty());

    let (_, body) = srv.get(&token, "/inventory/stocktakes").await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);

    let (_, body) = srv.get(&token, "/inventory/movements?warehouse_id=2&sku=SKU-002&kind=stocktake").await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn product_with_stock_cannot_be_deleted() {
    let srv = TestServer::spawn().await;
    let token = admin();

    let (_, body) = srv.get(&token, "/products?q=bolt").await;
    assert_eq!(body["data"]["total"], 1);
    let id = body["data"]["items"][0]["id"].as_u64().unwrap();

    let (status, body) = srv.delete(&token, &format!("/products/{id}")).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "CONFLICT");

    let (status, body) = srv
        .post(&token, "/products", json!({ "sku": "SKU-900", "name": "Spare" }))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let spare = body["data"]["id"].as_u64().unwrap();
    let (status, _) = srv.delete(&token, &format!("/products/{spare}")).await;
    assert_eq!(status, StatusCode::OK);
}
