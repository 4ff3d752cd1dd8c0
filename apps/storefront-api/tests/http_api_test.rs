//! End-to-end tests over a real listener, a file-backed database and
//! reqwest as the client.

use std::collections::HashMap;
use std::sync::Arc;

use reqwest::{Client, StatusCode};
use serde_json::{json, Value};
use storefront_api::{router, ApiConfig, AppState};
use storefront_core::Role;
use storefront_db::Database;
use tempfile::TempDir;
use tokio::net::TcpListener;

struct TestServer {
    base: String,
    client: Client,
    db: Database,
    _dir: TempDir,
}

impl TestServer {
    async fn start() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("storefront.db");

        let vars: HashMap<&str, String> = HashMap::from([
            ("DATABASE_PATH", db_path.display().to_string()),
            ("JWT_SECRET", "integration-secret".to_string()),
            ("ARGON2_MEMORY_KIB", "1024".to_string()),
            ("ARGON2_ITERATIONS", "1".to_string()),
            ("APP_ENV", "production".to_string()),
        ]);
        let config = ApiConfig::from_lookup(|key| vars.get(key).cloned()).unwrap();

        let db = Database::new(config.db_config()).await.unwrap();
        let state = Arc::new(AppState::new(db.clone(), config).unwrap());

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router(state)).await.unwrap();
        });

        TestServer {
            base: format!("http://{addr}"),
            client: Client::new(),
            db,
            _dir: dir,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }

    async fn send(
        &self,
        method: reqwest::Method,
        path: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut req = self.client.request(method, self.url(path));
        if let Some(token) = token {
            req = req.bearer_auth(token);
        }
        if let Some(body) = body {
            req = req.json(&body);
        }
        let resp = req.send().await.unwrap();
        let status = resp.status();
        (status, resp.json().await.unwrap())
    }

    async fn get(&self, path: &str, token: Option<&str>) -> (StatusCode, Value) {
        self.send(reqwest::Method::GET, path, token, None).await
    }

    async fn post(&self, path: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
        self.send(reqwest::Method::POST, path, token, Some(body)).await
    }

    /// Registers a user and returns `(user_id, token)`.
    async fn sign_up(&self, username: &str) -> (i64, String) {
        let email = format!("{username}@example.com");
        let (status, body) = self
            .post(
                "/api/auth/register",
                None,
                json!({ "username": username, "email": email, "password": "Passw0rd!" }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        let user_id = body["data"]["id"].as_i64().unwrap();

        let token = self.login(&email).await;
        (user_id, token)
    }

    async fn login(&self, email: &str) -> String {
        let (status, body) = self
            .post(
                "/api/auth/login",
                None,
                json!({ "email": email, "password": "Passw0rd!" }),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "{body}");
        body["data"]["token"].as_str().unwrap().to_string()
    }

    /// Registers a user, promotes it and returns an admin token.
    async fn admin(&self) -> String {
        let (user_id, _) = self.sign_up("admin").await;
        self.db.users().set_role(user_id, Role::Admin).await.unwrap();
        // Role is carried in the token, so log in again after promotion.
        self.login("admin@example.com").await
    }

    async fn create_product(&self, token: &str, name: &str, price: Value, stock: i64) -> i64 {
        let (status, body) = self
            .post(
                "/api/products",
                Some(token),
                json!({
                    "name": name,
                    "description": format!("{name} for integration tests"),
                    "price": price,
                    "stock": stock,
                    "category": "gadgets"
                }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        body["data"]["id"].as_i64().unwrap()
    }
}

#[tokio::test]
async fn test_health() {
    let server = TestServer::start().await;
    let (status, body) = server.get("/health", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["status"], "ok");
}

#[tokio::test]
async fn test_register_and_login() {
    let server = TestServer::start().await;
    let (user_id, token) = server.sign_up("alice").await;
    assert!(user_id > 0);
    assert!(!token.is_empty());

    let (status, body) = server
        .post(
            "/api/auth/register",
            None,
            json!({ "username": "alice2", "email": "ALICE@example.com", "password": "Passw0rd!" }),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["message"], "Email already exists");

    let (status, body) = server
        .post(
            "/api/auth/login",
            None,
            json!({ "email": "alice@example.com", "password": "wrong-password" }),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "Invalid credentials");

    let (status, body) = server
        .post(
            "/api/auth/register",
            None,
            json!({ "username": "x", "email": "nope", "password": "short" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Validation failed");
    assert_eq!(body["errors"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn test_catalog_writes_require_admin() {
    let server = TestServer::start().await;
    let (_, user_token) = server.sign_up("bob").await;
    let product = json!({
        "name": "Widget",
        "description": "A simple widget for testing",
        "price": "10.00",
        "stock": 5
    });

    let (status, body) = server.post("/api/products", None, product.clone()).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["success"], false);

    let (status, _) = server
        .post("/api/products", Some("not-a-token"), product.clone())
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = server
        .post("/api/products", Some(&user_token), product)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = server.get("/api/orders", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_product_lifecycle() {
    let server = TestServer::start().await;
    let admin = server.admin().await;

    let id = server.create_product(&admin, "Widget", json!(10.5), 5).await;
    server.create_product(&admin, "Gizmo", json!("3.00"), 1).await;

    let (status, body) = server.get(&format!("/api/products/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["price"], "10.50");
    assert_eq!(body["data"]["priceCents"], 1050);

    let (status, body) = server.get("/api/products?search=widg", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["total"], 1);
    assert_eq!(body["data"]["items"][0]["name"], "Widget");

    let (status, body) = server
        .send(
            reqwest::Method::PUT,
            &format!("/api/products/{id}"),
            Some(&admin),
            Some(json!({ "stock": 9 })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["stock"], 9);
    assert_eq!(body["data"]["name"], "Widget");

    let (status, _) = server
        .send(
            reqwest::Method::DELETE,
            &format!("/api/products/{id}"),
            Some(&admin),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = server.get(&format!("/api/products/{id}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], false);

    let (_, body) = server.get("/api/products", None).await;
    assert_eq!(body["data"]["total"], 1);
}

#[tokio::test]
async fn test_widget_order_then_insufficient_stock() {
    let server = TestServer::start().await;
    let admin = server.admin().await;
    let widget = server.create_product(&admin, "Widget", json!("10.00"), 5).await;
    let (buyer_id, buyer) = server.sign_up("carol").await;

    let (status, body) = server
        .post(
            "/api/orders",
            Some(&buyer),
            json!({ "products": [{ "productId": widget, "quantity": 3 }] }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(body["message"], "Order created successfully");
    assert_eq!(body["data"]["totalPrice"], "30.00");
    assert_eq!(body["data"]["userId"], buyer_id);
    assert_eq!(body["data"]["status"], "pending");
    assert_eq!(body["data"]["lines"][0]["unitPrice"], "10.00");

    let (_, body) = server.get(&format!("/api/products/{widget}"), None).await;
    assert_eq!(body["data"]["stock"], 2);

    let (status, body) = server
        .post(
            "/api/orders",
            Some(&buyer),
            json!({ "products": [{ "productId": widget, "quantity": 3 }] }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["message"],
        "Insufficient stock for product Widget. Available: 2, Requested: 3"
    );

    let (_, body) = server.get(&format!("/api/products/{widget}"), None).await;
    assert_eq!(body["data"]["stock"], 2);

    let (status, body) = server
        .post(
            "/api/orders",
            Some(&buyer),
            json!({ "products": [{ "productId": 9999, "quantity": 1 }] }),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND, "{body}");

    let (status, _) = server
        .post("/api/orders", Some(&buyer), json!({ "products": [] }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_orders_are_scoped_to_the_token() {
    let server = TestServer::start().await;
    let admin = server.admin().await;
    let widget = server.create_product(&admin, "Widget", json!("10.00"), 10).await;
    let (dave_id, dave) = server.sign_up("dave").await;
    let (_, erin) = server.sign_up("erin").await;

    let (status, body) = server
        .post(
            "/api/orders",
            Some(&dave),
            json!({ "userId": 12345, "products": [{ "productId": widget, "quantity": 1 }] }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["userId"], dave_id);
    let order_id = body["data"]["id"].as_i64().unwrap();

    let (status, body) = server
        .get(&format!("/api/orders?userId={dave_id}"), Some(&erin))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["total"], 0);

    let (status, _) = server
        .get(&format!("/api/orders/{order_id}"), Some(&erin))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = server
        .get(&format!("/api/orders/{order_id}"), Some(&dave))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["lines"].as_array().unwrap().len(), 1);

    let (status, body) = server.get("/api/orders?status=pending", Some(&dave)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["total"], 1);

    let (status, _) = server.get("/api/orders?status=lost", Some(&dave)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_malformed_input_gets_envelope() {
    let server = TestServer::start().await;
    let (_, token) = server.sign_up("frank").await;

    let resp = server
        .client
        .post(server.url("/api/orders"))
        .bearer_auth(&token)
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["success"], false);
    assert!(body["data"].is_null());

    let (status, body) = server.get("/api/products/abc", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);

    let (status, _) = server.get("/api/products?page=0", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = server.get("/api/nowhere", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], false);
}
