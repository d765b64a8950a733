//! End-to-end test harness for the Shopvely API.
//!
//! # Running Tests
//!
//! ```bash
//! # Apply migrations and start the server
//! cargo run -p shopvely-cli -- migrate
//! cargo run -p shopvely-api
//!
//! # Run the ignored end-to-end tests
//! cargo test -p shopvely-integration-tests -- --ignored
//! ```
//!
//! # Environment Variables
//!
//! - `SHOPVELY_API_URL` - Server base URL (default: `http://localhost:8000`)
//! - `SHOPVELY_DATABASE_URL` - Same database the server uses; needed to
//!   promote test users to staff

#![allow(clippy::missing_panics_doc)]
#![allow(clippy::unwrap_used)]

use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde_json::{Value, json};
use sqlx::PgPool;
use uuid::Uuid;

/// Base URL for the API (configurable via environment).
#[must_use]
pub fn api_base_url() -> String {
    std::env::var("SHOPVELY_API_URL").unwrap_or_else(|_| "http://localhost:8000".to_string())
}

/// Short unique suffix so tests never collide on usernames or titles.
#[must_use]
pub fn unique(prefix: &str) -> String {
    let id = Uuid::new_v4().simple().to_string();
    format!("{prefix}_{}", &id[..12])
}

/// A fake client address per login, so the token rate limiter never trips
/// across a whole test run.
fn fake_client_ip() -> String {
    let bytes = Uuid::new_v4().into_bytes();
    format!("10.{}.{}.{}", bytes[0], bytes[1], bytes[2])
}

/// Connect to the server's database.
pub async fn database() -> PgPool {
    dotenvy::dotenv().ok();
    let url = std::env::var("SHOPVELY_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .map(SecretString::from)
        .expect("SHOPVELY_DATABASE_URL must be set for integration tests");
    PgPool::connect(url.expose_secret())
        .await
        .expect("Failed to connect to database")
}

/// A signed-in API user.
pub struct Session {
    pub client: Client,
    pub base_url: String,
    pub username: String,
    pub password: String,
    pub access: String,
    pub refresh: String,
}

impl Session {
    /// Register a fresh customer and log in.
    pub async fn customer() -> Self {
        let client = Client::new();
        let base_url = api_base_url();
        let username = unique("customer");
        let password = "correct horse battery".to_string();

        let resp = client
            .post(format!("{base_url}/api/users/register/"))
            .json(&json!({
                "username": username,
                "email": format!("{username}@example.com"),
                "password": password,
            }))
            .send()
            .await
            .expect("Failed to register");
        assert_eq!(resp.status(), StatusCode::CREATED);

        let tokens = obtain_tokens(&client, &base_url, &username, &password).await;
        Self {
            client,
            base_url,
            username,
            password,
            access: tokens["access"].as_str().unwrap().to_string(),
            refresh: tokens["refresh"].as_str().unwrap().to_string(),
        }
    }

    /// Register a fresh user and promote them to staff.
    pub async fn staff() -> Self {
        let session = Self::customer().await;
        let pool = database().await;
        sqlx::query("UPDATE shop.user SET is_staff = TRUE WHERE username = $1")
            .bind(&session.username)
            .execute(&pool)
            .await
            .expect("Failed to promote user to staff");
        session
    }

    /// Authenticated request to an `/api` path.
    #[must_use]
    pub fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.client
            .request(method, format!("{}/api{path}", self.base_url))
            .bearer_auth(&self.access)
    }

    /// Send and decode a JSON response, returning status and body.
    pub async fn call(&self, method: Method, path: &str, body: Option<Value>) -> (StatusCode, Value) {
        let mut request = self.request(method, path);
        if let Some(body) = body {
            request = request.json(&body);
        }
        let resp = request.send().await.expect("Request failed");
        decode(resp).await
    }

    /// Add a product to the catalog. Requires a staff session.
    pub async fn create_product(&self, price: &str) -> i64 {
        let (status, body) = self
            .call(
                Method::POST,
                "/products/",
                Some(json!({ "title": unique("Product"), "price": price, "rating": 4.0 })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        body["id"].as_i64().unwrap()
    }

    /// Add an address to the address book.
    pub async fn create_address(&self, line1: &str, is_default: bool) -> i64 {
        let (status, body) = self
            .call(
                Method::POST,
                "/addresses/",
                Some(json!({
                    "full_name": "Asha Rao",
                    "phone": "9999900000",
                    "line1": line1,
                    "city": "Pune",
                    "state": "MH",
                    "pincode": "411001",
                    "is_default": is_default,
                })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        body["id"].as_i64().unwrap()
    }
}

/// POST /api/token with a fresh client address.
pub async fn obtain_tokens(client: &Client, base_url: &str, username: &str, password: &str) -> Value {
    let resp = client
        .post(format!("{base_url}/api/token/"))
        .header("x-forwarded-for", fake_client_ip())
        .json(&json!({ "username": username, "password": password }))
        .send()
        .await
        .expect("Failed to obtain tokens");
    let (status, body) = decode(resp).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    body
}

/// Split a response into status and JSON body (`Null` when empty).
pub async fn decode(resp: Response) -> (StatusCode, Value) {
    let status = resp.status();
    let bytes = resp.bytes().await.expect("Failed to read response");
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, body)
}
