// tests/common/mod.rs

#![allow(dead_code)]

use realty::{config::Config, routes, state::AppState};
use serde_json::{Value, json};

pub const TEST_SECRET: &str = "test_secret_for_integration_tests";

/// Spawns the app on a random port, backed by a fresh in-memory store.
/// Returns the base URL (e.g., "http://127.0.0.1:12345").
pub async fn spawn_app() -> String {
    let state = AppState::in_memory(Config::for_tests(TEST_SECRET));
    let app = routes::create_router(state);

    // Bind to port 0 to get a random available port
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind random port");

    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    address
}

/// A client that keeps the session cookie, like a browser.
pub fn browser() -> reqwest::Client {
    reqwest::Client::builder()
        .cookie_store(true)
        .build()
        .expect("Failed to build client")
}

/// Short unique suffix for usernames and emails.
pub fn unique(prefix: &str) -> String {
    format!("{}_{}", prefix, &uuid::Uuid::new_v4().simple().to_string()[..8])
}

/// Registers and signs in a fresh user on `client`. Returns the user JSON.
pub async fn sign_up_and_in(address: &str, client: &reqwest::Client) -> Value {
    let username = unique("user");
    let email = format!("{}@example.com", username);

    let response = client
        .post(format!("{}/api/auth/signup", address))
        .json(&json!({ "username": username, "email": email, "password": "secret123" }))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status().as_u16(), 201);

    let response = client
        .post(format!("{}/api/auth/signin", address))
        .json(&json!({ "email": email, "password": "secret123" }))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status().as_u16(), 200);

    response.json().await.unwrap()
}

/// Valid listing body; tweak fields with `patch`.
pub fn listing_body(name: &str, kind: &str, regular_price: i64) -> Value {
    json!({
        "name": name,
        "description": "A place to live",
        "address": "12 Harbour Street",
        "type": kind,
        "parking": false,
        "furnished": false,
        "offer": false,
        "bedrooms": 2,
        "bathrooms": 1,
        "regularPrice": regular_price,
        "discountPrice": 0,
        "imageUrls": ["https://cdn.example.com/cover.jpg"]
    })
}

/// Creates a listing as the signed-in user on `client`. Returns the listing JSON.
pub async fn create_listing(address: &str, client: &reqwest::Client, body: &Value) -> Value {
    let response = client
        .post(format!("{}/api/listing/create", address))
        .json(body)
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status().as_u16(), 201);
    response.json().await.unwrap()
}

/// Names of the listings in a search response, in response order.
pub fn names(listings: &Value) -> Vec<String> {
    listings
        .as_array()
        .expect("array body")
        .iter()
        .map(|l| l["name"].as_str().unwrap().to_string())
        .collect()
}
