// tests/api_tests.rs

mod common;

use common::{browser, create_listing, listing_body, names, sign_up_and_in, spawn_app, unique};
use serde_json::{Value, json};

#[tokio::test]
async fn unknown_api_path_is_404() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();

    let response = client
        .get(format!("{}/api/random_path_that_does_not_exist", address))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status().as_u16(), 404);
}

#[tokio::test]
async fn health_responds_ok() {
    let address = spawn_app().await;
    let response = reqwest::get(format!("{}/api/health", address)).await.unwrap();
    assert!(response.status().is_success());
    assert_eq!(response.text().await.unwrap(), "ok");
}

#[tokio::test]
async fn signup_returns_user_without_password() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();
    let username = unique("u");

    let response = client
        .post(format!("{}/api/auth/signup", address))
        .json(&json!({
            "username": username,
            "email": format!("{}@Example.com", username),
            "password": "password123"
        }))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status().as_u16(), 201);
    let user: Value = response.json().await.unwrap();
    assert_eq!(user["username"], username.as_str());
    assert_eq!(user["email"], format!("{}@example.com", username).as_str());
    assert!(user["_id"].is_i64());
    assert!(user.get("password").is_none());
}

#[tokio::test]
async fn signup_fails_validation() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();

    // Act: username too short
    let response = client
        .post(format!("{}/api/auth/signup", address))
        .json(&json!({ "username": "yo", "email": "yo@example.com", "password": "password123" }))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status().as_u16(), 400);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["success"], false);
    assert_eq!(body["statusCode"], 400);
    assert!(body["message"].is_string());
}

#[tokio::test]
async fn duplicate_signup_conflicts() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();
    let body = json!({ "username": "dupe_user", "email": "dupe@example.com", "password": "password123" });

    let first = client
        .post(format!("{}/api/auth/signup", address))
        .json(&body)
        .send()
        .await
        .unwrap();
    assert_eq!(first.status().as_u16(), 201);

    let second = client
        .post(format!("{}/api/auth/signup", address))
        .json(&body)
        .send()
        .await
        .unwrap();
    assert_eq!(second.status().as_u16(), 409);
}

#[tokio::test]
async fn malformed_json_is_a_bad_request() {
    let address = spawn_app().await;
    let response = reqwest::Client::new()
        .post(format!("{}/api/auth/signup", address))
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 400);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn signin_sets_http_only_cookie() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();
    let username = unique("c");
    let email = format!("{}@example.com", username);

    client
        .post(format!("{}/api/auth/signup", address))
        .json(&json!({ "username": username, "email": email, "password": "secret123" }))
        .send()
        .await
        .unwrap();

    let response = client
        .post(format!("{}/api/auth/signin", address))
        .json(&json!({ "email": email, "password": "secret123" }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 200);
    let cookie = response
        .headers()
        .get("set-cookie")
        .expect("session cookie")
        .to_str()
        .unwrap()
        .to_string();
    assert!(cookie.starts_with("access_token="));
    assert!(cookie.contains("HttpOnly"));

    let user: Value = response.json().await.unwrap();
    assert!(user.get("password").is_none());
}

#[tokio::test]
async fn signin_rejects_unknown_email_and_wrong_password() {
    let address = spawn_app().await;
    let client = browser();
    let user = sign_up_and_in(&address, &client).await;

    let response = client
        .post(format!("{}/api/auth/signin", address))
        .json(&json!({ "email": "nobody@example.com", "password": "secret123" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 404);

    let response = client
        .post(format!("{}/api/auth/signin", address))
        .json(&json!({ "email": user["email"], "password": "not-it" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 401);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["message"], "Wrong credentials");
}

#[tokio::test]
async fn oauth_creates_then_reuses_account() {
    let address = spawn_app().await;
    let client = browser();
    let body = json!({
        "name": "Jane Doe",
        "email": "jane.doe@example.com",
        "photo": "https://photos.example.com/jane.png"
    });

    let first: Value = client
        .post(format!("{}/api/auth/google", address))
        .json(&body)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(first["avatar"], "https://photos.example.com/jane.png");
    assert!(first["username"].as_str().unwrap().starts_with("janedoe"));

    let second: Value = client
        .post(format!("{}/api/auth/google", address))
        .json(&body)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(first["_id"], second["_id"]);
}

#[tokio::test]
async fn protected_routes_need_a_session() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("{}/api/listing/create", address))
        .json(&listing_body("Cosy Cabin", "rent", 900))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 401);

    let response = client
        .post(format!("{}/api/listing/create", address))
        .header("cookie", "access_token=not.a.token")
        .json(&listing_body("Cosy Cabin", "rent", 900))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 403);
}

#[tokio::test]
async fn signout_clears_the_session() {
    let address = spawn_app().await;
    let client = browser();
    sign_up_and_in(&address, &client).await;

    let response = client
        .get(format!("{}/api/auth/signout", address))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["success"], true);

    let response = client
        .post(format!("{}/api/listing/create", address))
        .json(&listing_body("Cosy Cabin", "rent", 900))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 401);
}

#[tokio::test]
async fn partial_profile_update_changes_only_present_fields() {
    let address = spawn_app().await;
    let client = browser();
    let user = sign_up_and_in(&address, &client).await;
    let id = user["_id"].as_i64().unwrap();

    let response = client
        .post(format!("{}/api/user/update/{}", address, id))
        .json(&json!({ "avatar": "https://photos.example.com/new.png" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);
    let updated: Value = response.json().await.unwrap();
    assert_eq!(updated["avatar"], "https://photos.example.com/new.png");
    assert_eq!(updated["username"], user["username"]);
    assert_eq!(updated["email"], user["email"]);

    // New password works, the old one no longer does.
    client
        .post(format!("{}/api/user/update/{}", address, id))
        .json(&json!({ "password": "fresh-pass" }))
        .send()
        .await
        .unwrap();
    let old = client
        .post(format!("{}/api/auth/signin", address))
        .json(&json!({ "email": user["email"], "password": "secret123" }))
        .send()
        .await
        .unwrap();
    assert_eq!(old.status().as_u16(), 401);
    let new = client
        .post(format!("{}/api/auth/signin", address))
        .json(&json!({ "email": user["email"], "password": "fresh-pass" }))
        .send()
        .await
        .unwrap();
    assert_eq!(new.status().as_u16(), 200);
}

#[tokio::test]
async fn users_cannot_touch_each_other() {
    let address = spawn_app().await;
    let alice = browser();
    let bob = browser();
    let alice_user = sign_up_and_in(&address, &alice).await;
    sign_up_and_in(&address, &bob).await;
    let alice_id = alice_user["_id"].as_i64().unwrap();

    let listing = create_listing(&address, &alice, &listing_body("Alice Place", "rent", 1200)).await;
    let listing_id = listing["_id"].as_i64().unwrap();

    let response = bob
        .post(format!("{}/api/user/update/{}", address, alice_id))
        .json(&json!({ "username": "hijacked" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 403);

    let response = bob
        .get(format!("{}/api/user/listings/{}", address, alice_id))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 403);

    let response = bob
        .post(format!("{}/api/listing/update/{}", address, listing_id))
        .json(&listing_body("Bob Was Here", "sale", 3000))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 403);

    let response = bob
        .delete(format!("{}/api/listing/delete/{}", address, listing_id))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 403);

    let response = bob
        .delete(format!("{}/api/user/delete/{}", address, alice_id))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 403);

    // Alice keeps her account and her listing.
    let response = reqwest::Client::new()
        .post(format!("{}/api/auth/signin", address))
        .json(&json!({ "email": alice_user["email"], "password": "secret123" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);

    let mine: Value = alice
        .get(format!("{}/api/user/listings/{}", address, alice_id))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(names(&mine), vec!["Alice Place"]);

    // Nothing changed.
    let unchanged: Value = reqwest::get(format!("{}/api/listing/get/{}", address, listing_id))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(unchanged, listing);
}

#[tokio::test]
async fn listing_lifecycle() {
    let address = spawn_app().await;
    let client = browser();
    let user = sign_up_and_in(&address, &client).await;

    let mut body = listing_body("Garden House", "sale", 4000);
    body["offer"] = json!(true);
    body["discountPrice"] = json!(3500);
    let created = create_listing(&address, &client, &body).await;
    let id = created["_id"].as_i64().unwrap();

    assert_eq!(created["userRef"], user["_id"]);
    assert_eq!(created["type"], "sale");
    assert_eq!(created["discountPrice"], 3500);

    let fetched: Value = reqwest::get(format!("{}/api/listing/get/{}", address, id))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(fetched, created);

    body["name"] = json!("Garden House Deluxe");
    let response = client
        .post(format!("{}/api/listing/update/{}", address, id))
        .json(&body)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);
    let updated: Value = response.json().await.unwrap();
    assert_eq!(updated["name"], "Garden House Deluxe");
    assert_eq!(updated["_id"], created["_id"]);

    let mine: Value = client
        .get(format!("{}/api/user/listings/{}", address, user["_id"]))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(names(&mine), vec!["Garden House Deluxe"]);

    let response = client
        .delete(format!("{}/api/listing/delete/{}", address, id))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);

    let response = reqwest::get(format!("{}/api/listing/get/{}", address, id)).await.unwrap();
    assert_eq!(response.status().as_u16(), 404);
}

#[tokio::test]
async fn discount_must_stay_below_regular_price() {
    let address = spawn_app().await;
    let client = browser();
    sign_up_and_in(&address, &client).await;

    let mut body = listing_body("Overpriced Offer", "rent", 1000);
    body["offer"] = json!(true);
    body["discountPrice"] = json!(1000);

    let response = client
        .post(format!("{}/api/listing/create", address))
        .json(&body)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 400);

    let all: Value = reqwest::get(format!("{}/api/listing/get", address))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(all.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn update_rejects_discount_not_below_regular_price() {
    let address = spawn_app().await;
    let client = browser();
    sign_up_and_in(&address, &client).await;

    let mut body = listing_body("Fair Offer", "rent", 1000);
    body["offer"] = json!(true);
    body["discountPrice"] = json!(800);
    let created = create_listing(&address, &client, &body).await;
    let id = created["_id"].as_i64().unwrap();

    body["name"] = json!("Unfair Offer");
    body["discountPrice"] = json!(1000);
    let response = client
        .post(format!("{}/api/listing/update/{}", address, id))
        .json(&body)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 400);

    let unchanged: Value = reqwest::get(format!("{}/api/listing/get/{}", address, id))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(unchanged, created);
}

#[tokio::test]
async fn free_text_html_is_sanitized() {
    let address = spawn_app().await;
    let client = browser();
    sign_up_and_in(&address, &client).await;

    let mut body = listing_body("<img src=x onerror=alert(1)>Script House", "rent", 1000);
    body["description"] = json!("<b>Bright</b><script>alert(1)</script>");
    body["address"] = json!("<i>4 Tag Lane</i>");
    let created = create_listing(&address, &client, &body).await;

    assert_eq!(created["name"], "Script House");
    assert_eq!(created["description"], "<b>Bright</b>");
    assert_eq!(created["address"], "4 Tag Lane");
}

#[tokio::test]
async fn markup_only_description_is_rejected() {
    let address = spawn_app().await;
    let client = browser();
    sign_up_and_in(&address, &client).await;

    let mut body = listing_body("Empty Inside", "rent", 1000);
    body["description"] = json!("<script>alert(1)</script>");
    let response = client
        .post(format!("{}/api/listing/create", address))
        .json(&body)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 400);

    let created = create_listing(&address, &client, &listing_body("Full Inside", "rent", 1000)).await;
    let response = client
        .post(format!("{}/api/listing/update/{}", address, created["_id"]))
        .json(&body)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 400);
}

#[tokio::test]
async fn missing_and_malformed_ids_are_404() {
    let address = spawn_app().await;

    let response = reqwest::get(format!("{}/api/listing/get/999999", address)).await.unwrap();
    assert_eq!(response.status().as_u16(), 404);

    let response = reqwest::get(format!("{}/api/listing/get/not-an-id", address)).await.unwrap();
    assert_eq!(response.status().as_u16(), 404);
}

#[tokio::test]
async fn search_filters_by_term_and_type() {
    let address = spawn_app().await;
    let client = browser();
    sign_up_and_in(&address, &client).await;

    create_listing(&address, &client, &listing_body("Sale Loft", "rent", 1000)).await;
    create_listing(&address, &client, &listing_body("Loft A", "rent", 1100)).await;
    create_listing(&address, &client, &listing_body("Loft B", "rent", 1200)).await;
    create_listing(&address, &client, &listing_body("Loft C", "sale", 5000)).await;

    let page: Value = reqwest::get(format!(
        "{}/api/listing/get?searchTerm=Loft&type=rent&limit=2&startIndex=0",
        address
    ))
    .await
    .unwrap()
    .json()
    .await
    .unwrap();

    assert_eq!(names(&page), vec!["Loft B", "Loft A"]);
    for listing in page.as_array().unwrap() {
        assert_eq!(listing["type"], "rent");
    }
}

#[tokio::test]
async fn search_tolerates_garbage_parameters() {
    let address = spawn_app().await;
    let client = browser();
    sign_up_and_in(&address, &client).await;
    create_listing(&address, &client, &listing_body("Any Flat", "rent", 800)).await;

    let response = reqwest::get(format!(
        "{}/api/listing/get?limit=abc&startIndex=-3&sort=password&order=up&type=castle&parking=maybe",
        address
    ))
    .await
    .unwrap();

    assert_eq!(response.status().as_u16(), 200);
    let page: Value = response.json().await.unwrap();
    assert_eq!(names(&page), vec!["Any Flat"]);
}

#[tokio::test]
async fn search_pages_by_price_without_overlap() {
    let address = spawn_app().await;
    let client = browser();
    sign_up_and_in(&address, &client).await;

    for (i, price) in [3000, 1000, 2000, 1000, 4000].into_iter().enumerate() {
        let mut body = listing_body(&format!("Flat number {}", i), "rent", price);
        if i % 2 == 0 {
            body["parking"] = json!(true);
        }
        create_listing(&address, &client, &body).await;
    }

    let url = |start: usize| {
        format!(
            "{}/api/listing/get?sort=regularPrice&order=asc&limit=3&startIndex={}",
            address, start
        )
    };
    let first: Value = reqwest::get(url(0)).await.unwrap().json().await.unwrap();
    let first = first.as_array().unwrap().clone();
    let second: Value = reqwest::get(url(first.len())).await.unwrap().json().await.unwrap();
    let second = second.as_array().unwrap().clone();

    assert_eq!(first.len(), 3);
    assert_eq!(second.len(), 2);

    let prices: Vec<i64> = first
        .iter()
        .chain(second.iter())
        .map(|l| l["regularPrice"].as_i64().unwrap())
        .collect();
    assert_eq!(prices, vec![1000, 1000, 2000, 3000, 4000]);

    let mut ids: Vec<i64> = first
        .iter()
        .chain(second.iter())
        .map(|l| l["_id"].as_i64().unwrap())
        .collect();
    ids.sort();
    ids.dedup();
    assert_eq!(ids.len(), 5);

    let parking: Value = reqwest::get(format!("{}/api/listing/get?parking=true", address))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(parking.as_array().unwrap().len(), 3);
    assert!(parking.as_array().unwrap().iter().all(|l| l["parking"] == true));
}

#[tokio::test]
async fn deleting_a_user_removes_their_listings() {
    let address = spawn_app().await;
    let client = browser();
    let user = sign_up_and_in(&address, &client).await;
    let listing = create_listing(&address, &client, &listing_body("Short Lived", "rent", 700)).await;

    let response = client
        .delete(format!("{}/api/user/delete/{}", address, user["_id"]))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["message"], "User has been deleted!");

    let response = reqwest::get(format!("{}/api/listing/get/{}", address, listing["_id"]))
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 404);

    // Session cookie was cleared along with the account.
    let response = client
        .post(format!("{}/api/listing/create", address))
        .json(&listing_body("Ghost Listing", "rent", 700))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 401);
}
