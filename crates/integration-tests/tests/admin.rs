//! Admin dashboard, user and store administration over HTTP.

#![allow(clippy::unwrap_used)]

use axum::http::StatusCode;
use serde_json::{Value, json};
use storerate_core::{Role, UserId};
use storerate_integration_tests::{PASSWORD, TestApp};

fn store_body(owner: UserId, email: &str) -> Value {
    json!({
        "name": "Corner Shop",
        "email": email,
        "address": "2 Market Road",
        "owner": owner.as_i32(),
    })
}

#[tokio::test]
async fn test_admin_routes_reject_other_roles() {
    let app = TestApp::new();
    let user = app.create_user("user@example.com", Role::User).await;
    let owner = app.create_user("owner@example.com", Role::StoreOwner).await;

    for token in [user.token.as_str(), owner.token.as_str()] {
        for uri in [
            "/api/admin/dashboard",
            "/api/admin/users",
            "/api/admin/store-owners",
            "/api/admin/stores",
        ] {
            let (status, body) = app.get(uri, Some(token)).await;
            assert_eq!(status, StatusCode::FORBIDDEN, "{uri}");
            assert_eq!(body["msg"], "Admin access required");
        }
    }

    let (status, _) = app.get("/api/admin/dashboard", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app
        .post(
            "/api/admin/stores",
            Some(&user.token),
            store_body(owner.id(), "shop@example.com"),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(app.store_count().await, 0);
}

#[tokio::test]
async fn test_create_store_links_owner() {
    let app = TestApp::new();
    let admin = app.create_user("admin@example.com", Role::Admin).await;
    let owner = app.create_user("owner@example.com", Role::StoreOwner).await;

    let (status, body) = app
        .post(
            "/api/admin/stores",
            Some(&admin.token),
            store_body(owner.id(), "Shop@Example.com"),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["success"], true);

    let store = &body["data"]["store"];
    assert_eq!(store["name"], "Corner Shop");
    assert_eq!(store["email"], "shop@example.com");
    assert_eq!(store["owner"]["id"], owner.id().as_i32());
    assert_eq!(store["owner"]["email"], "owner@example.com");

    // The owner can now see their (empty) ratings view
    let (status, body) = app
        .get(
            &format!("/api/stores/{}/ratings", owner.id()),
            Some(&owner.token),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["totalRatings"], 0);
    assert_eq!(body["averageRating"], 0.0);
}

#[tokio::test]
async fn test_second_store_for_owner_conflicts() {
    let app = TestApp::new();
    let admin = app.create_user("admin@example.com", Role::Admin).await;
    let owner = app.create_user("owner@example.com", Role::StoreOwner).await;

    let (status, _) = app
        .post(
            "/api/admin/stores",
            Some(&admin.token),
            store_body(owner.id(), "first@example.com"),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = app
        .post(
            "/api/admin/stores",
            Some(&admin.token),
            store_body(owner.id(), "second@example.com"),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["msg"], "Store owner already has a store assigned");
    assert_eq!(app.store_count().await, 1);
}

#[tokio::test]
async fn test_create_store_failures() {
    let app = TestApp::new();
    let admin = app.create_user("admin@example.com", Role::Admin).await;
    let owner = app.create_user("owner@example.com", Role::StoreOwner).await;
    let other_owner = app.create_user("owner2@example.com", Role::StoreOwner).await;
    let user = app.create_user("user@example.com", Role::User).await;

    app.post(
        "/api/admin/stores",
        Some(&admin.token),
        store_body(owner.id(), "shop@example.com"),
    )
    .await;

    let (status, body) = app
        .post(
            "/api/admin/stores",
            Some(&admin.token),
            store_body(other_owner.id(), "SHOP@example.com"),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["msg"], "Store with this email already exists");

    let (status, _) = app
        .post(
            "/api/admin/stores",
            Some(&admin.token),
            store_body(user.id(), "user-shop@example.com"),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app
        .post(
            "/api/admin/stores",
            Some(&admin.token),
            store_body(UserId::new(9999), "ghost@example.com"),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app
        .post(
            "/api/admin/stores",
            Some(&admin.token),
            json!({ "name": "", "email": "blank@example.com", "address": "x", "owner": other_owner.id().as_i32() }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .post(
            "/api/admin/stores",
            Some(&admin.token),
            store_body(other_owner.id(), "not-an-email"),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    assert_eq!(app.store_count().await, 1);
}

#[tokio::test]
async fn test_dashboard_counts() {
    let app = TestApp::new();
    let admin = app.create_user("admin@example.com", Role::Admin).await;
    let owner = app.create_user("owner@example.com", Role::StoreOwner).await;
    let user = app.create_user("user@example.com", Role::User).await;
    let store = app.create_store(&owner, "Corner Shop", "shop@example.com").await;

    app.post(
        "/api/stores/ratings",
        Some(&user.token),
        json!({ "storeId": store.id.as_i32(), "rating": 4 }),
    )
    .await;

    let (status, body) = app.get("/api/admin/dashboard", Some(&admin.token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({ "totalUsers": 3, "totalStores": 1, "totalRatings": 1 })
    );
}

#[tokio::test]
async fn test_user_listing_and_filters() {
    let app = TestApp::new();
    let admin = app.create_user("admin@example.com", Role::Admin).await;
    app.create_user("owner@example.com", Role::StoreOwner).await;
    app.create_user("alice@example.com", Role::User).await;

    let (status, body) = app.get("/api/admin/users", Some(&admin.token)).await;
    assert_eq!(status, StatusCode::OK);
    let users = body.as_array().unwrap();
    assert_eq!(users.len(), 3);
    assert_eq!(users[0]["email"], "alice@example.com");
    assert!(users.iter().all(|u| u.get("passwordHash").is_none()));

    let (_, body) = app
        .get("/api/admin/users?role=store_owner", Some(&admin.token))
        .await;
    let owners = body.as_array().unwrap();
    assert_eq!(owners.len(), 1);
    assert_eq!(owners[0]["role"], "store_owner");

    let (_, body) = app.get("/api/admin/users?email=ALICE", Some(&admin.token)).await;
    assert_eq!(body.as_array().unwrap().len(), 1);

    let (_, body) = app
        .get("/api/admin/store-owners", Some(&admin.token))
        .await;
    assert_eq!(body["user"].as_array().unwrap().len(), 1);
    assert!(body["message"].is_string());
}

#[tokio::test]
async fn test_admin_creates_users_with_any_role() {
    let app = TestApp::new();
    let admin = app.create_user("admin@example.com", Role::Admin).await;

    let (status, body) = app
        .post(
            "/api/admin/users",
            Some(&admin.token),
            json!({
                "name": "Second Admin",
                "email": "second@example.com",
                "password": PASSWORD,
                "address": "9 Hill Road",
                "role": "admin",
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["role"], "admin");

    let (status, _) = app
        .post(
            "/api/users/login",
            None,
            json!({ "email": "second@example.com", "password": PASSWORD }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = app
        .post(
            "/api/admin/users",
            Some(&admin.token),
            json!({
                "name": "Again",
                "email": "SECOND@example.com",
                "password": PASSWORD,
                "role": "user",
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["msg"], "User already exists");
}

#[tokio::test]
async fn test_admin_store_listing_filters() {
    let app = TestApp::new();
    let admin = app.create_user("admin@example.com", Role::Admin).await;
    let owner = app.create_user("owner@example.com", Role::StoreOwner).await;
    let other_owner = app.create_user("owner2@example.com", Role::StoreOwner).await;
    app.create_store(&owner, "Corner Bakery", "bakery@example.com").await;
    app.create_store(&other_owner, "Green Grocer", "grocer@example.com")
        .await;

    let (status, body) = app.get("/api/admin/stores", Some(&admin.token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 2);

    let (_, body) = app
        .get("/api/admin/stores?email=grocer", Some(&admin.token))
        .await;
    let stores = body.as_array().unwrap();
    assert_eq!(stores.len(), 1);
    assert_eq!(stores[0]["name"], "Green Grocer");
    assert_eq!(stores[0]["owner"]["email"], "owner2@example.com");
    assert!(stores[0]["userRating"].is_null());
}
