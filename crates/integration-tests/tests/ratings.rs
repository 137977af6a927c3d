//! Store browsing, rating submission and aggregates over HTTP.

#![allow(clippy::unwrap_used)]

use axum::http::StatusCode;
use serde_json::{Value, json};
use storerate_core::Role;
use storerate_integration_tests::TestApp;

fn rate(store_id: impl Into<Value>, rating: i64) -> Value {
    json!({ "storeId": store_id.into(), "rating": rating })
}

#[tokio::test]
async fn test_unauthenticated_rating_is_rejected() {
    let app = TestApp::new();
    let owner = app.create_user("owner@example.com", Role::StoreOwner).await;
    let store = app.create_store(&owner, "Corner Shop", "shop@example.com").await;

    let (status, body) = app
        .post("/api/stores/ratings", None, rate(store.id.as_i32(), 4))
        .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["success"], false);
    assert_eq!(app.rating_count().await, 0);
}

#[tokio::test]
async fn test_aggregate_tracks_latest_rating_per_user() {
    let app = TestApp::new();
    let owner = app.create_user("owner@example.com", Role::StoreOwner).await;
    let store = app.create_store(&owner, "Corner Shop", "shop@example.com").await;
    let a = app.create_user("a@example.com", Role::User).await;
    let b = app.create_user("b@example.com", Role::User).await;
    let id = store.id.as_i32();

    let (status, body) = app.post("/api/stores/ratings", Some(&a.token), rate(id, 3)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "rating": 3.0, "ratingCount": 1, "userRating": 3 }));

    let (_, body) = app.post("/api/stores/ratings", Some(&b.token), rate(id, 5)).await;
    assert_eq!(body, json!({ "rating": 4.0, "ratingCount": 2, "userRating": 5 }));

    // String IDs are accepted too
    let (_, body) = app
        .post("/api/stores/ratings", Some(&a.token), rate(id.to_string(), 1))
        .await;
    assert_eq!(body, json!({ "rating": 3.0, "ratingCount": 2, "userRating": 1 }));

    assert_eq!(app.rating_count().await, 2);
}

#[tokio::test]
async fn test_resubmitting_same_value_is_idempotent() {
    let app = TestApp::new();
    let owner = app.create_user("owner@example.com", Role::StoreOwner).await;
    let store = app.create_store(&owner, "Corner Shop", "shop@example.com").await;
    let user = app.create_user("user@example.com", Role::User).await;
    let id = store.id.as_i32();

    let (_, first) = app.post("/api/stores/ratings", Some(&user.token), rate(id, 4)).await;
    let (_, second) = app.post("/api/stores/ratings", Some(&user.token), rate(id, 4)).await;

    assert_eq!(first, second);
    assert_eq!(app.rating_count().await, 1);
}

#[tokio::test]
async fn test_rating_validation() {
    let app = TestApp::new();
    let owner = app.create_user("owner@example.com", Role::StoreOwner).await;
    let store = app.create_store(&owner, "Corner Shop", "shop@example.com").await;
    let user = app.create_user("user@example.com", Role::User).await;
    let id = store.id.as_i32();

    for bad in [0, 6, -1] {
        let (status, _) = app
            .post("/api/stores/ratings", Some(&user.token), rate(id, bad))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "rating {bad}");
    }

    let (status, _) = app
        .post(
            "/api/stores/ratings",
            Some(&user.token),
            json!({ "storeId": id, "rating": 4.5 }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .post("/api/stores/ratings", Some(&user.token), rate("abc", 3))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = app
        .post("/api/stores/ratings", Some(&user.token), rate(9999, 3))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["msg"], "Store not found");

    assert_eq!(app.rating_count().await, 0);
}

#[tokio::test]
async fn test_owner_cannot_rate_own_store() {
    let app = TestApp::new();
    let owner = app.create_user("owner@example.com", Role::StoreOwner).await;
    let store = app.create_store(&owner, "Corner Shop", "shop@example.com").await;

    let (status, _) = app
        .post("/api/stores/ratings", Some(&owner.token), rate(store.id.as_i32(), 5))
        .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(app.rating_count().await, 0);
}

#[tokio::test]
async fn test_check_own_rating() {
    let app = TestApp::new();
    let owner = app.create_user("owner@example.com", Role::StoreOwner).await;
    let store = app.create_store(&owner, "Corner Shop", "shop@example.com").await;
    let user = app.create_user("user@example.com", Role::User).await;
    let uri = format!("/api/stores/check?storeId={}", store.id);

    let (status, body) = app.get(&uri, Some(&user.token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "rating": null }));

    app.post("/api/stores/ratings", Some(&user.token), rate(store.id.as_i32(), 2))
        .await;

    let (_, body) = app.get(&uri, Some(&user.token)).await;
    assert_eq!(body["rating"], 2);
    assert!(body["createdAt"].is_string());

    let (status, _) = app.get("/api/stores/check", Some(&user.token)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app.get(&uri, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_store_listing_with_and_without_viewer() {
    let app = TestApp::new();
    let owner = app.create_user("owner@example.com", Role::StoreOwner).await;
    let other_owner = app.create_user("owner2@example.com", Role::StoreOwner).await;
    let bakery = app.create_store(&owner, "Corner Bakery", "bakery@example.com").await;
    app.create_store(&other_owner, "Green Grocer", "grocer@example.com")
        .await;
    let user = app.create_user("user@example.com", Role::User).await;

    app.post("/api/stores/ratings", Some(&user.token), rate(bakery.id.as_i32(), 5))
        .await;

    let (status, body) = app.get("/api/stores", None).await;
    assert_eq!(status, StatusCode::OK);
    let stores = body.as_array().unwrap();
    assert_eq!(stores.len(), 2);
    // Newest first
    assert_eq!(stores[0]["name"], "Green Grocer");
    assert_eq!(stores[0]["rating"], 0.0);
    assert_eq!(stores[0]["ratingCount"], 0);
    assert!(stores[1]["userRating"].is_null());
    assert_eq!(stores[1]["owner"]["email"], "owner@example.com");

    let (_, body) = app.get("/api/stores", Some(&user.token)).await;
    let bakery_view = body
        .as_array()
        .unwrap()
        .iter()
        .find(|s| s["name"] == "Corner Bakery")
        .unwrap();
    assert_eq!(bakery_view["rating"], 5.0);
    assert_eq!(bakery_view["userRating"], 5);

    let (_, body) = app.get("/api/stores?search=bakery%20street", None).await;
    assert_eq!(body.as_array().unwrap().len(), 0);

    let (_, body) = app.get("/api/stores?search=GROCER", None).await;
    let found = body.as_array().unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0]["name"], "Green Grocer");

    let (status, _) = app.get("/api/stores", Some("not-a-token")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_owner_ratings_view() {
    let app = TestApp::new();
    let owner = app.create_user("owner@example.com", Role::StoreOwner).await;
    let store = app.create_store(&owner, "Corner Shop", "shop@example.com").await;
    let a = app.create_user("a@example.com", Role::User).await;
    let b = app.create_user("b@example.com", Role::User).await;
    let id = store.id.as_i32();

    app.post("/api/stores/ratings", Some(&a.token), rate(id, 2)).await;
    app.post("/api/stores/ratings", Some(&b.token), rate(id, 5)).await;

    let uri = format!("/api/stores/{}/ratings", owner.id());
    let (status, body) = app.get(&uri, Some(&owner.token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["averageRating"], 3.5);
    assert_eq!(body["totalRatings"], 2);

    let ratings = body["ratings"].as_array().unwrap();
    assert_eq!(ratings.len(), 2);
    assert_eq!(ratings[0]["userEmail"], "b@example.com");
    assert_eq!(ratings[0]["rating"], 5);
    assert_eq!(ratings[1]["userName"], "Test Person");

    let (status, _) = app.get(&uri, Some(&a.token)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app.get("/api/stores/abc/ratings", Some(&owner.token)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_owner_ratings_edge_cases() {
    let app = TestApp::new();
    let storeless = app.create_user("storeless@example.com", Role::StoreOwner).await;
    let user = app.create_user("user@example.com", Role::User).await;

    let (status, body) = app
        .get(
            &format!("/api/stores/{}/ratings", storeless.id()),
            Some(&storeless.token),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["msg"], "No store associated with this owner");

    let (status, body) = app
        .get(&format!("/api/stores/{}/ratings", user.id()), Some(&user.token))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["msg"], "Specified user is not a store owner");
}
