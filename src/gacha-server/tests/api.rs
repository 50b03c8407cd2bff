//! Router tests driven through `tower::ServiceExt::oneshot`

use std::sync::Arc;

use axum::{
    body::Body,
    http::{Method, Request, StatusCode},
    Router,
};
use gacha::{DrawOrchestrator, GachaSettings, Item, PoolRegistry, Rarity};
use gacha_server::{router, AppState, PoolsResponse, PullResponse, RatesResponse, StatsResponse};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

fn item(id: u32, name: &str, rarity: Rarity, base_weight: u32) -> Item {
    Item {
        id,
        name: name.to_string(),
        rarity,
        base_weight,
    }
}

fn main_pool() -> Vec<Item> {
    vec![
        item(1, "Wooden Sword", Rarity::N, 610),
        item(2, "Silver Rapier", Rarity::R, 250),
        item(3, "Frost Lance", Rarity::SR, 100),
        item(101, "Starfall Blade", Rarity::SSR, 10),
        item(102, "Aegis of Dawn", Rarity::SSR, 10),
        item(103, "Crown of the Tide", Rarity::SSR, 10),
        item(104, "Voidwalker Mantle", Rarity::SSR, 10),
    ]
}

fn confirm_pool() -> Vec<Item> {
    main_pool()
        .into_iter()
        .filter(|i| i.rarity == Rarity::SSR)
        .collect()
}

fn app() -> Router {
    let mut registry = PoolRegistry::new();
    registry.register("normal", main_pool()).unwrap();
    registry.register("confirm", confirm_pool()).unwrap();
    registry.register("pickup", main_pool()).unwrap();
    registry.register("pickup-confirm", confirm_pool()).unwrap();
    let gacha = DrawOrchestrator::new(registry, GachaSettings::default()).unwrap();
    router(Arc::new(AppState::new(gacha)))
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Vec<u8>) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, bytes.to_vec())
}

#[tokio::test]
async fn test_health() {
    let app = app();
    let (status, body) = send(&app, Method::GET, "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    let body: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_list_pools() {
    let app = app();
    let (status, body) = send(&app, Method::GET, "/pools", None).await;
    assert_eq!(status, StatusCode::OK);
    let pools: PoolsResponse = serde_json::from_slice(&body).unwrap();
    assert_eq!(pools.pools, vec!["confirm", "normal", "pickup", "pickup-confirm"]);
}

#[tokio::test]
async fn test_pool_items() {
    let app = app();
    let (status, body) = send(&app, Method::GET, "/pools/confirm/items", None).await;
    assert_eq!(status, StatusCode::OK);
    let items: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(items.as_array().map(Vec::len), Some(4));
    assert_eq!(items[0]["rarity"], "SSR");

    let (status, body) = send(&app, Method::GET, "/pools/normal/items/101", None).await;
    assert_eq!(status, StatusCode::OK);
    let item: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(item["name"], "Starfall Blade");

    let (status, _) = send(&app, Method::GET, "/pools/normal/items/999", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&app, Method::GET, "/pools/limited/items", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_pull() {
    let app = app();
    let (status, body) = send(&app, Method::POST, "/pull", None).await;
    assert_eq!(status, StatusCode::OK);
    let pull: PullResponse = serde_json::from_slice(&body).unwrap();
    assert_eq!(pull.kind, "normal");
    assert_eq!(pull.total_pulls, 10);
    assert_eq!(pull.items.len(), 10);
    assert_eq!(pull.items.last().map(|e| e.rarity.as_str()), Some("SSR"));
    assert!(pull.items.iter().all(|e| !e.is_pickup_hit));
    assert!(!pull.draw_id.is_empty());
    assert!(chrono::DateTime::parse_from_rfc3339(&pull.timestamp).is_ok());
}

#[tokio::test]
async fn test_pull_pickup() {
    let app = app();
    let pickup = [101u32, 102, 103];
    let (status, body) = send(
        &app,
        Method::POST,
        "/pull/pickup",
        Some(json!({ "pickup_item_ids": pickup })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let pull: PullResponse = serde_json::from_slice(&body).unwrap();
    assert_eq!(pull.kind, "pickup");
    assert_eq!(pull.items.len(), 10);
    assert_eq!(pull.items.last().map(|e| e.rarity.as_str()), Some("SSR"));
    for entry in &pull.items {
        assert_eq!(entry.is_pickup_hit, pickup.contains(&entry.id));
    }
}

#[tokio::test]
async fn test_pull_pickup_validation() {
    let app = app();
    let cases = [
        json!({ "pickup_item_ids": [101, 102] }),
        json!({ "pickup_item_ids": [101, 102, 999] }),
        json!({ "pickup_item_ids": [101, 102, 3] }),
        json!({ "pickup_item_ids": [101, 101, 102] }),
    ];
    for body in cases {
        let (status, message) = send(&app, Method::POST, "/pull/pickup", Some(body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(!message.is_empty());
    }

    // Rejected draws are not counted
    let (_, body) = send(&app, Method::GET, "/stats", None).await;
    let stats: StatsResponse = serde_json::from_slice(&body).unwrap();
    assert_eq!(stats.total_draws, 0);
}

#[tokio::test]
async fn test_pull_box() {
    let app = app();
    let (status, body) = send(
        &app,
        Method::POST,
        "/pull/box",
        Some(json!({ "pool": "normal", "count": 5, "exclude_ids": [1, 2] })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let pull: PullResponse = serde_json::from_slice(&body).unwrap();
    assert_eq!(pull.kind, "box");
    let mut ids: Vec<u32> = pull.items.iter().map(|e| e.id).collect();
    ids.sort_unstable();
    assert_eq!(ids, vec![3, 101, 102, 103, 104]);

    let (status, _) = send(
        &app,
        Method::POST,
        "/pull/box",
        Some(json!({ "pool": "normal", "count": 6, "exclude_ids": [1, 2] })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &app,
        Method::POST,
        "/pull/box",
        Some(json!({ "pool": "limited", "count": 1 })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_rates() {
    let app = app();
    let (status, body) = send(&app, Method::GET, "/pools/normal/rates", None).await;
    assert_eq!(status, StatusCode::OK);
    let rates: RatesResponse = serde_json::from_slice(&body).unwrap();
    assert_eq!(rates.total_weight, 1000);
    assert_eq!(rates.rarities[0].rarity, "SSR");
    assert_eq!(rates.rarities[0].percent, "4.00%");

    let (status, body) = send(
        &app,
        Method::POST,
        "/rates/pickup",
        Some(json!({ "pickup_item_ids": [101, 102, 103] })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let rates: RatesResponse = serde_json::from_slice(&body).unwrap();
    assert_eq!(rates.total_weight, 1300);
    assert!(rates.items[..3].iter().all(|r| r.is_pickup && r.adjusted_weight == 110));
}

#[tokio::test]
async fn test_stats_roundtrip() {
    let app = app();
    send(&app, Method::POST, "/pull", None).await;
    send(
        &app,
        Method::POST,
        "/pull/pickup",
        Some(json!({ "pickup_item_ids": [101, 102, 103] })),
    )
    .await;

    let (status, body) = send(&app, Method::GET, "/stats", None).await;
    assert_eq!(status, StatusCode::OK);
    let stats: StatsResponse = serde_json::from_slice(&body).unwrap();
    assert_eq!(stats.total_draws, 2);
    assert_eq!(stats.total_pulls, 20);
    assert_eq!(stats.normal_draws, 1);
    assert_eq!(stats.pickup_draws, 1);
    assert!(stats.by_rarity.get("SSR").copied().unwrap_or(0) >= 2);

    let (status, _) = send(&app, Method::DELETE, "/stats", None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (_, body) = send(&app, Method::GET, "/stats", None).await;
    let stats: StatsResponse = serde_json::from_slice(&body).unwrap();
    assert_eq!(stats.total_draws, 0);
    assert!(stats.by_rarity.is_empty());
}

#[tokio::test]
async fn test_openapi_document() {
    let app = app();
    let (status, body) = send(&app, Method::GET, "/openapi.json", None).await;
    assert_eq!(status, StatusCode::OK);
    let doc: Value = serde_json::from_slice(&body).unwrap();
    assert!(doc["paths"]["/pull/pickup"].is_object());
    assert!(doc["paths"]["/pools/{pool}/rates"].is_object());
}
