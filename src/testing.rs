//! Fixtures for unit tests that need a store.

use sqlx::{Pool, Sqlite};

use crate::db::{
    init_pool,
    models::{CreateProfileRequest, CreateRouterRequest},
    queries,
};

pub async fn pool() -> Pool<Sqlite> {
    init_pool("sqlite::memory:").await.unwrap()
}

pub async fn seed_router(pool: &Pool<Sqlite>, public_key: Option<&str>) -> String {
    let req = CreateRouterRequest {
        name: "Test Router".to_string(),
        buy_page_title: None,
        buy_page_description: None,
        connection_url: Some("http://10.0.0.1/login".to_string()),
        enabled: Some(true),
        public_key: public_key.map(str::to_string),
        owner_id: Some("owner-1".to_string()),
    };
    queries::insert_router(pool, &req).await.unwrap()
}

pub async fn seed_profile(pool: &Pool<Sqlite>, router_id: &str, price: i64, duration: &str) -> String {
    let req = CreateProfileRequest {
        name: format!("Pass {duration}"),
        description: None,
        price,
        duration: duration.to_string(),
        enabled: None,
        visible_on_buy_page: None,
    };
    queries::insert_profile(pool, router_id, &req).await.unwrap()
}

pub async fn seed_profile_with(
    pool: &Pool<Sqlite>,
    router_id: &str,
    price: i64,
    enabled: bool,
    visible: bool,
) -> String {
    let req = CreateProfileRequest {
        name: format!("Pass {price}"),
        description: None,
        price,
        duration: "1 jour".to_string(),
        enabled: Some(enabled),
        visible_on_buy_page: Some(visible),
    };
    queries::insert_profile(pool, router_id, &req).await.unwrap()
}

pub async fn seed_code(pool: &Pool<Sqlite>, router_id: &str, profile_id: &str, username: &str) {
    let inserted = queries::insert_wifi_code(pool, router_id, profile_id, username, "secret")
        .await
        .unwrap();
    assert!(inserted);
}
