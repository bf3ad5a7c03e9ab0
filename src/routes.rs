use axum::{
    Router,
    routing::{delete, get, post, put},
};

use crate::{
    app_state::AppState,
    handlers::{admin, buy},
};

pub fn create_app(state: AppState) -> Router {
    Router::new()
        // Buyer pages and checkout
        .route("/buy", get(buy::get_catalog))
        .route("/buy/profile", get(buy::get_offer))
        .route("/api/purchases", post(buy::create_purchase))
        .route("/api/payments/{id}/checkout", post(buy::begin_checkout))
        .route("/api/payments/{id}/callback", post(buy::checkout_callback))
        .route("/api/payments/{id}/error", post(buy::checkout_error))
        .route("/api/payments/{id}/close", post(buy::checkout_close))
        .route("/api/payments/{id}/receipt", get(buy::get_receipt))
        .route("/api/payments/{id}/receipt/print", get(buy::print_receipt))
        .route("/api/payments/{id}/receipt/sms", post(buy::sms_receipt))
        // Administration
        .route("/api/routers", post(admin::create_router))
        .route(
            "/api/routers/{id}",
            get(admin::get_router).put(admin::update_router),
        )
        .route(
            "/api/routers/{id}/settings",
            get(admin::get_settings).put(admin::update_settings),
        )
        .route(
            "/api/routers/{id}/profiles",
            get(admin::list_profiles).post(admin::create_profile),
        )
        .route("/api/profiles/{id}", put(admin::update_profile))
        .route(
            "/api/routers/{id}/wifi-codes",
            get(admin::list_codes).post(admin::import_codes),
        )
        .route("/api/wifi-codes/{id}", delete(admin::delete_code))
        .route("/api/routers/{id}/clients", get(admin::list_clients))
        .route("/api/routers/{id}/payments", get(admin::list_payments))
        .route("/api/routers/{id}/sales", post(admin::record_sale))
        .route("/api/routers/{id}/stats", get(admin::router_stats))
        .with_state(state)
}
