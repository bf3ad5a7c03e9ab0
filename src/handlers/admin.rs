use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::{
    app_state::AppState,
    db::{
        models::{
            Client, CreateProfileRequest, CreateRouterRequest, ImportCodesRequest,
            ImportCodesResponse, Payment, PaymentStatus, Profile, Router, UpdateProfileRequest,
            UpdateRouterRequest, VoucherStatus, WifiCode,
        },
        queries,
    },
    error::{AppError, Result},
    handlers::buy::{ReceiptResponse, outcome_response},
    purchase::{ManualSaleRequest, catalog},
    settings::{RouterSettings, UpdateSettingsRequest},
    validation::admin as checks,
};

const DEFAULT_PAYMENT_PAGE: i64 = 50;
const MAX_PAYMENT_PAGE: i64 = 500;

async fn existing_router(state: &AppState, router_id: &str) -> Result<Router> {
    queries::get_router(&state.pool, router_id)
        .await?
        .ok_or(AppError::NotFound("Router"))
}

/// POST /api/routers
pub async fn create_router(
    State(state): State<AppState>,
    Json(req): Json<CreateRouterRequest>,
) -> Result<(StatusCode, Json<Router>)> {
    checks::check_router(&req)?;
    let id = queries::insert_router(&state.pool, &req).await?;
    tracing::info!(router_id = %id, name = %req.name, "router created");

    Ok((StatusCode::CREATED, Json(existing_router(&state, &id).await?)))
}

/// GET /api/routers/{id}
pub async fn get_router(
    Path(router_id): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<Router>> {
    Ok(Json(existing_router(&state, &router_id).await?))
}

/// PUT /api/routers/{id}
pub async fn update_router(
    Path(router_id): Path<String>,
    State(state): State<AppState>,
    Json(req): Json<UpdateRouterRequest>,
) -> Result<Json<Router>> {
    if req.name.as_deref().is_some_and(|n| n.trim().is_empty()) {
        return Err(AppError::Validation("Router name cannot be empty".to_string()));
    }
    if !queries::update_router(&state.pool, &router_id, &req).await? {
        return Err(AppError::NotFound("Router"));
    }
    Ok(Json(existing_router(&state, &router_id).await?))
}

/// GET /api/routers/{id}/settings
pub async fn get_settings(
    Path(router_id): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<RouterSettings>> {
    existing_router(&state, &router_id).await?;
    Ok(Json(catalog::load_settings(&state.pool, &router_id).await?))
}

/// PUT /api/routers/{id}/settings
pub async fn update_settings(
    Path(router_id): Path<String>,
    State(state): State<AppState>,
    Json(req): Json<UpdateSettingsRequest>,
) -> Result<Json<RouterSettings>> {
    existing_router(&state, &router_id).await?;

    let appearance = req
        .appearance
        .as_ref()
        .map(serde_json::to_string)
        .transpose()
        .map_err(|e| AppError::Corrupt(e.to_string()))?;
    let advanced = req
        .advanced
        .as_ref()
        .map(serde_json::to_string)
        .transpose()
        .map_err(|e| AppError::Corrupt(e.to_string()))?;

    queries::upsert_settings_documents(
        &state.pool,
        &router_id,
        appearance.as_deref(),
        advanced.as_deref(),
    )
    .await?;

    Ok(Json(catalog::load_settings(&state.pool, &router_id).await?))
}

/// GET /api/routers/{id}/profiles
/// All profiles, including disabled and hidden ones
pub async fn list_profiles(
    Path(router_id): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<Vec<Profile>>> {
    existing_router(&state, &router_id).await?;
    Ok(Json(queries::list_profiles(&state.pool, &router_id).await?))
}

/// POST /api/routers/{id}/profiles
pub async fn create_profile(
    Path(router_id): Path<String>,
    State(state): State<AppState>,
    Json(req): Json<CreateProfileRequest>,
) -> Result<(StatusCode, Json<Profile>)> {
    existing_router(&state, &router_id).await?;
    checks::check_new_profile(&req)?;

    let id = queries::insert_profile(&state.pool, &router_id, &req).await?;
    let profile = queries::get_profile(&state.pool, &id)
        .await?
        .ok_or(AppError::NotFound("Profile"))?;

    Ok((StatusCode::CREATED, Json(profile)))
}

/// PUT /api/profiles/{id}
pub async fn update_profile(
    Path(profile_id): Path<String>,
    State(state): State<AppState>,
    Json(req): Json<UpdateProfileRequest>,
) -> Result<Json<Profile>> {
    checks::check_profile_update(&req)?;
    if !queries::update_profile(&state.pool, &profile_id, &req).await? {
        return Err(AppError::NotFound("Profile"));
    }

    let profile = queries::get_profile(&state.pool, &profile_id)
        .await?
        .ok_or(AppError::NotFound("Profile"))?;
    Ok(Json(profile))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CodeFilter {
    profile_id: Option<String>,
    status: Option<VoucherStatus>,
}

/// GET /api/routers/{id}/wifi-codes?profileId=&status=
pub async fn list_codes(
    Path(router_id): Path<String>,
    Query(filter): Query<CodeFilter>,
    State(state): State<AppState>,
) -> Result<Json<Vec<WifiCode>>> {
    existing_router(&state, &router_id).await?;
    let codes = queries::list_wifi_codes(
        &state.pool,
        &router_id,
        filter.profile_id.as_deref(),
        filter.status,
    )
    .await?;
    Ok(Json(codes))
}

/// POST /api/routers/{id}/wifi-codes
/// Bulk import; usernames already known on the router are skipped
pub async fn import_codes(
    Path(router_id): Path<String>,
    State(state): State<AppState>,
    Json(req): Json<ImportCodesRequest>,
) -> Result<(StatusCode, Json<ImportCodesResponse>)> {
    existing_router(&state, &router_id).await?;
    checks::check_import(&req)?;
    queries::get_profile(&state.pool, &req.profile_id)
        .await?
        .filter(|p| p.router_id == router_id)
        .ok_or(AppError::NotFound("Profile"))?;

    let mut imported = 0;
    for code in &req.codes {
        if queries::insert_wifi_code(
            &state.pool,
            &router_id,
            &req.profile_id,
            code.username.trim(),
            code.password.trim(),
        )
        .await?
        {
            imported += 1;
        }
    }
    let skipped = req.codes.len() as u64 - imported;
    tracing::info!(router_id = %router_id, profile_id = %req.profile_id, imported, skipped, "codes imported");

    Ok((StatusCode::CREATED, Json(ImportCodesResponse { imported, skipped })))
}

/// DELETE /api/wifi-codes/{id}
/// Only codes still available can be removed
pub async fn delete_code(
    Path(code_id): Path<String>,
    State(state): State<AppState>,
) -> Result<StatusCode> {
    let code = queries::get_wifi_code(&state.pool, &code_id)
        .await?
        .ok_or(AppError::NotFound("Code"))?;

    if code.status != VoucherStatus::Available
        || !queries::delete_available_wifi_code(&state.pool, &code_id).await?
    {
        return Err(AppError::Validation(
            "Only available codes can be deleted".to_string(),
        ));
    }

    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/routers/{id}/clients
pub async fn list_clients(
    Path(router_id): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<Vec<Client>>> {
    existing_router(&state, &router_id).await?;
    Ok(Json(queries::list_clients(&state.pool, &router_id).await?))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentFilter {
    status: Option<PaymentStatus>,
    client_id: Option<String>,
    limit: Option<i64>,
}

/// GET /api/routers/{id}/payments?status=&clientId=&limit=
pub async fn list_payments(
    Path(router_id): Path<String>,
    Query(filter): Query<PaymentFilter>,
    State(state): State<AppState>,
) -> Result<Json<Vec<Payment>>> {
    existing_router(&state, &router_id).await?;
    let limit = filter
        .limit
        .unwrap_or(DEFAULT_PAYMENT_PAGE)
        .clamp(1, MAX_PAYMENT_PAGE);

    let payments = queries::list_payments(
        &state.pool,
        &router_id,
        filter.status,
        filter.client_id.as_deref(),
        limit,
    )
    .await?;
    Ok(Json(payments))
}

/// POST /api/routers/{id}/sales
pub async fn record_sale(
    Path(router_id): Path<String>,
    State(state): State<AppState>,
    Json(req): Json<ManualSaleRequest>,
) -> Result<Json<ReceiptResponse>> {
    let outcome = state.coordinator().record_manual_sale(&router_id, &req).await?;
    outcome_response(outcome)
}

#[derive(Debug, Default, Serialize)]
pub struct CodeCounts {
    pub available: i64,
    pub used: i64,
}

#[derive(Debug, Serialize)]
pub struct RouterStats {
    pub codes: CodeCounts,
    pub payments: BTreeMap<String, i64>,
    pub revenue: i64,
    pub clients: i64,
}

/// GET /api/routers/{id}/stats
pub async fn router_stats(
    Path(router_id): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<RouterStats>> {
    existing_router(&state, &router_id).await?;

    let mut codes = CodeCounts::default();
    for (status, count) in queries::count_wifi_codes_by_status(&state.pool, &router_id).await? {
        match VoucherStatus::try_from(status) {
            Ok(VoucherStatus::Available) => codes.available += count,
            Ok(VoucherStatus::Used) => codes.used += count,
            Err(e) => tracing::warn!(router_id = %router_id, error = %e, "skipping unknown code status"),
        }
    }

    let payments = queries::count_payments_by_status(&state.pool, &router_id)
        .await?
        .into_iter()
        .collect();

    Ok(Json(RouterStats {
        codes,
        payments,
        revenue: queries::completed_revenue(&state.pool, &router_id).await?,
        clients: queries::count_clients(&state.pool, &router_id).await?,
    }))
}
