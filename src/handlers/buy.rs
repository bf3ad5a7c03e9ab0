use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::Html,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    app_state::AppState,
    checkout::CheckoutSession,
    db::{models::Payment, queries},
    error::{AppError, Result},
    purchase::{
        CheckoutOutcome, PurchaseRequest,
        catalog::{self, Catalog, Offer},
        receipt::{Receipt, SmsNotice, load_receipt, simulate_sms},
    },
    validation::normalize_phone,
};

#[derive(Debug, Deserialize)]
pub struct BuyQuery {
    id: Option<String>,
    #[serde(rename = "routerId")]
    router_id: Option<String>,
}

impl BuyQuery {
    fn router_id(&self) -> Result<&str> {
        self.router_id
            .as_deref()
            .or(self.id.as_deref())
            .filter(|id| !id.is_empty())
            .ok_or_else(|| AppError::Validation("Missing router id".to_string()))
    }
}

#[derive(Debug, Deserialize)]
pub struct OfferQuery {
    #[serde(rename = "routerId")]
    router_id: String,
    #[serde(rename = "profileId")]
    profile_id: String,
}

#[derive(Debug, Serialize)]
pub struct PaymentResponse {
    pub status: String,
    pub payment: Payment,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceiptResponse {
    pub status: String,
    pub payment: Payment,
    pub receipt: Receipt,
    pub copy_text: String,
}

#[derive(Debug, Deserialize)]
pub struct SmsRequest {
    phone: Option<String>,
}

/// GET /buy?id={routerId}
/// Router store front with the profiles on sale
pub async fn get_catalog(
    Query(params): Query<BuyQuery>,
    State(state): State<AppState>,
) -> Result<Json<Catalog>> {
    let catalog = catalog::load_catalog(&state.pool, params.router_id()?).await?;
    Ok(Json(catalog))
}

/// GET /buy/profile?routerId={id}&profileId={id}
pub async fn get_offer(
    Query(params): Query<OfferQuery>,
    State(state): State<AppState>,
) -> Result<Json<Offer>> {
    let offer = catalog::load_offer(&state.pool, &params.router_id, &params.profile_id).await?;
    Ok(Json(offer))
}

/// POST /api/purchases
/// Creates the pending payment for a buyer's chosen profile
pub async fn create_purchase(
    State(state): State<AppState>,
    Json(req): Json<PurchaseRequest>,
) -> Result<(StatusCode, Json<PaymentResponse>)> {
    let payment = state.coordinator().start_purchase(&req).await?;
    Ok((
        StatusCode::CREATED,
        Json(PaymentResponse {
            status: "OK".to_string(),
            payment,
        }),
    ))
}

/// POST /api/payments/{id}/checkout
/// Moves the payment to processing and returns the widget init payload
pub async fn begin_checkout(
    Path(payment_id): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<CheckoutSession>> {
    let session = state.coordinator().begin_checkout(&payment_id).await?;
    Ok(Json(session))
}

/// POST /api/payments/{id}/callback
/// Relay of the widget's completion callback
pub async fn checkout_callback(
    Path(payment_id): Path<String>,
    State(state): State<AppState>,
    Json(payload): Json<Value>,
) -> Result<Json<ReceiptResponse>> {
    let outcome = state.coordinator().on_callback(&payment_id, &payload).await?;
    outcome_response(outcome)
}

/// POST /api/payments/{id}/error
pub async fn checkout_error(
    Path(payment_id): Path<String>,
    State(state): State<AppState>,
    Json(payload): Json<Value>,
) -> Result<Json<ReceiptResponse>> {
    let outcome = state.coordinator().on_error(&payment_id, &payload).await?;
    outcome_response(outcome)
}

/// POST /api/payments/{id}/close
/// Always answers with the payment's state; closing after completion changes nothing
pub async fn checkout_close(
    Path(payment_id): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<PaymentResponse>> {
    let outcome = state.coordinator().on_close(&payment_id).await?;
    Ok(Json(PaymentResponse {
        status: "OK".to_string(),
        payment: outcome.payment().clone(),
    }))
}

/// GET /api/payments/{id}/receipt
pub async fn get_receipt(
    Path(payment_id): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<ReceiptResponse>> {
    let receipt = load_receipt(&state.pool, &payment_id).await?;
    let payment = queries::get_payment(&state.pool, &payment_id)
        .await?
        .ok_or(AppError::NotFound("Payment"))?;
    Ok(Json(receipt_response(payment, receipt)))
}

/// GET /api/payments/{id}/receipt/print
pub async fn print_receipt(
    Path(payment_id): Path<String>,
    State(state): State<AppState>,
) -> Result<Html<String>> {
    let receipt = load_receipt(&state.pool, &payment_id).await?;
    Ok(Html(receipt.print_html()))
}

/// POST /api/payments/{id}/receipt/sms
/// Defaults to the buyer's phone when none is given
pub async fn sms_receipt(
    Path(payment_id): Path<String>,
    State(state): State<AppState>,
    Json(req): Json<SmsRequest>,
) -> Result<Json<SmsNotice>> {
    let receipt = load_receipt(&state.pool, &payment_id).await?;

    let phone = match req.phone.as_deref().filter(|p| !p.trim().is_empty()) {
        Some(raw) => normalize_phone(raw)
            .ok_or_else(|| AppError::Validation("Please enter a valid phone number".to_string()))?,
        None => {
            let payment = queries::get_payment(&state.pool, &payment_id)
                .await?
                .ok_or(AppError::NotFound("Payment"))?;
            queries::get_client(&state.pool, &payment.client_id)
                .await?
                .ok_or(AppError::NotFound("Customer"))?
                .phone
        }
    };

    Ok(Json(simulate_sms(&receipt, &phone)))
}

/// Map a settled checkout to what the buyer sees.
pub fn outcome_response(outcome: CheckoutOutcome) -> Result<Json<ReceiptResponse>> {
    match outcome {
        CheckoutOutcome::Fulfilled { payment, receipt } => {
            Ok(Json(receipt_response(payment, receipt)))
        }
        CheckoutOutcome::Unfulfilled { payment } => Err(AppError::NoVoucherAvailable {
            payment_id: payment.id,
        }),
        CheckoutOutcome::Failed { payment } => Err(AppError::PaymentFailed(
            payment
                .failure_reason
                .unwrap_or_else(|| "Transaction not approved".to_string()),
        )),
        CheckoutOutcome::Cancelled { .. } => Err(AppError::PaymentCancelled),
    }
}

fn receipt_response(payment: Payment, receipt: Receipt) -> ReceiptResponse {
    ReceiptResponse {
        status: "OK".to_string(),
        copy_text: receipt.copy_text(),
        payment,
        receipt,
    }
}
