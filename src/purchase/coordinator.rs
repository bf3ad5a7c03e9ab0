//! Payment session state machine.
//!
//! `pending -> processing -> {completed | failed | cancelled}`. Every move is a
//! conditional update on the expected prior status, so a replayed or late
//! callback finds the payment already settled and only reports it.

use serde::Deserialize;
use serde_json::Value;
use sqlx::{Pool, Sqlite};
use std::sync::Arc;

use crate::{
    checkout::{CheckoutProvider, CheckoutSession, SessionRequest, Verdict},
    db::{
        models::{Payment, PaymentMethod, PaymentStatus, Profile, Router},
        queries::{self, NewPayment},
    },
    error::{AppError, Result},
    purchase::{
        catalog,
        customers::resolve_customer,
        receipt::{Receipt, load_receipt},
        vouchers::claim_voucher,
    },
    validation::{ContactForm, validate_contact},
};

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseRequest {
    pub router_id: String,
    pub profile_id: String,
    #[serde(flatten)]
    pub contact: ContactForm,
}

/// A sale recorded by the router owner for cash or off-platform payments.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManualSaleRequest {
    pub profile_id: String,
    pub method: PaymentMethod,
    pub reference: Option<String>,
    #[serde(flatten)]
    pub contact: ContactForm,
}

#[derive(Debug, Clone)]
pub enum CheckoutOutcome {
    Fulfilled { payment: Payment, receipt: Receipt },
    /// Money taken but the profile had no code left.
    Unfulfilled { payment: Payment },
    Failed { payment: Payment },
    Cancelled { payment: Payment },
}

impl CheckoutOutcome {
    pub fn payment(&self) -> &Payment {
        match self {
            CheckoutOutcome::Fulfilled { payment, .. }
            | CheckoutOutcome::Unfulfilled { payment }
            | CheckoutOutcome::Failed { payment }
            | CheckoutOutcome::Cancelled { payment } => payment,
        }
    }
}

pub struct PaymentCoordinator {
    pool: Pool<Sqlite>,
    provider: Arc<dyn CheckoutProvider>,
}

impl PaymentCoordinator {
    pub fn new(pool: Pool<Sqlite>, provider: Arc<dyn CheckoutProvider>) -> Self {
        Self { pool, provider }
    }

    /// Buyer submitted contact info for a profile: create the `pending` payment.
    pub async fn start_purchase(&self, req: &PurchaseRequest) -> Result<Payment> {
        let router = catalog::load_selling_router(&self.pool, &req.router_id).await?;
        let profile = catalog::load_buyable_profile(&self.pool, &router.id, &req.profile_id).await?;

        self.create_pending(&router, &profile, &req.contact, self.provider.method())
            .await
    }

    /// Hand the payment over to the checkout widget: `pending -> processing`.
    pub async fn begin_checkout(&self, payment_id: &str) -> Result<CheckoutSession> {
        let payment = self.fetch(payment_id).await?;
        if payment.status != PaymentStatus::Pending {
            return Err(AppError::InvalidTransition {
                from: payment.status,
                to: PaymentStatus::Processing,
            });
        }

        let router = queries::get_router(&self.pool, &payment.router_id)
            .await?
            .ok_or(AppError::NotFound("Router"))?;
        let profile = queries::get_profile(&self.pool, &payment.profile_id)
            .await?
            .ok_or(AppError::NotFound("Profile"))?;
        let client = queries::get_client(&self.pool, &payment.client_id)
            .await?
            .ok_or(AppError::NotFound("Customer"))?;

        // Build the session first so a misconfigured router leaves the payment pending
        let session = self
            .provider
            .open_session(&SessionRequest {
                router: &router,
                profile: &profile,
                client: &client,
                payment: &payment,
            })
            .await?;

        if !self
            .advance(&payment, PaymentStatus::Processing, None, None)
            .await?
        {
            let current = self.fetch(payment_id).await?;
            return Err(AppError::InvalidTransition {
                from: current.status,
                to: PaymentStatus::Processing,
            });
        }

        Ok(session)
    }

    /// Widget completion callback.
    pub async fn on_callback(&self, payment_id: &str, payload: &Value) -> Result<CheckoutOutcome> {
        match self.provider.interpret_callback(payload) {
            Verdict::Approved { transaction_id } => {
                self.settle(payment_id, PaymentStatus::Completed, Some(&transaction_id), None)
                    .await
            }
            Verdict::Declined { reason } => {
                self.settle(payment_id, PaymentStatus::Failed, None, Some(&reason))
                    .await
            }
            Verdict::Dismissed => {
                self.settle(
                    payment_id,
                    PaymentStatus::Cancelled,
                    None,
                    Some("Checkout dismissed by buyer"),
                )
                .await
            }
        }
    }

    /// Widget error callback.
    pub async fn on_error(&self, payment_id: &str, payload: &Value) -> Result<CheckoutOutcome> {
        let reason = self.provider.describe_error(payload);
        self.settle(payment_id, PaymentStatus::Failed, None, Some(&reason))
            .await
    }

    /// Widget close callback. Only cancels a payment nothing else has settled.
    pub async fn on_close(&self, payment_id: &str) -> Result<CheckoutOutcome> {
        self.settle(
            payment_id,
            PaymentStatus::Cancelled,
            None,
            Some("Checkout closed before completion"),
        )
        .await
    }

    /// Owner-recorded sale; goes through the same states as an online one.
    pub async fn record_manual_sale(
        &self,
        router_id: &str,
        req: &ManualSaleRequest,
    ) -> Result<CheckoutOutcome> {
        if req.method == PaymentMethod::Fedapay {
            return Err(AppError::Validation(
                "Online payments cannot be recorded manually".to_string(),
            ));
        }

        let router = queries::get_router(&self.pool, router_id)
            .await?
            .ok_or(AppError::NotFound("Router"))?;
        let profile = queries::get_profile(&self.pool, &req.profile_id)
            .await?
            .filter(|p| p.router_id == router.id && p.enabled)
            .ok_or(AppError::NotFound("Profile"))?;

        let payment = self
            .create_pending(&router, &profile, &req.contact, req.method)
            .await?;
        if !self
            .advance(&payment, PaymentStatus::Processing, None, None)
            .await?
        {
            let current = self.fetch(&payment.id).await?;
            return Err(AppError::InvalidTransition {
                from: current.status,
                to: PaymentStatus::Processing,
            });
        }

        let reference = req
            .reference
            .as_deref()
            .map(str::trim)
            .filter(|r| !r.is_empty());
        self.settle(&payment.id, PaymentStatus::Completed, reference, None)
            .await
    }

    async fn create_pending(
        &self,
        router: &Router,
        profile: &Profile,
        form: &ContactForm,
        method: PaymentMethod,
    ) -> Result<Payment> {
        let settings = catalog::load_settings(&self.pool, &router.id).await?;
        let contact = validate_contact(&settings.advanced, form)?;
        let client_id = resolve_customer(&self.pool, &router.id, &contact).await?;

        let payment_id = queries::insert_payment(
            &self.pool,
            &NewPayment {
                router_id: &router.id,
                client_id: &client_id,
                profile_id: &profile.id,
                amount: profile.price,
                profile_name: &profile.name,
                duration: &profile.duration,
                method,
            },
        )
        .await?;

        tracing::info!(
            payment_id = %payment_id,
            router_id = %router.id,
            profile_id = %profile.id,
            amount = profile.price,
            %method,
            "payment created"
        );

        self.fetch(&payment_id).await
    }

    async fn fetch(&self, payment_id: &str) -> Result<Payment> {
        queries::get_payment(&self.pool, payment_id)
            .await?
            .ok_or(AppError::NotFound("Payment"))
    }

    /// Conditional status move. `Ok(false)` means another writer moved it first.
    async fn advance(
        &self,
        payment: &Payment,
        to: PaymentStatus,
        transaction_id: Option<&str>,
        reason: Option<&str>,
    ) -> Result<bool> {
        if !payment.status.can_transition_to(to) {
            return Err(AppError::InvalidTransition {
                from: payment.status,
                to,
            });
        }

        let moved = queries::transition_payment(
            &self.pool,
            &payment.id,
            payment.status,
            to,
            transaction_id,
            reason,
        )
        .await?;

        if moved {
            tracing::info!(payment_id = %payment.id, from = %payment.status, %to, "payment transition");
        }
        Ok(moved)
    }

    /// Drive a `processing` payment to a terminal state, or report the
    /// terminal state it already reached.
    async fn settle(
        &self,
        payment_id: &str,
        to: PaymentStatus,
        transaction_id: Option<&str>,
        reason: Option<&str>,
    ) -> Result<CheckoutOutcome> {
        let payment = self.fetch(payment_id).await?;
        if payment.status.is_terminal() {
            tracing::debug!(payment_id, status = %payment.status, "callback for settled payment");
            return self.outcome_of(payment).await;
        }

        let moved = if to == PaymentStatus::Completed {
            self.complete(&payment, transaction_id).await?
        } else {
            self.advance(&payment, to, transaction_id, reason).await?
        };

        if !moved {
            let current = self.fetch(payment_id).await?;
            if !current.status.is_terminal() {
                return Err(AppError::InvalidTransition {
                    from: current.status,
                    to,
                });
            }
            return self.outcome_of(current).await;
        }

        if let Some(reason) = reason {
            tracing::warn!(payment_id, %to, reason, "payment not completed");
        }

        let settled = self.fetch(payment_id).await?;
        self.outcome_of(settled).await
    }

    /// Move into `completed`, bump the buyer's counters and hand over a code,
    /// all in one transaction. A store error rolls back to `processing` so a
    /// replayed callback can try again.
    async fn complete(&self, payment: &Payment, transaction_id: Option<&str>) -> Result<bool> {
        let to = PaymentStatus::Completed;
        if !payment.status.can_transition_to(to) {
            return Err(AppError::InvalidTransition {
                from: payment.status,
                to,
            });
        }

        let mut tx = self.pool.begin().await?;
        if !queries::transition_payment(
            &mut *tx,
            &payment.id,
            payment.status,
            to,
            transaction_id,
            None,
        )
        .await?
        {
            return Ok(false);
        }

        queries::record_client_purchase(&mut *tx, &payment.client_id, payment.amount).await?;
        let code = claim_voucher(&mut *tx, &payment.router_id, &payment.profile_id, &payment.id).await?;
        if let Some(code) = &code {
            queries::attach_voucher(&mut *tx, &payment.id, code).await?;
        }
        tx.commit().await?;

        tracing::info!(payment_id = %payment.id, from = %payment.status, %to, "payment transition");
        match code {
            Some(code) => tracing::info!(payment_id = %payment.id, code_id = %code.id, "code delivered"),
            None => tracing::warn!(
                payment_id = %payment.id,
                profile_id = %payment.profile_id,
                "payment completed but no code available"
            ),
        }
        Ok(true)
    }

    async fn outcome_of(&self, payment: Payment) -> Result<CheckoutOutcome> {
        match payment.status {
            PaymentStatus::Completed if payment.voucher_id.is_some() => {
                let receipt = load_receipt(&self.pool, &payment.id).await?;
                Ok(CheckoutOutcome::Fulfilled { payment, receipt })
            }
            PaymentStatus::Completed => Ok(CheckoutOutcome::Unfulfilled { payment }),
            PaymentStatus::Failed => Ok(CheckoutOutcome::Failed { payment }),
            PaymentStatus::Cancelled => Ok(CheckoutOutcome::Cancelled { payment }),
            PaymentStatus::Pending | PaymentStatus::Processing => {
                Err(AppError::InvalidTransition {
                    from: payment.status,
                    to: PaymentStatus::Completed,
                })
            }
        }
    }
}
