use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    db::models::{Client, Payment, PaymentMethod, Profile, Router},
    error::Result,
};

pub mod fedapay;

pub use fedapay::FedaPayWidget;

/// Everything the browser needs to open the hosted checkout widget.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutSession {
    pub provider: String,
    pub payment_id: String,
    pub public_key: String,
    pub environment: String,
    pub transaction: SessionTransaction,
    pub currency: SessionCurrency,
    pub customer: SessionCustomer,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionTransaction {
    pub amount: i64,
    pub description: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionCurrency {
    pub iso: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionCustomer {
    pub firstname: Option<String>,
    pub lastname: Option<String>,
    pub email: Option<String>,
    pub phone_number: SessionPhone,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionPhone {
    pub number: String,
    pub country: String,
}

/// What a provider's completion callback means for the payment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Approved { transaction_id: String },
    Declined { reason: String },
    Dismissed,
}

pub struct SessionRequest<'a> {
    pub router: &'a Router,
    pub profile: &'a Profile,
    pub client: &'a Client,
    pub payment: &'a Payment,
}

#[async_trait]
pub trait CheckoutProvider: Send + Sync {
    /// Method recorded on payments taken through this provider.
    fn method(&self) -> PaymentMethod;

    /// Build the widget init payload for a payment about to enter `processing`.
    async fn open_session(&self, request: &SessionRequest<'_>) -> Result<CheckoutSession>;

    /// Interpret the payload handed to the widget's completion callback.
    fn interpret_callback(&self, payload: &Value) -> Verdict;

    /// Human readable reason for the widget's error callback.
    fn describe_error(&self, payload: &Value) -> String;
}
