use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;

use crate::{
    checkout::{
        CheckoutProvider, CheckoutSession, SessionCurrency, SessionCustomer, SessionPhone,
        SessionRequest, SessionTransaction, Verdict,
    },
    db::models::PaymentMethod,
    error::{AppError, Result},
};

/// Sentinel the widget puts in `reason` when the buyer closes the dialog.
pub const DIALOG_DISMISSED: &str = "DIALOG DISMISSED";
const APPROVED: &str = "approved";

/// FedaPay checkout.js widget contract.
pub struct FedaPayWidget {
    pub environment: String,
    pub currency: String,
    pub country: String,
}

#[derive(Debug, Default, Deserialize)]
struct CallbackPayload {
    reason: Option<String>,
    transaction: Option<TransactionPayload>,
    message: Option<String>,
    code: Option<Value>,
}

#[derive(Debug, Default, Deserialize)]
struct TransactionPayload {
    id: Option<Value>,
    status: Option<String>,
    last_error_code: Option<String>,
}

impl TransactionPayload {
    fn id(&self) -> Option<String> {
        self.id.as_ref().and_then(scalar_to_string)
    }
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn parse(payload: &Value) -> CallbackPayload {
    // Unknown shapes are treated as empty rather than rejected
    CallbackPayload::deserialize(payload).unwrap_or_default()
}

fn split_name(name: Option<&str>) -> (Option<String>, Option<String>) {
    let Some(name) = name.map(str::trim).filter(|n| !n.is_empty()) else {
        return (None, None);
    };
    match name.split_once(char::is_whitespace) {
        Some((first, rest)) => (Some(first.to_string()), Some(rest.trim().to_string())),
        None => (Some(name.to_string()), None),
    }
}

#[async_trait]
impl CheckoutProvider for FedaPayWidget {
    fn method(&self) -> PaymentMethod {
        PaymentMethod::Fedapay
    }

    async fn open_session(&self, request: &SessionRequest<'_>) -> Result<CheckoutSession> {
        let public_key = request
            .router
            .public_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .ok_or(AppError::ProviderNotConfigured)?;

        let (firstname, lastname) = split_name(request.client.name.as_deref());

        Ok(CheckoutSession {
            provider: "fedapay".to_string(),
            payment_id: request.payment.id.clone(),
            public_key: public_key.to_string(),
            environment: self.environment.clone(),
            transaction: SessionTransaction {
                amount: request.payment.amount,
                description: format!(
                    "{} - {} ({})",
                    request.router.name, request.profile.name, request.profile.duration
                ),
            },
            currency: SessionCurrency {
                iso: self.currency.clone(),
            },
            customer: SessionCustomer {
                firstname,
                lastname,
                email: request.client.email.clone(),
                phone_number: SessionPhone {
                    number: request.client.phone.clone(),
                    country: self.country.clone(),
                },
            },
        })
    }

    fn interpret_callback(&self, payload: &Value) -> Verdict {
        let payload = parse(payload);

        if payload.reason.as_deref() == Some(DIALOG_DISMISSED) {
            return Verdict::Dismissed;
        }

        let transaction = payload.transaction.unwrap_or_default();
        let status = transaction.status.as_deref().unwrap_or_default();
        match transaction.id() {
            Some(transaction_id) if status == APPROVED => Verdict::Approved { transaction_id },
            _ => {
                let mut details = Vec::new();
                if let Some(status) = &transaction.status {
                    details.push(format!("status: {status}"));
                }
                if let Some(code) = &transaction.last_error_code {
                    details.push(format!("code: {code}"));
                }
                if let Some(reason) = &payload.reason {
                    details.push(format!("reason: {reason}"));
                }
                let reason = if details.is_empty() {
                    "Transaction not approved".to_string()
                } else {
                    format!("Transaction not approved ({})", details.join(", "))
                };
                Verdict::Declined { reason }
            }
        }
    }

    fn describe_error(&self, payload: &Value) -> String {
        let payload = parse(payload);

        let mut details = Vec::new();
        if let Some(code) = payload.code.as_ref().and_then(scalar_to_string) {
            details.push(format!("code: {code}"));
        }
        if let Some(transaction) = &payload.transaction {
            if let Some(status) = &transaction.status {
                details.push(format!("status: {status}"));
            }
            if let Some(code) = &transaction.last_error_code {
                details.push(format!("code: {code}"));
            }
        }

        let message = payload
            .message
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| "Payment widget reported an error".to_string());
        if details.is_empty() {
            message
        } else {
            format!("{message} ({})", details.join(", "))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn widget() -> FedaPayWidget {
        FedaPayWidget {
            environment: "sandbox".to_string(),
            currency: "XOF".to_string(),
            country: "bj".to_string(),
        }
    }

    #[test]
    fn test_approved_needs_id_and_status() {
        let w = widget();
        assert_eq!(
            w.interpret_callback(&json!({"transaction": {"id": "tx1", "status": "approved"}})),
            Verdict::Approved {
                transaction_id: "tx1".to_string()
            }
        );
        assert_eq!(
            w.interpret_callback(&json!({"transaction": {"id": 4521, "status": "approved"}})),
            Verdict::Approved {
                transaction_id: "4521".to_string()
            }
        );
        assert!(matches!(
            w.interpret_callback(&json!({"transaction": {"status": "approved"}})),
            Verdict::Declined { .. }
        ));
    }

    #[test]
    fn test_dismissal_sentinel() {
        assert_eq!(
            widget().interpret_callback(&json!({"reason": "DIALOG DISMISSED"})),
            Verdict::Dismissed
        );
        // Must match exactly
        assert!(matches!(
            widget().interpret_callback(&json!({"reason": "dialog dismissed"})),
            Verdict::Declined { .. }
        ));
    }

    #[test]
    fn test_declined_reason_uses_provider_fields() {
        let verdict = widget().interpret_callback(&json!({
            "transaction": {"id": 9, "status": "declined", "last_error_code": "insufficient_funds"}
        }));
        assert_eq!(
            verdict,
            Verdict::Declined {
                reason: "Transaction not approved (status: declined, code: insufficient_funds)"
                    .to_string()
            }
        );
        assert_eq!(
            widget().interpret_callback(&json!("garbage")),
            Verdict::Declined {
                reason: "Transaction not approved".to_string()
            }
        );
    }

    #[test]
    fn test_describe_error() {
        let w = widget();
        assert_eq!(
            w.describe_error(&json!({"message": "Network down", "code": 503})),
            "Network down (code: 503)"
        );
        assert_eq!(w.describe_error(&json!(null)), "Payment widget reported an error");
    }

    #[test]
    fn test_split_name() {
        assert_eq!(
            split_name(Some("Aïcha Bio Tchané")),
            (Some("Aïcha".to_string()), Some("Bio Tchané".to_string()))
        );
        assert_eq!(split_name(Some("Aïcha")), (Some("Aïcha".to_string()), None));
        assert_eq!(split_name(Some("  ")), (None, None));
    }
}
