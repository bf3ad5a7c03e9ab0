use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Router {
    pub id: String,
    pub name: String,
    pub buy_page_title: Option<String>,
    pub buy_page_description: Option<String>,
    pub connection_url: Option<String>,
    pub enabled: bool,
    pub public_key: Option<String>,
    pub owner_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub id: String,
    pub router_id: String,
    pub name: String,
    pub description: Option<String>,
    /// Plain FCFA amount.
    pub price: i64,
    /// Free text such as "30 jours", see `purchase::duration`.
    pub duration: String,
    pub enabled: bool,
    pub visible_on_buy_page: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Profile {
    pub fn is_on_sale(&self) -> bool {
        self.enabled && self.visible_on_buy_page
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct WifiCode {
    pub id: String,
    pub router_id: String,
    pub profile_id: String,
    pub username: String,
    pub password: String,
    #[sqlx(try_from = "String")]
    pub status: VoucherStatus,
    pub payment_id: Option<String>,
    pub used_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Client {
    pub id: String,
    pub router_id: String,
    pub name: Option<String>,
    pub phone: String,
    pub email: Option<String>,
    pub purchased_codes: i64,
    pub total_spent: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Payment {
    pub id: String,
    pub router_id: String,
    pub client_id: String,
    pub profile_id: String,
    pub voucher_id: Option<String>,
    pub voucher_code: Option<String>,
    pub amount: i64,
    /// Profile name and duration as sold; later profile edits leave them alone.
    pub profile_name: String,
    pub duration: String,
    #[sqlx(try_from = "String")]
    pub method: PaymentMethod,
    #[sqlx(try_from = "String")]
    pub status: PaymentStatus,
    pub transaction_id: Option<String>,
    pub failure_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Voucher lifecycle. Older records may carry `sold`, which reads as `Used`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VoucherStatus {
    Available,
    #[serde(alias = "sold")]
    Used,
}

impl VoucherStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            VoucherStatus::Available => "available",
            VoucherStatus::Used => "used",
        }
    }
}

impl TryFrom<String> for VoucherStatus {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        match s.as_str() {
            "available" => Ok(VoucherStatus::Available),
            "used" | "sold" => Ok(VoucherStatus::Used),
            other => Err(format!("unknown voucher status '{other}'")),
        }
    }
}

impl fmt::Display for VoucherStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Cash,
    MobileMoney,
    BankTransfer,
    Fedapay,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "cash",
            PaymentMethod::MobileMoney => "mobile_money",
            PaymentMethod::BankTransfer => "bank_transfer",
            PaymentMethod::Fedapay => "fedapay",
        }
    }
}

impl TryFrom<String> for PaymentMethod {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        match s.as_str() {
            "cash" => Ok(PaymentMethod::Cash),
            "mobile_money" => Ok(PaymentMethod::MobileMoney),
            "bank_transfer" => Ok(PaymentMethod::BankTransfer),
            "fedapay" => Ok(PaymentMethod::Fedapay),
            other => Err(format!("unknown payment method '{other}'")),
        }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Payment lifecycle: `pending -> processing -> {completed | failed | cancelled}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    Processing,
    Completed,
    Failed,
    Cancelled,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Processing => "processing",
            PaymentStatus::Completed => "completed",
            PaymentStatus::Failed => "failed",
            PaymentStatus::Cancelled => "cancelled",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            PaymentStatus::Completed | PaymentStatus::Failed | PaymentStatus::Cancelled
        )
    }

    pub fn can_transition_to(&self, next: PaymentStatus) -> bool {
        matches!(
            (self, next),
            (PaymentStatus::Pending, PaymentStatus::Processing)
                | (PaymentStatus::Processing, PaymentStatus::Completed)
                | (PaymentStatus::Processing, PaymentStatus::Failed)
                | (PaymentStatus::Processing, PaymentStatus::Cancelled)
        )
    }
}

impl TryFrom<String> for PaymentStatus {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        match s.as_str() {
            "pending" => Ok(PaymentStatus::Pending),
            "processing" => Ok(PaymentStatus::Processing),
            "completed" => Ok(PaymentStatus::Completed),
            "failed" => Ok(PaymentStatus::Failed),
            "cancelled" => Ok(PaymentStatus::Cancelled),
            other => Err(format!("unknown payment status '{other}'")),
        }
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRouterRequest {
    pub name: String,
    pub buy_page_title: Option<String>,
    pub buy_page_description: Option<String>,
    pub connection_url: Option<String>,
    pub enabled: Option<bool>,
    pub public_key: Option<String>,
    pub owner_id: Option<String>,
}

/// Partial router update. Absent fields keep their stored value.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateRouterRequest {
    pub name: Option<String>,
    pub buy_page_title: Option<String>,
    pub buy_page_description: Option<String>,
    pub connection_url: Option<String>,
    pub enabled: Option<bool>,
    pub public_key: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateProfileRequest {
    pub name: String,
    pub description: Option<String>,
    pub price: i64,
    pub duration: String,
    pub enabled: Option<bool>,
    pub visible_on_buy_page: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<i64>,
    pub duration: Option<String>,
    pub enabled: Option<bool>,
    pub visible_on_buy_page: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoucherCredentials {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportCodesRequest {
    pub profile_id: String,
    pub codes: Vec<VoucherCredentials>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportCodesResponse {
    pub imported: u64,
    pub skipped: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sold_reads_as_used() {
        assert_eq!(
            VoucherStatus::try_from("sold".to_string()),
            Ok(VoucherStatus::Used)
        );
        let parsed: VoucherStatus = serde_json::from_str("\"sold\"").unwrap();
        assert_eq!(parsed, VoucherStatus::Used);
        assert_eq!(serde_json::to_string(&parsed).unwrap(), "\"used\"");
    }

    #[test]
    fn test_payment_never_skips_processing() {
        use PaymentStatus::*;
        for terminal in [Completed, Failed, Cancelled] {
            assert!(!Pending.can_transition_to(terminal));
            assert!(Processing.can_transition_to(terminal));
            assert!(terminal.is_terminal());
            for next in [Pending, Processing, Completed, Failed, Cancelled] {
                assert!(!terminal.can_transition_to(next));
            }
        }
        assert!(Pending.can_transition_to(Processing));
        assert!(!Processing.can_transition_to(Pending));
    }

    #[test]
    fn test_unknown_status_rejected() {
        assert!(PaymentStatus::try_from("refunded".to_string()).is_err());
        assert!(PaymentMethod::try_from("paypal".to_string()).is_err());
        assert_eq!(
            PaymentMethod::try_from("mobile_money".to_string()),
            Ok(PaymentMethod::MobileMoney)
        );
    }
}
