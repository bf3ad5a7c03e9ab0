use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{Pool, Sqlite};

use crate::{
    db::{
        models::{Payment, PaymentStatus, Router, WifiCode},
        queries,
    },
    error::{AppError, Result},
    purchase::duration::valid_until,
};

/// Credentials handed to the buyer once a payment is fulfilled.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Receipt {
    pub payment_id: String,
    pub transaction_id: Option<String>,
    pub router_name: String,
    pub connection_url: Option<String>,
    pub profile_name: String,
    pub duration: String,
    pub amount: i64,
    pub username: String,
    pub password: String,
    pub issued_at: DateTime<Utc>,
    pub valid_until: Option<DateTime<Utc>>,
}

impl Receipt {
    /// Profile details come from the payment's snapshot, not the live profile.
    pub fn new(router: &Router, payment: &Payment, code: &WifiCode) -> Self {
        let issued_at = code.used_at.unwrap_or_else(Utc::now);
        Self {
            payment_id: payment.id.clone(),
            transaction_id: payment.transaction_id.clone(),
            router_name: router.name.clone(),
            connection_url: router.connection_url.clone(),
            profile_name: payment.profile_name.clone(),
            duration: payment.duration.clone(),
            amount: payment.amount,
            username: code.username.clone(),
            password: code.password.clone(),
            issued_at,
            valid_until: valid_until(&payment.duration, issued_at),
        }
    }

    /// Plain text put on the clipboard.
    pub fn copy_text(&self) -> String {
        let mut text = format!(
            "{} - {}\nUsername: {}\nPassword: {}",
            self.router_name, self.profile_name, self.username, self.password
        );
        if let Some(until) = self.valid_until {
            text.push_str(&format!("\nValid until: {}", until.format("%d/%m/%Y %H:%M")));
        }
        text
    }

    /// Standalone printable receipt page.
    pub fn print_html(&self) -> String {
        let validity = self
            .valid_until
            .map(|d| d.format("%d/%m/%Y %H:%M").to_string())
            .unwrap_or_else(|| "-".to_string());
        let transaction = self.transaction_id.as_deref().unwrap_or("-");

        format!(
            r#"<!DOCTYPE html>
<html>
<head><meta charset="utf-8"><title>Receipt {payment}</title></head>
<body onload="window.print()">
<h1>{router}</h1>
<table>
<tr><th>Plan</th><td>{profile} ({duration})</td></tr>
<tr><th>Amount</th><td>{amount} FCFA</td></tr>
<tr><th>Username</th><td>{username}</td></tr>
<tr><th>Password</th><td>{password}</td></tr>
<tr><th>Date</th><td>{issued}</td></tr>
<tr><th>Valid until</th><td>{validity}</td></tr>
<tr><th>Transaction</th><td>{transaction}</td></tr>
</table>
</body>
</html>
"#,
            payment = escape_html(&self.payment_id),
            router = escape_html(&self.router_name),
            profile = escape_html(&self.profile_name),
            duration = escape_html(&self.duration),
            amount = self.amount,
            username = escape_html(&self.username),
            password = escape_html(&self.password),
            issued = self.issued_at.format("%d/%m/%Y %H:%M"),
            transaction = escape_html(transaction),
        )
    }
}

/// Outcome of the "send by SMS" action. No gateway is wired in; delivery is simulated.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SmsNotice {
    pub to: String,
    pub message: String,
    pub sent: bool,
    pub simulated: bool,
}

pub fn simulate_sms(receipt: &Receipt, phone: &str) -> SmsNotice {
    tracing::info!(payment_id = %receipt.payment_id, to = phone, "simulated SMS delivery");
    SmsNotice {
        to: phone.to_string(),
        message: receipt.copy_text(),
        sent: true,
        simulated: true,
    }
}

/// Rebuild the receipt of a fulfilled payment.
pub async fn load_receipt(pool: &Pool<Sqlite>, payment_id: &str) -> Result<Receipt> {
    let payment = queries::get_payment(pool, payment_id)
        .await?
        .ok_or(AppError::NotFound("Payment"))?;

    if payment.status != PaymentStatus::Completed {
        return Err(AppError::NotFound("Receipt"));
    }
    let Some(voucher_id) = payment.voucher_id.as_deref() else {
        return Err(AppError::NoVoucherAvailable {
            payment_id: payment.id.clone(),
        });
    };

    let code = queries::get_wifi_code(pool, voucher_id)
        .await?
        .ok_or(AppError::NotFound("Code"))?;
    let router = queries::get_router(pool, &payment.router_id)
        .await?
        .ok_or(AppError::NotFound("Router"))?;

    Ok(Receipt::new(&router, &payment, &code))
}

fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
