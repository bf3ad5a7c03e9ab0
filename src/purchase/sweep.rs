use chrono::Utc;
use sqlx::{Pool, Sqlite};
use std::time::Duration;
use tokio::task::JoinHandle;

use crate::{db::queries, error::Result};

pub const TIMEOUT_REASON: &str = "Checkout timed out";

/// Cancel payments left in `processing` for longer than `timeout`.
pub async fn sweep_stale_checkouts(pool: &Pool<Sqlite>, timeout: chrono::Duration) -> Result<u64> {
    let cutoff = Utc::now() - timeout;
    let swept = queries::cancel_stale_processing(pool, cutoff, TIMEOUT_REASON).await?;
    if swept > 0 {
        tracing::info!(swept, "cancelled stale checkouts");
    }
    Ok(swept)
}

pub fn spawn_sweeper(pool: Pool<Sqlite>, every: Duration, timeout: chrono::Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        loop {
            ticker.tick().await;
            if let Err(e) = sweep_stale_checkouts(&pool, timeout).await {
                tracing::error!(error = %e, "checkout sweep failed");
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::{PaymentMethod, PaymentStatus};
    use crate::db::queries::NewPayment;
    use crate::testing;

    #[tokio::test]
    async fn test_only_stale_processing_is_cancelled() {
        let pool = testing::pool().await;
        let router_id = testing::seed_router(&pool, None).await;
        let profile_id = testing::seed_profile(&pool, &router_id, 500, "1 jour").await;
        let new = NewPayment {
            router_id: &router_id,
            client_id: "c1",
            profile_id: &profile_id,
            amount: 500,
            profile_name: "Pass 1 jour",
            duration: "1 jour",
            method: PaymentMethod::Fedapay,
        };

        let pending = queries::insert_payment(&pool, &new).await.unwrap();
        let processing = queries::insert_payment(&pool, &new).await.unwrap();
        queries::transition_payment(
            &pool,
            &processing,
            PaymentStatus::Pending,
            PaymentStatus::Processing,
            None,
            None,
        )
        .await
        .unwrap();

        // Nothing is older than an hour yet
        assert_eq!(
            sweep_stale_checkouts(&pool, chrono::Duration::hours(1)).await.unwrap(),
            0
        );

        // A negative timeout puts the cutoff in the future
        assert_eq!(
            sweep_stale_checkouts(&pool, chrono::Duration::minutes(-1)).await.unwrap(),
            1
        );

        let swept = queries::get_payment(&pool, &processing).await.unwrap().unwrap();
        assert_eq!(swept.status, PaymentStatus::Cancelled);
        assert_eq!(swept.failure_reason.as_deref(), Some(TIMEOUT_REASON));
        let untouched = queries::get_payment(&pool, &pending).await.unwrap().unwrap();
        assert_eq!(untouched.status, PaymentStatus::Pending);
    }
}
