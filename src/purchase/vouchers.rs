use sqlx::{Executor, Pool, Sqlite};

use crate::{
    db::{models::WifiCode, queries},
    error::Result,
};

/// One unused code for (router, profile). Nothing is reserved.
pub async fn allocate_voucher(
    pool: &Pool<Sqlite>,
    router_id: &str,
    profile_id: &str,
) -> Result<Option<WifiCode>> {
    queries::find_available_wifi_code(pool, router_id, profile_id).await
}

/// Flip the next available code to `used` for `payment_id`.
///
/// Selection and flip are a single conditional update, so a code is never
/// handed to two payments and `None` means the profile really ran out.
pub async fn claim_voucher<'e, E>(
    executor: E,
    router_id: &str,
    profile_id: &str,
    payment_id: &str,
) -> Result<Option<WifiCode>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let code = queries::claim_next_wifi_code(executor, router_id, profile_id, payment_id).await?;
    if let Some(code) = &code {
        tracing::debug!(code_id = %code.id, payment_id, "code claimed");
    }
    Ok(code)
}
