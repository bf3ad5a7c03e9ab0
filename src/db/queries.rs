use chrono::{DateTime, Utc};
use sqlx::{Executor, Pool, Sqlite};

use crate::db::models::{
    Client, CreateProfileRequest, CreateRouterRequest, Payment, PaymentMethod, PaymentStatus,
    Profile, Router, UpdateProfileRequest, UpdateRouterRequest, VoucherStatus, WifiCode,
};
use crate::db::new_id;
use crate::error::Result;

// ---- routers ----

pub async fn get_router(pool: &Pool<Sqlite>, id: &str) -> Result<Option<Router>> {
    let router = sqlx::query_as::<_, Router>("SELECT * FROM routers WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await?;

    Ok(router)
}

pub async fn insert_router(pool: &Pool<Sqlite>, req: &CreateRouterRequest) -> Result<String> {
    let id = new_id();
    let now = Utc::now();

    sqlx::query(
        "INSERT INTO routers (id, name, buy_page_title, buy_page_description, connection_url,
         enabled, public_key, owner_id, created_at, updated_at)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(&id)
    .bind(&req.name)
    .bind(&req.buy_page_title)
    .bind(&req.buy_page_description)
    .bind(&req.connection_url)
    .bind(req.enabled.unwrap_or(true))
    .bind(&req.public_key)
    .bind(&req.owner_id)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await?;

    Ok(id)
}

pub async fn update_router(
    pool: &Pool<Sqlite>,
    id: &str,
    req: &UpdateRouterRequest,
) -> Result<bool> {
    let result = sqlx::query(
        "UPDATE routers SET
            name = COALESCE(?, name),
            buy_page_title = COALESCE(?, buy_page_title),
            buy_page_description = COALESCE(?, buy_page_description),
            connection_url = COALESCE(?, connection_url),
            enabled = COALESCE(?, enabled),
            public_key = COALESCE(?, public_key),
            updated_at = ?
         WHERE id = ?",
    )
    .bind(&req.name)
    .bind(&req.buy_page_title)
    .bind(&req.buy_page_description)
    .bind(&req.connection_url)
    .bind(req.enabled)
    .bind(&req.public_key)
    .bind(Utc::now())
    .bind(id)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

// ---- settings ----

/// Raw (appearance, advanced) JSON documents, each possibly absent.
pub async fn get_settings_documents(
    pool: &Pool<Sqlite>,
    router_id: &str,
) -> Result<(Option<String>, Option<String>)> {
    let row: Option<(Option<String>, Option<String>)> =
        sqlx::query_as("SELECT appearance, advanced FROM router_settings WHERE router_id = ?")
            .bind(router_id)
            .fetch_optional(pool)
            .await?;

    Ok(row.unwrap_or((None, None)))
}

pub async fn upsert_settings_documents(
    pool: &Pool<Sqlite>,
    router_id: &str,
    appearance: Option<&str>,
    advanced: Option<&str>,
) -> Result<()> {
    sqlx::query(
        "INSERT INTO router_settings (router_id, appearance, advanced, updated_at)
         VALUES (?, ?, ?, ?)
         ON CONFLICT(router_id) DO UPDATE SET
            appearance = COALESCE(excluded.appearance, appearance),
            advanced = COALESCE(excluded.advanced, advanced),
            updated_at = excluded.updated_at",
    )
    .bind(router_id)
    .bind(appearance)
    .bind(advanced)
    .bind(Utc::now())
    .execute(pool)
    .await?;

    Ok(())
}

// ---- profiles ----

pub async fn get_profile(pool: &Pool<Sqlite>, id: &str) -> Result<Option<Profile>> {
    let profile = sqlx::query_as::<_, Profile>("SELECT * FROM profiles WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await?;

    Ok(profile)
}

pub async fn list_profiles(pool: &Pool<Sqlite>, router_id: &str) -> Result<Vec<Profile>> {
    let profiles = sqlx::query_as::<_, Profile>(
        "SELECT * FROM profiles WHERE router_id = ? ORDER BY price ASC, name ASC",
    )
    .bind(router_id)
    .fetch_all(pool)
    .await?;

    Ok(profiles)
}

/// Profiles shown on the buy page: enabled and visible.
pub async fn list_buyable_profiles(pool: &Pool<Sqlite>, router_id: &str) -> Result<Vec<Profile>> {
    let profiles = sqlx::query_as::<_, Profile>(
        "SELECT * FROM profiles WHERE router_id = ? AND enabled = 1 AND visible_on_buy_page = 1
         ORDER BY price ASC, name ASC",
    )
    .bind(router_id)
    .fetch_all(pool)
    .await?;

    Ok(profiles)
}

pub async fn insert_profile(
    pool: &Pool<Sqlite>,
    router_id: &str,
    req: &CreateProfileRequest,
) -> Result<String> {
    let id = new_id();
    let now = Utc::now();

    sqlx::query(
        "INSERT INTO profiles (id, router_id, name, description, price, duration, enabled,
         visible_on_buy_page, created_at, updated_at)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(&id)
    .bind(router_id)
    .bind(&req.name)
    .bind(&req.description)
    .bind(req.price)
    .bind(&req.duration)
    .bind(req.enabled.unwrap_or(true))
    .bind(req.visible_on_buy_page.unwrap_or(true))
    .bind(now)
    .bind(now)
    .execute(pool)
    .await?;

    Ok(id)
}

pub async fn update_profile(
    pool: &Pool<Sqlite>,
    id: &str,
    req: &UpdateProfileRequest,
) -> Result<bool> {
    let result = sqlx::query(
        "UPDATE profiles SET
            name = COALESCE(?, name),
            description = COALESCE(?, description),
            price = COALESCE(?, price),
            duration = COALESCE(?, duration),
            enabled = COALESCE(?, enabled),
            visible_on_buy_page = COALESCE(?, visible_on_buy_page),
            updated_at = ?
         WHERE id = ?",
    )
    .bind(&req.name)
    .bind(&req.description)
    .bind(req.price)
    .bind(&req.duration)
    .bind(req.enabled)
    .bind(req.visible_on_buy_page)
    .bind(Utc::now())
    .bind(id)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

// ---- wifi codes ----

pub async fn get_wifi_code(pool: &Pool<Sqlite>, id: &str) -> Result<Option<WifiCode>> {
    let code = sqlx::query_as::<_, WifiCode>("SELECT * FROM wifi_codes WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await?;

    Ok(code)
}

/// First available code for (router, profile), oldest first. Reserves nothing.
pub async fn find_available_wifi_code(
    pool: &Pool<Sqlite>,
    router_id: &str,
    profile_id: &str,
) -> Result<Option<WifiCode>> {
    let code = sqlx::query_as::<_, WifiCode>(
        "SELECT * FROM wifi_codes WHERE router_id = ? AND profile_id = ? AND status = 'available'
         ORDER BY created_at ASC, id ASC LIMIT 1",
    )
    .bind(router_id)
    .bind(profile_id)
    .fetch_optional(pool)
    .await?;

    Ok(code)
}

/// Flip the oldest available code of (router, profile) to used in one
/// statement. `None` only when no code is left.
pub async fn claim_next_wifi_code<'e, E>(
    executor: E,
    router_id: &str,
    profile_id: &str,
    payment_id: &str,
) -> Result<Option<WifiCode>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let now = Utc::now();
    let code = sqlx::query_as::<_, WifiCode>(
        "UPDATE wifi_codes SET status = ?, payment_id = ?, used_at = ?, updated_at = ?
         WHERE id = (
             SELECT id FROM wifi_codes
             WHERE router_id = ? AND profile_id = ? AND status = 'available'
             ORDER BY created_at ASC, id ASC LIMIT 1
         ) AND status = 'available'
         RETURNING *",
    )
    .bind(VoucherStatus::Used.as_str())
    .bind(payment_id)
    .bind(now)
    .bind(now)
    .bind(router_id)
    .bind(profile_id)
    .fetch_optional(executor)
    .await?;

    Ok(code)
}

/// Returns false when the username already exists on this router.
pub async fn insert_wifi_code(
    pool: &Pool<Sqlite>,
    router_id: &str,
    profile_id: &str,
    username: &str,
    password: &str,
) -> Result<bool> {
    let now = Utc::now();
    let result = sqlx::query(
        "INSERT OR IGNORE INTO wifi_codes (id, router_id, profile_id, username, password, status,
         created_at, updated_at)
         VALUES (?, ?, ?, ?, ?, 'available', ?, ?)",
    )
    .bind(new_id())
    .bind(router_id)
    .bind(profile_id)
    .bind(username)
    .bind(password)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

pub async fn list_wifi_codes(
    pool: &Pool<Sqlite>,
    router_id: &str,
    profile_id: Option<&str>,
    status: Option<VoucherStatus>,
) -> Result<Vec<WifiCode>> {
    // Legacy rows may still say 'sold'
    let statuses: Option<(&str, &str)> = status.map(|s| match s {
        VoucherStatus::Available => ("available", "available"),
        VoucherStatus::Used => ("used", "sold"),
    });

    let codes = sqlx::query_as::<_, WifiCode>(
        "SELECT * FROM wifi_codes
         WHERE router_id = ?
           AND (? IS NULL OR profile_id = ?)
           AND (? IS NULL OR status IN (?, ?))
         ORDER BY created_at DESC",
    )
    .bind(router_id)
    .bind(profile_id)
    .bind(profile_id)
    .bind(statuses.map(|s| s.0))
    .bind(statuses.map(|s| s.0))
    .bind(statuses.map(|s| s.1))
    .fetch_all(pool)
    .await?;

    Ok(codes)
}

pub async fn delete_available_wifi_code(pool: &Pool<Sqlite>, id: &str) -> Result<bool> {
    let result = sqlx::query("DELETE FROM wifi_codes WHERE id = ? AND status = 'available'")
        .bind(id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

pub async fn count_wifi_codes_by_status(
    pool: &Pool<Sqlite>,
    router_id: &str,
) -> Result<Vec<(String, i64)>> {
    let rows: Vec<(String, i64)> = sqlx::query_as(
        "SELECT status, COUNT(*) FROM wifi_codes WHERE router_id = ? GROUP BY status",
    )
    .bind(router_id)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

// ---- clients ----

pub async fn get_client(pool: &Pool<Sqlite>, id: &str) -> Result<Option<Client>> {
    let client = sqlx::query_as::<_, Client>("SELECT * FROM clients WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await?;

    Ok(client)
}

pub async fn find_client_by_phone(
    pool: &Pool<Sqlite>,
    router_id: &str,
    phone: &str,
) -> Result<Option<Client>> {
    let client = sqlx::query_as::<_, Client>(
        "SELECT * FROM clients WHERE router_id = ? AND phone = ? LIMIT 1",
    )
    .bind(router_id)
    .bind(phone)
    .fetch_optional(pool)
    .await?;

    Ok(client)
}

pub async fn insert_client(
    pool: &Pool<Sqlite>,
    router_id: &str,
    name: Option<&str>,
    phone: &str,
    email: Option<&str>,
) -> Result<String> {
    let id = new_id();
    let now = Utc::now();

    sqlx::query(
        "INSERT INTO clients (id, router_id, name, phone, email, purchased_codes, total_spent,
         created_at, updated_at)
         VALUES (?, ?, ?, ?, ?, 0, 0, ?, ?)",
    )
    .bind(&id)
    .bind(router_id)
    .bind(name)
    .bind(phone)
    .bind(email)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await?;

    Ok(id)
}

/// Overwrite name/email only with the values given; `None` keeps the stored value.
pub async fn update_client_contact(
    pool: &Pool<Sqlite>,
    id: &str,
    name: Option<&str>,
    email: Option<&str>,
) -> Result<()> {
    sqlx::query(
        "UPDATE clients SET name = COALESCE(?, name), email = COALESCE(?, email), updated_at = ?
         WHERE id = ?",
    )
    .bind(name)
    .bind(email)
    .bind(Utc::now())
    .bind(id)
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn record_client_purchase<'e, E>(executor: E, id: &str, amount: i64) -> Result<()>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query(
        "UPDATE clients SET purchased_codes = purchased_codes + 1, total_spent = total_spent + ?,
         updated_at = ? WHERE id = ?",
    )
    .bind(amount)
    .bind(Utc::now())
    .bind(id)
    .execute(executor)
    .await?;

    Ok(())
}

pub async fn list_clients(pool: &Pool<Sqlite>, router_id: &str) -> Result<Vec<Client>> {
    let clients = sqlx::query_as::<_, Client>(
        "SELECT * FROM clients WHERE router_id = ? ORDER BY updated_at DESC",
    )
    .bind(router_id)
    .fetch_all(pool)
    .await?;

    Ok(clients)
}

pub async fn count_clients(pool: &Pool<Sqlite>, router_id: &str) -> Result<i64> {
    let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM clients WHERE router_id = ?")
        .bind(router_id)
        .fetch_one(pool)
        .await?;

    Ok(row.0)
}

// ---- payments ----

pub struct NewPayment<'a> {
    pub router_id: &'a str,
    pub client_id: &'a str,
    pub profile_id: &'a str,
    pub amount: i64,
    pub profile_name: &'a str,
    pub duration: &'a str,
    pub method: PaymentMethod,
}

/// Always starts in `pending`.
pub async fn insert_payment(pool: &Pool<Sqlite>, new: &NewPayment<'_>) -> Result<String> {
    let id = new_id();
    let now = Utc::now();

    sqlx::query(
        "INSERT INTO payments (id, router_id, client_id, profile_id, amount, profile_name,
         duration, method, status, created_at, updated_at)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(&id)
    .bind(new.router_id)
    .bind(new.client_id)
    .bind(new.profile_id)
    .bind(new.amount)
    .bind(new.profile_name)
    .bind(new.duration)
    .bind(new.method.as_str())
    .bind(PaymentStatus::Pending.as_str())
    .bind(now)
    .bind(now)
    .execute(pool)
    .await?;

    Ok(id)
}

pub async fn get_payment(pool: &Pool<Sqlite>, id: &str) -> Result<Option<Payment>> {
    let payment = sqlx::query_as::<_, Payment>("SELECT * FROM payments WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await?;

    Ok(payment)
}

/// Move a payment from `from` to `to`. Returns false when the stored status
/// was no longer `from`.
pub async fn transition_payment<'e, E>(
    executor: E,
    id: &str,
    from: PaymentStatus,
    to: PaymentStatus,
    transaction_id: Option<&str>,
    failure_reason: Option<&str>,
) -> Result<bool>
where
    E: Executor<'e, Database = Sqlite>,
{
    let result = sqlx::query(
        "UPDATE payments SET
            status = ?,
            transaction_id = COALESCE(?, transaction_id),
            failure_reason = COALESCE(?, failure_reason),
            updated_at = ?
         WHERE id = ? AND status = ?",
    )
    .bind(to.as_str())
    .bind(transaction_id)
    .bind(failure_reason)
    .bind(Utc::now())
    .bind(id)
    .bind(from.as_str())
    .execute(executor)
    .await?;

    Ok(result.rows_affected() > 0)
}

pub async fn attach_voucher<'e, E>(executor: E, payment_id: &str, code: &WifiCode) -> Result<()>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query(
        "UPDATE payments SET voucher_id = ?, voucher_code = ?, updated_at = ? WHERE id = ?",
    )
    .bind(&code.id)
    .bind(&code.username)
    .bind(Utc::now())
    .bind(payment_id)
    .execute(executor)
    .await?;

    Ok(())
}

pub async fn list_payments(
    pool: &Pool<Sqlite>,
    router_id: &str,
    status: Option<PaymentStatus>,
    client_id: Option<&str>,
    limit: i64,
) -> Result<Vec<Payment>> {
    let status = status.map(|s| s.as_str());
    let payments = sqlx::query_as::<_, Payment>(
        "SELECT * FROM payments
         WHERE router_id = ?
           AND (? IS NULL OR status = ?)
           AND (? IS NULL OR client_id = ?)
         ORDER BY created_at DESC
         LIMIT ?",
    )
    .bind(router_id)
    .bind(status)
    .bind(status)
    .bind(client_id)
    .bind(client_id)
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(payments)
}

pub async fn count_payments_by_status(
    pool: &Pool<Sqlite>,
    router_id: &str,
) -> Result<Vec<(String, i64)>> {
    let rows: Vec<(String, i64)> = sqlx::query_as(
        "SELECT status, COUNT(*) FROM payments WHERE router_id = ? GROUP BY status",
    )
    .bind(router_id)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

pub async fn completed_revenue(pool: &Pool<Sqlite>, router_id: &str) -> Result<i64> {
    let row: (Option<i64>,) = sqlx::query_as(
        "SELECT SUM(amount) FROM payments WHERE router_id = ? AND status = 'completed'",
    )
    .bind(router_id)
    .fetch_one(pool)
    .await?;

    Ok(row.0.unwrap_or(0))
}

/// Cancel every `processing` payment untouched since `cutoff`.
pub async fn cancel_stale_processing(
    pool: &Pool<Sqlite>,
    cutoff: DateTime<Utc>,
    reason: &str,
) -> Result<u64> {
    let result = sqlx::query(
        "UPDATE payments SET status = ?, failure_reason = ?, updated_at = ?
         WHERE status = ? AND updated_at < ?",
    )
    .bind(PaymentStatus::Cancelled.as_str())
    .bind(reason)
    .bind(Utc::now())
    .bind(PaymentStatus::Processing.as_str())
    .bind(cutoff)
    .execute(pool)
    .await?;

    Ok(result.rows_affected())
}
