use sqlx::{Pool, Sqlite};

use crate::{db::queries, error::Result, validation::Contact};

/// Find-or-create the customer keyed by (router, phone).
///
/// An existing record only has name/email overwritten by non-empty values.
/// Not guarded against two concurrent first purchases with the same phone.
pub async fn resolve_customer(
    pool: &Pool<Sqlite>,
    router_id: &str,
    contact: &Contact,
) -> Result<String> {
    if let Some(existing) = queries::find_client_by_phone(pool, router_id, &contact.phone).await? {
        queries::update_client_contact(
            pool,
            &existing.id,
            contact.name.as_deref(),
            contact.email.as_deref(),
        )
        .await?;
        return Ok(existing.id);
    }

    let id = queries::insert_client(
        pool,
        router_id,
        contact.name.as_deref(),
        &contact.phone,
        contact.email.as_deref(),
    )
    .await?;
    tracing::info!(router_id, client_id = %id, "new customer");

    Ok(id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing;

    fn contact(name: Option<&str>, phone: &str, email: Option<&str>) -> Contact {
        Contact {
            name: name.map(str::to_string),
            phone: phone.to_string(),
            email: email.map(str::to_string),
        }
    }

    #[tokio::test]
    async fn test_same_phone_same_customer() {
        let pool = testing::pool().await;
        let router_id = testing::seed_router(&pool, None).await;

        let first = resolve_customer(&pool, &router_id, &contact(Some("Aïcha"), "90000000", None))
            .await
            .unwrap();
        let second = resolve_customer(&pool, &router_id, &contact(None, "90000000", None))
            .await
            .unwrap();

        assert_eq!(first, second);
        assert_eq!(queries::list_clients(&pool, &router_id).await.unwrap().len(), 1);

        // Empty values never wipe what was stored
        let client = queries::get_client(&pool, &first).await.unwrap().unwrap();
        assert_eq!(client.name.as_deref(), Some("Aïcha"));
        assert_eq!(client.purchased_codes, 0);
        assert_eq!(client.total_spent, 0);
    }

    #[tokio::test]
    async fn test_new_values_overwrite() {
        let pool = testing::pool().await;
        let router_id = testing::seed_router(&pool, None).await;

        let id = resolve_customer(&pool, &router_id, &contact(Some("A"), "90000000", None))
            .await
            .unwrap();
        resolve_customer(&pool, &router_id, &contact(Some("Aïcha"), "90000000", Some("a@b.co")))
            .await
            .unwrap();

        let client = queries::get_client(&pool, &id).await.unwrap().unwrap();
        assert_eq!(client.name.as_deref(), Some("Aïcha"));
        assert_eq!(client.email.as_deref(), Some("a@b.co"));
    }

    #[tokio::test]
    async fn test_customers_scoped_by_router() {
        let pool = testing::pool().await;
        let r1 = testing::seed_router(&pool, None).await;
        let r2 = testing::seed_router(&pool, None).await;

        let c1 = resolve_customer(&pool, &r1, &contact(None, "90000000", None))
            .await
            .unwrap();
        let c2 = resolve_customer(&pool, &r2, &contact(None, "90000000", None))
            .await
            .unwrap();

        assert_ne!(c1, c2);
    }
}
