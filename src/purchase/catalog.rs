use serde::Serialize;
use sqlx::{Pool, Sqlite};

use crate::{
    db::{
        models::{Profile, Router},
        queries,
    },
    error::{AppError, Result},
    settings::RouterSettings,
};

/// Public face of a router on its buy page.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreFront {
    pub id: String,
    pub name: String,
    pub title: String,
    pub description: Option<String>,
    pub connection_url: Option<String>,
}

impl From<&Router> for StoreFront {
    fn from(router: &Router) -> Self {
        Self {
            id: router.id.clone(),
            name: router.name.clone(),
            title: router
                .buy_page_title
                .clone()
                .unwrap_or_else(|| router.name.clone()),
            description: router.buy_page_description.clone(),
            connection_url: router.connection_url.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Catalog {
    pub router: StoreFront,
    pub profiles: Vec<Profile>,
    pub settings: RouterSettings,
}

/// A single profile's buy page.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Offer {
    pub router: StoreFront,
    pub profile: Profile,
    pub settings: RouterSettings,
}

/// Router that is allowed to sell right now.
pub async fn load_selling_router(pool: &Pool<Sqlite>, router_id: &str) -> Result<Router> {
    let router = queries::get_router(pool, router_id)
        .await?
        .ok_or(AppError::NotFound("Router"))?;

    if !router.enabled {
        return Err(AppError::RouterDisabled);
    }

    Ok(router)
}

/// Settings with defaults filled in for absent or unreadable documents.
pub async fn load_settings(pool: &Pool<Sqlite>, router_id: &str) -> Result<RouterSettings> {
    let (appearance, advanced) = queries::get_settings_documents(pool, router_id).await?;
    Ok(RouterSettings::from_documents(appearance.as_deref(), advanced.as_deref()))
}

/// Profile of `router_id` that is enabled and visible on the buy page.
pub async fn load_buyable_profile(
    pool: &Pool<Sqlite>,
    router_id: &str,
    profile_id: &str,
) -> Result<Profile> {
    queries::get_profile(pool, profile_id)
        .await?
        .filter(|p| p.router_id == router_id && p.is_on_sale())
        .ok_or(AppError::NotFound("Profile"))
}

pub async fn load_catalog(pool: &Pool<Sqlite>, router_id: &str) -> Result<Catalog> {
    let router = load_selling_router(pool, router_id).await?;
    let profiles = queries::list_buyable_profiles(pool, router_id).await?;
    let settings = load_settings(pool, router_id).await?;

    tracing::debug!(router_id, profiles = profiles.len(), "catalog loaded");

    Ok(Catalog {
        router: StoreFront::from(&router),
        profiles,
        settings,
    })
}

pub async fn load_offer(pool: &Pool<Sqlite>, router_id: &str, profile_id: &str) -> Result<Offer> {
    let router = load_selling_router(pool, router_id).await?;
    let profile = load_buyable_profile(pool, router_id, profile_id).await?;
    let settings = load_settings(pool, router_id).await?;

    Ok(Offer {
        router: StoreFront::from(&router),
        profile,
        settings,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::UpdateRouterRequest;
    use crate::testing;

    #[tokio::test]
    async fn test_hidden_and_disabled_profiles_excluded() {
        let pool = testing::pool().await;
        let router_id = testing::seed_router(&pool, Some("pk_test")).await;
        let shown = testing::seed_profile(&pool, &router_id, 500, "1 jour").await;
        let disabled = testing::seed_profile_with(&pool, &router_id, 300, false, true).await;
        let hidden = testing::seed_profile_with(&pool, &router_id, 200, true, false).await;

        let catalog = load_catalog(&pool, &router_id).await.unwrap();
        let ids: Vec<_> = catalog.profiles.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec![shown.as_str()]);

        assert!(matches!(
            load_offer(&pool, &router_id, &disabled).await,
            Err(AppError::NotFound("Profile"))
        ));
        assert!(matches!(
            load_offer(&pool, &router_id, &hidden).await,
            Err(AppError::NotFound("Profile"))
        ));
    }

    #[tokio::test]
    async fn test_missing_router_halts() {
        let pool = testing::pool().await;
        assert!(matches!(
            load_catalog(&pool, "nope").await,
            Err(AppError::NotFound("Router"))
        ));
    }

    #[tokio::test]
    async fn test_disabled_router() {
        let pool = testing::pool().await;
        let router_id = testing::seed_router(&pool, None).await;
        let update = UpdateRouterRequest {
            enabled: Some(false),
            ..Default::default()
        };
        queries::update_router(&pool, &router_id, &update).await.unwrap();

        assert!(matches!(
            load_catalog(&pool, &router_id).await,
            Err(AppError::RouterDisabled)
        ));
    }

    #[tokio::test]
    async fn test_settings_default_when_absent() {
        let pool = testing::pool().await;
        let router_id = testing::seed_router(&pool, None).await;

        let catalog = load_catalog(&pool, &router_id).await.unwrap();
        assert_eq!(catalog.settings, RouterSettings::default());
        assert_eq!(catalog.router.title, "Test Router");

        queries::upsert_settings_documents(&pool, &router_id, None, Some(r#"{"collectEmail":true}"#))
            .await
            .unwrap();
        let settings = load_settings(&pool, &router_id).await.unwrap();
        assert!(settings.advanced.collect_email);
        assert!(settings.advanced.require_phone);
    }

    #[tokio::test]
    async fn test_unreadable_settings_still_serve_catalog() {
        let pool = testing::pool().await;
        let router_id = testing::seed_router(&pool, None).await;
        testing::seed_profile(&pool, &router_id, 500, "1 jour").await;
        queries::upsert_settings_documents(&pool, &router_id, Some("{broken"), Some("42"))
            .await
            .unwrap();

        let catalog = load_catalog(&pool, &router_id).await.unwrap();
        assert_eq!(catalog.settings, RouterSettings::default());
        assert_eq!(catalog.profiles.len(), 1);
    }

    #[tokio::test]
    async fn test_profile_of_other_router_not_buyable() {
        let pool = testing::pool().await;
        let r1 = testing::seed_router(&pool, None).await;
        let r2 = testing::seed_router(&pool, None).await;
        let p2 = testing::seed_profile(&pool, &r2, 500, "1 jour").await;

        assert!(load_buyable_profile(&pool, &r1, &p2).await.is_err());
        assert!(load_buyable_profile(&pool, &r2, &p2).await.is_ok());
    }
}
