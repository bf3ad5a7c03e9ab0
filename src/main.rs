use clap::Parser;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use fastnet_lite::{
    app_state::AppState,
    checkout::{CheckoutProvider, FedaPayWidget},
    config::Config,
    db::init_pool,
    purchase::sweep::spawn_sweeper,
    routes::create_app,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "fastnet_lite=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Parse configuration
    let config = Arc::new(Config::parse());

    // Initialize database
    let pool = init_pool(&config.database_url).await?;

    let checkout: Arc<dyn CheckoutProvider> = Arc::new(FedaPayWidget {
        environment: config.provider_env.clone(),
        currency: config.currency.clone(),
        country: config.country_code.clone(),
    });

    // Cancel checkouts the buyer walked away from
    spawn_sweeper(
        pool.clone(),
        config.sweep_interval(),
        config.processing_timeout(),
    );

    let state = AppState {
        pool,
        config: config.clone(),
        checkout,
    };

    let app = create_app(state).layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()));

    let listener = tokio::net::TcpListener::bind(&config.socket_addr()).await?;

    tracing::info!("Server running on {}", config.socket_addr());
    tracing::info!(
        "Checkout: {} ({}), timeout {} min",
        config.provider_env,
        config.currency,
        config.processing_timeout_mins
    );

    axum::serve(listener, app).await?;

    Ok(())
}
