use std::time::Duration;

use anyhow::Result;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use askshot_server::{
    auth::GoogleVerifier,
    config::Config,
    create_app,
    database::Database,
    services::{
        cache::CacheService, credits::CreditLedger, email::EmailService,
        payments::PaymentGateway, redis::RedisService, vision::VisionClient,
    },
    AppState,
};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "askshot_server=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;

    let database = Database::new(&config.database_url).await?;
    database.migrate().await?;
    tracing::info!("Connected to Postgres, migrations applied");

    let redis = RedisService::new(&config.redis_url).await?;
    tracing::info!("Connected to Redis");

    let cache = CacheService::new(redis.clone());
    let credits = CreditLedger::new(database.clone(), cache.clone());
    let vision = VisionClient::new(
        config.vision_api_url.clone(),
        config.vision_api_key.clone(),
        config.vision_model.clone(),
        Duration::from_millis(config.vision_retry_base_delay_ms),
    );
    let payments = PaymentGateway::new(
        config.payment_api_url.clone(),
        config.payment_app_id.clone(),
        config.payment_secret_key.clone(),
    );
    let email = EmailService::new(
        config.email_api_url.clone(),
        config.email_api_key.clone(),
        config.email_from.clone(),
    );
    let google = GoogleVerifier::new(config.google_client_id.clone());

    let state = AppState {
        database,
        redis,
        cache,
        credits,
        vision,
        payments,
        email,
        google,
        config: config.clone(),
    };

    let app = create_app(state);

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
