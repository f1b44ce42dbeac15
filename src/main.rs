use std::{net::SocketAddr, sync::Arc};

use anyhow::Context;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use project_hosting_server::{
    config::Config,
    create_app,
    database::Database,
    handlers::AppState,
    services::{LogNotificationSink, NotificationSink, RedisNotificationSink, RedisService},
    storage::create_storage,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env().context("failed to load configuration")?;

    let database = Database::new(&config.database_url)
        .await
        .context("failed to connect to database")?;
    database.migrate().await.context("failed to run migrations")?;

    let storage = create_storage(&config)?;

    let notifications: Arc<dyn NotificationSink> = match &config.redis_url {
        Some(url) => {
            let redis = RedisService::new(url)
                .await
                .context("failed to connect to redis")?;
            tracing::info!("notifications queued in redis");
            Arc::new(RedisNotificationSink::new(redis))
        }
        None => {
            tracing::warn!("REDIS_URL not set, notifications will only be logged");
            Arc::new(LogNotificationSink)
        }
    };

    let port = config.port;
    let state = AppState::new(config, Arc::new(database), Arc::new(storage), notifications)?;
    let app = create_app(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("listening on {}", addr);

    axum::serve(listener, app).await?;
    Ok(())
}
