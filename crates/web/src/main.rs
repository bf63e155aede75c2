use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use gateway::{
    FormRelayClient, SolapiClient, SolapiConfig, SupabaseAuthClient, SupabaseAuthConfig,
    SupabaseStorageClient, SupabaseStorageConfig,
};
use storage::Database;
use tokio::sync::watch;
use web::config::Config;
use web::dispatcher::{OutboxDispatcher, RetryPolicy};
use web::{AppState, build_router};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .init();

    tracing::info!("Starting MatchVibe API");

    let config = Config::from_env().context("Failed to load API configuration")?;
    tracing::info!("Configuration loaded successfully");

    tracing::info!(
        "Connecting to database at: {}",
        config
            .database_url
            .split('@')
            .next_back()
            .unwrap_or("unknown")
    );
    let db = Database::new(&config.database_url)
        .await
        .context("Failed to initialize database")?;
    tracing::info!("Database connection established");

    tracing::info!("Running database migrations");
    db.run_migrations()
        .await
        .context("Failed to run migrations")?;
    tracing::info!("Database migrations completed successfully");

    let notifier = Arc::new(
        SolapiClient::new(SolapiConfig {
            base_url: config.solapi_base_url.clone(),
            api_key: config.solapi_api_key.clone(),
            api_secret: config.solapi_api_secret.clone(),
            sender: config.solapi_sender.clone(),
        })
        .context("Failed to build SMS client")?,
    );
    let identity = SupabaseAuthClient::new(SupabaseAuthConfig {
        project_url: config.supabase_url.clone(),
        anon_key: config.supabase_anon_key.clone(),
        reset_redirect: config.password_reset_redirect.clone(),
    })
    .context("Failed to build auth client")?;
    let photos = SupabaseStorageClient::new(SupabaseStorageConfig {
        project_url: config.supabase_url.clone(),
        service_key: config.supabase_service_key.clone(),
        bucket: config.photo_bucket.clone(),
    })
    .context("Failed to build photo storage client")?;
    let contact = FormRelayClient::new(config.contact_form_url.clone())
        .context("Failed to build contact form client")?;

    let dispatcher = OutboxDispatcher::new(
        Arc::new(db.outbox()),
        notifier.clone(),
        RetryPolicy::new(config.outbox_max_attempts),
    );

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let sweeper = dispatcher
        .clone()
        .spawn(Duration::from_secs(config.outbox_poll_secs), shutdown_rx);
    tracing::info!(
        interval_secs = config.outbox_poll_secs,
        max_attempts = config.outbox_max_attempts,
        "Outbox dispatcher started"
    );

    let state = AppState {
        teams: Arc::new(db.teams()),
        match_requests: Arc::new(db.match_requests()),
        dispatcher,
        notifier,
        identity: Arc::new(identity),
        photos: Arc::new(photos),
        contact: Arc::new(contact),
        app_url: config.app_url.clone(),
    };

    let bind_address = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&bind_address)
        .await
        .with_context(|| format!("Failed to bind {bind_address}"))?;
    tracing::info!("Starting server at http://{}", bind_address);
    tracing::info!(
        "Swagger UI available at http://{}/swagger-ui/",
        bind_address
    );

    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c().await.ok();
            tracing::info!("Shutdown signal received");
        })
        .await
        .context("Server error")?;

    shutdown_tx.send(true).ok();
    sweeper.await.ok();

    Ok(())
}
