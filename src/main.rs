// src/main.rs

use std::sync::Arc;
use std::time::Duration;

use dotenvy::dotenv;
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};
use ujian_gto::config::Config;
use ujian_gto::live::LiveHub;
use ujian_gto::routes;
use ujian_gto::state::AppState;
use ujian_gto::storage::LocalBlobStore;
use ujian_gto::store::{DataStore, KeyValueStore, MemoryKv, MemoryStore, PgStore, StoreError};

#[tokio::main]
async fn main() {
    // Load .env file (if present)
    dotenv().ok();

    // Load configuration from environment
    let config = Config::from_env().expect("Invalid configuration");

    let file_appender = tracing_appender::rolling::daily("logs", "app.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);
    let env_filter = EnvFilter::new(&config.rust_log);
    let stdout_layer = fmt::layer().with_writer(std::io::stdout).with_target(false);
    let file_layer = fmt::layer().with_writer(non_blocking).with_ansi(false);

    // Initialize Tracing (Logging)
    tracing_subscriber::registry()
        .with(env_filter)
        .with(stdout_layer)
        .with(file_layer)
        .init();

    let (store, kv): (Arc<dyn DataStore>, Arc<dyn KeyValueStore>) = match &config.database_url {
        Some(url) => {
            let pg = Arc::new(connect_postgres(url).await);
            let store: Arc<dyn DataStore> = pg.clone();
            let kv: Arc<dyn KeyValueStore> = pg;
            (store, kv)
        }
        None => {
            tracing::warn!("DATABASE_URL not set, using the in-memory store. Data is lost on restart.");
            let store: Arc<dyn DataStore> = Arc::new(MemoryStore::new());
            let kv: Arc<dyn KeyValueStore> = Arc::new(MemoryKv::new());
            (store, kv)
        }
    };

    // Seed Teacher Account
    if let Some(seed) = &config.teacher_seed {
        match store
            .insert_teacher(&seed.username, &seed.password, &seed.name)
            .await
        {
            Ok(_) => tracing::info!("Teacher account created: {}", seed.username),
            Err(StoreError::Duplicate(_)) => {}
            Err(e) => tracing::error!("Failed to seed teacher account: {:?}", e),
        }
    }

    let blobs = Arc::new(LocalBlobStore::new(
        config.upload_dir.clone(),
        config.public_base_url.clone(),
    ));

    let state = AppState {
        store,
        kv,
        blobs,
        hub: LiveHub::new(),
        config: config.clone(),
    };

    // Create the Axum application router
    let app = routes::create_router(state);

    tracing::info!("Listening on {}", config.bind_addr);

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .expect("Failed to bind listen address");

    // Start the server
    if let Err(e) = axum::serve(listener, app).await {
        tracing::error!("Server error: {}", e);
    }
}

/// Connects with retry and applies migrations.
async fn connect_postgres(url: &str) -> PgStore {
    let mut retry_count = 0;
    let pool = loop {
        match PgPoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(3))
            .connect(url)
            .await
        {
            Ok(pool) => break pool,
            Err(e) => {
                retry_count += 1;
                if retry_count > 5 {
                    panic!("Failed to connect to database after 5 retries: {}", e);
                }
                tracing::warn!("Database not ready, retrying in 2s... (Attempt {})", retry_count);
                tokio::time::sleep(Duration::from_secs(2)).await;
            }
        }
    };

    tracing::info!("Database connected...");

    // Run Migrations Automatically
    tracing::info!("Running migrations...");
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to run database migrations");
    tracing::info!("Migrations applied successfully.");

    PgStore::new(pool)
}
