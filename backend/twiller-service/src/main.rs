use std::io;
use std::sync::Arc;

use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpServer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use twiller_service::repository::{self, MemoryRepository, PostgresRepository, Repository};
use twiller_service::services::EmailService;
use twiller_service::websocket::BroadcastRegistry;
use twiller_service::{handlers, AppState, Config};

/// JSON body limit; inline image payloads from the composer are large.
const JSON_PAYLOAD_LIMIT: usize = 50 * 1024 * 1024;

#[actix_web::main]
async fn main() -> io::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,actix_web=info,sqlx=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(err) => {
            tracing::error!("Configuration loading failed: {:#}", err);
            eprintln!("ERROR: Failed to load configuration: {}", err);
            std::process::exit(1);
        }
    };

    tracing::info!("Starting twiller-service v{}", env!("CARGO_PKG_VERSION"));
    config.log_summary();

    // Primary backend is PostgreSQL; a failed connection at startup selects
    // the in-memory backend with the same contract instead of a crash.
    let store: Arc<dyn Repository> = match repository::connect(&config.database).await {
        Ok(pool) => {
            tracing::info!("Connected to PostgreSQL and ran migrations");
            Arc::new(PostgresRepository::new(pool))
        }
        Err(err) => {
            tracing::warn!(error = %format!("{:#}", err), "Database connection failed");
            tracing::warn!("Using in-memory fallback for data storage");
            Arc::new(MemoryRepository::new())
        }
    };
    tracing::info!(backend = store.backend_name(), "Storage backend selected");

    let email = match EmailService::new(&config.email, &config.frontend) {
        Ok(email) => email,
        Err(err) => {
            tracing::error!("Email service initialization failed: {}", err);
            std::process::exit(1);
        }
    };

    let state = AppState {
        store,
        registry: BroadcastRegistry::new(),
        email,
    };

    let bind_address = (config.app.host.clone(), config.app.port);
    tracing::info!(
        "Server listening on http://{}:{}",
        bind_address.0,
        bind_address.1
    );

    HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(state.clone()))
            .app_data(web::JsonConfig::default().limit(JSON_PAYLOAD_LIMIT))
            .wrap(Cors::permissive())
            .wrap(Logger::default())
            .wrap(tracing_actix_web::TracingLogger::default())
            .configure(handlers::configure)
    })
    .bind(bind_address)?
    .run()
    .await
}
