use std::sync::Arc;
use sqlx::sqlite::SqlitePoolOptions;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use atrium::{
    api,
    auth::AuthService,
    config::Settings,
    repository,
    service::ServiceContext,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "atrium=debug,tower_http=debug,axum=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let settings = Settings::new().unwrap_or_else(|e| {
        tracing::warn!("Failed to load config: {}. Using defaults.", e);
        Settings::default()
    });

    tracing::info!("Starting Atrium server on {}:{}", settings.server.host, settings.server.port);

    // Initialize database
    let db_pool = SqlitePoolOptions::new()
        .max_connections(settings.database.max_connections)
        .connect(&settings.database.url)
        .await?;

    // Run migrations
    sqlx::migrate!("./migrations")
        .run(&db_pool)
        .await?;

    // Initialize auth service
    let auth_service = Arc::new(AuthService::new(db_pool.clone()));

    // Initialize repositories
    let user_repo = Arc::new(repository::SqliteUserRepository::new(db_pool.clone()));
    let announcement_repo = Arc::new(repository::SqliteAnnouncementRepository::new(db_pool.clone()));
    let receipt_repo = Arc::new(repository::SqliteReadReceiptRepository::new(db_pool.clone()));
    let credit_repo = Arc::new(repository::SqliteCreditRepository::new(db_pool.clone()));
    let document_repo = Arc::new(repository::SqliteDocumentRepository::new(db_pool.clone()));

    // Create service context
    let service_context = Arc::new(ServiceContext::new(
        user_repo,
        announcement_repo,
        receipt_repo,
        credit_repo,
        document_repo,
        auth_service.clone(),
        &settings,
    ));

    // Expired sessions pile up otherwise; clear them on boot.
    match auth_service.cleanup_expired_sessions().await {
        Ok(removed) if removed > 0 => tracing::info!("Removed {} expired sessions", removed),
        Ok(_) => {}
        Err(e) => tracing::warn!("Session cleanup failed: {}", e),
    }

    let app = api::create_app(service_context, Arc::new(settings.clone()));

    let listener = tokio::net::TcpListener::bind(
        format!("{}:{}", settings.server.host, settings.server.port)
    ).await?;

    tracing::info!("Server listening on http://{}:{}", settings.server.host, settings.server.port);

    axum::serve(listener, app).await?;

    Ok(())
}
