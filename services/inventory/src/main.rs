use anyhow::{Context, Result};
use sqlx::migrate::Migrator;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use common::database::{DatabaseConfig, health_check, init_pool, run_migrations};
use inventory::{
    AppState,
    clock::SystemClock,
    config::{Settings, StorageBackend},
    create_router,
    credentials::EmailPolicy,
    repositories::{PgItemRepository, PgUserRepository},
};

static MIGRATOR: Migrator = sqlx::migrate!();

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = FmtSubscriber::builder().with_env_filter(filter).finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("Starting inventory service");

    let settings = Settings::load()?;
    let emails = EmailPolicy::new(&settings.organization_domain)
        .with_context(|| format!("invalid organization domain {}", settings.organization_domain))?;
    let cookie_key = settings.cookie_key()?;
    let clock = Arc::new(SystemClock);

    let app_state = match settings.storage {
        StorageBackend::Postgres => {
            // Initialize database connection pool
            let db_config = DatabaseConfig::from_env()?;
            let pool = init_pool(&db_config).await?;

            // Check database connectivity
            if health_check(&pool).await? {
                info!("Database connection successful");
            } else {
                anyhow::bail!("Failed to connect to database");
            }

            run_migrations(&pool, &MIGRATOR).await?;

            AppState::new(
                Arc::new(PgUserRepository::new(pool.clone())),
                Arc::new(PgItemRepository::new(pool)),
                emails,
                clock,
                cookie_key,
            )
        }
        StorageBackend::Memory => {
            warn!("Using in-memory storage, data is lost on shutdown");
            AppState::in_memory(emails, clock, cookie_key)
        }
    };

    match &settings.bootstrap_admin {
        Some(admin) => match app_state.directory.ensure_account(admin.candidate()).await? {
            Some(id) => info!("Bootstrap administrator {} created with id {}", admin.email, id),
            None => info!("Bootstrap administrator {} already exists", admin.email),
        },
        None => info!("No bootstrap administrator configured"),
    }

    info!("Inventory service initialized successfully");

    // Start the web server
    let app = create_router(app_state);

    let listener = TcpListener::bind(&settings.bind_address).await?;
    info!("Inventory service listening on {}", settings.bind_address);

    axum::serve(listener, app).await?;

    Ok(())
}
