use std::sync::Arc;

use service_booking::api::routes::{create_app_state, create_routes};
use service_booking::config::{run_migrations, AppConfig, DatabaseConfig, DatabaseSeeder};
use service_booking::services::{SmtpConfig, VerificationMailer};
use tokio::net::TcpListener;
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let config = AppConfig::from_env()?;
    let database_config = DatabaseConfig::from_env()?;

    let pool = database_config.create_pool().await?;
    run_migrations(&pool).await?;

    DatabaseSeeder::new(pool.clone()).seed_all().await?;

    let mailer = Arc::new(VerificationMailer::new(SmtpConfig::from_env())?);
    let state = create_app_state(pool, &config, mailer);
    let app = create_routes(state);

    let listener = TcpListener::bind(config.server_address()).await?;
    info!("Service booking API starting on http://{}", config.server_address());

    axum::serve(listener, app).await?;

    Ok(())
}
