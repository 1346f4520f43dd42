use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use registrar::infrastructure::AppState;
use registrar::{config, db, server};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "registrar=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = config::Config::from_env();

    // Initialize database
    let db = db::init_db(&config.database_url).await?;

    let state = AppState::new(db, config.api_key.as_str());
    server::serve(&config, state).await?;

    Ok(())
}
