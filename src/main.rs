#![allow(clippy::result_large_err)]

use coffee_orders::{
    api::{self, AppState},
    config::{self, database},
    core::seed,
    errors::Result,
};
use dotenvy::dotenv;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // 2. Load .env file, non-fatal since variables can be set externally
    dotenv().ok();

    // 3. Load the application configuration
    let app_config = config::load_app_configuration()
        .inspect_err(|e| error!("Failed to load application configuration: {e}"))?;

    // 4. Connect and make sure the schema exists
    let db = database::create_connection(&app_config.database_url)
        .await
        .inspect(|_| info!("Database connection established"))
        .inspect_err(|e| error!("Failed to connect to database: {e}"))?;
    database::create_tables(&db)
        .await
        .inspect_err(|e| error!("Failed to create tables: {e}"))?;

    // 5. Seed the menu on first start
    seed::seed_from_file(&db, &app_config.menu_path)
        .await
        .inspect_err(|e| error!("Failed to seed menu: {e}"))?;

    // 6. Serve the API
    let state = AppState::new(db)?;
    api::serve(state, &app_config.socket_address()).await
}
