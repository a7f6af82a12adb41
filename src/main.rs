use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use livestream_api::config::Config;
use livestream_api::db::Database;
use livestream_api::{build_router, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = Config::load()?;
    tracing::info!(
        enforce_ownership = config.publish.enforce_ownership,
        token_ttl_hours = config.jwt.expiry_hours,
        "Configuration loaded successfully"
    );

    let db = Database::connect(&config).await?;
    db.run_migrations().await?;

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let state = AppState::postgres(config, db.pg.clone());
    let app = build_router(state);

    tracing::info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "livestream_api=debug,tower_http=debug".into());

    let json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}
