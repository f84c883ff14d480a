use anyhow::Context;
use api::auth::TokenKeys;
use api::db::{self, PgStore};
use api::{router, AppState, Settings};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::new().context("failed to load settings")?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&settings.log.filter)),
        )
        .init();

    let pool = db::connect(&settings.database)
        .await
        .context("failed to connect to database")?;
    db::run_migrations(&pool)
        .await
        .context("failed to run migrations")?;

    let tokens = TokenKeys::new(&settings.auth.jwt_secret, settings.auth.token_ttl_days);
    let app = router(AppState::new(PgStore::new(pool), tokens));

    let listener = tokio::net::TcpListener::bind(&settings.server.bind)
        .await
        .with_context(|| format!("failed to bind {}", settings.server.bind))?;
    tracing::info!("Server listening on {}", settings.server.bind);

    axum::serve(listener, app).await?;
    Ok(())
}
