use std::sync::Arc;

use axum::routing::get;

use nutrifit_api::config::AppConfig;
use nutrifit_api::{router, run_migrations, AppState};
use nutrifit_shared::clients::db::create_pool;
use nutrifit_shared::middleware::{init_metrics, init_tracing};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing("nutrifit-api");

    let config = AppConfig::load()?;
    let port = config.port;

    let db = create_pool(&config.database_url, config.db_pool_size)?;

    if config.run_migrations {
        let mut conn = db.get()?;
        run_migrations(&mut conn)?;
    }

    let prometheus = init_metrics()?;

    let state = Arc::new(AppState::new(db, config));

    let app = router(state).route(
        "/metrics",
        get(move || {
            let handle = prometheus.clone();
            async move { handle.render() }
        }),
    );

    let addr = format!("0.0.0.0:{port}");
    tracing::info!(addr = %addr, "nutrifit-api starting");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
