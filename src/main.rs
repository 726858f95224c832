use scout_api_rust::app::app;
use scout_api_rust::database::{pool, Stores};
use scout_api_rust::state::AppState;
use scout_api_rust::{config, is_production};

#[tokio::main]
async fn main() {
    // Load .env if present so cargo run picks up DATABASE_URL and provider keys.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "scout_api_rust=debug,tower_http=info".into()),
        )
        .init();

    let config = config::config();
    tracing::info!("Starting Scout API in {:?} mode", config.environment);

    let (stores, db_pool) = match std::env::var("DATABASE_URL") {
        Ok(url) if !url.is_empty() => {
            let db = pool::connect(&url)
                .await
                .unwrap_or_else(|e| panic!("failed to connect to database: {}", e));
            pool::ensure_schema(&db)
                .await
                .unwrap_or_else(|e| panic!("failed to prepare schema: {}", e));
            (Stores::postgres(db.clone()), Some(db))
        }
        _ => {
            if is_production!() {
                panic!("DATABASE_URL must be set in production");
            }
            tracing::warn!("DATABASE_URL not set; using in-memory stores (data is not persisted)");
            (Stores::in_memory(), None)
        }
    };

    let state = AppState::from_config(stores, db_pool)
        .unwrap_or_else(|e| panic!("failed to build application state: {}", e));
    let app = app(state);

    // Allow tests or deployments to override port via env
    let port = std::env::var("SCOUT_API_PORT")
        .ok()
        .or_else(|| std::env::var("PORT").ok())
        .and_then(|s| s.parse::<u16>().ok())
        .unwrap_or(3000);

    let bind_addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .unwrap_or_else(|e| panic!("failed to bind {}: {}", bind_addr, e));

    println!("🚀 Scout API server listening on http://{}", bind_addr);

    axum::serve(listener, app).await.expect("server");
}
