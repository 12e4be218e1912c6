/*
 * Responsibility
 * - Config読み込み → 依存生成 → Router 組み立て
 * - Middleware pipeline の適用 (request id / log / metrics / timeout / body limit / auth)
 * - axum::serve() で起動、SIGINT/SIGTERM で graceful shutdown
 */
use std::sync::Arc;

use anyhow::Result;
use axum::{Router, routing::get};
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use crate::{
    api,
    config::Config,
    middleware::{basic_auth, metrics::METRICS_PATH, pipeline},
    repos::PgStore,
    services::metrics::HttpMetrics,
    state::AppState,
};

pub async fn run() -> Result<()> {
    init_tracing();
    install_panic_hook();

    let config = Config::from_env()?;

    // 接続は最初のクエリまで遅延させる (DB 不在でも起動し、_ready で 503 を返す)
    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect_lazy(&config.database_url)?;

    let metrics = Arc::new(HttpMetrics::new()?);
    let state = AppState::from_store(Arc::new(PgStore::new(pool)), metrics);

    let app = build_router(state, &config);

    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    tracing::info!(
        addr = %config.addr,
        env = ?config.app_env,
        max_body_bytes = config.max_body_bytes,
        timeout_secs = config.request_timeout.as_secs(),
        "listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("server stopped");
    Ok(())
}

pub fn build_router(state: AppState, config: &Config) -> Router {
    build_router_with(
        state,
        &config.pipeline(),
        config.metrics_credentials.clone(),
    )
}

/// `Config` を持たないテスト用の入口
pub fn build_router_with(
    state: AppState,
    pipeline_config: &pipeline::PipelineConfig,
    metrics_credentials: Option<basic_auth::BasicCredentials>,
) -> Router {
    let metrics_route = basic_auth::protect(get(api::metrics::metrics), metrics_credentials);

    let router = Router::new()
        .route(METRICS_PATH, metrics_route)
        .nest("/api/v1", api::v1::routes());

    pipeline::apply(router, &state, pipeline_config).with_state(state)
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,tower_http=info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .init();
}

fn install_panic_hook() {
    std::panic::set_hook(Box::new(|info| {
        tracing::error!(panic = %info, "panic");
    }));
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %err, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("SIGINT received, shutting down"),
        _ = terminate => tracing::info!("SIGTERM received, shutting down"),
    }
}
