mod api;
mod middleware;
mod scheduler;
mod services;

use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use crate::{
    api::{build_app, default_rate_limit_state, AppState},
    middleware::AuthState,
    services::Services,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = aeo_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let pool_config = aeo_db::PoolConfig::from_app_config(&config);
    let pool = aeo_db::connect_pool(&config.database_url, pool_config).await?;
    aeo_db::run_migrations(&pool).await?;

    let interrupted =
        aeo_db::fail_interrupted_scans(&pool, "scan interrupted by server restart").await?;
    if interrupted > 0 {
        tracing::warn!(interrupted, "marked unfinished scans as failed");
    }

    let services = Arc::new(Services::from_app_config(&pool, &config));
    let _scheduler =
        scheduler::build_scheduler(pool.clone(), Arc::clone(&services), &config.scan_schedule)
            .await?;

    let auth = AuthState::from_env(matches!(config.env, aeo_core::Environment::Development))?;
    let app = build_app(AppState { pool, services }, auth, default_rate_limit_state());

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    tracing::info!(addr = %config.bind_addr, env = %config.env, "aeo-server listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("received shutdown signal, starting graceful shutdown");
}
