use std::{net::SocketAddr, time::Duration};

use anyhow::Context;
use http::HeaderValue;
use tokio::signal;
use tower_http::{
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
};
use tracing::{error, info, warn};

use ledgerbook as app;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // .env is optional; real environment variables take precedence
    let _ = dotenvy::dotenv();

    // Console logging until the configured subscriber takes over
    let cfg = tracing::subscriber::with_default(
        app::config::bootstrap_subscriber(),
        app::config::load_config,
    )
    .context("failed to load configuration")?;
    app::config::init_tracing(cfg.log_level(), cfg.log_json);

    let descriptor = app::connection::ConnectionResolver::from_config(&cfg)
        .resolve()
        .await
        .map_err(|e| {
            error!("{}", e);
            e
        })
        .context("database connection is not configured")?;

    // Lazy pool: the server starts even while the database is unreachable
    let db_pool = app::db::establish_connection_from_app_config(&cfg, &descriptor)
        .await
        .context("failed to create database pool")?;

    if cfg.auto_init_schema {
        match app::schema::init_schema(&db_pool).await {
            Ok(report) => info!(tables = report.tables.len(), "Schema initialized at startup"),
            Err(e) => warn!("Schema initialization at startup failed: {}", e),
        }
    }

    let cors_layer = {
        let origins: Vec<HeaderValue> = cfg
            .cors_origins()
            .iter()
            .filter_map(|origin| HeaderValue::from_str(origin).ok())
            .collect();
        if origins.is_empty() {
            CorsLayer::permissive()
        } else {
            CorsLayer::new()
                .allow_origin(origins)
                .allow_methods(Any)
                .allow_headers(Any)
        }
    };

    let addr: SocketAddr = format!("{}:{}", cfg.host, cfg.port)
        .parse()
        .with_context(|| format!("invalid bind address {}:{}", cfg.host, cfg.port))?;

    let state = app::AppState::new(db_pool, cfg, descriptor);
    let router = app::build_router(state)
        .layer(TimeoutLayer::new(REQUEST_TIMEOUT))
        .layer(cors_layer);

    info!("ledgerbook listening on http://{}", addr);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;

    axum::serve(listener, router.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("ledgerbook stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("shutdown signal received");
}
