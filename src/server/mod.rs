//! JSON API consumed by the dashboard.
//!
//! | Method | Path                         | Response                         |
//! |--------|------------------------------|----------------------------------|
//! | GET    | `/api/data?type=latest`      | today's report                   |
//! | GET    | `/api/data?type=history`     | stored report dates              |
//! | GET    | `/api/data?date=YYYY-MM-DD`  | that day's report, or 404        |
//! | GET    | `/api/trends`                | seven days of tracked topic heat |
//! | POST   | `/api/crawl`                 | crawl now and store the result   |
//! | GET    | `/api/health`                | liveness check                   |

pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::{
    http::{header::CONTENT_TYPE, Method},
    routing::{get, post},
    Router,
};
use tokio::{
    net::TcpListener,
    signal::{self, ctrl_c},
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{info, warn};

use crate::app::{AppContext, Result};
use crate::daemon::{ScheduleConfig, Scheduler};
use crate::service::ReportService;

use routes::{crawl_handler, data_handler, health_handler, method_not_allowed, trends_handler};

#[derive(Clone)]
pub struct AppState {
    pub service: Arc<ReportService>,
}

pub fn router(service: Arc<ReportService>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([CONTENT_TYPE]);

    Router::new()
        .route("/api/data", get(data_handler))
        .route("/api/trends", get(trends_handler))
        .route("/api/crawl", post(crawl_handler))
        .route("/api/health", get(health_handler))
        .method_not_allowed_fallback(method_not_allowed)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(AppState { service })
}

/// Serve the API until Ctrl+C / SIGTERM, optionally crawling on a schedule
pub async fn start_server(ctx: AppContext, schedule: Option<ScheduleConfig>) -> Result<()> {
    let scheduler = schedule.map(|config| {
        let scheduler = Arc::new(Scheduler::new(ctx.service.clone(), config));
        let runner = scheduler.clone();
        tokio::spawn(async move { runner.run().await });
        scheduler
    });

    let app = router(ctx.service.clone());

    let address = ctx.config.server.address();
    info!("Binding to {address} ({} store)", ctx.store.backend());

    let listener = TcpListener::bind(&address).await?;
    info!("Server running on http://{address}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Some(scheduler) = scheduler {
        scheduler.stop();
    }
    info!("Server shut down");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = ctrl_c().await {
            warn!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }

        info!("Received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }

        info!("Received terminate signal, shutting down");
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
