//! Application startup and lifecycle management.

use crate::config::InvoicingConfig;
use crate::handlers::{self, dashboard, invoices};
use crate::services::{Database, InMemoryInvoiceRepository, InvoiceRepository, SessionVerifier};
use axum::extract::FromRef;
use axum::middleware::from_fn;
use axum::routing::get;
use axum::Router;
use secrecy::ExposeSecret;
use service_core::error::AppError;
use service_core::middleware::{
    metrics::metrics_middleware, security_headers::security_headers_middleware,
    tracing::{request_id_middleware, REQUEST_ID_HEADER},
};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::trace::TraceLayer;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub repository: Arc<dyn InvoiceRepository>,
    pub sessions: Arc<SessionVerifier>,
}

impl FromRef<AppState> for Arc<SessionVerifier> {
    fn from_ref(state: &AppState) -> Self {
        state.sessions.clone()
    }
}

impl AppState {
    pub fn new(config: &InvoicingConfig, repository: Arc<dyn InvoiceRepository>) -> Self {
        Self {
            repository,
            sessions: Arc::new(SessionVerifier::new(&config.auth.jwt_secret)),
        }
    }
}

/// Build the HTTP router. Public so tests can drive it without a listener.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health_check))
        .route("/ready", get(handlers::readiness_check))
        .route("/metrics", get(handlers::metrics_endpoint))
        .route("/dashboard", get(dashboard::dashboard))
        .route(
            "/dashboard/invoices",
            get(invoices::list_invoices).post(invoices::create_invoice),
        )
        .route(
            "/dashboard/invoices/:id",
            get(invoices::get_invoice).post(invoices::update_invoice),
        )
        .route(
            "/dashboard/invoices/:id/paid",
            get(invoices::confirm_mark_paid).post(invoices::mark_paid),
        )
        .route("/dashboard/invoice-total", get(invoices::total_preview))
        .layer(from_fn(metrics_middleware))
        .layer(from_fn(security_headers_middleware))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &axum::http::Request<_>| {
                let request_id = request
                    .headers()
                    .get(REQUEST_ID_HEADER)
                    .and_then(|value| value.to_str().ok())
                    .unwrap_or("-");

                tracing::info_span!(
                    "http_request",
                    request_id = %request_id,
                    method = %request.method(),
                    uri = %request.uri(),
                    version = ?request.version(),
                    user_id = tracing::field::Empty,
                )
            }),
        )
        .layer(from_fn(request_id_middleware))
        .with_state(state)
}

/// Pick the invoice store: PostgreSQL when a URL is configured, otherwise an
/// in-memory map (refused in production).
async fn build_repository(config: &InvoicingConfig) -> Result<Arc<dyn InvoiceRepository>, AppError> {
    match &config.database.url {
        Some(url) => {
            let db = Database::new(
                url.expose_secret(),
                config.database.max_connections,
                config.database.min_connections,
            )
            .await?;
            db.run_migrations().await?;
            Ok(Arc::new(db))
        }
        None if config.is_production() => Err(AppError::ConfigError(anyhow::anyhow!(
            "DATABASE_URL is required in production"
        ))),
        None => {
            tracing::warn!("DATABASE_URL not set; invoices are kept in memory and lost on restart");
            Ok(Arc::new(InMemoryInvoiceRepository::new()))
        }
    }
}

/// Application container for managing server lifecycle.
pub struct Application {
    port: u16,
    listener: TcpListener,
    router: Router,
}

impl Application {
    /// Build the application with the given configuration.
    pub async fn build(config: InvoicingConfig) -> Result<Self, AppError> {
        let repository = build_repository(&config).await?;
        let state = AppState::new(&config, repository);

        // Port 0 binds a random port for testing.
        let addr = SocketAddr::from(([0, 0, 0, 0], config.common.port));
        let listener = TcpListener::bind(addr).await.map_err(|e| {
            tracing::error!("Failed to bind HTTP listener to {}: {}", addr, e);
            AppError::from(e)
        })?;
        let port = listener.local_addr()?.port();

        tracing::info!("Invoicing service: HTTP on port {}", port);

        Ok(Self {
            port,
            listener,
            router: build_router(state),
        })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// Serve until Ctrl+C or SIGTERM.
    pub async fn run_until_stopped(self) -> std::io::Result<()> {
        axum::serve(self.listener, self.router)
            .with_graceful_shutdown(shutdown_signal())
            .await
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
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

    tracing::info!("Shutdown signal received");
}
