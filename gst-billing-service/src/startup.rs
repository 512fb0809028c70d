use crate::config::BillingConfig;
use crate::handlers;
use crate::services::{LedgerWriter, TemplateFiller};
use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use service_core::error::AppError;
use service_core::middleware::{metrics_middleware, request_id_middleware};
use std::future::Future;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;

#[derive(Clone)]
pub struct AppState {
    pub config: BillingConfig,
    pub ledger: LedgerWriter,
    pub filler: Arc<TemplateFiller>,
}

pub struct Application {
    port: u16,
    listener: TcpListener,
    router: Router,
    state: AppState,
}

impl Application {
    pub async fn build(config: BillingConfig) -> Result<Self, AppError> {
        config.layout.resolve().map_err(|e| {
            tracing::error!("Invalid template layout: {:#}", e);
            AppError::ConfigError(e)
        })?;

        let template_path = &config.storage.template_path;
        if !template_path.is_file() {
            tracing::error!(path = %template_path.display(), "Invoice template not found");
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "invoice template {:?} not found",
                template_path
            )));
        }

        tokio::fs::create_dir_all(&config.storage.output_dir)
            .await
            .map_err(|e| {
                tracing::error!(
                    "Failed to create output directory {}: {}",
                    config.storage.output_dir.display(),
                    e
                );
                AppError::from(e)
            })?;

        let ledger = LedgerWriter::start(&config.storage.ledger_path, config.ledger.queue_capacity)
            .await
            .map_err(|e| {
                tracing::error!("Failed to open ledger: {}", e);
                AppError::ConfigError(anyhow::Error::new(e))
            })?;

        let filler = Arc::new(TemplateFiller::new(
            &config.storage.template_path,
            &config.storage.output_dir,
            config.layout.clone(),
        ));

        let state = AppState {
            config: config.clone(),
            ledger,
            filler,
        };

        let static_dir = &config.storage.static_dir;
        let router = Router::new()
            .route("/health", get(handlers::health_check))
            .route("/metrics", get(handlers::metrics_endpoint))
            .route("/save_invoice", post(handlers::save_invoice))
            .route("/invoices", get(handlers::list_invoices))
            .route("/invoices/:inv_num", get(handlers::get_invoice))
            .route_service("/", ServeFile::new(static_dir.join("index.html")))
            .nest_service("/static", ServeDir::new(static_dir))
            .route_layer(middleware::from_fn(metrics_middleware))
            .layer(middleware::from_fn(request_id_middleware))
            .layer(TraceLayer::new_for_http())
            .with_state(state.clone());

        let addr = format!("{}:{}", config.common.host, config.common.port);
        let listener = TcpListener::bind(&addr).await.map_err(|e| {
            tracing::error!("Failed to bind TCP listener to {}: {}", addr, e);
            AppError::from(e)
        })?;
        let port = listener.local_addr()?.port();

        tracing::info!(
            port,
            ledger = %config.storage.ledger_path.display(),
            template = %config.storage.template_path.display(),
            "Listening on {}",
            port
        );

        Ok(Self {
            port,
            listener,
            router,
            state,
        })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn ledger(&self) -> &LedgerWriter {
        &self.state.ledger
    }

    pub async fn run_until_stopped(self) -> std::io::Result<()> {
        axum::serve(self.listener, self.router).await
    }

    /// Serve until `signal` resolves, letting in-flight requests finish.
    pub async fn run_until<F>(self, signal: F) -> std::io::Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        axum::serve(self.listener, self.router)
            .with_graceful_shutdown(signal)
            .await
    }
}
