//! Http surface built on `axum`.
//!
//! Routes are thin wrappers around [`Service`] operations. The service is
//! shared with handlers through a request extension.

pub mod admin;
pub mod error;
pub mod extract;
pub mod image;

pub use extract::admin::Admin;

use std::future::Future;

use axum::extract::DefaultBodyLimit;
use axum::Extension;
use tower_http::trace::TraceLayer;

use crate::{Config, Result, Service};

pub type Router = axum::Router;

pub type ServiceExt = Extension<Service>;

/// Collects all the application routes.
pub fn router() -> Router {
    Router::new().merge(image::router()).merge(admin::router())
}

/// Wraps the routes with the shared service and common middleware.
pub fn app(service: Service) -> Router {
    let max_size = service.config.upload.max_size;
    router()
        .layer(DefaultBodyLimit::max(max_size))
        .layer(TraceLayer::new_for_http())
        .layer(Extension(service))
}

/// Initializes application state as defined in config and starts the web
/// server. Runs until the process is stopped.
pub async fn start(config: Config) -> Result<()> {
    start_with_shutdown(config, std::future::pending()).await
}

/// Same as [`start`] but returns once `shutdown` completes, after in-flight
/// requests were handled.
pub async fn start_with_shutdown(
    config: Config,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> Result<()> {
    crate::tracing::init(&config).unwrap_or_else(|e| {
        log::warn!("failed to initialize tracing (perhaps it was already initialized?): {e}")
    });

    crate::init::initialize(&config)?;

    let addr = config.address;
    let service = Service::from_config(config)?;
    let router = app(service);

    // Serve the application
    tracing::info!("starting server at {addr}");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown)
        .await?;

    tracing::info!("server stopped");
    Ok(())
}
