//! # HTTP Server
//!
//! Combines the dataset and health routers behind CORS, request tracing
//! and a body size limit.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{extract::DefaultBodyLimit, Router};
use tokio::net::TcpListener;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use super::config::HttpServerConfig;
use super::dataset_routes::{dataset_routes, DatasetState};
use super::errors::ServerError;
use super::health_routes::health_routes;
use crate::api::DatasetService;

/// HTTP server for the dataset service
pub struct HttpServer {
    config: HttpServerConfig,
    router: Router,
}

impl HttpServer {
    /// Create a new HTTP server serving `service`
    pub fn new(config: HttpServerConfig, service: DatasetService) -> Self {
        let router = Self::build_router(&config, service);
        Self { config, router }
    }

    /// Build the combined router with all endpoints
    fn build_router(config: &HttpServerConfig, service: DatasetService) -> Router {
        let dataset_state = Arc::new(DatasetState::new(service));

        let cors = if config.cors_origins.is_empty() {
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any)
        } else {
            let origins: Vec<_> = config
                .cors_origins
                .iter()
                .filter_map(|s| match s.parse() {
                    Ok(origin) => Some(origin),
                    Err(_) => {
                        warn!(origin = %s, "ignoring invalid CORS origin");
                        None
                    }
                })
                .collect();

            CorsLayer::new()
                .allow_origin(AllowOrigin::list(origins))
                .allow_methods(Any)
                .allow_headers(Any)
        };

        Router::new()
            .merge(health_routes())
            .merge(dataset_routes(dataset_state))
            .layer(DefaultBodyLimit::max(config.max_upload_bytes))
            .layer(TraceLayer::new_for_http())
            .layer(cors)
    }

    /// Get the socket address
    pub fn socket_addr(&self) -> String {
        self.config.socket_addr()
    }

    /// Get the router (for testing)
    pub fn router(self) -> Router {
        self.router
    }

    /// Start the HTTP server (async)
    pub async fn start(self) -> Result<(), ServerError> {
        let raw = self.config.socket_addr();
        let addr: SocketAddr = raw
            .parse()
            .map_err(|_| ServerError::InvalidAddress(raw.clone()))?;

        let listener = TcpListener::bind(addr).await.map_err(|source| ServerError::Bind {
            addr: raw.clone(),
            source,
        })?;

        info!(%addr, "gridstore HTTP server listening");
        axum::serve(listener, self.router).await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::DatasetStore;
    use tempfile::TempDir;

    fn service(temp_dir: &TempDir) -> DatasetService {
        DatasetService::new(DatasetStore::open(temp_dir.path()).unwrap())
    }

    #[test]
    fn test_server_with_default_port() {
        let temp_dir = TempDir::new().unwrap();
        let server = HttpServer::new(HttpServerConfig::default(), service(&temp_dir));
        assert_eq!(server.socket_addr(), "0.0.0.0:5001");
    }

    #[test]
    fn test_router_builds_with_origins() {
        let temp_dir = TempDir::new().unwrap();
        let config = HttpServerConfig {
            cors_origins: vec!["http://localhost:3000".into(), "not an origin\n".into()],
            ..HttpServerConfig::with_port(8080)
        };
        let server = HttpServer::new(config, service(&temp_dir));
        assert_eq!(server.socket_addr(), "0.0.0.0:8080");
        let _router = server.router();
    }
}
