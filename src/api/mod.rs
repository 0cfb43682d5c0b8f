//! HTTP interface - JSON API, admin CRUD and the demo pages.
//!
//! All routes share one [`AppState`] holding the database connection and the compiled
//! templates. Handlers return [`crate::errors::Result`], whose error type renders itself as a
//! JSON error response with the matching status code.

/// Generic create/read/update/delete over every table
pub mod admin;

/// Demo pages rendered from embedded templates
pub mod demo;

/// Order entry endpoints
pub mod orders;

/// Product list endpoint
pub mod products;

use crate::errors::Result;
use axum::{
    Router,
    http::{Method, header::CONTENT_TYPE},
};
use sea_orm::DatabaseConnection;
use std::{sync::Arc, time::Duration};
use tera::Tera;
use tokio::{net::TcpListener, signal};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{error, info};

/// Shared state handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub templates: Arc<Tera>,
}

impl AppState {
    /// Builds the state, compiling the embedded templates.
    pub fn new(db: DatabaseConnection) -> Result<Self> {
        Ok(Self {
            db,
            templates: Arc::new(demo::templates()?),
        })
    }
}

/// Builds the application router with all routes and middleware.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([CONTENT_TYPE])
        .max_age(Duration::from_secs(60 * 60));

    Router::new()
        .merge(products::routes())
        .merge(orders::routes())
        .nest("/admin", admin::routes())
        .merge(demo::routes())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Binds `address` and serves the application until Ctrl+C or SIGTERM.
pub async fn serve(state: AppState, address: &str) -> Result<()> {
    let listener = TcpListener::bind(address).await?;
    info!("Server running on {address}");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shut down");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        match signal::ctrl_c().await {
            Ok(()) => info!("Received Ctrl+C, shutting down"),
            Err(e) => {
                error!("Failed to install Ctrl+C handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                error!("Failed to install signal handler: {e}");
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
}

#[cfg(test)]
pub(crate) mod test_support {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use serde_json::Value;
    use tower::ServiceExt;

    /// Sends one request through a fresh router and returns the status and JSON body.
    pub async fn send(
        state: &AppState,
        method: Method,
        uri: &str,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let request = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => request
                .header(CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string())),
            None => request.body(Body::empty()),
        }
        .unwrap();

        let response = router(state.clone()).oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, json)
    }

    /// Reads a JSON decimal, serialized as a string.
    pub fn decimal(value: &Value) -> rust_decimal::Decimal {
        value.as_str().unwrap().parse().unwrap()
    }

    pub async fn test_state() -> crate::errors::Result<AppState> {
        AppState::new(crate::test_utils::setup_test_db().await?)
    }
}
