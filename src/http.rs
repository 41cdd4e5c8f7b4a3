// Copyright 2022 houseme
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! HTTP surface: a single `GET /generate` endpoint returning a fresh id as
//! JSON.

use crate::generator::IdSource;
use crate::id::FlakeId;
use axum::{
    Json, Router,
    extract::{Request, State},
    http::StatusCode,
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::get,
};
use serde::{Deserialize, Serialize};
use std::{net::SocketAddr, sync::Arc, time::Duration};
use tokio::{net::TcpListener, signal};
use tower_http::{timeout::RequestBodyTimeoutLayer, trace::TraceLayer};

/// Time allowed for the client to send the request body.
pub const READ_TIMEOUT: Duration = Duration::from_secs(1);
/// Time allowed for handling a request and producing the response.
pub const WRITE_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpConfig {
    pub addr: SocketAddr,
    pub read_timeout: Duration,
    pub write_timeout: Duration,
}

impl HttpConfig {
    /// Listen on every interface at `port` with the default timeouts.
    pub fn with_port(port: u16) -> Self {
        Self {
            addr: SocketAddr::from(([0, 0, 0, 0], port)),
            read_timeout: READ_TIMEOUT,
            write_timeout: WRITE_TIMEOUT,
        }
    }
}

/// Body of a successful `GET /generate`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerateResponse {
    /// The canonical encoded id.
    pub id: String,
    pub flake: FlakeId,
}

impl From<FlakeId> for GenerateResponse {
    fn from(id: FlakeId) -> Self {
        Self {
            id: id.to_string(),
            flake: id,
        }
    }
}

#[derive(Clone)]
struct AppState {
    source: Arc<dyn IdSource>,
}

/// Build the router with the default timeouts.
pub fn router(source: Arc<dyn IdSource>) -> Router {
    with_timeouts(routes(source), READ_TIMEOUT, WRITE_TIMEOUT)
}

fn routes(source: Arc<dyn IdSource>) -> Router {
    Router::new()
        .route("/generate", get(generate))
        .with_state(AppState { source })
}

fn with_timeouts(router: Router, read_timeout: Duration, write_timeout: Duration) -> Router {
    router
        .layer(middleware::from_fn_with_state(write_timeout, deadline))
        .layer(RequestBodyTimeoutLayer::new(read_timeout))
        .layer(TraceLayer::new_for_http())
}

async fn generate(State(state): State<AppState>) -> Json<GenerateResponse> {
    Json(state.source.generate().into())
}

async fn deadline(State(limit): State<Duration>, request: Request, next: Next) -> Response {
    let uri = request.uri().clone();
    match tokio::time::timeout(limit, next.run(request)).await {
        Ok(response) => response,
        Err(_) => {
            tracing::warn!(%uri, ?limit, "request timed out");
            (StatusCode::SERVICE_UNAVAILABLE, "request timed out").into_response()
        }
    }
}

/// Serve `source` until Ctrl+C or SIGTERM.
pub async fn serve(config: HttpConfig, source: Arc<dyn IdSource>) -> std::io::Result<()> {
    let listener = TcpListener::bind(config.addr).await?;
    let addr = listener.local_addr()?;
    tracing::info!(
        %addr,
        read_timeout = ?config.read_timeout,
        write_timeout = ?config.write_timeout,
        "listening"
    );

    let app = with_timeouts(routes(source), config.read_timeout, config.write_timeout);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("server shut down");
    Ok(())
}

async fn shutdown_signal() {
    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    tokio::select! {
        () = ctrl_c => tracing::info!("received Ctrl+C signal"),
        () = terminate => tracing::info!("received SIGTERM signal"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{Body, to_bytes};
    use axum::http::{Method, header};
    use tower::ServiceExt;

    struct FixedSource(FlakeId);

    impl IdSource for FixedSource {
        fn generate(&self) -> FlakeId {
            self.0
        }
    }

    fn fixed_id() -> FlakeId {
        FlakeId::new(1_620_000_000_000, 0x123456, 42)
    }

    fn request(method: Method, uri: &str) -> Request {
        axum::http::Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .unwrap()
    }

    #[tokio::test]
    async fn generate_returns_json() {
        let app = router(Arc::new(FixedSource(fixed_id())));

        let response = app
            .oneshot(request(Method::GET, "/generate"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "application/json"
        );

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let parsed: GenerateResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(parsed.id, "000001792F864800-000000123456-002A");
        assert_eq!(parsed.flake, fixed_id());
        assert_eq!(parsed.id.parse::<FlakeId>().unwrap(), parsed.flake);
    }

    #[tokio::test]
    async fn generate_json_field_names() {
        let app = router(Arc::new(FixedSource(fixed_id())));

        let response = app
            .oneshot(request(Method::GET, "/generate"))
            .await
            .unwrap();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value: serde_json::Value = serde_json::from_slice(&body).unwrap();

        assert_eq!(value["flake"]["timestamp"], 1_620_000_000_000u64);
        assert_eq!(value["flake"]["worker_id"], 0x123456);
        assert_eq!(value["flake"]["sequence"], 42);
    }

    #[tokio::test]
    async fn other_methods_are_rejected() {
        for method in [Method::POST, Method::PUT, Method::DELETE] {
            let app = router(Arc::new(FixedSource(fixed_id())));
            let response = app.oneshot(request(method.clone(), "/generate")).await.unwrap();
            assert_eq!(
                response.status(),
                StatusCode::METHOD_NOT_ALLOWED,
                "method {method}"
            );
        }
    }

    #[tokio::test]
    async fn unknown_path_is_not_found() {
        let app = router(Arc::new(FixedSource(fixed_id())));
        let response = app.oneshot(request(Method::GET, "/nope")).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn slow_handler_hits_write_timeout() {
        let slow = Router::new().route(
            "/slow",
            get(|| async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                "done"
            }),
        );
        let app = with_timeouts(slow, READ_TIMEOUT, Duration::from_millis(10));

        let response = app.oneshot(request(Method::GET, "/slow")).await.unwrap();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], b"request timed out");
    }

    #[test]
    fn config_with_port() {
        let config = HttpConfig::with_port(8080);
        assert_eq!(config.addr.port(), 8080);
        assert_eq!(config.read_timeout, READ_TIMEOUT);
        assert_eq!(config.write_timeout, WRITE_TIMEOUT);
    }
}
