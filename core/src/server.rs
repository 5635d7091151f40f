//! # Lookup Server
//!
//! HTTP front of the resolver. Decodes a [`LookupRequest`], derives the
//! caller's identity according to the deployment's [`IdentityMode`], resolves
//! the port and answers with a bare JSON integer.
//!
//! | Outcome                       | Status | Body            |
//! |-------------------------------|--------|-----------------|
//! | resolved                      | 200    | host port       |
//! | not exposed                   | 200    | `0`             |
//! | malformed body / port         | 400    | diagnostic text |
//! | no matching container         | 404    | diagnostic text |
//! | inventory unavailable         | 502    | diagnostic text |
//!
//! The server holds no per-session state; every request is independent.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{ConnectInfo, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use dockport_common::config::{HEALTH_PATH, IdentityMode};
use dockport_common::container::{IdentityQuery, NOT_EXPOSED, PortQuery, Resolution};
use dockport_common::error::{InventoryError, ValidationError};
use thiserror::Error;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{Span, info, warn};

use crate::protocol::LookupRequest;
use crate::resolver::PortResolver;

#[derive(Debug, Error)]
pub enum LookupError {
    #[error(transparent)]
    Invalid(#[from] ValidationError),

    #[error("unable to lookup the port {port} for container {identity}")]
    NotFound { identity: String, port: PortQuery },

    #[error(transparent)]
    Inventory(InventoryError),

    #[error("peer address unavailable, cannot derive source identity")]
    PeerUnavailable,
}

impl LookupError {
    pub fn status(&self) -> StatusCode {
        match self {
            LookupError::Invalid(_) => StatusCode::BAD_REQUEST,
            LookupError::NotFound { .. } => StatusCode::NOT_FOUND,
            LookupError::Inventory(_) => StatusCode::BAD_GATEWAY,
            LookupError::PeerUnavailable => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for LookupError {
    fn into_response(self) -> Response {
        (self.status(), self.to_string()).into_response()
    }
}

#[derive(Clone)]
pub struct LookupServer {
    resolver: Arc<PortResolver>,
    mode: IdentityMode,
    span: Span,
}

impl LookupServer {
    pub fn new(resolver: Arc<PortResolver>, mode: IdentityMode, span: Span) -> Self {
        Self { resolver, mode, span }
    }

    /// Lookup endpoint on `lookup_path`, plus `GET /health`.
    pub fn router(&self, lookup_path: &str) -> Router {
        Router::new()
            .route(lookup_path, post(lookup_handler))
            .route(HEALTH_PATH, get(health_check))
            .layer(TraceLayer::new_for_http())
            .with_state(self.clone())
    }

    /// Handles one lookup body. `peer` is the transport-layer origin and is
    /// only consulted in source-IP mode.
    pub async fn handle_lookup(&self, peer: Option<SocketAddr>, body: &[u8]) -> Result<u16, LookupError> {
        let (identity, port) = match self.decode(peer, body) {
            Ok(decoded) => decoded,
            Err(err) => {
                warn!(parent: &self.span, ?peer, error = %err, "rejected lookup request");
                return Err(err);
            }
        };

        let resolution = self.resolver.resolve(&identity, port).await;
        info!(parent: &self.span, %identity, %port, outcome = %resolution, "lookup result");

        match resolution {
            Resolution::Resolved(host_port) => Ok(host_port),
            Resolution::NotExposed => Ok(NOT_EXPOSED),
            Resolution::NotFound => Err(LookupError::NotFound {
                identity: identity.to_string(),
                port,
            }),
            Resolution::Failed(err) => Err(LookupError::Inventory(err)),
        }
    }

    fn decode(&self, peer: Option<SocketAddr>, body: &[u8]) -> Result<(IdentityQuery, PortQuery), LookupError> {
        let request: LookupRequest =
            serde_json::from_slice(body).map_err(|e| ValidationError::MalformedBody(e.to_string()))?;
        let port: PortQuery = request.port.parse()?;

        let identity = match self.mode {
            // Body identity fields are not consulted in this mode.
            IdentityMode::SourceIp => {
                let peer = peer.ok_or(LookupError::PeerUnavailable)?;
                IdentityQuery::BySourceIp {
                    ip: peer.ip().to_canonical(),
                }
            }
            IdentityMode::Remote => {
                if request.hostname.is_empty() {
                    return Err(ValidationError::MissingField("Hostname").into());
                }
                IdentityQuery::ByHostnameAndTriple {
                    hostname: request.hostname,
                    ip: request.ip,
                    mac: request.mac,
                }
            }
        };
        Ok((identity, port))
    }
}

async fn lookup_handler(
    State(server): State<LookupServer>,
    connect_info: Option<ConnectInfo<SocketAddr>>,
    body: Bytes,
) -> Response {
    let peer = connect_info.map(|ConnectInfo(addr)| addr);
    match server.handle_lookup(peer, &body).await {
        Ok(port) => Json(port).into_response(),
        Err(err) => err.into_response(),
    }
}

async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "dockport",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Serves `router` on `listener` until `shutdown` completes. Peer addresses
/// are attached to every request so source-IP mode can read them.
pub async fn serve<F>(listener: TcpListener, router: Router, shutdown: F) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    axum::serve(listener, router.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(shutdown)
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inventory::StaticInventory;
    use axum::body::Body;
    use axum::http::Request;
    use dockport_common::container::ContainerRecord;
    use tower::ServiceExt;

    const MAC: &str = "aa:bb:cc:dd:ee:ff";

    fn inventory() -> StaticInventory {
        StaticInventory::new().with_container(
            "3f4e5d",
            ContainerRecord::new("web", "192.168.1.10", MAC).with_port(PortQuery::tcp(80), 32768),
        )
    }

    fn server(inventory: StaticInventory, mode: IdentityMode) -> LookupServer {
        let resolver = PortResolver::new(Arc::new(inventory), Span::none());
        LookupServer::new(Arc::new(resolver), mode, Span::none())
    }

    fn lookup_request(body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn send(server: &LookupServer, request: Request<Body>) -> (StatusCode, String) {
        let response = server.router("/").oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    fn remote_body(hostname: &str, port: &str) -> String {
        serde_json::json!({"Hostname": hostname, "IP": "192.168.1.10", "Mac": MAC, "Port": port}).to_string()
    }

    #[tokio::test]
    async fn resolved_port_is_a_json_integer() {
        let server = server(inventory(), IdentityMode::Remote);
        let (status, body) = send(&server, lookup_request(&remote_body("web", "80"))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "32768");
    }

    #[tokio::test]
    async fn not_exposed_is_zero() {
        let server = server(inventory(), IdentityMode::Remote);
        let (status, body) = send(&server, lookup_request(&remote_body("web", "443"))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "0");
    }

    #[tokio::test]
    async fn unknown_container_is_404() {
        let server = server(inventory(), IdentityMode::Remote);
        let (status, body) = send(&server, lookup_request(&remote_body("ghost", "80"))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body.contains("ghost"), "unexpected body: {body}");
    }

    #[tokio::test]
    async fn malformed_requests_are_400() {
        let server = server(inventory(), IdentityMode::Remote);
        let bad_port = remote_body("web", "http");
        let no_hostname = remote_body("", "80");
        for body in ["{not json", r#"{"Hostname":"web"}"#, bad_port.as_str(), no_hostname.as_str()] {
            let (status, _) = send(&server, lookup_request(body)).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "body: {body}");
        }
    }

    #[tokio::test]
    async fn inventory_failure_is_502() {
        let failing = inventory().with_inspect_error(InventoryError::Transport("engine down".to_string()));
        let server = server(failing, IdentityMode::Remote);
        let (status, body) = send(&server, lookup_request(&remote_body("web", "80"))).await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert!(body.contains("engine down"));
    }

    #[tokio::test]
    async fn source_ip_mode_ignores_body_identity() {
        let server = server(inventory(), IdentityMode::SourceIp);
        let mut request = lookup_request(&remote_body("ghost", "80"));
        request
            .extensions_mut()
            .insert(ConnectInfo(SocketAddr::from(([192, 168, 1, 10], 51000))));
        let (status, body) = send(&server, request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "32768");

        let mut request = lookup_request(r#"{"Port":"80"}"#);
        request
            .extensions_mut()
            .insert(ConnectInfo(SocketAddr::from(([10, 9, 9, 9], 51000))));
        let (status, _) = send(&server, request).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn source_ip_mode_needs_peer_address() {
        let server = server(inventory(), IdentityMode::SourceIp);
        let (status, _) = send(&server, lookup_request(r#"{"Port":"80"}"#)).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn health_endpoint() {
        let server = server(inventory(), IdentityMode::Remote);
        let request = Request::builder().uri("/health").body(Body::empty()).unwrap();
        let (status, body) = send(&server, request).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("healthy"));
    }

    #[tokio::test]
    async fn serves_over_tcp_with_peer_address() {
        let server = server(
            StaticInventory::new().with_container(
                "local",
                ContainerRecord::new("local", "127.0.0.1", MAC).with_port(PortQuery::udp(8125), 41000),
            ),
            IdentityMode::SourceIp,
        );
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (tx, rx) = tokio::sync::oneshot::channel::<()>();
        let handle = tokio::spawn(serve(listener, server.router("/"), async {
            let _ = rx.await;
        }));

        let response = reqwest::Client::new()
            .post(format!("http://{addr}/"))
            .json(&LookupRequest::port_only("8125/udp"))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), reqwest::StatusCode::OK);
        assert_eq!(response.text().await.unwrap(), "41000");

        tx.send(()).unwrap();
        handle.await.unwrap().unwrap();
    }
}
