//! Querying side of the lookup protocol.
//!
//! A container calls [`RemoteLookupClient::lookup_self`] to learn which host
//! port its own logical port is published on. The client uses reqwest's
//! default settings: no retry and no timeout beyond the transport's own.
//! Callers that need resilience wrap it.

use dockport_common::container::Resolution;
use dockport_common::network::host_info::{self, HostInfo, HostInfoError};
use reqwest::StatusCode;
use thiserror::Error;
use tracing::{Span, debug};

use crate::protocol::LookupRequest;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error(transparent)]
    HostInfo(#[from] HostInfoError),

    #[error("lookup request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected response: {status} ({body})")]
    UnexpectedStatus { status: u16, body: String },

    #[error("invalid lookup response {body:?}: {reason}")]
    Decode { body: String, reason: String },
}

#[derive(Debug, Clone)]
pub struct RemoteLookupClient {
    http: reqwest::Client,
    url: String,
    span: Span,
}

impl RemoteLookupClient {
    pub fn new(url: impl Into<String>, span: Span) -> Self {
        Self::with_client(reqwest::Client::new(), url, span)
    }

    pub fn with_client(http: reqwest::Client, url: impl Into<String>, span: Span) -> Self {
        Self {
            http,
            url: url.into(),
            span,
        }
    }

    /// Gathers this host's identity on `interface` and asks the server for `port`.
    pub async fn lookup_self(&self, interface: &str, port: &str) -> Result<Resolution, ClientError> {
        let info = host_info::lookup_host_info(interface)?;
        self.lookup(&info, port).await
    }

    /// Asks for `port` on behalf of an already known identity.
    pub async fn lookup(&self, info: &HostInfo, port: &str) -> Result<Resolution, ClientError> {
        self.send(&LookupRequest::from_host_info(info, port)).await
    }

    /// For servers running in source-IP mode, which ignore identity fields.
    pub async fn lookup_port_only(&self, port: &str) -> Result<Resolution, ClientError> {
        self.send(&LookupRequest::port_only(port)).await
    }

    async fn send(&self, request: &LookupRequest) -> Result<Resolution, ClientError> {
        debug!(parent: &self.span, url = %self.url, hostname = %request.hostname, port = %request.port, "sending lookup");
        let response = self.http.post(&self.url).json(request).send().await?;
        let status = response.status();
        let body = response.text().await?;

        if status != StatusCode::OK {
            return Err(ClientError::UnexpectedStatus {
                status: status.as_u16(),
                body,
            });
        }
        decode_port(body)
    }
}

fn decode_port(body: String) -> Result<Resolution, ClientError> {
    let value: i64 = match serde_json::from_str(&body) {
        Ok(value) => value,
        Err(err) => {
            return Err(ClientError::Decode {
                reason: err.to_string(),
                body,
            });
        }
    };
    Resolution::from_wire(value).ok_or_else(|| ClientError::Decode {
        reason: format!("{value} is not a port"),
        body,
    })
}

/// One-shot form of [`RemoteLookupClient::lookup_self`].
pub async fn lookup_self(server_url: &str, interface: &str, port: &str) -> Result<Resolution, ClientError> {
    RemoteLookupClient::new(server_url, Span::current())
        .lookup_self(interface, port)
        .await
}
