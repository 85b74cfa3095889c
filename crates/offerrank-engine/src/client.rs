//! HTTP client for the external ranking plugin.
//!
//! One `POST` per scheduling round over a fresh HTTP/1 connection. The
//! whole exchange (connect, send, read body) is bounded by the configured
//! timeout. No retries: a failed exchange is returned to the caller as a
//! [`RankingError`] and the orchestrator decides what to do with it.

use std::time::Duration;

use bytes::Bytes;
use http::{Method, Request, header};
use http_body_util::{BodyExt, Full};
use hyper_util::rt::TokioIo;
use serde::{Deserialize, Serialize};
use tokio::net::TcpStream;
use tracing::debug;

use offerrank_core::{PluginEndpoint, ResourceRequest, TaskGroupKey};

use crate::error::{RankingError, RankingResult};

const USER_AGENT: &str = "offerrank/0.1";

/// Body sent to the ranking plugin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankingRequest {
    /// One hostname per offer, in snapshot order.
    pub hosts: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resources: Option<ResourceRequest>,
}

impl RankingRequest {
    pub fn new(hosts: Vec<String>) -> Self {
        Self {
            hosts,
            job_key: None,
            resources: None,
        }
    }

    /// Attach the task group and resource request being scheduled.
    pub fn with_context(mut self, key: &TaskGroupKey, resources: &ResourceRequest) -> Self {
        self.job_key = Some(key.to_string());
        self.resources = Some(resources.clone());
        self
    }
}

/// Body returned by the ranking plugin.
///
/// `error` empty or absent means success, in which case `hosts` must be
/// present.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankingResponse {
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub hosts: Option<Vec<String>>,
}

impl RankingResponse {
    pub fn success<S: Into<String>>(hosts: impl IntoIterator<Item = S>) -> Self {
        Self {
            error: Some(String::new()),
            hosts: Some(hosts.into_iter().map(Into::into).collect()),
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            error: Some(message.into()),
            hosts: None,
        }
    }

    /// Decode a response body.
    ///
    /// Fails with [`RankingError::Decode`] when the body is not a JSON
    /// object or carries neither `error` nor `hosts`.
    pub fn from_slice(body: &[u8]) -> RankingResult<Self> {
        let response: RankingResponse =
            serde_json::from_slice(body).map_err(|e| RankingError::Decode(e.to_string()))?;
        if response.error.is_none() && response.hosts.is_none() {
            return Err(RankingError::Decode(
                "response has neither `error` nor `hosts`".to_string(),
            ));
        }
        Ok(response)
    }

    /// The plugin's host order, or the failure the response signals.
    pub fn hosts(&self) -> RankingResult<&[String]> {
        if let Some(message) = self.error.as_deref().filter(|m| !m.is_empty()) {
            return Err(RankingError::PluginReported(message.to_string()));
        }
        self.hosts
            .as_deref()
            .ok_or_else(|| RankingError::Decode("successful response without `hosts`".to_string()))
    }
}

/// Client bound to one plugin endpoint.
#[derive(Debug, Clone)]
pub struct RankingClient {
    endpoint: PluginEndpoint,
    timeout: Duration,
}

impl RankingClient {
    pub fn new(endpoint: PluginEndpoint, timeout: Duration) -> Self {
        Self { endpoint, timeout }
    }

    pub fn endpoint(&self) -> &PluginEndpoint {
        &self.endpoint
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Ask the plugin to rank `request.hosts`.
    ///
    /// Only returns `Ok` for a response whose [`RankingResponse::hosts`]
    /// succeeds.
    pub async fn request(&self, request: &RankingRequest) -> RankingResult<RankingResponse> {
        let body = serde_json::to_vec(request)
            .map_err(|e| RankingError::Transport(format!("encoding request: {e}")))?;

        let response = match tokio::time::timeout(self.timeout, self.exchange(body)).await {
            Ok(result) => result?,
            Err(_) => {
                debug!(uri = %self.endpoint.uri(), timeout = ?self.timeout, "ranking plugin timed out");
                return Err(RankingError::Transport(format!(
                    "timed out after {:?}",
                    self.timeout
                )));
            }
        };

        response.hosts()?;
        Ok(response)
    }

    async fn exchange(&self, body: Vec<u8>) -> RankingResult<RankingResponse> {
        let authority = self.endpoint.authority.as_str();

        let stream = TcpStream::connect(authority)
            .await
            .map_err(|e| RankingError::Transport(format!("connecting to {authority}: {e}")))?;

        let io = TokioIo::new(stream);
        let (mut sender, conn) = hyper::client::conn::http1::handshake(io)
            .await
            .map_err(|e| RankingError::Transport(format!("handshake with {authority}: {e}")))?;

        // Drive the connection in the background.
        tokio::spawn(async move {
            if let Err(e) = conn.await {
                debug!(error = %e, "ranking plugin connection closed with error");
            }
        });

        let req = Request::builder()
            .method(Method::POST)
            .uri(self.endpoint.path.as_str())
            .header(header::HOST, authority)
            .header(header::CONTENT_TYPE, "application/json")
            .header(header::USER_AGENT, USER_AGENT)
            .body(Full::new(Bytes::from(body)))
            .map_err(|e| RankingError::Transport(format!("building request: {e}")))?;

        let resp = sender
            .send_request(req)
            .await
            .map_err(|e| RankingError::Transport(format!("sending request: {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            debug!(%status, uri = %self.endpoint.uri(), "ranking plugin non-2xx");
            return Err(RankingError::Transport(format!("plugin answered {status}")));
        }

        let bytes = resp
            .into_body()
            .collect()
            .await
            .map_err(|e| RankingError::Transport(format!("reading body: {e}")))?
            .to_bytes();

        RankingResponse::from_slice(&bytes)
    }
}
