//! Network transport used by the failover pipeline.

use std::time::Duration;

use futures_util::future::BoxFuture;
use futures_util::FutureExt;
use reqwest::header::USER_AGENT;
use url::Url;

use crate::config::schema::RequestOptions;
use crate::error::{IconError, IconResult};

/// Raw response handed back by a [`Transport`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResponse {
    pub status: u16,
    pub body: String,
}

impl TransportResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Fetches one URL.
///
/// Implementations report network failures (timeouts included) as
/// [`IconError::Transport`]. Status handling is left to the caller, so a
/// non-2xx response is still `Ok`.
pub trait Transport: Send + Sync {
    fn fetch<'a>(
        &'a self,
        url: &'a Url,
        options: &'a RequestOptions,
    ) -> BoxFuture<'a, IconResult<TransportResponse>>;
}

/// `reqwest`-backed transport.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new() -> IconResult<Self> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(network_error)?;
        Ok(Self { client })
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

fn network_error(e: reqwest::Error) -> IconError {
    let message = if e.is_timeout() {
        format!("request timed out: {e}")
    } else {
        e.to_string()
    };
    IconError::Transport {
        status: None,
        message,
    }
}

impl Transport for HttpTransport {
    fn fetch<'a>(
        &'a self,
        url: &'a Url,
        options: &'a RequestOptions,
    ) -> BoxFuture<'a, IconResult<TransportResponse>> {
        async move {
            let mut request = self
                .client
                .get(url.clone())
                .header(USER_AGENT, options.user_agent.as_str());
            if options.timeout_ms > 0 {
                request = request.timeout(Duration::from_millis(options.timeout_ms));
            }
            for (name, value) in &options.headers {
                request = request.header(name.as_str(), value.as_str());
            }

            let response = request.send().await.map_err(network_error)?;
            let status = response.status().as_u16();
            let body = response.text().await.map_err(network_error)?;

            tracing::debug!(url = %url, status, bytes = body.len(), "Transport response");
            Ok(TransportResponse { status, body })
        }
        .boxed()
    }
}
