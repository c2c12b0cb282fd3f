// # HTTP IP Source
//
// This crate provides public IP discovery for fwddns over HTTP.
//
// ## Architecture
//
// Asks an external "what is my IP" service once per call:
//
// ```http
// GET https://api.ipify.org?format=json
//
// {"ip": "203.0.113.7"}
// ```
//
// No polling, no caching, no retry. A failed request fails the run.

use fwddns_core::config::DEFAULT_REQUEST_TIMEOUT_SECS;
use fwddns_core::traits::IpSource;
use fwddns_core::{Error, Result};

use serde::Deserialize;
use std::net::{IpAddr, Ipv4Addr};
use std::time::Duration;

/// ipify endpoint returning `{"ip": "..."}`
pub const IPIFY_URL: &str = "https://api.ipify.org?format=json";

/// Default HTTP timeout for the lookup, same as the Robot calls
const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS);

/// Response body of the ipify JSON endpoint
#[derive(Debug, Deserialize)]
struct IpifyResponse {
    ip: String,
}

/// HTTP-based public IP source (ipify JSON format)
#[derive(Debug, Clone)]
pub struct HttpIpSource {
    /// URL to fetch the IP from
    url: String,

    /// Per-request timeout
    timeout: Duration,

    /// HTTP client
    client: reqwest::Client,
}

impl HttpIpSource {
    /// Create an IP source querying ipify with the default timeout
    pub fn new() -> Result<Self> {
        Self::with_url(IPIFY_URL, DEFAULT_HTTP_TIMEOUT)
    }

    /// Create an IP source querying `url` with the given request timeout
    ///
    /// # Parameters
    ///
    /// - `url`: Endpoint answering with `{"ip": "<v4>"}`
    /// - `timeout`: Per-request timeout
    pub fn with_url(url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            url: url.into(),
            timeout,
            client,
        })
    }

    /// URL this source queries
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Timeout applied to each lookup
    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

/// Extract the IPv4 address from an ipify JSON body
fn parse_ip(body: &str) -> Result<Ipv4Addr> {
    let parsed: IpifyResponse = serde_json::from_str(body)
        .map_err(|e| Error::parse(format!("Invalid IP service response: {}", e)))?;

    let ip_text = parsed.ip.trim();
    let ip: IpAddr = ip_text
        .parse()
        .map_err(|_| Error::parse(format!("Invalid IP address: {}", ip_text)))?;

    match ip {
        IpAddr::V4(v4) => Ok(v4),
        IpAddr::V6(_) => Err(Error::parse(format!("Expected IPv4, got: {}", ip))),
    }
}

#[async_trait::async_trait]
impl IpSource for HttpIpSource {
    async fn current(&self) -> Result<Ipv4Addr> {
        tracing::debug!("Looking up public IP via {}", self.url);

        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| Error::network(format!("Request to {} failed: {}", self.url, e)))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| Error::network(format!("Failed to read response: {}", e)))?;

        if !status.is_success() {
            tracing::warn!("IP service answered {}", status);
            return Err(Error::http_status(status.as_u16(), body));
        }

        parse_ip(&body)
    }

    fn source_name(&self) -> &'static str {
        "ipify"
    }
}
