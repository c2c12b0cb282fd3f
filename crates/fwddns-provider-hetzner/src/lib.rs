// # Hetzner Robot Firewall API
//
// This crate implements `FirewallApi` for the Hetzner Robot webservice.
//
// ## Behavior
//
// - One HTTP request per call (no retry, no backoff, no caching)
// - HTTP Basic authentication with the webservice user
// - Timeout taken from the configuration
// - Status-specific error messages (401, 403, 404, 409, 429, 5xx)
// - Robot error envelopes (`{"error": {"code", "message"}}`) surfaced in errors
//
// ## Security Requirements
//
// - The webservice password NEVER appears in logs or `Debug` output
//
// ## API Reference
//
// - Get firewall: GET `/firewall/{server-id}`
// - Apply firewall: POST `/firewall/{server-id}` (urlencoded, see [`form`])

pub mod form;

use async_trait::async_trait;
use fwddns_core::model::{FirewallEnvelope, FirewallRuleSet};
use fwddns_core::traits::FirewallApi;
use fwddns_core::{Configuration, Error, Result};
use serde_json::Value;

/// Hetzner Robot firewall client
///
/// Bound to one server and one set of webservice credentials.
///
/// # Security
///
/// The Debug implementation intentionally does NOT expose the password.
pub struct HetznerFirewall {
    /// Webservice base URL, without trailing slash
    base_url: String,

    /// Server number or main IP
    server_id: String,

    /// Webservice user
    user: String,

    /// Webservice password
    /// ⚠️ NEVER log this value
    password: String,

    /// Dump payloads and raw responses
    debug: bool,

    /// HTTP client for API requests
    client: reqwest::Client,
}

impl std::fmt::Debug for HetznerFirewall {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HetznerFirewall")
            .field("base_url", &self.base_url)
            .field("server_id", &self.server_id)
            .field("user", &self.user)
            .field("password", &"<REDACTED>")
            .field("debug", &self.debug)
            .finish()
    }
}

impl HetznerFirewall {
    /// Create a client from the resolved configuration
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the HTTP client cannot be built.
    pub fn new(config: &Configuration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| Error::config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            base_url: config.api_base_url.clone(),
            server_id: config.server_id.clone(),
            user: config.api_user.clone(),
            password: config.api_password().to_string(),
            debug: config.debug,
            client,
        })
    }

    /// `{base}/firewall/{server-id}`
    pub fn firewall_url(&self) -> String {
        format!("{}/firewall/{}", self.base_url, self.server_id)
    }

    /// Read a response body, turning non-2xx statuses into API errors
    async fn read_body(&self, response: reqwest::Response, action: &str) -> Result<String> {
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| Error::network(format!("Failed to read response: {}", e)))?;

        if self.debug {
            tracing::debug!("Response status code: {}", status.as_u16());
            tracing::debug!("Response content: {}", body);
        }

        if !status.is_success() {
            return Err(api_error(status.as_u16(), body, action, &self.server_id));
        }

        Ok(body)
    }
}

/// Robot error envelope: `{"error": {"status", "code", "message"}}`
fn robot_error_detail(body: &str) -> Option<String> {
    let json: Value = serde_json::from_str(body).ok()?;
    let error = json.get("error")?;
    let code = error.get("code").and_then(Value::as_str).unwrap_or("UNKNOWN");
    let message = error.get("message").and_then(Value::as_str).unwrap_or_default();
    Some(format!("{}: {}", code, message))
}

/// Map a non-2xx response to an API error with a contextual message
fn api_error(status: u16, body: String, action: &str, server_id: &str) -> Error {
    let mut message = match status {
        401 => "Authentication failed: invalid webservice credentials".to_string(),
        403 => "Forbidden: webservice user may not manage this firewall".to_string(),
        404 => format!("Server or firewall not found: {}", server_id),
        409 => "Conflict: firewall is currently being updated".to_string(),
        429 => "Rate limit exceeded. Please retry later".to_string(),
        500..=599 => "Robot server error (transient)".to_string(),
        _ => format!("{} failed", action),
    };

    if let Some(detail) = robot_error_detail(&body) {
        message = format!("{} ({})", message, detail);
    }

    Error::api(status, message, body)
}

#[async_trait]
impl FirewallApi for HetznerFirewall {
    /// Fetch the current firewall of the configured server
    ///
    /// # API Call
    ///
    /// ```http
    /// GET /firewall/{server-id}
    /// Authorization: Basic <user:password>
    /// ```
    async fn fetch_rules(&self) -> Result<FirewallRuleSet> {
        let url = self.firewall_url();
        tracing::debug!("Fetching firewall rules: GET {}", url);

        let response = self
            .client
            .get(&url)
            .basic_auth(&self.user, Some(&self.password))
            .send()
            .await
            .map_err(|e| Error::network(format!("HTTP request failed: {}", e)))?;

        let body = self.read_body(response, "Firewall lookup").await?;

        let envelope: FirewallEnvelope = serde_json::from_str(&body)
            .map_err(|e| Error::parse(format!("Failed to parse firewall response: {}", e)))?;

        Ok(envelope.firewall)
    }

    /// Replace the firewall of the configured server
    ///
    /// # API Call
    ///
    /// ```http
    /// POST /firewall/{server-id}
    /// Authorization: Basic <user:password>
    /// Content-Type: application/x-www-form-urlencoded
    ///
    /// server_ip=...&status=active&rules[input][0][name]=...&...
    /// ```
    async fn submit_rules(&self, rule_set: &FirewallRuleSet) -> Result<Value> {
        let url = self.firewall_url();
        let fields = form::encode(rule_set);

        if self.debug {
            let dump: serde_json::Map<String, Value> = fields
                .iter()
                .map(|(k, v)| (k.clone(), Value::String(v.clone())))
                .collect();
            tracing::debug!(
                "Data to be sent:\n{}",
                serde_json::to_string_pretty(&dump).unwrap_or_default()
            );
        }

        tracing::info!(
            "Submitting firewall rules: POST {} ({} fields)",
            url,
            fields.len()
        );

        let response = self
            .client
            .post(&url)
            .basic_auth(&self.user, Some(&self.password))
            .form(&fields)
            .send()
            .await
            .map_err(|e| Error::network(format!("HTTP request failed: {}", e)))?;

        let body = self.read_body(response, "Firewall update").await?;

        serde_json::from_str(&body)
            .map_err(|e| Error::parse(format!("Failed to parse update response: {}", e)))
    }

    fn api_name(&self) -> &'static str {
        "hetzner-robot"
    }
}
