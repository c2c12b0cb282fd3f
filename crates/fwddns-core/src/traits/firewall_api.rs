// # Firewall API Trait
//
// Defines the interface to a remote firewall management API.
//
// ## Implementations
//
// - Hetzner Robot webservice: `fwddns-provider-hetzner` crate
//
// ## Usage
//
// ```rust,ignore
// use fwddns_core::FirewallApi;
//
// let api = /* FirewallApi implementation */;
// let rule_set = api.fetch_rules().await?;
// let response = api.submit_rules(&rule_set).await?;
// ```

use crate::model::FirewallRuleSet;
use async_trait::async_trait;

/// Trait for firewall API clients
///
/// A client is bound to one server and one set of credentials at
/// construction time.
///
/// # Single-Shot
///
/// Each method performs exactly one HTTP request. There is no retry, no
/// caching between calls, and no decision about *whether* to submit; that
/// belongs to the `SyncEngine`.
#[async_trait]
pub trait FirewallApi: Send + Sync {
    /// Fetch the complete current rule set
    ///
    /// # Returns
    ///
    /// - `Ok(FirewallRuleSet)`: The rule set as stored remotely
    /// - `Err(Error::Network)`: Transport failure
    /// - `Err(Error::Api)`: Non-2xx response (status and body attached)
    /// - `Err(Error::Parse)`: Body is not a firewall document
    async fn fetch_rules(&self) -> Result<FirewallRuleSet, crate::Error>;

    /// Replace the remote rule set with `rule_set`
    ///
    /// The whole rule set is submitted, input and output rules alike.
    ///
    /// # Returns
    ///
    /// The decoded JSON response body
    async fn submit_rules(
        &self,
        rule_set: &FirewallRuleSet,
    ) -> Result<serde_json::Value, crate::Error>;

    /// Name of the API (for logging)
    fn api_name(&self) -> &'static str;
}
