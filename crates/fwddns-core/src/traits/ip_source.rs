// # IP Source Trait
//
// Defines the interface for discovering the caller's public IPv4 address.
//
// ## Implementations
//
// - ipify JSON endpoint: `fwddns-ip-http` crate
//
// ## Usage
//
// ```rust,ignore
// use fwddns_core::IpSource;
//
// let source = /* IpSource implementation */;
// let ip = source.current().await?;
// println!("Current public IP: {}", ip);
// ```

use async_trait::async_trait;
use std::net::Ipv4Addr;

/// Trait for public IP discovery
///
/// One call, one request. Implementations must not retry or cache: the
/// engine asks exactly once per run and any failure aborts the run.
#[async_trait]
pub trait IpSource: Send + Sync {
    /// Get the current public IPv4 address
    ///
    /// # Returns
    ///
    /// - `Ok(Ipv4Addr)`: The externally visible address
    /// - `Err(Error::Network)`: Transport failure or non-2xx status
    /// - `Err(Error::Parse)`: Unexpected response body
    async fn current(&self) -> Result<Ipv4Addr, crate::Error>;

    /// Name of the source (for logging)
    fn source_name(&self) -> &'static str;
}
