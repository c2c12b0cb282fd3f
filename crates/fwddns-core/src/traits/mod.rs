//! Core traits for fwddns
//!
//! These are the seams between the sync engine and the outside world.
//!
//! - [`IpSource`]: Discover the current public IP
//! - [`FirewallApi`]: Read and write a remote firewall rule set

pub mod ip_source;
pub mod firewall_api;

pub use ip_source::IpSource;
pub use firewall_api::FirewallApi;
