// # fwddns-core
//
// Core library for keeping a remote firewall allow-list in sync with the
// operator's current public IP ("dynamic DNS for firewalls").
//
// ## Architecture Overview
//
// - **Configuration**: Environment + settings file, resolved once at startup
// - **IpSource**: Trait for discovering the current public IPv4 address
// - **FirewallApi**: Trait for fetching and submitting a remote rule set
// - **update_rules**: Pure rewrite of managed rules' source address
// - **SyncEngine**: Sequences one fetch-modify-submit pass
//
// ## Design Principles
//
// 1. **Explicit configuration**: No ambient lookups after startup
// 2. **Single pass**: One run, sequential calls, no background tasks
// 3. **Library-first**: API clients live in their own crates behind traits
// 4. **Idempotency**: Nothing is submitted when the rules already match

pub mod traits;
pub mod engine;
pub mod config;
pub mod error;
pub mod model;
pub mod updater;

// Re-export core types for convenience
pub use traits::{IpSource, FirewallApi};
pub use engine::{SyncEngine, SyncOutcome, SyncFailure, Stage};
pub use config::{Configuration, ConfigSources, Settings};
pub use error::{Error, ErrorKind, Result};
pub use model::{Field, FirewallEnvelope, FirewallRuleSet, Rule, Rules, Direction};
pub use updater::update_rules;
