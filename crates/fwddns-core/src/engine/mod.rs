//! Sync engine
//!
//! The SyncEngine runs one fetch-modify-submit pass:
//!
//! ```text
//! Init ─► ConfigLoaded ─► IpDiscovered ─► RulesFetched ─┬─► NoChangeNeeded ─┐
//!                                                       └─► RulesSubmitted ─┴─► Done
//!
//!                 any stage ─► Failed(kind)
//! ```
//!
//! `Init → ConfigLoaded` happens before the engine exists (the binary
//! resolves the [`Configuration`] and hands it over). Every later transition
//! is one component call:
//!
//! 1. [`IpSource::current`] discovers the public IP
//! 2. [`FirewallApi::fetch_rules`] reads the remote rule set
//! 3. [`update_rules`] rewrites managed input rules (pure)
//! 4. [`FirewallApi::submit_rules`] writes back, only if something changed
//!
//! There is no retry and no rollback. The first failure ends the run and is
//! returned as a [`SyncFailure`] carrying the last stage reached.

use crate::config::Configuration;
use crate::error::{Error, ErrorKind};
use crate::model::FirewallRuleSet;
use crate::traits::{FirewallApi, IpSource};
use crate::updater::{host_cidr, unmatched_rule_names, update_rules};
use serde::Serialize;
use std::net::Ipv4Addr;
use tracing::{debug, info, warn};

/// Progress of a sync run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    /// Process started
    Init,
    /// Configuration resolved
    ConfigLoaded,
    /// Public IP known
    IpDiscovered,
    /// Remote rule set fetched
    RulesFetched,
    /// Rules already matched the public IP
    NoChangeNeeded,
    /// Updated rules were submitted
    RulesSubmitted,
    /// Run finished
    Done,
}

/// Successful end of a sync run
#[derive(Debug, Clone, PartialEq)]
pub enum SyncOutcome {
    /// Every managed rule already pointed at the public IP
    Unchanged {
        /// Discovered public IP
        ip: Ipv4Addr,
    },

    /// Rules were rewritten and accepted by the API
    Updated {
        /// Discovered public IP
        ip: Ipv4Addr,
        /// Decoded API response
        response: serde_json::Value,
    },

    /// Rules would have been rewritten, but dry-run mode skipped the submit
    DryRun {
        /// Discovered public IP
        ip: Ipv4Addr,
        /// The rule set that would have been submitted
        rule_set: FirewallRuleSet,
    },
}

impl SyncOutcome {
    /// The single message printed to the operator
    pub fn message(&self) -> String {
        match self {
            SyncOutcome::Unchanged { .. } => {
                "No update needed. Current IP already matches firewall rules.".to_string()
            }
            SyncOutcome::Updated { .. } => "Firewall rules updated successfully!".to_string(),
            SyncOutcome::DryRun { ip, .. } => format!(
                "Dry run: managed rules would be set to {} (nothing submitted).",
                host_cidr(*ip)
            ),
        }
    }
}

/// Failed sync run
#[derive(Debug, thiserror::Error)]
#[error("sync failed after {stage:?}: {error}")]
pub struct SyncFailure {
    /// Last stage reached before the failure
    pub stage: Stage,
    /// What went wrong
    #[source]
    pub error: Error,
}

impl SyncFailure {
    /// Category of the underlying error
    pub fn kind(&self) -> ErrorKind {
        self.error.kind()
    }
}

/// Single-pass firewall sync engine
///
/// Owns its collaborators and the configuration for the duration of one run.
/// All calls are awaited in sequence; nothing is spawned.
pub struct SyncEngine {
    /// Public IP discovery
    ip_source: Box<dyn IpSource>,

    /// Remote firewall API
    firewall: Box<dyn FirewallApi>,

    /// Resolved configuration
    config: Configuration,
}

impl SyncEngine {
    /// Create a new sync engine
    ///
    /// # Parameters
    ///
    /// - `ip_source`: IP discovery implementation
    /// - `firewall`: Firewall API client, bound to the configured server
    /// - `config`: Resolved configuration
    pub fn new(
        ip_source: Box<dyn IpSource>,
        firewall: Box<dyn FirewallApi>,
        config: Configuration,
    ) -> Self {
        Self {
            ip_source,
            firewall,
            config,
        }
    }

    /// The configuration this engine runs with
    pub fn config(&self) -> &Configuration {
        &self.config
    }

    /// Run one sync pass
    ///
    /// # Returns
    ///
    /// - `Ok(SyncOutcome)`: Run reached `Done`
    /// - `Err(SyncFailure)`: Run reached `Failed`; `stage` is the last good stage
    pub async fn run(&self) -> std::result::Result<SyncOutcome, SyncFailure> {
        let mut stage = Stage::ConfigLoaded;
        debug!("Sync stage: {:?}", stage);

        if self.config.rule_names.is_empty() {
            warn!("No managed rule names configured, nothing will ever be updated");
        }

        // Step 1: Discover public IP
        let ip = self
            .ip_source
            .current()
            .await
            .map_err(|error| SyncFailure { stage, error })?;
        stage = self.advance(stage, Stage::IpDiscovered);
        info!(
            "Current public IP: {} (via {})",
            ip,
            self.ip_source.source_name()
        );

        // Step 2: Fetch rules
        let current = self
            .firewall
            .fetch_rules()
            .await
            .map_err(|error| SyncFailure { stage, error })?;
        stage = self.advance(stage, Stage::RulesFetched);
        info!(
            "Fetched firewall rules from {} ({} input, {} output)",
            self.firewall.api_name(),
            current.rules.input.len(),
            current.rules.output.len()
        );
        if self.config.debug {
            debug!("Current firewall rules:\n{}", to_pretty_json(&current));
        }

        for name in unmatched_rule_names(&current, &self.config.rule_names) {
            warn!("Managed rule '{}' not found among input rules", name);
        }

        // Step 3: Rewrite managed rules
        let (updated, changed) = update_rules(current, ip, &self.config.rule_names);

        if !changed {
            stage = self.advance(stage, Stage::NoChangeNeeded);
            info!("Managed rules already allow {}", host_cidr(ip));
            self.advance(stage, Stage::Done);
            return Ok(SyncOutcome::Unchanged { ip });
        }

        if self.config.dry_run {
            info!(
                "[DRY-RUN] Would submit updated rules to {} (src_ip -> {})",
                self.firewall.api_name(),
                host_cidr(ip)
            );
            if self.config.debug {
                debug!("Updated firewall rules:\n{}", to_pretty_json(&updated));
            }
            self.advance(stage, Stage::Done);
            return Ok(SyncOutcome::DryRun {
                ip,
                rule_set: updated,
            });
        }

        // Step 4: Submit
        info!("Submitting updated rules (src_ip -> {})", host_cidr(ip));
        let response = self
            .firewall
            .submit_rules(&updated)
            .await
            .map_err(|error| SyncFailure { stage, error })?;
        stage = self.advance(stage, Stage::RulesSubmitted);
        if self.config.debug {
            debug!("Updated firewall rules:\n{}", to_pretty_json(&response));
        }

        self.advance(stage, Stage::Done);
        Ok(SyncOutcome::Updated { ip, response })
    }

    fn advance(&self, from: Stage, to: Stage) -> Stage {
        debug!("Sync stage: {:?} -> {:?}", from, to);
        to
    }
}

fn to_pretty_json<T: Serialize>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_default()
}
