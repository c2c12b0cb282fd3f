//! Test doubles and common utilities for sync contract tests
//!
//! The doubles count calls so tests can assert which steps of a run were
//! (or were not) reached.

#![allow(dead_code)]

use fwddns_core::error::{Error, Result};
use fwddns_core::model::{Field, FirewallRuleSet, Rule, Rules};
use fwddns_core::traits::{FirewallApi, IpSource};
use fwddns_core::{Configuration, Settings};
use std::collections::HashMap;
use std::net::Ipv4Addr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// An IP source that always reports the same address
pub struct StaticIpSource {
    ip: Ipv4Addr,
    calls: Arc<AtomicUsize>,
}

impl StaticIpSource {
    pub fn new(ip: Ipv4Addr) -> Self {
        Self {
            ip,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Shared handle to the call counter
    pub fn calls(&self) -> Arc<AtomicUsize> {
        self.calls.clone()
    }
}

#[async_trait::async_trait]
impl IpSource for StaticIpSource {
    async fn current(&self) -> Result<Ipv4Addr> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.ip)
    }

    fn source_name(&self) -> &'static str {
        "static"
    }
}

/// An IP source whose request never gets through
pub struct UnreachableIpSource;

#[async_trait::async_trait]
impl IpSource for UnreachableIpSource {
    async fn current(&self) -> Result<Ipv4Addr> {
        Err(Error::network("connection refused"))
    }

    fn source_name(&self) -> &'static str {
        "unreachable"
    }
}

/// What the mock API answers to a fetch
#[derive(Clone)]
pub enum FetchReply {
    Rules(FirewallRuleSet),
    Status(u16),
    Garbage,
}

/// What the mock API answers to a submit
#[derive(Clone)]
pub enum SubmitReply {
    Accept,
    Status(u16),
}

/// Call counters and captured submissions, shared with the test
#[derive(Clone, Default)]
pub struct ApiLog {
    fetches: Arc<AtomicUsize>,
    submitted: Arc<Mutex<Vec<FirewallRuleSet>>>,
}

impl ApiLog {
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    pub fn submit_count(&self) -> usize {
        self.submitted.lock().unwrap().len()
    }

    pub fn submitted(&self) -> Vec<FirewallRuleSet> {
        self.submitted.lock().unwrap().clone()
    }
}

/// A scripted firewall API
pub struct MockFirewallApi {
    fetch: FetchReply,
    submit: SubmitReply,
    log: ApiLog,
}

impl MockFirewallApi {
    pub fn new(fetch: FetchReply, submit: SubmitReply) -> Self {
        Self {
            fetch,
            submit,
            log: ApiLog::default(),
        }
    }

    /// Serve `rule_set` and accept any submission
    pub fn serving(rule_set: FirewallRuleSet) -> Self {
        Self::new(FetchReply::Rules(rule_set), SubmitReply::Accept)
    }

    pub fn log(&self) -> ApiLog {
        self.log.clone()
    }
}

#[async_trait::async_trait]
impl FirewallApi for MockFirewallApi {
    async fn fetch_rules(&self) -> Result<FirewallRuleSet> {
        self.log.fetches.fetch_add(1, Ordering::SeqCst);
        match &self.fetch {
            FetchReply::Rules(rule_set) => Ok(rule_set.clone()),
            FetchReply::Status(status) => Err(Error::api(
                *status,
                "Authentication failed",
                r#"{"error":{"status":401,"code":"UNAUTHORIZED","message":"Unauthorized"}}"#,
            )),
            FetchReply::Garbage => Err(Error::parse("expected value at line 1 column 1")),
        }
    }

    async fn submit_rules(&self, rule_set: &FirewallRuleSet) -> Result<serde_json::Value> {
        self.log.submitted.lock().unwrap().push(rule_set.clone());
        match &self.submit {
            SubmitReply::Accept => Ok(serde_json::json!({ "firewall": rule_set })),
            SubmitReply::Status(status) => Err(Error::api(*status, "Rejected", "")),
        }
    }

    fn api_name(&self) -> &'static str {
        "mock"
    }
}

/// A rule with a name and source address
pub fn rule(name: &str, src_ip: Option<&str>) -> Rule {
    Rule {
        ip_version: Field::Value("ipv4".to_string()),
        name: Field::Value(name.to_string()),
        src_ip: src_ip.map_or(Field::Null, |ip| Field::Value(ip.to_string())),
        dst_port: Field::Value("22".to_string()),
        protocol: Field::Null,
        action: Field::Value("accept".to_string()),
        ..Rule::default()
    }
}

/// A rule set for server 321 with the given rules
pub fn rule_set(input: Vec<Rule>, output: Vec<Rule>) -> FirewallRuleSet {
    FirewallRuleSet {
        server_ip: "203.0.113.10".to_string(),
        server_number: 321,
        status: "active".to_string(),
        filter_ipv6: false,
        whitelist_hos: true,
        port: "main".to_string(),
        rules: Rules { input, output },
    }
}

/// Required environment for a resolvable configuration
pub fn test_env() -> HashMap<String, String> {
    [
        ("HETZNER_SERVER_ID", "321"),
        ("HETZNER_API_USER", "#ws+test"),
        ("HETZNER_API_PASSWORD", "test-password"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect()
}

/// Configuration managing the given rule names
pub fn config_for(rule_names: &[&str]) -> Configuration {
    let settings = Settings {
        rule_names: rule_names.iter().map(|s| s.to_string()).collect(),
        debug: true,
        dry_run: false,
        request_timeout_secs: 30,
    };
    Configuration::from_parts(&test_env(), settings).expect("test configuration is valid")
}

/// In-memory sink for `tracing` output
#[derive(Clone, Default)]
pub struct LogCapture(Arc<Mutex<Vec<u8>>>);

impl LogCapture {
    /// Install a debug-level fmt subscriber writing into this buffer
    ///
    /// The returned guard keeps it as the thread default; `#[tokio::test]`
    /// polls everything on the test thread.
    pub fn install(&self) -> tracing::subscriber::DefaultGuard {
        let sink = self.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_ansi(false)
            .with_writer(move || sink.clone())
            .finish();
        tracing::subscriber::set_default(subscriber)
    }

    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl std::io::Write for LogCapture {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}
