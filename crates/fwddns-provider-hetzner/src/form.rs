//! Form encoding of a rule set for `POST /firewall/{server-id}`
//!
//! The Robot webservice takes the whole firewall as flat
//! `application/x-www-form-urlencoded` pairs:
//!
//! ```text
//! server_ip=203.0.113.10
//! status=active
//! filter_ipv6=false
//! rules[input][0][name]=home ssh
//! rules[input][0][src_ip]=198.51.100.23/32
//! rules[output][0][action]=accept
//! ```
//!
//! Absent and `null` rule fields are left out entirely; the API treats a
//! present-but-empty key differently from a missing one.

use fwddns_core::model::{Direction, Field, FirewallRuleSet, Rule};
use serde_json::Value;

/// Flatten `rule_set` into ordered form pairs
pub fn encode(rule_set: &FirewallRuleSet) -> Vec<(String, String)> {
    let mut fields = vec![
        ("server_ip".to_string(), rule_set.server_ip.clone()),
        ("server_number".to_string(), rule_set.server_number.to_string()),
        ("status".to_string(), rule_set.status.clone()),
        ("filter_ipv6".to_string(), rule_set.filter_ipv6.to_string()),
        ("whitelist_hos".to_string(), rule_set.whitelist_hos.to_string()),
        ("port".to_string(), rule_set.port.clone()),
    ];

    for direction in [Direction::Input, Direction::Output] {
        for (index, rule) in rule_set.rules.get(direction).iter().enumerate() {
            push_rule(&mut fields, direction, index, rule);
        }
    }

    fields
}

fn push_rule(fields: &mut Vec<(String, String)>, direction: Direction, index: usize, rule: &Rule) {
    let key = |name: &str| format!("rules[{}][{}][{}]", direction.as_str(), index, name);

    for (name, field) in rule.known_fields() {
        if let Field::Value(value) = field {
            fields.push((key(name), value.clone()));
        }
    }

    for (name, value) in &rule.extra {
        if let Some(text) = render(value) {
            fields.push((key(name), text));
        }
    }
}

/// Text form of a passthrough value; `None` for null
fn render(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Array(_) | Value::Object(_) => Some(value.to_string()),
    }
}
