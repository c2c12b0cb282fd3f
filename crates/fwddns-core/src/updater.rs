//! Rule updater
//!
//! Pure transformation of a fetched rule set: point the source address of
//! every managed input rule at the current public IP.
//!
//! Only `input` rules are inspected. `output` rules are carried through
//! unchanged and still take part in the submission.

use crate::model::{Field, FirewallRuleSet};
use std::collections::BTreeSet;
use std::net::Ipv4Addr;

/// Source CIDR for a single host
pub fn host_cidr(ip: Ipv4Addr) -> String {
    format!("{}/32", ip)
}

/// Rewrite `src_ip` of every input rule named in `rule_names`
///
/// Returns the rule set and whether any rule was modified. Rules sharing a
/// name are all updated. No rule is added or removed and no other field is
/// touched.
pub fn update_rules(
    mut rule_set: FirewallRuleSet,
    new_ip: Ipv4Addr,
    rule_names: &BTreeSet<String>,
) -> (FirewallRuleSet, bool) {
    let target = host_cidr(new_ip);
    let mut changed = false;

    for rule in rule_set.rules.input.iter_mut() {
        let managed = rule.name().is_some_and(|name| rule_names.contains(name));
        if !managed {
            continue;
        }

        if rule.src_ip.as_value() != Some(&target) {
            rule.src_ip = Field::Value(target.clone());
            changed = true;
        }
    }

    (rule_set, changed)
}

/// Configured names that match no input rule
pub fn unmatched_rule_names<'a>(
    rule_set: &FirewallRuleSet,
    rule_names: &'a BTreeSet<String>,
) -> Vec<&'a str> {
    rule_names
        .iter()
        .filter(|name| {
            !rule_set
                .rules
                .input
                .iter()
                .any(|rule| rule.name() == Some(name.as_str()))
        })
        .map(String::as_str)
        .collect()
}
