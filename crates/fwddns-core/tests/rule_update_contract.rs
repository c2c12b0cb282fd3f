//! Contract Test: Rule Update Properties
//!
//! Property tests for the pure rule updater.
//!
//! Constraints verified:
//! - Updating twice with the same IP changes nothing the second time
//! - Only managed input rules' `src_ip` is ever modified
//! - `changed` is true exactly when some managed rule pointed elsewhere
//!
//! If this test fails, managed rules may be rewritten incorrectly.

mod common;

use common::rule_set;
use fwddns_core::model::{Field, FirewallRuleSet, Rule};
use fwddns_core::update_rules;
use proptest::prelude::*;
use std::collections::BTreeSet;
use std::net::Ipv4Addr;

const NAMES: &[&str] = &["web", "ssh", "mail", "vpn"];

fn field_strategy(values: &'static [&'static str]) -> impl Strategy<Value = Field<String>> {
    prop_oneof![
        Just(Field::Absent),
        Just(Field::Null),
        proptest::sample::select(values).prop_map(|v| Field::Value(v.to_string())),
    ]
}

fn rule_strategy() -> impl Strategy<Value = Rule> {
    (
        field_strategy(NAMES),
        field_strategy(&["1.2.3.4/32", "5.6.7.8/32", "10.0.0.0/8"]),
        field_strategy(&["22", "80", "443"]),
        field_strategy(&["accept", "discard"]),
    )
        .prop_map(|(name, src_ip, dst_port, action)| Rule {
            name,
            src_ip,
            dst_port,
            action,
            ..Rule::default()
        })
}

fn rule_set_strategy() -> impl Strategy<Value = FirewallRuleSet> {
    (
        proptest::collection::vec(rule_strategy(), 0..8),
        proptest::collection::vec(rule_strategy(), 0..4),
    )
        .prop_map(|(input, output)| rule_set(input, output))
}

fn ip_strategy() -> impl Strategy<Value = Ipv4Addr> {
    prop_oneof![
        Just(Ipv4Addr::new(1, 2, 3, 4)),
        Just(Ipv4Addr::new(5, 6, 7, 8)),
        any::<u32>().prop_map(Ipv4Addr::from),
    ]
}

fn names_strategy() -> impl Strategy<Value = BTreeSet<String>> {
    proptest::sample::subsequence(NAMES.to_vec(), 0..=NAMES.len())
        .prop_map(|names| names.into_iter().map(String::from).collect())
}

fn is_managed(rule: &Rule, names: &BTreeSet<String>) -> bool {
    rule.name().is_some_and(|name| names.contains(name))
}

proptest! {
    #[test]
    fn second_update_is_idempotent(set in rule_set_strategy(), ip in ip_strategy(), names in names_strategy()) {
        let (once, _) = update_rules(set, ip, &names);
        let (twice, changed) = update_rules(once.clone(), ip, &names);

        prop_assert!(!changed);
        prop_assert_eq!(twice, once);
    }

    #[test]
    fn only_managed_input_src_ip_changes(set in rule_set_strategy(), ip in ip_strategy(), names in names_strategy()) {
        let (updated, _) = update_rules(set.clone(), ip, &names);

        prop_assert_eq!(&updated.rules.output, &set.rules.output);
        prop_assert_eq!(updated.rules.input.len(), set.rules.input.len());
        prop_assert_eq!(&updated.server_ip, &set.server_ip);
        prop_assert_eq!(updated.server_number, set.server_number);

        for (before, after) in set.rules.input.iter().zip(&updated.rules.input) {
            let mut after_with_old_src = after.clone();
            after_with_old_src.src_ip = before.src_ip.clone();
            prop_assert_eq!(&after_with_old_src, before, "only src_ip may differ");

            if is_managed(before, &names) {
                prop_assert_eq!(after.src_ip.as_value(), Some(&format!("{}/32", ip)));
            } else {
                prop_assert_eq!(&after.src_ip, &before.src_ip);
            }
        }
    }

    #[test]
    fn changed_iff_a_managed_rule_differed(set in rule_set_strategy(), ip in ip_strategy(), names in names_strategy()) {
        let target = format!("{}/32", ip);
        let expected = set
            .rules
            .input
            .iter()
            .any(|rule| is_managed(rule, &names) && rule.src_ip.as_value() != Some(&target));

        let (_, changed) = update_rules(set, ip, &names);
        prop_assert_eq!(changed, expected);
    }
}
