//! Schedule evaluation: which timed rule governs each condition type

use nop_api::{ConditionRule, ConditionType};
use std::collections::HashMap;
use std::time::Duration;

/// Select the governing rule for every condition type at the given age.
///
/// Rules are grouped by condition type. Within a group a rule is eligible when
/// its threshold is at or below `elapsed`, and the eligible rule with the
/// greatest threshold governs. On equal thresholds the rule declared first
/// wins. Groups with no eligible rule contribute nothing.
///
/// Returns indices into `rules`, ascending.
pub fn evaluate(rules: &[ConditionRule], elapsed: Duration) -> Vec<usize> {
    let mut governing: HashMap<&ConditionType, usize> = HashMap::new();

    for (index, rule) in rules.iter().enumerate() {
        if !rule.is_eligible(elapsed) {
            continue;
        }

        match governing.get(&rule.condition_type) {
            // Strictly greater: a later equal threshold never displaces the winner
            Some(&current) if rules[current].threshold >= rule.threshold => {}
            _ => {
                governing.insert(&rule.condition_type, index);
            }
        }
    }

    let mut selected: Vec<usize> = governing.into_values().collect();
    selected.sort_unstable();
    selected
}

/// Indices of every eligible rule, ascending
pub fn eligible(rules: &[ConditionRule], elapsed: Duration) -> Vec<usize> {
    rules
        .iter()
        .enumerate()
        .filter(|(_, rule)| rule.is_eligible(elapsed))
        .map(|(index, _)| index)
        .collect()
}

/// Time until the next rule becomes eligible, if any is still pending
pub fn next_transition(rules: &[ConditionRule], elapsed: Duration) -> Option<Duration> {
    rules
        .iter()
        .filter(|rule| !rule.is_eligible(elapsed))
        .map(|rule| rule.threshold - elapsed)
        .min()
}
