//! Condition application: merge governing rules into observed status

use chrono::{DateTime, Utc};
use nop_api::{Condition, ConditionRule, ConditionSet, ConditionType};
use tracing::trace;

use crate::{evaluate, ScheduledResource};

/// Write one `Available` condition per selected rule, replacing by type.
///
/// Every selected type gets `last_transition_time = now`, even when its
/// status is unchanged. Returns the types whose status or reason changed.
pub fn apply(
    conditions: &mut ConditionSet,
    selected: &[usize],
    rules: &[ConditionRule],
    now: DateTime<Utc>,
) -> Vec<ConditionType> {
    let mut changed = Vec::new();

    for rule in selected.iter().filter_map(|&index| rules.get(index)) {
        let condition = Condition::available(rule.condition_type.clone(), rule.status, now);

        let same = conditions
            .get(&rule.condition_type)
            .is_some_and(|existing| existing.same_state(&condition));
        if !same {
            changed.push(rule.condition_type.clone());
        }

        trace!(
            condition_type = %rule.condition_type,
            status = %rule.status,
            threshold = %rule.threshold_text,
            "Applying governing rule"
        );
        conditions.set(condition);
    }

    changed
}

/// Evaluate a resource's rules at `now` and apply the result to its status.
///
/// Elapsed time is measured from the creation time and clamped at zero.
/// Resources carrying a deletion marker are left untouched.
pub fn apply_schedule<R: ScheduledResource + ?Sized>(
    resource: &mut R,
    now: DateTime<Utc>,
) -> Vec<ConditionType> {
    if resource.was_deleted() {
        return Vec::new();
    }

    let elapsed = nop_util::elapsed_since(resource.creation_time(), now);
    let rules = resource.rules().to_vec();
    let selected = evaluate(&rules, elapsed);

    apply(resource.conditions_mut(), &selected, &rules, now)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::NopResource;
    use chrono::TimeZone;
    use nop_api::{ConditionReason, ConditionStatus};
    use nop_util::ResourceName;
    use std::time::Duration;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 1, 9, 0, 0).unwrap()
    }

    fn at(secs: i64) -> DateTime<Utc> {
        t0() + chrono::Duration::seconds(secs)
    }

    fn rules() -> Vec<ConditionRule> {
        vec![
            ConditionRule::new(Duration::from_secs(1), "Ready", ConditionStatus::False),
            ConditionRule::new(Duration::from_secs(4), "Ready", ConditionStatus::True),
            ConditionRule::new(Duration::from_secs(2), "Synced", ConditionStatus::True),
        ]
    }

    #[test]
    fn apply_replaces_by_type() {
        let rules = rules();
        let mut conditions = ConditionSet::new();

        let changed = apply(&mut conditions, &[0, 2], &rules, at(2));
        assert_eq!(changed.len(), 2);
        assert_eq!(conditions.len(), 2);

        let changed = apply(&mut conditions, &[1, 2], &rules, at(5));
        assert_eq!(changed, vec![ConditionType::ready()]);
        assert_eq!(conditions.len(), 2);

        let ready = conditions.get(&ConditionType::ready()).unwrap();
        assert_eq!(ready.status, ConditionStatus::True);
        assert_eq!(ready.reason, ConditionReason::Available);
        assert_eq!(ready.last_transition_time, at(5));
    }

    #[test]
    fn reapplying_only_moves_timestamp() {
        let rules = rules();
        let mut conditions = ConditionSet::new();

        apply(&mut conditions, &[1, 2], &rules, at(5));
        let before = conditions.summary();

        let changed = apply(&mut conditions, &[1, 2], &rules, at(9));
        assert!(changed.is_empty());
        assert_eq!(conditions.summary(), before);
        assert!(conditions.iter().all(|c| c.last_transition_time == at(9)));
    }

    #[test]
    fn unselected_types_are_left_alone() {
        let rules = rules();
        let mut conditions = ConditionSet::new();
        conditions.set(Condition::available(
            ConditionType::new("Healthy"),
            ConditionStatus::Unknown,
            t0(),
        ));

        apply(&mut conditions, &[0], &rules, at(1));

        let healthy = conditions.get(&ConditionType::new("Healthy")).unwrap();
        assert_eq!(healthy.last_transition_time, t0());
        assert_eq!(conditions.len(), 2);
    }

    #[test]
    fn out_of_range_indices_are_ignored() {
        let mut conditions = ConditionSet::new();
        assert!(apply(&mut conditions, &[7], &rules(), at(1)).is_empty());
        assert!(conditions.is_empty());
    }

    #[test]
    fn apply_schedule_uses_resource_age() {
        let mut cr = NopResource::new(ResourceName::new("example"), rules(), t0());

        assert!(apply_schedule(&mut cr, at(0)).is_empty());
        assert!(cr.status.conditions.is_empty());

        apply_schedule(&mut cr, at(3));
        assert_eq!(
            cr.status.conditions.summary(),
            vec![
                (ConditionType::ready(), ConditionStatus::False),
                (ConditionType::synced(), ConditionStatus::True),
            ]
        );

        apply_schedule(&mut cr, at(4));
        let ready = cr.status.conditions.get(&ConditionType::ready()).unwrap();
        assert_eq!(ready.status, ConditionStatus::True);
    }

    #[test]
    fn apply_schedule_skips_deleted_resources() {
        let mut cr = NopResource::new(ResourceName::new("doomed"), rules(), t0());
        cr.meta.deletion_time = Some(at(1));

        assert!(apply_schedule(&mut cr, at(10)).is_empty());
        assert!(cr.status.conditions.is_empty());
    }

    #[test]
    fn clock_skew_only_applies_zero_thresholds() {
        let rules = vec![
            ConditionRule::new(Duration::ZERO, "Synced", ConditionStatus::True),
            ConditionRule::new(Duration::from_secs(1), "Ready", ConditionStatus::True),
        ];
        let mut cr = NopResource::new(ResourceName::new("skewed"), rules, at(60));

        apply_schedule(&mut cr, t0());
        assert_eq!(
            cr.status.conditions.summary(),
            vec![(ConditionType::synced(), ConditionStatus::True)]
        );
    }
}
