//! Plan activation, expiry and renewal arithmetic.
//!
//! All durations are whole days of exactly `DAY_IN_MS` milliseconds added to
//! the stored instant, so no calendar or timezone adjustment takes place.

use chrono::{DateTime, TimeDelta, Utc};

use crate::models::plan::PlanDefinition;

pub const DAY_IN_MS: i64 = 24 * 60 * 60 * 1000;

/// Default renewal reminder window.
pub const DEFAULT_REMINDER_DAYS: i64 = 2;

/// Where a plan duration comes from.
#[derive(Debug, Clone, Copy)]
pub enum PlanTerm<'a> {
    Days(i64),
    Plan(&'a PlanDefinition),
}

impl From<i64> for PlanTerm<'_> {
    fn from(days: i64) -> Self {
        PlanTerm::Days(days)
    }
}

impl<'a> From<&'a PlanDefinition> for PlanTerm<'a> {
    fn from(plan: &'a PlanDefinition) -> Self {
        PlanTerm::Plan(plan)
    }
}

/// Duration in days, `None` when the term never expires.
///
/// A plan's explicit `duration_in_days` wins over its billing period. A zero
/// duration counts as no expiry.
pub fn resolve_duration_days<'a>(term: impl Into<PlanTerm<'a>>) -> Option<i64> {
    let days = match term.into() {
        PlanTerm::Days(days) => Some(days),
        PlanTerm::Plan(plan) => plan
            .duration_in_days
            .or_else(|| plan.billing_period.default_days()),
    };
    days.filter(|d| *d != 0)
}

fn days(count: i64) -> Option<TimeDelta> {
    count
        .checked_mul(DAY_IN_MS)
        .and_then(TimeDelta::try_milliseconds)
}

pub fn compute_expiry<'a>(
    activated_at: Option<DateTime<Utc>>,
    term: impl Into<PlanTerm<'a>>,
) -> Option<DateTime<Utc>> {
    let activated_at = activated_at?;
    let duration = days(resolve_duration_days(term)?)?;
    activated_at.checked_add_signed(duration)
}

pub fn renewal_reminder_date(
    expires_at: Option<DateTime<Utc>>,
    reminder_days: i64,
) -> Option<DateTime<Utc>> {
    expires_at?.checked_sub_signed(days(reminder_days)?)
}

/// Whole days left, rounded up. Negative once expired.
pub fn days_until_expiry(expires_at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> Option<i64> {
    let diff = (expires_at? - now).num_milliseconds();
    Some(-(-diff).div_euclid(DAY_IN_MS))
}

/// True on `[expires_at - reminder_days, expires_at)`.
pub fn is_reminder_due(
    expires_at: Option<DateTime<Utc>>,
    reminder_days: i64,
    now: DateTime<Utc>,
) -> bool {
    match (expires_at, renewal_reminder_date(expires_at, reminder_days)) {
        (Some(expires_at), Some(reminder_at)) => reminder_at <= now && now < expires_at,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;
    use crate::{
        models::plan::BillingPeriod,
        services::catalog::{DEFAULT_PLAN_ID, catalog},
    };

    fn at(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
    }

    fn plan_with(period: BillingPeriod, duration: Option<i64>) -> PlanDefinition {
        PlanDefinition {
            billing_period: period,
            duration_in_days: duration,
            ..catalog().default_plan().clone()
        }
    }

    #[test]
    fn duration_prefers_explicit_days_over_period() {
        assert_eq!(resolve_duration_days(&plan_with(BillingPeriod::Year, Some(10))), Some(10));
        assert_eq!(resolve_duration_days(&plan_with(BillingPeriod::Week, None)), Some(7));
        assert_eq!(resolve_duration_days(&plan_with(BillingPeriod::Month, None)), Some(30));
        assert_eq!(resolve_duration_days(&plan_with(BillingPeriod::Year, None)), Some(365));
        assert_eq!(resolve_duration_days(&plan_with(BillingPeriod::Forever, None)), None);
        assert_eq!(resolve_duration_days(45_i64), Some(45));
        assert_eq!(resolve_duration_days(0_i64), None);
    }

    #[test]
    fn expiry_adds_exact_milliseconds() {
        let activated = Utc.timestamp_millis_opt(1_700_000_123_456).unwrap();
        let plan = plan_with(BillingPeriod::Month, Some(30));
        let expiry = compute_expiry(Some(activated), &plan).unwrap();
        assert_eq!(
            expiry.timestamp_millis(),
            activated.timestamp_millis() + 30 * DAY_IN_MS
        );
    }

    #[test]
    fn forever_plan_and_missing_activation_never_expire() {
        let free = catalog().get_plan_by_id_or_default(Some(DEFAULT_PLAN_ID));
        assert_eq!(compute_expiry(Some(at(2025, 1, 1, 0)), free), None);
        assert_eq!(compute_expiry(None, 30_i64), None);
    }

    #[test]
    fn reminder_date_subtracts_days() {
        let expires = at(2025, 3, 10, 12);
        assert_eq!(renewal_reminder_date(Some(expires), 2), Some(at(2025, 3, 8, 12)));
        assert_eq!(renewal_reminder_date(None, 2), None);
    }

    #[test]
    fn days_until_expiry_rounds_up_and_goes_negative() {
        let expires = at(2025, 3, 10, 12);
        assert_eq!(days_until_expiry(Some(expires), at(2025, 3, 10, 11)), Some(1));
        assert_eq!(days_until_expiry(Some(expires), at(2025, 3, 8, 12)), Some(2));
        assert_eq!(days_until_expiry(Some(expires), expires), Some(0));
        assert_eq!(days_until_expiry(Some(expires), at(2025, 3, 10, 13)), Some(0));
        assert_eq!(days_until_expiry(Some(expires), at(2025, 3, 12, 13)), Some(-2));
        assert_eq!(days_until_expiry(None, expires), None);
    }

    #[test]
    fn reminder_due_only_inside_half_open_window() {
        let expires = at(2025, 3, 10, 12);
        let reminder = at(2025, 3, 8, 12);
        let just_before = reminder - TimeDelta::milliseconds(1);
        let just_inside = expires - TimeDelta::milliseconds(1);

        assert!(!is_reminder_due(Some(expires), 2, just_before));
        assert!(is_reminder_due(Some(expires), 2, reminder));
        assert!(is_reminder_due(Some(expires), 2, just_inside));
        assert!(!is_reminder_due(Some(expires), 2, expires));
        assert!(!is_reminder_due(Some(expires), 2, at(2025, 4, 1, 0)));
        assert!(!is_reminder_due(None, 2, reminder));
    }

    #[test]
    fn reminder_due_is_monotonic_over_time() {
        let expires = at(2025, 3, 10, 12);
        let states: Vec<bool> = (0..96)
            .map(|h| is_reminder_due(Some(expires), 2, at(2025, 3, 7, 0) + TimeDelta::hours(h)))
            .collect();
        let first_true = states.iter().position(|s| *s).unwrap();
        let last_true = states.iter().rposition(|s| *s).unwrap();
        assert!(states[first_true..=last_true].iter().all(|s| *s));
        assert!(states[..first_true].iter().all(|s| !*s));
        assert!(states[last_true + 1..].iter().all(|s| !*s));
    }
}
