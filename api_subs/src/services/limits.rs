//! Quota checks consulted before generating or refining an email.
//!
//! Checks only read; they never change counters. Concurrent requests near a
//! boundary may both pass.

use common::error::{AppError, Res};
use db::{models::user::User, store::EmailStore};
use uuid::Uuid;

use crate::{
    models::{plan::PlanDefinition, usage::MonthlyUsage},
    services::catalog::catalog,
};

fn limit_reached(limit: Option<u32>, current: i64) -> bool {
    limit.is_some_and(|max| current >= i64::from(max))
}

/// Denies once `used` reaches the plan's monthly limit.
pub fn check_monthly_quota(plan: &PlanDefinition, usage: &MonthlyUsage) -> Res<()> {
    let limit = plan.limits.monthly_email_generations;
    if limit_reached(limit, usage.used) {
        return Err(AppError::QuotaExceeded(format!(
            "You have reached the {} plan limit of {} emails this month. Please upgrade your plan to continue.",
            plan.name,
            limit.unwrap_or_default()
        )));
    }
    Ok(())
}

pub fn regeneration_allowed(max_regenerations: Option<u32>, current_regenerations: i64) -> bool {
    !limit_reached(max_regenerations, current_regenerations)
}

fn regeneration_denied(limit: Option<u32>) -> AppError {
    AppError::QuotaExceeded(format!(
        "Your current plan allows {} updates per email. Upgrade to unlock unlimited revisions.",
        limit.unwrap_or_default()
    ))
}

/// Denies once the email has as many revisions as the plan allows.
pub fn ensure_regeneration_allowed(plan: &PlanDefinition, current_regenerations: i64) -> Res<()> {
    let limit = plan.limits.max_regenerations_per_email;
    if !regeneration_allowed(limit, current_regenerations) {
        return Err(regeneration_denied(limit));
    }
    Ok(())
}

/// Whether the user may refine the given email once more.
pub async fn check_regeneration_limit(
    store: &dyn EmailStore,
    user: &User,
    email_id: Uuid,
) -> Res<bool> {
    let plan = catalog().plan_for_user(user);
    let current = store.count_revisions(email_id).await?;
    Ok(regeneration_allowed(
        plan.limits.max_regenerations_per_email,
        current,
    ))
}

/// Like [`check_regeneration_limit`], but a denial is a `QuotaExceeded`
/// error carrying the user-facing message.
pub async fn enforce_regeneration_limit(
    store: &dyn EmailStore,
    user: &User,
    email_id: Uuid,
) -> Res<()> {
    if !check_regeneration_limit(store, user, email_id).await? {
        let plan = catalog().plan_for_user(user);
        return Err(regeneration_denied(
            plan.limits.max_regenerations_per_email,
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use db::{
        models::user::SubscriptionState,
        store::memory::{InMemoryStore, user_with},
    };

    use super::*;
    use crate::services::catalog::DEFAULT_PLAN_ID;

    fn usage(used: i64) -> MonthlyUsage {
        let start = Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2025, 7, 1, 0, 0, 0).unwrap();
        MonthlyUsage {
            used,
            window_start: start,
            window_end: end,
        }
    }

    #[test]
    fn monthly_quota_denies_at_limit_not_after() {
        let free = catalog().get_plan_by_id_or_default(Some(DEFAULT_PLAN_ID));
        assert!(check_monthly_quota(free, &usage(49)).is_ok());

        let err = check_monthly_quota(free, &usage(50)).unwrap_err();
        assert!(matches!(err, AppError::QuotaExceeded(_)));
        assert_eq!(
            err.to_string(),
            "You have reached the Starter Plan plan limit of 50 emails this month. Please upgrade your plan to continue."
        );
    }

    #[test]
    fn unlimited_monthly_quota_never_denies() {
        let mut plan = catalog().default_plan().clone();
        plan.limits.monthly_email_generations = None;
        assert!(check_monthly_quota(&plan, &usage(1_000_000)).is_ok());
    }

    #[test]
    fn zero_limits_deny_everything() {
        assert!(!regeneration_allowed(Some(0), 0));
        let mut plan = catalog().default_plan().clone();
        plan.limits.monthly_email_generations = Some(0);
        assert!(check_monthly_quota(&plan, &usage(0)).is_err());
    }

    #[test]
    fn regeneration_boundary() {
        assert!(regeneration_allowed(Some(3), 2));
        assert!(!regeneration_allowed(Some(3), 3));
        assert!(!regeneration_allowed(Some(3), 4));
        assert!(regeneration_allowed(None, 10_000));

        let free = catalog().default_plan();
        let err = ensure_regeneration_allowed(free, 3).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Your current plan allows 3 updates per email. Upgrade to unlock unlimited revisions."
        );
    }

    #[actix_web::test]
    async fn regeneration_check_reads_revision_count() {
        let store = InMemoryStore::new();
        let user = user_with(SubscriptionState::default());
        let email_id = Uuid::new_v4();

        store.set_revisions(email_id, 2);
        assert!(check_regeneration_limit(&store, &user, email_id).await.unwrap());

        store.set_revisions(email_id, 3);
        assert!(!check_regeneration_limit(&store, &user, email_id).await.unwrap());
        assert_eq!(store.count_revisions(email_id).await.unwrap(), 3);
    }

    #[actix_web::test]
    async fn paid_plan_has_unlimited_regenerations() {
        let store = InMemoryStore::new();
        let user = user_with(SubscriptionState {
            is_paid_user: true,
            plan_id: Some("STARTFREETRIAL".to_string()),
            ..SubscriptionState::default()
        });
        let email_id = Uuid::new_v4();
        store.set_revisions(email_id, 50);
        assert!(check_regeneration_limit(&store, &user, email_id).await.unwrap());
    }

    #[actix_web::test]
    async fn enforced_regeneration_limit_explains_denial() {
        let store = InMemoryStore::new();
        let user = user_with(SubscriptionState::default());
        let email_id = Uuid::new_v4();
        assert!(enforce_regeneration_limit(&store, &user, email_id).await.is_ok());

        store.set_revisions(email_id, 3);
        let err = enforce_regeneration_limit(&store, &user, email_id)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::QuotaExceeded(_)));
        assert_eq!(
            err.to_string(),
            "Your current plan allows 3 updates per email. Upgrade to unlock unlimited revisions."
        );
    }
}
