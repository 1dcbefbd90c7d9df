//! Applying a verified payment to a subscription.
//!
//! Payment verification against the gateway happens before this point.

use chrono::{DateTime, Utc};
use common::error::{AppError, Res};
use db::{
    models::user::{FREE_PLAN_NAME, PaymentInfo, SubscriptionState, User},
    store::UserStore,
};

use super::{catalog::catalog, expiry::compute_expiry};
use crate::{dtos::sub::ActivatePlanRequest, models::plan::PlanDefinition};

/// Rejects users that already hold an active paid plan.
pub fn ensure_upgradable(state: &SubscriptionState) -> Res<()> {
    if state.is_paid_user && state.plan_name != FREE_PLAN_NAME {
        return Err(AppError::BadRequest(
            "User already has an active subscription".to_string(),
        ));
    }
    Ok(())
}

/// Switches the subscription to `plan`, starting at the payment date.
pub fn activate_plan(
    state: &mut SubscriptionState,
    plan: &PlanDefinition,
    payment: PaymentInfo,
) -> Res<()> {
    if !plan.requires_payment() {
        return Err(AppError::BadRequest("Invalid plan type".to_string()));
    }
    ensure_upgradable(state)?;

    let activated_at = payment.payment_date;
    state.is_paid_user = true;
    state.plan_name = plan.name.clone();
    state.plan_id = Some(plan.id.clone());
    state.plan_activated_at = Some(activated_at);
    state.plan_expires_at = compute_expiry(Some(activated_at), plan);
    state.payment_info = Some(payment);
    Ok(())
}

/// Applies a verified payment made at `now` and persists the new state.
pub async fn activate_subscription(
    store: &dyn UserStore,
    mut user: User,
    req: ActivatePlanRequest,
    now: DateTime<Utc>,
) -> Res<User> {
    if [&req.order_id, &req.payment_id, &req.signature]
        .iter()
        .any(|field| field.trim().is_empty())
    {
        return Err(AppError::BadRequest(
            "Missing required payment details".to_string(),
        ));
    }

    let catalog = catalog();
    let plan = catalog
        .find(&req.plan_id)
        .filter(|plan| catalog.is_payable_id(&plan.id))
        .ok_or_else(|| AppError::BadRequest("Invalid plan type".to_string()))?;

    activate_plan(
        &mut user.subscription,
        plan,
        PaymentInfo {
            order_id: req.order_id,
            payment_id: req.payment_id.clone(),
            signature: req.signature,
            payment_date: now,
        },
    )?;
    store.save(&user).await?;

    log::info!(
        "Activated plan {} for user {} with payment {}",
        plan.id,
        user.id,
        req.payment_id
    );
    Ok(user)
}

#[cfg(test)]
mod tests {
    use chrono::{TimeDelta, TimeZone, Utc};

    use db::store::memory::{InMemoryStore, user_with};

    use super::*;
    use crate::services::freshness::{SubscriptionPhase, reconcile};

    fn payment() -> PaymentInfo {
        PaymentInfo {
            order_id: "order_9".to_string(),
            payment_id: "pay_9".to_string(),
            signature: "sig_9".to_string(),
            payment_date: Utc.with_ymd_and_hms(2025, 6, 1, 9, 0, 0).unwrap(),
        }
    }

    #[test]
    fn activation_sets_dates_from_payment() {
        let plan = catalog().get_plan_by_id_or_default(Some("STARTFREETRIAL"));
        let mut state = SubscriptionState::default();

        activate_plan(&mut state, plan, payment()).unwrap();

        let paid_at = payment().payment_date;
        assert!(state.is_paid_user);
        assert_eq!(state.plan_name, "Professional Plan");
        assert_eq!(state.plan_id.as_deref(), Some("STARTFREETRIAL"));
        assert_eq!(state.plan_activated_at, Some(paid_at));
        assert_eq!(state.plan_expires_at, Some(paid_at + TimeDelta::days(30)));
        assert_eq!(state.payment_info, Some(payment()));
    }

    #[test]
    fn free_plan_cannot_be_bought() {
        let mut state = SubscriptionState::default();
        let err = activate_plan(&mut state, catalog().default_plan(), payment()).unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
        assert_eq!(state, SubscriptionState::default());
    }

    #[test]
    fn active_subscription_blocks_second_purchase() {
        let plan = catalog().get_plan_by_id_or_default(Some("STARTFREETRIAL"));
        let mut state = SubscriptionState::default();
        activate_plan(&mut state, plan, payment()).unwrap();
        assert!(activate_plan(&mut state, plan, payment()).is_err());
    }

    #[test]
    fn expired_then_downgraded_user_can_buy_again() {
        let plan = catalog().get_plan_by_id_or_default(Some("STARTFREETRIAL"));
        let mut state = SubscriptionState::default();
        activate_plan(&mut state, plan, payment()).unwrap();

        let later = payment().payment_date + TimeDelta::days(45);
        reconcile(&mut state, later);
        assert_eq!(SubscriptionPhase::of(&state, later), SubscriptionPhase::Free);

        let renewal = PaymentInfo {
            payment_date: later,
            ..payment()
        };
        activate_plan(&mut state, plan, renewal).unwrap();
        assert_eq!(SubscriptionPhase::of(&state, later), SubscriptionPhase::PaidActive);
    }

    fn request(plan_id: &str) -> ActivatePlanRequest {
        ActivatePlanRequest {
            plan_id: plan_id.to_string(),
            order_id: "order_9".to_string(),
            payment_id: "pay_9".to_string(),
            signature: "sig_9".to_string(),
        }
    }

    #[actix_web::test]
    async fn activation_is_persisted() {
        let store = InMemoryStore::new();
        let user = user_with(SubscriptionState::default());
        store.insert_user(user.clone());
        let now = payment().payment_date;

        let user = activate_subscription(&store, user, request("startfreetrial"), now)
            .await
            .unwrap();

        assert_eq!(store.saves(), 1);
        assert_eq!(store.user(user.id).unwrap(), user);
        assert_eq!(
            user.subscription.plan_expires_at,
            Some(now + TimeDelta::days(30))
        );
    }

    #[actix_web::test]
    async fn rejected_activation_writes_nothing() {
        let store = InMemoryStore::new();
        let user = user_with(SubscriptionState::default());
        let now = payment().payment_date;

        let free = activate_subscription(&store, user.clone(), request("GETSTARTED"), now).await;
        assert!(matches!(free, Err(AppError::BadRequest(_))));

        let mut unsigned = request("STARTFREETRIAL");
        unsigned.signature = " ".to_string();
        let unsigned = activate_subscription(&store, user, unsigned, now).await;
        assert!(matches!(unsigned, Err(AppError::BadRequest(_))));

        assert_eq!(store.saves(), 0);
    }
}
