//! Lazy reconciliation of stored subscriptions against the current time.
//!
//! Runs once per authenticated request. Paid records from before expiry
//! tracking get their activation and expiry backfilled; expired paid records
//! are downgraded to the free tier. Nothing is written unless a field changed.

use chrono::{DateTime, Utc};
use db::{
    models::user::{FREE_PLAN_NAME, SubscriptionState, User},
    store::UserStore,
};

use super::expiry::compute_expiry;

/// Duration assumed when backfilling the expiry of legacy paid records,
/// whatever plan they hold.
pub const FALLBACK_DURATION_DAYS: i64 = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubscriptionPhase {
    Free,
    PaidActive,
    PaidExpired,
}

impl SubscriptionPhase {
    pub fn of(state: &SubscriptionState, now: DateTime<Utc>) -> Self {
        match (state.is_paid_user, state.plan_expires_at) {
            (false, _) => SubscriptionPhase::Free,
            (true, Some(expires_at)) if expires_at <= now => SubscriptionPhase::PaidExpired,
            (true, _) => SubscriptionPhase::PaidActive,
        }
    }
}

/// What a reconciliation pass changed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Reconciliation {
    pub backfilled: bool,
    pub downgraded: bool,
}

impl Reconciliation {
    pub fn requires_save(&self) -> bool {
        self.backfilled || self.downgraded
    }
}

/// Applies backfill and downgrade to `state` in place.
pub fn reconcile(state: &mut SubscriptionState, now: DateTime<Utc>) -> Reconciliation {
    let mut outcome = Reconciliation::default();
    if !state.is_paid_user {
        return outcome;
    }

    if state.plan_activated_at.is_none() {
        if let Some(paid_at) = state.payment_date() {
            state.plan_activated_at = Some(paid_at);
            outcome.backfilled = true;
        }
    }

    if state.plan_expires_at.is_none() {
        let anchor = state.plan_activated_at.or_else(|| state.payment_date());
        if let Some(expires_at) = compute_expiry(anchor, FALLBACK_DURATION_DAYS) {
            state.plan_expires_at = Some(expires_at);
            outcome.backfilled = true;
        }
    }

    if SubscriptionPhase::of(state, now) == SubscriptionPhase::PaidExpired {
        downgrade(state);
        outcome.downgraded = true;
    }

    outcome
}

fn downgrade(state: &mut SubscriptionState) {
    state.is_paid_user = false;
    state.plan_name = FREE_PLAN_NAME.to_string();
    state.plan_id = None;
    state.plan_activated_at = None;
    state.plan_expires_at = None;
}

/// Reconciles the user's subscription and persists it when it changed.
///
/// A failed write is logged and swallowed: the returned user carries the
/// reconciled state either way and the next request tries again.
pub async fn enforce_subscription_freshness(
    store: &dyn UserStore,
    mut user: User,
    now: DateTime<Utc>,
) -> User {
    let outcome = reconcile(&mut user.subscription, now);

    if outcome.downgraded {
        log::info!("Subscription of user {} expired, downgraded to free", user.id);
    } else if outcome.backfilled {
        log::debug!(
            "Backfilled subscription dates of user {}: activated={:?} expires={:?}",
            user.id,
            user.subscription.plan_activated_at,
            user.subscription.plan_expires_at
        );
    }

    if outcome.requires_save() {
        if let Err(e) = store.save(&user).await {
            log::error!(
                "Failed to persist subscription state of user {}: {}",
                user.id,
                e
            );
        }
    }

    user
}
