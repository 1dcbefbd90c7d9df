use std::sync::Arc;

use actix_web::{Responder, get, post, web};
use chrono::{DateTime, Utc};
use common::{clock::Clock, env_config::Config, error::Res, http::Success};
use db::{
    models::user::User,
    store::{EmailStore, UserStore},
};

use crate::{
    dtos::sub::{
        ActivatePlanRequest, PlanResponse, PlanSummary, SubscriptionPlansResponse,
        SubscriptionStatusResponse, UsageSummaryResponse,
    },
    services::{
        activation::activate_subscription,
        catalog::catalog,
        expiry::{days_until_expiry, is_reminder_due, renewal_reminder_date},
        usage::build_usage_summary,
    },
};

/// Lists every plan of the catalog.
///
/// # Output
/// - Success: Returns the plans, the default plan id and the ids that require payment
///
/// # Frontend Example
/// ```javascript
/// const response = await fetch('/api/sub/plans');
///
/// if (response.ok) {
///   const data = await response.json();
///   // {
///   //   plans: [{ id: "GETSTARTED", name: "Starter Plan", amount: 0, ... }, ...],
///   //   defaultPlanId: "GETSTARTED",
///   //   payablePlanIds: ["STARTFREETRIAL"]
///   // }
/// }
/// ```
#[get("/plans")]
pub async fn get_plans() -> Res<impl Responder> {
    let catalog = catalog();
    Success::ok(SubscriptionPlansResponse {
        plans: catalog.plans().iter().map(PlanResponse::from).collect(),
        default_plan_id: catalog.default_plan().id.clone(),
        payable_plan_ids: catalog.payable_plan_ids().to_vec(),
    })
}

/// Returns the plan, monthly generation usage and capabilities of the
/// authenticated user.
///
/// # Frontend Example
/// ```javascript
/// const response = await fetch('/api/dashboard/sub/usage', { credentials: 'include' });
///
/// if (response.ok) {
///   const { data } = await response.json();
///   // data.usage.monthlyEmailGenerations => { used: 12, limit: 50, windowStart, windowEnd }
/// }
/// ```
#[get("/usage")]
pub async fn get_usage(
    user: web::ReqData<User>,
    store: web::Data<Arc<dyn EmailStore>>,
    clock: web::Data<Arc<dyn Clock>>,
) -> Res<impl Responder> {
    let plan = catalog().plan_for_user(&user);
    let summary = build_usage_summary(&***store, &user, plan, clock.now(), None).await?;
    Success::ok(UsageSummaryResponse { data: summary })
}

/// Returns the subscription of the authenticated user with its renewal state.
///
/// # Output
/// - `daysUntilExpiry`: whole days left, rounded up, `null` without expiry
/// - `renewalReminderDate`: when the renewal reminder starts
/// - `reminderDue`: whether the reminder should be shown now
#[get("/current")]
pub async fn get_current(
    user: web::ReqData<User>,
    config: web::Data<Arc<Config>>,
    clock: web::Data<Arc<dyn Clock>>,
) -> Res<impl Responder> {
    Success::ok(status_response(
        &user,
        config.renewal_reminder_days,
        clock.now(),
    ))
}

/// Applies a payment that was already verified with the gateway and starts
/// the paid plan at the current time.
///
/// # Output
/// - Success: Returns the new subscription status, as `/current` does
/// - Error: 400 for a free or unknown plan, missing payment details, or an
///   active subscription
///
/// # Frontend Example
/// ```javascript
/// const response = await fetch('/api/dashboard/sub/activate', {
///   method: 'POST',
///   credentials: 'include',
///   headers: { 'Content-Type': 'application/json' },
///   body: JSON.stringify({
///     planId: 'STARTFREETRIAL',
///     orderId: order.id,
///     paymentId: payment.id,
///     signature: payment.signature
///   })
/// });
/// ```
#[post("/activate")]
pub async fn post_activate(
    user: web::ReqData<User>,
    store: web::Data<Arc<dyn UserStore>>,
    config: web::Data<Arc<Config>>,
    clock: web::Data<Arc<dyn Clock>>,
    req: web::Json<ActivatePlanRequest>,
) -> Res<impl Responder> {
    let now = clock.now();
    let user =
        activate_subscription(&***store, user.into_inner(), req.into_inner(), now).await?;
    Success::ok(status_response(&user, config.renewal_reminder_days, now))
}

fn status_response(
    user: &User,
    reminder_days: i64,
    now: DateTime<Utc>,
) -> SubscriptionStatusResponse {
    let state = &user.subscription;
    let plan = catalog().plan_for_user(user);

    SubscriptionStatusResponse {
        is_paid_user: state.is_paid_user,
        plan_name: state.plan_name.clone(),
        plan: PlanSummary {
            id: plan.id.clone(),
            name: plan.name.clone(),
            requires_payment: plan.requires_payment(),
            description: plan.description.clone(),
        },
        plan_activated_at: state.plan_activated_at,
        plan_expires_at: state.plan_expires_at,
        days_until_expiry: days_until_expiry(state.plan_expires_at, now),
        renewal_reminder_date: renewal_reminder_date(state.plan_expires_at, reminder_days),
        reminder_due: is_reminder_due(state.plan_expires_at, reminder_days, now),
    }
}

#[cfg(test)]
mod tests {
    use actix_web::{App, HttpMessage, dev::ServiceResponse, http::StatusCode, test};
    use chrono::{DateTime, TimeDelta, TimeZone, Utc};
    use common::{
        clock::FixedClock,
        env_config::{ComposerConfig, JwtConfig},
    };
    use db::{
        models::user::SubscriptionState,
        store::memory::{InMemoryStore, user_with},
    };
    use serde_json::Value;

    use super::*;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 15, 12, 0, 0).unwrap()
    }

    fn config() -> Arc<Config> {
        Arc::new(Config {
            environment: "development".to_string(),
            database_url: String::new(),
            jwt_config: JwtConfig {
                secret: "secret".to_string(),
                expiration_hours: 1,
            },
            server_host: "127.0.0.1".to_string(),
            server_port: 8080,
            num_workers: 1,
            cors_allowed_origin: "http://localhost:3000".to_string(),
            console_logging_enabled: false,
            renewal_reminder_days: 2,
            composer: ComposerConfig {
                url: String::new(),
                api_key: String::new(),
            },
        })
    }

    /// Serves `req` the way `core` mounts the routes, with `user` already
    /// authenticated.
    async fn call(
        req: test::TestRequest,
        user: User,
        store: Arc<InMemoryStore>,
    ) -> ServiceResponse {
        let email_store: Arc<dyn EmailStore> = store.clone();
        let user_store: Arc<dyn UserStore> = store;
        let clock: Arc<dyn Clock> = Arc::new(FixedClock(now()));
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(email_store))
                .app_data(web::Data::new(user_store))
                .app_data(web::Data::new(clock))
                .app_data(web::Data::new(config()))
                .service(crate::mount_plans())
                .service(web::scope("/dashboard").service(crate::mount_subs())),
        )
        .await;
        let req = req.to_request();
        req.extensions_mut().insert(user);
        test::call_service(&app, req).await
    }

    async fn get_json(uri: &str, user: User, store: Arc<InMemoryStore>) -> Value {
        let res = call(test::TestRequest::get().uri(uri), user, store).await;
        assert_eq!(res.status(), StatusCode::OK);
        test::read_body_json(res).await
    }

    #[actix_web::test]
    async fn plans_lists_catalog() {
        let user = user_with(SubscriptionState::default());
        let body = get_json("/sub/plans", user, Arc::new(InMemoryStore::new())).await;
        assert_eq!(body["defaultPlanId"], "GETSTARTED");
        assert_eq!(body["payablePlanIds"][0], "STARTFREETRIAL");
        assert_eq!(body["plans"].as_array().unwrap().len(), 2);
        assert_eq!(body["plans"][1]["requiresPayment"], true);
    }

    #[actix_web::test]
    async fn usage_reports_current_month() {
        let store = Arc::new(InMemoryStore::new());
        let user = user_with(SubscriptionState::default());
        store.add_email(user.id, now());
        store.add_email(user.id, now() - TimeDelta::days(40));

        let body = get_json("/dashboard/sub/usage", user, store).await;
        let monthly = &body["data"]["usage"]["monthlyEmailGenerations"];
        assert_eq!(monthly["used"], 1);
        assert_eq!(monthly["limit"], 50);
        assert_eq!(body["data"]["plan"]["id"], "GETSTARTED");
        assert_eq!(body["data"]["capabilities"]["maxRegenerationsPerEmail"], 3);
    }

    #[actix_web::test]
    async fn current_flags_due_reminder() {
        let user = user_with(SubscriptionState {
            is_paid_user: true,
            plan_name: "Professional Plan".to_string(),
            plan_id: Some("STARTFREETRIAL".to_string()),
            plan_activated_at: Some(now() - TimeDelta::days(29)),
            plan_expires_at: Some(now() + TimeDelta::hours(30)),
            payment_info: None,
        });

        let body = get_json("/dashboard/sub/current", user, Arc::new(InMemoryStore::new())).await;
        assert_eq!(body["isPaidUser"], true);
        assert_eq!(body["plan"]["id"], "STARTFREETRIAL");
        assert_eq!(body["daysUntilExpiry"], 2);
        assert_eq!(body["reminderDue"], true);
    }

    #[actix_web::test]
    async fn current_for_free_user_has_no_expiry() {
        let user = user_with(SubscriptionState::default());
        let body = get_json("/dashboard/sub/current", user, Arc::new(InMemoryStore::new())).await;
        assert_eq!(body["isPaidUser"], false);
        assert!(body["daysUntilExpiry"].is_null());
        assert_eq!(body["reminderDue"], false);
    }

    #[actix_web::test]
    async fn activate_stores_thirty_day_term() {
        let store = Arc::new(InMemoryStore::new());
        let user = user_with(SubscriptionState::default());
        store.insert_user(user.clone());

        let req = test::TestRequest::post()
            .uri("/dashboard/sub/activate")
            .set_json(serde_json::json!({
                "planId": "STARTFREETRIAL",
                "orderId": "order_1",
                "paymentId": "pay_1",
                "signature": "sig_1"
            }));
        let res = call(req, user.clone(), store.clone()).await;
        assert_eq!(res.status(), StatusCode::OK);
        let body: Value = test::read_body_json(res).await;
        assert_eq!(body["isPaidUser"], true);
        assert_eq!(body["plan"]["id"], "STARTFREETRIAL");
        assert_eq!(body["daysUntilExpiry"], 30);

        let stored = store.user(user.id).unwrap().subscription;
        assert_eq!(stored.plan_activated_at, Some(now()));
        assert_eq!(stored.plan_expires_at, Some(now() + TimeDelta::days(30)));
        assert_eq!(stored.payment_info.unwrap().payment_date, now());
    }

    #[actix_web::test]
    async fn activate_refuses_free_plan() {
        let store = Arc::new(InMemoryStore::new());
        let user = user_with(SubscriptionState::default());
        store.insert_user(user.clone());

        let req = test::TestRequest::post()
            .uri("/dashboard/sub/activate")
            .set_json(serde_json::json!({
                "planId": "GETSTARTED",
                "orderId": "order_1",
                "paymentId": "pay_1",
                "signature": "sig_1"
            }));
        let res = call(req, user.clone(), store.clone()).await;
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        assert!(!store.user(user.id).unwrap().subscription.is_paid_user);
        assert_eq!(store.saves(), 0);
    }
}
