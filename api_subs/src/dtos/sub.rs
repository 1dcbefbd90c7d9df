use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::plan::{BillingPeriod, PlanDefinition, PlanLimits};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanUsageSummary {
    pub plan: PlanSummary,
    pub usage: UsageBreakdown,
    pub capabilities: Capabilities,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanSummary {
    pub id: String,
    pub name: String,
    pub requires_payment: bool,
    pub description: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageBreakdown {
    pub monthly_email_generations: MonthlyUsageSnapshot,
}

#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyUsageSnapshot {
    pub used: i64,
    pub window_start: DateTime<Utc>,
    pub window_end: DateTime<Utc>,
    /// `None` when the plan has no monthly cap.
    pub limit: Option<u32>,
}

#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Capabilities {
    pub max_regenerations_per_email: Option<u32>,
}

/// A catalog plan as shown on the pricing page.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanResponse {
    pub id: String,
    pub name: String,
    pub description: String,
    pub amount: i64,
    pub currency: String,
    pub billing_period: BillingPeriod,
    pub duration_in_days: Option<i64>,
    pub requires_payment: bool,
    pub limits: PlanLimits,
    pub features: Vec<String>,
    pub button_text: String,
    pub popular: bool,
}

impl From<&PlanDefinition> for PlanResponse {
    fn from(plan: &PlanDefinition) -> Self {
        Self {
            id: plan.id.clone(),
            name: plan.name.clone(),
            description: plan.description.clone(),
            amount: plan.amount,
            currency: plan.currency.clone(),
            billing_period: plan.billing_period,
            duration_in_days: plan.duration_in_days,
            requires_payment: plan.requires_payment(),
            limits: plan.limits,
            features: plan.features.clone(),
            button_text: plan.button_text.clone(),
            popular: plan.popular,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionPlansResponse {
    pub plans: Vec<PlanResponse>,
    pub default_plan_id: String,
    pub payable_plan_ids: Vec<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionStatusResponse {
    pub is_paid_user: bool,
    pub plan_name: String,
    pub plan: PlanSummary,
    pub plan_activated_at: Option<DateTime<Utc>>,
    pub plan_expires_at: Option<DateTime<Utc>>,
    pub days_until_expiry: Option<i64>,
    pub renewal_reminder_date: Option<DateTime<Utc>>,
    pub reminder_due: bool,
}

#[derive(Debug, Serialize)]
pub struct UsageSummaryResponse {
    pub data: PlanUsageSummary,
}

/// A payment already verified with the gateway.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivatePlanRequest {
    pub plan_id: String,
    pub order_id: String,
    pub payment_id: String,
    pub signature: String,
}
