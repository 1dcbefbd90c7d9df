use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BillingPeriod {
    Forever,
    Week,
    Month,
    Year,
}

impl BillingPeriod {
    /// Days covered by one billing period, `None` for plans that never expire.
    pub fn default_days(&self) -> Option<i64> {
        match self {
            BillingPeriod::Forever => None,
            BillingPeriod::Week => Some(7),
            BillingPeriod::Month => Some(30),
            BillingPeriod::Year => Some(365),
        }
    }
}

/// Quotas attached to a plan. `None` means unlimited.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanLimits {
    pub monthly_email_generations: Option<u32>,
    pub max_regenerations_per_email: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanDefinition {
    pub id: String,
    pub name: String,
    pub description: String,
    /// Price in minor units. Zero marks the free tier.
    pub amount: i64,
    pub currency: String,
    pub billing_period: BillingPeriod,
    /// Overrides the duration derived from `billing_period`.
    pub duration_in_days: Option<i64>,
    pub limits: PlanLimits,
    pub features: Vec<String>,
    pub button_text: String,
    pub popular: bool,
}

impl PlanDefinition {
    pub fn requires_payment(&self) -> bool {
        self.amount > 0
    }
}
