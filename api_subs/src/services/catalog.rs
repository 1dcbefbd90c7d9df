//! Static catalog of plans.
//!
//! Built once on first access and read-only afterwards.

use std::sync::LazyLock;

use common::error::{AppError, Res};
use db::models::user::User;

use crate::models::plan::{BillingPeriod, PlanDefinition, PlanLimits};

pub const DEFAULT_PLAN_ID: &str = "GETSTARTED";

static CATALOG: LazyLock<PlanCatalog> = LazyLock::new(|| {
    PlanCatalog::new(builtin_plans(), DEFAULT_PLAN_ID).expect("built-in plan catalog is valid")
});

/// The process-wide plan catalog.
pub fn catalog() -> &'static PlanCatalog {
    &CATALOG
}

#[derive(Debug)]
pub struct PlanCatalog {
    plans: Vec<PlanDefinition>,
    default_index: usize,
    payable_plan_ids: Vec<String>,
}

impl PlanCatalog {
    /// Builds a catalog. Ids are normalized to upper case.
    ///
    /// Fails when ids collide, when `default_id` is not in `plans`, or when
    /// the default plan requires payment.
    pub fn new(plans: Vec<PlanDefinition>, default_id: &str) -> Res<Self> {
        let plans: Vec<PlanDefinition> = plans
            .into_iter()
            .map(|mut plan| {
                plan.id = normalize_plan_id(&plan.id);
                plan
            })
            .collect();

        for (i, plan) in plans.iter().enumerate() {
            if plans[..i].iter().any(|p| p.id == plan.id) {
                return Err(AppError::Internal(format!(
                    "Duplicate plan id '{}' in catalog",
                    plan.id
                )));
            }
        }

        let default_id = normalize_plan_id(default_id);
        let default_index = plans
            .iter()
            .position(|p| p.id == default_id)
            .ok_or_else(|| {
                AppError::Internal(format!("Default plan '{}' is not in catalog", default_id))
            })?;
        if plans[default_index].requires_payment() {
            return Err(AppError::Internal(format!(
                "Default plan '{}' must be free",
                default_id
            )));
        }

        let payable_plan_ids = plans
            .iter()
            .filter(|p| p.requires_payment())
            .map(|p| p.id.clone())
            .collect();

        Ok(Self {
            plans,
            default_index,
            payable_plan_ids,
        })
    }

    pub fn plans(&self) -> &[PlanDefinition] {
        &self.plans
    }

    pub fn default_plan(&self) -> &PlanDefinition {
        &self.plans[self.default_index]
    }

    /// Exact lookup after normalization. Empty ids match nothing.
    pub fn find(&self, id: &str) -> Option<&PlanDefinition> {
        let id = normalize_plan_id(id);
        if id.is_empty() {
            return None;
        }
        self.plans.iter().find(|p| p.id == id)
    }

    /// Never fails: unknown, empty or missing ids resolve to the default plan.
    pub fn get_plan_by_id_or_default(&self, id: Option<&str>) -> &PlanDefinition {
        match id.and_then(|id| self.find(id)) {
            Some(plan) => plan,
            None => {
                if let Some(id) = id.filter(|id| !id.trim().is_empty()) {
                    log::warn!(
                        "Unknown plan id '{}', falling back to '{}'",
                        id,
                        self.default_plan().id
                    );
                }
                self.default_plan()
            }
        }
    }

    /// Plan the user's quotas are taken from.
    pub fn plan_for_user(&self, user: &User) -> &PlanDefinition {
        self.get_plan_by_id_or_default(user.subscription.plan_id.as_deref())
    }

    pub fn payable_plan_ids(&self) -> &[String] {
        &self.payable_plan_ids
    }

    pub fn is_payable_id(&self, id: &str) -> bool {
        let id = normalize_plan_id(id);
        self.payable_plan_ids.iter().any(|p| *p == id)
    }
}

pub fn is_payable(plan: &PlanDefinition) -> bool {
    plan.requires_payment()
}

pub fn normalize_plan_id(id: &str) -> String {
    id.trim().to_uppercase()
}

fn builtin_plans() -> Vec<PlanDefinition> {
    vec![
        PlanDefinition {
            id: DEFAULT_PLAN_ID.to_string(),
            name: "Starter Plan".to_string(),
            description: "Perfect for trying AI-powered email generation".to_string(),
            amount: 0,
            currency: "INR".to_string(),
            billing_period: BillingPeriod::Forever,
            duration_in_days: None,
            limits: PlanLimits {
                monthly_email_generations: Some(50),
                max_regenerations_per_email: Some(3),
            },
            features: vec![
                "50 emails per month".to_string(),
                "Basic email templates".to_string(),
                "Standard tone options".to_string(),
                "Copy & export functionality".to_string(),
            ],
            button_text: "Get Started".to_string(),
            popular: false,
        },
        PlanDefinition {
            id: "STARTFREETRIAL".to_string(),
            name: "Professional Plan".to_string(),
            description: "Ideal for professionals and small teams".to_string(),
            amount: 900,
            currency: "INR".to_string(),
            billing_period: BillingPeriod::Month,
            duration_in_days: Some(30),
            limits: PlanLimits {
                monthly_email_generations: Some(500),
                max_regenerations_per_email: None,
            },
            features: vec![
                "500 emails per month".to_string(),
                "Advanced personalization".to_string(),
                "All tone customizations".to_string(),
                "Priority email support".to_string(),
                "Unlimited revisions".to_string(),
            ],
            button_text: "Start Free Trial".to_string(),
            popular: true,
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plan(id: &str, amount: i64) -> PlanDefinition {
        PlanDefinition {
            id: id.to_string(),
            name: id.to_string(),
            description: String::new(),
            amount,
            currency: "INR".to_string(),
            billing_period: BillingPeriod::Month,
            duration_in_days: None,
            limits: PlanLimits::default(),
            features: Vec::new(),
            button_text: String::new(),
            popular: false,
        }
    }

    #[test]
    fn builtin_catalog_has_free_default() {
        let default = catalog().default_plan();
        assert_eq!(default.id, DEFAULT_PLAN_ID);
        assert!(!is_payable(default));
        assert_eq!(catalog().plans().iter().filter(|p| !p.requires_payment()).count(), 1);
    }

    #[test]
    fn lookup_is_case_insensitive_and_trimmed() {
        let plan = catalog().get_plan_by_id_or_default(Some("  startFreeTrial "));
        assert_eq!(plan.id, "STARTFREETRIAL");
        assert!(is_payable(plan));
    }

    #[test]
    fn unknown_empty_and_missing_ids_fall_back_to_default() {
        for id in [Some("ENTERPRISE"), Some(""), Some("   "), None] {
            assert_eq!(catalog().get_plan_by_id_or_default(id).id, DEFAULT_PLAN_ID);
        }
    }

    #[test]
    fn payable_ids_are_computed_once_from_amounts() {
        assert_eq!(catalog().payable_plan_ids(), ["STARTFREETRIAL".to_string()]);
        assert!(catalog().is_payable_id("startfreetrial"));
        assert!(!catalog().is_payable_id(DEFAULT_PLAN_ID));
    }

    #[test]
    fn default_must_exist_and_be_free() {
        assert!(PlanCatalog::new(vec![plan("A", 0)], "B").is_err());
        assert!(PlanCatalog::new(vec![plan("A", 100)], "A").is_err());
        assert!(PlanCatalog::new(vec![plan("A", 0), plan("a", 100)], "A").is_err());
        assert!(PlanCatalog::new(vec![plan("a", 0), plan("b", 100)], "A").is_ok());
    }
}
