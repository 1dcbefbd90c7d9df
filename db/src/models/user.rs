use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Row, postgres::PgRow};
use uuid::Uuid;

/// Plan name stored for accounts without an active paid plan.
pub const FREE_PLAN_NAME: &str = "Free";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub username: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub subscription: SubscriptionState,
}

/// Subscription columns of a user record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionState {
    pub is_paid_user: bool,
    pub plan_name: String,
    /// Catalog id; absent or unknown ids resolve to the default plan.
    pub plan_id: Option<String>,
    pub plan_activated_at: Option<DateTime<Utc>>,
    /// `None` means no expiry is tracked.
    pub plan_expires_at: Option<DateTime<Utc>>,
    pub payment_info: Option<PaymentInfo>,
}

/// Last successful payment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentInfo {
    pub order_id: String,
    pub payment_id: String,
    pub signature: String,
    pub payment_date: DateTime<Utc>,
}

impl Default for SubscriptionState {
    fn default() -> Self {
        Self {
            is_paid_user: false,
            plan_name: FREE_PLAN_NAME.to_string(),
            plan_id: None,
            plan_activated_at: None,
            plan_expires_at: None,
            payment_info: None,
        }
    }
}

impl SubscriptionState {
    pub fn payment_date(&self) -> Option<DateTime<Utc>> {
        self.payment_info.as_ref().map(|p| p.payment_date)
    }
}

impl<'r> FromRow<'r, PgRow> for User {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        let payment_date: Option<DateTime<Utc>> = row.try_get("payment_date")?;
        let payment_info = match payment_date {
            Some(payment_date) => Some(PaymentInfo {
                order_id: row
                    .try_get::<Option<String>, _>("payment_order_id")?
                    .unwrap_or_default(),
                payment_id: row
                    .try_get::<Option<String>, _>("payment_id")?
                    .unwrap_or_default(),
                signature: row
                    .try_get::<Option<String>, _>("payment_signature")?
                    .unwrap_or_default(),
                payment_date,
            }),
            None => None,
        };

        Ok(User {
            id: row.try_get("id")?,
            email: row.try_get("email")?,
            username: row.try_get("username")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
            subscription: SubscriptionState {
                is_paid_user: row.try_get("is_paid_user")?,
                plan_name: row.try_get("plan_name")?,
                plan_id: row.try_get("plan_id")?,
                plan_activated_at: row.try_get("plan_activated_at")?,
                plan_expires_at: row.try_get("plan_expires_at")?,
                payment_info,
            },
        })
    }
}
