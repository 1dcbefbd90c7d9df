use common::error::{AppError, Res};
use sqlx::{Executor, Postgres};
use uuid::Uuid;

use crate::models::user::{SubscriptionState, User};

pub async fn get_user_by_id<'e, E: Executor<'e, Database = Postgres>>(
    executor: E,
    user_id: Uuid,
) -> Res<Option<User>> {
    sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
        .bind(user_id)
        .fetch_optional(executor)
        .await
        .map_err(AppError::from)
}

/// Writes every subscription column of the user in one statement.
pub async fn update_subscription<'e, E: Executor<'e, Database = Postgres>>(
    executor: E,
    user_id: Uuid,
    state: &SubscriptionState,
) -> Res<()> {
    let payment = state.payment_info.as_ref();
    sqlx::query(
        r#"
        UPDATE users
        SET is_paid_user = $2,
            plan_name = $3,
            plan_id = $4,
            plan_activated_at = $5,
            plan_expires_at = $6,
            payment_order_id = $7,
            payment_id = $8,
            payment_signature = $9,
            payment_date = $10,
            updated_at = NOW()
        WHERE id = $1
        "#,
    )
    .bind(user_id)
    .bind(state.is_paid_user)
    .bind(&state.plan_name)
    .bind(&state.plan_id)
    .bind(state.plan_activated_at)
    .bind(state.plan_expires_at)
    .bind(payment.map(|p| p.order_id.as_str()))
    .bind(payment.map(|p| p.payment_id.as_str()))
    .bind(payment.map(|p| p.signature.as_str()))
    .bind(payment.map(|p| p.payment_date))
    .execute(executor)
    .await?;
    Ok(())
}
