use chrono::{DateTime, Utc};
use common::error::{AppError, Res};
use sqlx::{Executor, Postgres};
use uuid::Uuid;

use crate::{
    dtos::email::{EmailCreateRequest, HistoryFilter, RevisionCreateRequest},
    models::email::{Email, EmailRevision},
};

/// Counts emails created by the user in `[start, end)`.
pub async fn count_by_user_in_window<'e, E: Executor<'e, Database = Postgres>>(
    executor: E,
    user_id: Uuid,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> Res<i64> {
    sqlx::query_scalar(
        "SELECT COUNT(*) FROM emails WHERE user_id = $1 AND created_at >= $2 AND created_at < $3",
    )
    .bind(user_id)
    .bind(start)
    .bind(end)
    .fetch_one(executor)
    .await
    .map_err(AppError::from)
}

pub async fn count_revisions<'e, E: Executor<'e, Database = Postgres>>(
    executor: E,
    email_id: Uuid,
) -> Res<i64> {
    sqlx::query_scalar("SELECT COUNT(*) FROM email_revisions WHERE email_id = $1")
        .bind(email_id)
        .fetch_one(executor)
        .await
        .map_err(AppError::from)
}

pub async fn insert_email<'e, E: Executor<'e, Database = Postgres>>(
    executor: E,
    data: EmailCreateRequest,
) -> Res<Email> {
    sqlx::query_as::<_, Email>(
        r#"
        INSERT INTO emails (user_id, prompt, generated_email)
        VALUES ($1, $2, $3)
        RETURNING *
        "#,
    )
    .bind(data.user_id)
    .bind(data.prompt)
    .bind(data.generated_email)
    .fetch_one(executor)
    .await
    .map_err(AppError::from)
}

pub async fn insert_revision<'e, E: Executor<'e, Database = Postgres>>(
    executor: E,
    data: RevisionCreateRequest,
) -> Res<EmailRevision> {
    sqlx::query_as::<_, EmailRevision>(
        r#"
        INSERT INTO email_revisions (email_id, prompt, generated_email)
        VALUES ($1, $2, $3)
        RETURNING *
        "#,
    )
    .bind(data.email_id)
    .bind(data.prompt)
    .bind(data.generated_email)
    .fetch_one(executor)
    .await
    .map_err(AppError::from)
}

/// Fetches an email only if it belongs to the given user.
pub async fn get_email_for_user<'e, E: Executor<'e, Database = Postgres>>(
    executor: E,
    email_id: Uuid,
    user_id: Uuid,
) -> Res<Option<Email>> {
    sqlx::query_as::<_, Email>("SELECT * FROM emails WHERE id = $1 AND user_id = $2")
        .bind(email_id)
        .bind(user_id)
        .fetch_optional(executor)
        .await
        .map_err(AppError::from)
}

/// Newest first.
pub async fn get_emails_by_user<'e, E: Executor<'e, Database = Postgres>>(
    executor: E,
    filter: HistoryFilter,
) -> Res<Vec<Email>> {
    sqlx::query_as::<_, Email>(
        "SELECT * FROM emails WHERE user_id = $1 ORDER BY created_at DESC LIMIT $2 OFFSET $3",
    )
    .bind(filter.user_id)
    .bind(filter.limit)
    .bind(filter.offset)
    .fetch_all(executor)
    .await
    .map_err(AppError::from)
}

pub async fn get_revisions<'e, E: Executor<'e, Database = Postgres>>(
    executor: E,
    email_id: Uuid,
) -> Res<Vec<EmailRevision>> {
    sqlx::query_as::<_, EmailRevision>(
        "SELECT * FROM email_revisions WHERE email_id = $1 ORDER BY created_at ASC",
    )
    .bind(email_id)
    .fetch_all(executor)
    .await
    .map_err(AppError::from)
}

/// Returns `false` when nothing matched.
pub async fn delete_email_for_user<'e, E: Executor<'e, Database = Postgres>>(
    executor: E,
    email_id: Uuid,
    user_id: Uuid,
) -> Res<bool> {
    let result = sqlx::query("DELETE FROM emails WHERE id = $1 AND user_id = $2")
        .bind(email_id)
        .bind(user_id)
        .execute(executor)
        .await?;
    Ok(result.rows_affected() > 0)
}
