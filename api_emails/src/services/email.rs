use api_subs::{
    models::{plan::PlanDefinition, usage::MonthlyUsage},
    services::{
        catalog::catalog,
        limits::{check_monthly_quota, enforce_regeneration_limit},
        usage::{build_usage_summary, monthly_email_usage},
    },
};
use chrono::{DateTime, Utc};
use common::error::{AppError, Res};
use db::{
    dtos::email::{EmailCreateRequest, HistoryFilter, RevisionCreateRequest},
    models::user::User,
    store::EmailStore,
};
use sqlx::PgPool;
use uuid::Uuid;

use super::{composer::EmailComposer, prompts};
use crate::dtos::email::{
    DEFAULT_HISTORY_LIMIT, EmailHistoryItem, GenerateEmailResponse, HistoryQuery,
    MAX_HISTORY_LIMIT, RefineEmailRequest, RefineEmailResponse,
};

fn require_text<'a>(value: &'a str, message: &str) -> Res<&'a str> {
    let value = value.trim();
    if value.is_empty() {
        return Err(AppError::BadRequest(message.to_string()));
    }
    Ok(value)
}

/// Checks the monthly quota and returns the plan and usage it was checked against.
pub async fn admit_generation(
    store: &dyn EmailStore,
    user: &User,
    now: DateTime<Utc>,
) -> Res<(&'static PlanDefinition, MonthlyUsage)> {
    let plan = catalog().plan_for_user(user);
    let usage = monthly_email_usage(store, user.id, now).await?;
    check_monthly_quota(plan, &usage)?;
    Ok((plan, usage))
}

pub async fn generate_email(
    pool: &PgPool,
    store: &dyn EmailStore,
    composer: &dyn EmailComposer,
    user: &User,
    prompt: &str,
    now: DateTime<Utc>,
) -> Res<GenerateEmailResponse> {
    let prompt = require_text(prompt, "Prompt is required")?;
    let (plan, usage) = admit_generation(store, user, now).await?;

    let full_email = composer.compose(&prompts::generation_prompt(prompt)).await?;

    let email = db::email::insert_email(
        pool,
        EmailCreateRequest {
            user_id: user.id,
            prompt: prompt.to_string(),
            generated_email: full_email.clone(),
        },
    )
    .await?;

    // the new email is not necessarily visible to a fresh count yet
    let usage = build_usage_summary(store, user, plan, now, Some(usage.incremented())).await?;

    Ok(GenerateEmailResponse {
        full_email,
        email_id: email.id,
        usage,
    })
}

pub async fn refine_email(
    pool: &PgPool,
    store: &dyn EmailStore,
    composer: &dyn EmailComposer,
    user: &User,
    req: RefineEmailRequest,
) -> Res<RefineEmailResponse> {
    let base_email = require_text(
        &req.base_email,
        "Email ID, base email, and modifications are required",
    )?;
    let modifications = require_text(
        &req.modifications,
        "Email ID, base email, and modifications are required",
    )?;

    let email = db::email::get_email_for_user(pool, req.email_id, user.id)
        .await?
        .ok_or_else(|| AppError::NotFound("Email not found".to_string()))?;

    enforce_regeneration_limit(store, user, email.id).await?;

    let prompt = prompts::refinement_prompt(base_email, modifications, &req.previous_refinements);
    let updated_email = composer.compose(&prompt).await?;

    let revision = db::email::insert_revision(
        pool,
        RevisionCreateRequest {
            email_id: email.id,
            prompt: modifications.to_string(),
            generated_email: updated_email.clone(),
        },
    )
    .await?;

    Ok(RefineEmailResponse {
        updated_email,
        revision_id: revision.id,
    })
}

/// Page size defaults to 10 and is capped at 100; pages start at 0.
/// Pages past the addressable range yield an empty page.
pub fn history_filter(user_id: Uuid, query: &HistoryQuery) -> HistoryFilter {
    let limit = query
        .limit
        .unwrap_or(DEFAULT_HISTORY_LIMIT)
        .clamp(1, MAX_HISTORY_LIMIT);
    let page = query.page.unwrap_or(0).max(0);
    HistoryFilter {
        user_id,
        limit,
        offset: page.saturating_mul(limit),
    }
}

pub async fn get_history(
    pool: &PgPool,
    user_id: Uuid,
    query: &HistoryQuery,
) -> Res<Vec<EmailHistoryItem>> {
    let emails = db::email::get_emails_by_user(pool, history_filter(user_id, query)).await?;

    let mut items = Vec::with_capacity(emails.len());
    for email in emails {
        let revisions = db::email::get_revisions(pool, email.id).await?;
        items.push(EmailHistoryItem { email, revisions });
    }
    Ok(items)
}

pub async fn delete_email(pool: &PgPool, user_id: Uuid, email_id: Uuid) -> Res<()> {
    if !db::email::delete_email_for_user(pool, email_id, user_id).await? {
        return Err(AppError::NotFound(
            "Email not found or already deleted".to_string(),
        ));
    }
    Ok(())
}
