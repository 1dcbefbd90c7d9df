use std::sync::Arc;

use actix_web::{Responder, delete, get, post, web};
use common::{clock::Clock, error::Res, http::Success};
use db::{models::user::User, store::EmailStore};
use serde_json::json;
use sqlx::PgPool;

use crate::{
    dtos::email::{
        DeleteEmailRequest, EmailHistoryResponse, GenerateEmailRequest, HistoryQuery,
        RefineEmailRequest,
    },
    services::{self, composer::EmailComposer},
};

/// Generates a new email from a prompt, counted against the monthly quota.
///
/// # Output
/// - Success: Returns the email, its id and the updated usage summary
/// - Error: 403 when the monthly generation limit is reached
///
/// # Frontend Example
/// ```javascript
/// const response = await fetch('/api/dashboard/email/generate', {
///   method: 'POST',
///   credentials: 'include',
///   headers: { 'Content-Type': 'application/json' },
///   body: JSON.stringify({ prompt: 'Follow up with the client about the invoice' })
/// });
///
/// if (response.status === 403) {
///   const { error } = await response.json();
///   // "You have reached the Starter Plan plan limit of 50 emails this month. ..."
/// }
/// ```
#[post("/generate")]
pub async fn post_generate(
    user: web::ReqData<User>,
    pool: web::Data<Arc<PgPool>>,
    store: web::Data<Arc<dyn EmailStore>>,
    composer: web::Data<Arc<dyn EmailComposer>>,
    clock: web::Data<Arc<dyn Clock>>,
    req: web::Json<GenerateEmailRequest>,
) -> Res<impl Responder> {
    let response = services::email::generate_email(
        &pool,
        &***store,
        &***composer,
        &user,
        &req.prompt,
        clock.now(),
    )
    .await?;
    Success::created(response)
}

/// Refines a previously generated email.
///
/// # Output
/// - Error: 404 when the email does not belong to the user
/// - Error: 403 when the plan's revision limit for this email is reached
#[post("/update")]
pub async fn post_update(
    user: web::ReqData<User>,
    pool: web::Data<Arc<PgPool>>,
    store: web::Data<Arc<dyn EmailStore>>,
    composer: web::Data<Arc<dyn EmailComposer>>,
    req: web::Json<RefineEmailRequest>,
) -> Res<impl Responder> {
    let response =
        services::email::refine_email(&pool, &***store, &***composer, &user, req.into_inner())
            .await?;
    Success::ok(response)
}

/// Lists the user's emails, newest first, each with its revisions.
///
/// Query: `?limit=10&page=0`
#[get("/history")]
pub async fn get_history(
    user: web::ReqData<User>,
    pool: web::Data<Arc<PgPool>>,
    query: web::Query<HistoryQuery>,
) -> Res<impl Responder> {
    let emails = services::email::get_history(&pool, user.id, &query).await?;
    Success::ok(EmailHistoryResponse { emails })
}

#[delete("")]
pub async fn delete_email(
    user: web::ReqData<User>,
    pool: web::Data<Arc<PgPool>>,
    req: web::Json<DeleteEmailRequest>,
) -> Res<impl Responder> {
    services::email::delete_email(&pool, user.id, req.email_id).await?;
    Success::ok(json!({ "message": "Email deleted successfully" }))
}
