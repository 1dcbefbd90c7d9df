use api_subs::dtos::sub::PlanUsageSummary;
use db::models::email::{Email, EmailRevision};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const DEFAULT_HISTORY_LIMIT: i64 = 10;
pub const MAX_HISTORY_LIMIT: i64 = 100;

#[derive(Debug, Deserialize)]
pub struct GenerateEmailRequest {
    pub prompt: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateEmailResponse {
    pub full_email: String,
    pub email_id: Uuid,
    pub usage: PlanUsageSummary,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefineEmailRequest {
    pub email_id: Uuid,
    pub base_email: String,
    pub modifications: String,
    /// Earlier modification requests, oldest first.
    #[serde(default)]
    pub previous_refinements: Vec<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RefineEmailResponse {
    pub updated_email: String,
    pub revision_id: Uuid,
}

#[derive(Debug, Default, Deserialize)]
pub struct HistoryQuery {
    pub limit: Option<i64>,
    pub page: Option<i64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EmailHistoryItem {
    #[serde(flatten)]
    pub email: Email,
    pub revisions: Vec<EmailRevision>,
}

#[derive(Debug, Serialize)]
pub struct EmailHistoryResponse {
    pub emails: Vec<EmailHistoryItem>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteEmailRequest {
    pub email_id: Uuid,
}
