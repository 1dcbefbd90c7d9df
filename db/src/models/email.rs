use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct Email {
    pub id: Uuid,
    pub user_id: Uuid,
    pub prompt: String,
    pub generated_email: String,
    pub created_at: DateTime<Utc>,
}

/// A refinement of a previously generated email.
#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct EmailRevision {
    pub id: Uuid,
    pub email_id: Uuid,
    pub prompt: String,
    pub generated_email: String,
    pub created_at: DateTime<Utc>,
}
