use uuid::Uuid;

pub struct EmailCreateRequest {
    pub user_id: Uuid,
    pub prompt: String,
    pub generated_email: String,
}

pub struct RevisionCreateRequest {
    pub email_id: Uuid,
    pub prompt: String,
    pub generated_email: String,
}

pub struct HistoryFilter {
    pub user_id: Uuid,
    pub limit: i64,
    pub offset: i64,
}
