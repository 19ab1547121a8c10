use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use uuid::Uuid;

use crate::models::skill::Skill;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ResumeRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub file_name: String,
    pub file_url: String,
    pub storage_path: String,
    pub title: String,
    pub description: String,
    pub extracted_text: Option<String>,
    pub extracted_skills: Json<Vec<Skill>>,
    pub uploaded_at: DateTime<Utc>,
}
