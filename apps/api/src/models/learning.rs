use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::types::Json;
use sqlx::FromRow;
use uuid::Uuid;

use crate::models::gap::SkillGap;

/// A resource inside a generated learning path. Values come from the LLM or
/// the fallback planner, so type/difficulty/cost stay free-form strings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlannedResource {
    pub id: String,
    pub title: String,
    #[serde(rename = "type")]
    pub resource_type: String,
    pub url: String,
    pub difficulty: String,
    pub estimated_hours: u32,
    pub cost: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct LearningPathRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub skill_gaps: Json<Vec<SkillGap>>,
    pub resources: Json<Vec<PlannedResource>>,
    pub estimated_timeline: i32,
    pub priority_order: Vec<String>,
    pub completed_resources: Option<Json<Value>>,
    pub current_skill: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Curated catalogue entry (table `learning_resources`).
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct LearningResourceRow {
    pub id: Uuid,
    pub title: String,
    #[sqlx(rename = "type")]
    #[serde(rename = "type")]
    pub resource_type: String,
    pub url: String,
    pub difficulty: String,
    pub estimated_hours: i32,
    pub cost: String,
    pub skills: Vec<String>,
    pub rating: f64,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}
