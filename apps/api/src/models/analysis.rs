use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use uuid::Uuid;

use crate::models::gap::SkillGap;
use crate::models::skill::Skill;

/// A persisted gap analysis (table `skill_gaps`).
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct SkillGapAnalysisRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub resume_id: Uuid,
    pub job_description_id: Uuid,
    pub skill_gaps: Json<Vec<SkillGap>>,
    pub overall_gap: String,
    pub recommended_focus: Vec<String>,
    pub estimated_time_to_close: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Analysis row joined with the titles of its resume and job description.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct AnalysisHistoryRow {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub analysis: SkillGapAnalysisRow,
    pub resume_title: Option<String>,
    pub resume_file_name: Option<String>,
    pub job_title: Option<String>,
    pub job_company: Option<String>,
}

/// Analysis row joined with the skill lists it was computed from.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct AnalysisDetailRow {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub analysis: SkillGapAnalysisRow,
    pub resume_title: Option<String>,
    pub resume_file_name: Option<String>,
    pub resume_skills: Option<Json<Vec<Skill>>>,
    pub job_title: Option<String>,
    pub job_company: Option<String>,
    pub job_required_skills: Option<Json<Vec<Skill>>>,
    pub job_preferred_skills: Option<Json<Vec<Skill>>>,
}
