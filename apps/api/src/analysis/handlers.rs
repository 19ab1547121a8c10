use axum::{
    extract::{Path, State},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use sqlx::types::Json as SqlJson;
use sqlx::PgPool;
use tracing::{error, info};
use uuid::Uuid;

use crate::analysis::blend::run_gap_analysis;
use crate::analysis::insights::{category_counts, generate_insights};
use crate::auth::AuthUser;
use crate::errors::AppError;
use crate::jobs::fetch_job;
use crate::models::analysis::{AnalysisDetailRow, AnalysisHistoryRow, SkillGapAnalysisRow};
use crate::models::gap::{GapAnalysisResult, Priority};
use crate::models::skill::Skill;
use crate::resumes::fetch_resume;
use crate::routes::ApiResponse;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeRequest {
    #[serde(default)]
    pub resume_id: String,
    #[serde(default)]
    pub job_description_id: String,
}

impl AnalyzeRequest {
    fn ids(&self) -> Result<(Uuid, Uuid), AppError> {
        let resume_id = Uuid::parse_str(self.resume_id.trim())
            .map_err(|_| AppError::Validation("Valid resume ID is required".into()))?;
        let job_id = Uuid::parse_str(self.job_description_id.trim())
            .map_err(|_| AppError::Validation("Valid job description ID is required".into()))?;
        Ok((resume_id, job_id))
    }
}

/// Counts reported next to a fresh analysis.
pub fn analysis_summary(
    result: &GapAnalysisResult,
    current: &[Skill],
    required: &[Skill],
    preferred: &[Skill],
) -> Value {
    let critical = result
        .skill_gaps
        .iter()
        .filter(|gap| gap.priority == Priority::High)
        .count();

    json!({
        "totalCurrentSkills": current.len(),
        "totalRequiredSkills": required.len(),
        "totalPreferredSkills": preferred.len(),
        "totalGaps": result.skill_gaps.len(),
        "criticalGaps": critical,
    })
}

fn weeks_column(weeks: u32) -> i32 {
    i32::try_from(weeks).unwrap_or(i32::MAX)
}

async fn save_analysis(
    db: &PgPool,
    user_id: Uuid,
    resume_id: Uuid,
    job_id: Uuid,
    result: &GapAnalysisResult,
) -> Result<SkillGapAnalysisRow, sqlx::Error> {
    sqlx::query_as(
        r#"
        INSERT INTO skill_gaps
            (user_id, resume_id, job_description_id, skill_gaps, overall_gap,
             recommended_focus, estimated_time_to_close, created_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, NOW())
        RETURNING *
        "#,
    )
    .bind(user_id)
    .bind(resume_id)
    .bind(job_id)
    .bind(SqlJson(&result.skill_gaps))
    .bind(result.overall_gap.as_str())
    .bind(&result.recommended_focus)
    .bind(weeks_column(result.estimated_time_to_close))
    .fetch_one(db)
    .await
}

/// POST /api/skill-analysis/analyze
///
/// A failed save is logged and reported as `savedAnalysis: null`.
pub async fn handle_analyze(
    State(state): State<AppState>,
    user: AuthUser,
    Json(req): Json<AnalyzeRequest>,
) -> Result<Json<ApiResponse<Value>>, AppError> {
    let (resume_id, job_id) = req.ids()?;

    let resume = fetch_resume(&state.db, user.id, resume_id).await?;
    let job = fetch_job(&state.db, user.id, job_id).await?;

    let current = resume.extracted_skills.0;
    let required = job.required_skills.0;
    let preferred = job.preferred_skills.0;

    let result = run_gap_analysis(state.gap_advisor.as_ref(), &current, &required, &preferred).await;

    let saved = match save_analysis(&state.db, user.id, resume_id, job_id, &result).await {
        Ok(row) => {
            info!("Saved skill gap analysis {} for {}", row.id, user.id);
            Some(row)
        }
        Err(e) => {
            error!("Failed to save analysis: {e}");
            None
        }
    };

    let summary = analysis_summary(&result, &current, &required, &preferred);

    Ok(ApiResponse::with_message(
        "Skill gap analysis completed successfully",
        json!({
            "analysis": result,
            "savedAnalysis": saved,
            "summary": summary,
        }),
    ))
}

/// GET /api/skill-analysis
pub async fn handle_list_analyses(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<ApiResponse<Vec<SkillGapAnalysisRow>>>, AppError> {
    let analyses: Vec<SkillGapAnalysisRow> =
        sqlx::query_as("SELECT * FROM skill_gaps WHERE user_id = $1 ORDER BY created_at DESC")
            .bind(user.id)
            .fetch_all(&state.db)
            .await?;

    Ok(ApiResponse::ok(analyses))
}

/// GET /api/skill-analysis/history
pub async fn handle_history(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<ApiResponse<Value>>, AppError> {
    let analyses: Vec<AnalysisHistoryRow> = sqlx::query_as(
        r#"
        SELECT sg.*,
               r.title AS resume_title,
               r.file_name AS resume_file_name,
               j.title AS job_title,
               j.company AS job_company
        FROM skill_gaps sg
        LEFT JOIN resumes r ON r.id = sg.resume_id
        LEFT JOIN job_descriptions j ON j.id = sg.job_description_id
        WHERE sg.user_id = $1
        ORDER BY sg.created_at DESC
        "#,
    )
    .bind(user.id)
    .fetch_all(&state.db)
    .await?;

    Ok(ApiResponse::ok(json!({ "analyses": analyses })))
}

async fn fetch_detail(db: &PgPool, user_id: Uuid, id: Uuid) -> Result<AnalysisDetailRow, AppError> {
    sqlx::query_as(
        r#"
        SELECT sg.*,
               r.title AS resume_title,
               r.file_name AS resume_file_name,
               r.extracted_skills AS resume_skills,
               j.title AS job_title,
               j.company AS job_company,
               j.required_skills AS job_required_skills,
               j.preferred_skills AS job_preferred_skills
        FROM skill_gaps sg
        LEFT JOIN resumes r ON r.id = sg.resume_id
        LEFT JOIN job_descriptions j ON j.id = sg.job_description_id
        WHERE sg.id = $1 AND sg.user_id = $2
        "#,
    )
    .bind(id)
    .bind(user_id)
    .fetch_optional(db)
    .await?
    .ok_or_else(|| AppError::not_found("Analysis"))
}

/// GET /api/skill-analysis/:id
pub async fn handle_get_analysis(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Value>>, AppError> {
    let analysis = fetch_detail(&state.db, user.id, id).await?;
    Ok(ApiResponse::ok(json!({ "analysis": analysis })))
}

/// POST /api/skill-analysis/:id/reanalyze
///
/// Runs the same blended pipeline as a fresh analysis against the current
/// resume and job skill lists.
pub async fn handle_reanalyze(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Value>>, AppError> {
    let existing = fetch_detail(&state.db, user.id, id).await?;

    let current = existing.resume_skills.map(|s| s.0).unwrap_or_default();
    let required = existing.job_required_skills.map(|s| s.0).unwrap_or_default();
    let preferred = existing.job_preferred_skills.map(|s| s.0).unwrap_or_default();

    let result = run_gap_analysis(state.gap_advisor.as_ref(), &current, &required, &preferred).await;

    let updated: SkillGapAnalysisRow = sqlx::query_as(
        r#"
        UPDATE skill_gaps SET
            skill_gaps = $3,
            overall_gap = $4,
            recommended_focus = $5,
            estimated_time_to_close = $6,
            updated_at = NOW()
        WHERE id = $1 AND user_id = $2
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(user.id)
    .bind(SqlJson(&result.skill_gaps))
    .bind(result.overall_gap.as_str())
    .bind(&result.recommended_focus)
    .bind(weeks_column(result.estimated_time_to_close))
    .fetch_optional(&state.db)
    .await?
    .ok_or_else(|| AppError::not_found("Analysis"))?;

    Ok(ApiResponse::with_message(
        "Analysis updated successfully",
        json!({ "analysis": updated }),
    ))
}

/// GET /api/skill-analysis/insights
pub async fn handle_insights(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<ApiResponse<Value>>, AppError> {
    let skill_lists: Vec<(SqlJson<Vec<Skill>>,)> =
        sqlx::query_as("SELECT extracted_skills FROM resumes WHERE user_id = $1")
            .bind(user.id)
            .fetch_all(&state.db)
            .await?;

    let skills: Vec<Skill> = skill_lists
        .into_iter()
        .flat_map(|(list,)| list.0)
        .collect();

    let insights = generate_insights(&state.llm, &skills).await;

    Ok(ApiResponse::ok(json!({
        "insights": insights,
        "skillsByCategory": category_counts(&skills),
        "totalSkills": skills.len(),
    })))
}
