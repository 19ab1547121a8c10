use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use sqlx::types::Json as SqlJson;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::errors::AppError;
use crate::jobs::extract::extract_job_skills;
use crate::models::job::JobDescriptionRow;
use crate::models::skill::Skill;
use crate::resumes::fetch_resume;
use crate::routes::ApiResponse;
use crate::state::AppState;
use crate::validation::length_between;

#[derive(Debug, Deserialize)]
pub struct JobDescriptionRequest {
    pub title: String,
    pub company: String,
    pub description: String,
}

impl JobDescriptionRequest {
    fn validate(&self) -> Result<(), AppError> {
        length_between(
            &self.title,
            1,
            100,
            "Job title is required and must be less than 100 characters",
        )?;
        length_between(
            &self.company,
            1,
            100,
            "Company name is required and must be less than 100 characters",
        )?;
        length_between(
            &self.description,
            10,
            5000,
            "Job description must be between 10 and 5000 characters",
        )
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeJobRequest {
    pub job_description_id: Option<String>,
    pub description: Option<String>,
}

/// Loads a job description owned by `user_id`, or `NotFound`.
pub async fn fetch_job(db: &PgPool, user_id: Uuid, id: Uuid) -> Result<JobDescriptionRow, AppError> {
    sqlx::query_as("SELECT * FROM job_descriptions WHERE id = $1 AND user_id = $2")
        .bind(id)
        .bind(user_id)
        .fetch_optional(db)
        .await?
        .ok_or_else(|| AppError::not_found("Job description"))
}

/// Current skills whose name appears among the targets, ignoring case.
pub fn matching_skills(current: &[Skill], targets: &[Skill]) -> Vec<Skill> {
    current
        .iter()
        .filter(|held| targets.iter().any(|target| target.same_name(&held.name)))
        .cloned()
        .collect()
}

/// POST /api/job-description
pub async fn handle_create_job(
    State(state): State<AppState>,
    user: AuthUser,
    Json(req): Json<JobDescriptionRequest>,
) -> Result<(StatusCode, Json<ApiResponse<Value>>), AppError> {
    req.validate()?;
    let description = req.description.trim();

    let skills = extract_job_skills(&state.llm, description).await;

    let job: JobDescriptionRow = sqlx::query_as(
        r#"
        INSERT INTO job_descriptions
            (user_id, title, company, description, required_skills, preferred_skills, created_at)
        VALUES ($1, $2, $3, $4, $5, $6, NOW())
        RETURNING *
        "#,
    )
    .bind(user.id)
    .bind(req.title.trim())
    .bind(req.company.trim())
    .bind(description)
    .bind(SqlJson(&skills.required))
    .bind(SqlJson(&skills.preferred))
    .fetch_one(&state.db)
    .await?;

    info!("Job description {} created by {}", job.id, user.id);

    Ok((
        StatusCode::CREATED,
        ApiResponse::with_message(
            "Job description created successfully",
            json!({ "jobDescription": job, "extractedSkills": skills }),
        ),
    ))
}

/// GET /api/job-description
pub async fn handle_list_jobs(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<ApiResponse<Value>>, AppError> {
    let jobs: Vec<JobDescriptionRow> = sqlx::query_as(
        "SELECT * FROM job_descriptions WHERE user_id = $1 ORDER BY created_at DESC",
    )
    .bind(user.id)
    .fetch_all(&state.db)
    .await?;

    Ok(ApiResponse::ok(json!({ "jobDescriptions": jobs })))
}

/// GET /api/job-description/:id
pub async fn handle_get_job(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Value>>, AppError> {
    let job = fetch_job(&state.db, user.id, id).await?;
    Ok(ApiResponse::ok(json!({ "jobDescription": job })))
}

/// PUT /api/job-description/:id
///
/// Re-extracts both skill lists from the new description.
pub async fn handle_update_job(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(req): Json<JobDescriptionRequest>,
) -> Result<Json<ApiResponse<Value>>, AppError> {
    req.validate()?;
    let description = req.description.trim();

    let skills = extract_job_skills(&state.llm, description).await;

    let job: Option<JobDescriptionRow> = sqlx::query_as(
        r#"
        UPDATE job_descriptions SET
            title = $3,
            company = $4,
            description = $5,
            required_skills = $6,
            preferred_skills = $7,
            updated_at = NOW()
        WHERE id = $1 AND user_id = $2
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(user.id)
    .bind(req.title.trim())
    .bind(req.company.trim())
    .bind(description)
    .bind(SqlJson(&skills.required))
    .bind(SqlJson(&skills.preferred))
    .fetch_optional(&state.db)
    .await?;

    let job = job.ok_or_else(|| AppError::not_found("Job description"))?;

    Ok(ApiResponse::with_message(
        "Job description updated successfully",
        json!({ "jobDescription": job, "extractedSkills": skills }),
    ))
}

/// DELETE /api/job-description/:id
pub async fn handle_delete_job(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<()>>, AppError> {
    let result = sqlx::query("DELETE FROM job_descriptions WHERE id = $1 AND user_id = $2")
        .bind(id)
        .bind(user.id)
        .execute(&state.db)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::not_found("Job description"));
    }

    Ok(ApiResponse::message("Job description deleted successfully"))
}

/// POST /api/job-description/:id/reanalyze
pub async fn handle_reanalyze_job(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Value>>, AppError> {
    let existing = fetch_job(&state.db, user.id, id).await?;
    let skills = extract_job_skills(&state.llm, &existing.description).await;

    let job: Option<JobDescriptionRow> = sqlx::query_as(
        r#"
        UPDATE job_descriptions SET
            required_skills = $3,
            preferred_skills = $4,
            updated_at = NOW()
        WHERE id = $1 AND user_id = $2
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(user.id)
    .bind(SqlJson(&skills.required))
    .bind(SqlJson(&skills.preferred))
    .fetch_optional(&state.db)
    .await?;

    let job = job.ok_or_else(|| AppError::not_found("Job description"))?;

    Ok(ApiResponse::with_message(
        "Skills re-analyzed successfully",
        json!({ "jobDescription": job, "extractedSkills": skills }),
    ))
}

/// GET /api/job-description/:id/compare/:resume_id
pub async fn handle_compare_job(
    State(state): State<AppState>,
    user: AuthUser,
    Path((id, resume_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<ApiResponse<Value>>, AppError> {
    let job = fetch_job(&state.db, user.id, id).await?;
    let resume = fetch_resume(&state.db, user.id, resume_id).await?;

    let targets: Vec<Skill> = job
        .required_skills
        .0
        .into_iter()
        .chain(job.preferred_skills.0)
        .collect();
    let current = resume.extracted_skills.0;
    let matching = matching_skills(&current, &targets);

    Ok(ApiResponse::ok(json!({
        "currentSkills": current,
        "requiredSkills": targets,
        "comparison": {
            "totalRequired": targets.len(),
            "totalCurrent": current.len(),
            "matchingSkills": matching,
        }
    })))
}

/// POST /api/job-description/analyze
///
/// Extraction preview; nothing is saved.
pub async fn handle_analyze_job_text(
    State(state): State<AppState>,
    _user: AuthUser,
    Json(req): Json<AnalyzeJobRequest>,
) -> Result<Json<ApiResponse<Value>>, AppError> {
    let description = match (req.job_description_id.as_deref(), req.description.as_deref()) {
        (Some(id), Some(description)) if !id.trim().is_empty() && !description.trim().is_empty() => {
            description
        }
        _ => {
            return Err(AppError::Validation(
                "jobDescriptionId and description are required".into(),
            ))
        }
    };

    let skills = extract_job_skills(&state.llm, description).await;

    Ok(ApiResponse::ok(json!({
        "requiredSkills": skills.required,
        "preferredSkills": skills.preferred,
    })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::skill::{SkillCategory, SkillLevel};

    fn request(title: &str, company: &str, description: &str) -> JobDescriptionRequest {
        JobDescriptionRequest {
            title: title.into(),
            company: company.into(),
            description: description.into(),
        }
    }

    #[test]
    fn test_job_validation_bounds() {
        assert!(request("Backend Engineer", "Acme", "Build APIs in Rust").validate().is_ok());
        assert!(request("  ", "Acme", "Build APIs in Rust").validate().is_err());
        assert!(request("Backend", &"x".repeat(101), "Build APIs in Rust").validate().is_err());
        assert!(request("Backend", "Acme", "too short").validate().is_err());
        assert!(request("Backend", "Acme", &"x".repeat(5001)).validate().is_err());
    }

    #[test]
    fn test_matching_skills_ignore_case() {
        let current = vec![
            Skill::new("rust", SkillCategory::ProgrammingLanguages, SkillLevel::Expert),
            Skill::new("COBOL", SkillCategory::ProgrammingLanguages, SkillLevel::Expert),
        ];
        let targets = vec![Skill::new("Rust", SkillCategory::Other, SkillLevel::Advanced)];

        let matching = matching_skills(&current, &targets);

        assert_eq!(matching.len(), 1);
        assert_eq!(matching[0].name, "rust");
    }
}
