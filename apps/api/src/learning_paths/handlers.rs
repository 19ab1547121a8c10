use axum::{
    extract::{Path, Query, State},
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
use crate::learning_paths::planner::{generate_plan, recommendations};
use crate::models::gap::{GapSize, SkillGap};
use crate::models::learning::{LearningPathRow, LearningResourceRow};
use crate::routes::ApiResponse;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratePathRequest {
    pub skill_gaps: Option<Vec<SkillGap>>,
    #[serde(default)]
    pub preferences: Option<Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegenerateRequest {
    #[serde(default)]
    pub preferences: Option<Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressRequest {
    pub completed_resources: Option<Value>,
    pub current_skill: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ResourceFilter {
    pub difficulty: Option<String>,
    #[serde(rename = "type")]
    pub resource_type: Option<String>,
    pub cost: Option<String>,
}

/// Every gap needs a skill name and a real gap size.
fn validate_gaps(gaps: Option<Vec<SkillGap>>) -> Result<Vec<SkillGap>, AppError> {
    let gaps = gaps.ok_or_else(|| AppError::Validation("Skill gaps array is required".into()))?;
    for gap in &gaps {
        if gap.skill.name.trim().is_empty() {
            return Err(AppError::Validation("Skill name is required".into()));
        }
        if gap.gap == GapSize::None {
            return Err(AppError::Validation("Valid gap size is required".into()));
        }
    }
    Ok(gaps)
}

async fn fetch_path(db: &PgPool, user_id: Uuid, id: Uuid) -> Result<LearningPathRow, AppError> {
    sqlx::query_as("SELECT * FROM learning_paths WHERE id = $1 AND user_id = $2")
        .bind(id)
        .bind(user_id)
        .fetch_optional(db)
        .await?
        .ok_or_else(|| AppError::not_found("Learning path"))
}

/// POST /api/learning-path/generate
pub async fn handle_generate_path(
    State(state): State<AppState>,
    user: AuthUser,
    Json(req): Json<GeneratePathRequest>,
) -> Result<(StatusCode, Json<ApiResponse<Value>>), AppError> {
    let gaps = validate_gaps(req.skill_gaps)?;

    let plan = generate_plan(&state.llm, &gaps, req.preferences.as_ref()).await;

    let saved: LearningPathRow = sqlx::query_as(
        r#"
        INSERT INTO learning_paths
            (user_id, skill_gaps, resources, estimated_timeline, priority_order, created_at)
        VALUES ($1, $2, $3, $4, $5, NOW())
        RETURNING *
        "#,
    )
    .bind(user.id)
    .bind(SqlJson(&gaps))
    .bind(SqlJson(&plan.resources))
    .bind(plan.stored_timeline())
    .bind(plan.stored_priority_order(&gaps))
    .fetch_one(&state.db)
    .await?;

    info!(
        "Learning path {} generated for {} ({} resources)",
        saved.id,
        user.id,
        plan.resources.len()
    );

    Ok((
        StatusCode::CREATED,
        ApiResponse::with_message(
            "Learning path generated successfully",
            json!({ "learningPath": saved, "aiRecommendations": plan }),
        ),
    ))
}

/// GET /api/learning-path
pub async fn handle_list_paths(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<ApiResponse<Value>>, AppError> {
    let paths: Vec<LearningPathRow> = sqlx::query_as(
        "SELECT * FROM learning_paths WHERE user_id = $1 ORDER BY created_at DESC",
    )
    .bind(user.id)
    .fetch_all(&state.db)
    .await?;

    Ok(ApiResponse::ok(json!({ "learningPaths": paths })))
}

/// GET /api/learning-path/:id
pub async fn handle_get_path(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Value>>, AppError> {
    let path = fetch_path(&state.db, user.id, id).await?;
    Ok(ApiResponse::ok(json!({ "learningPath": path })))
}

/// PUT /api/learning-path/:id/progress
///
/// Absent fields keep their stored value.
pub async fn handle_update_progress(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(req): Json<ProgressRequest>,
) -> Result<Json<ApiResponse<Value>>, AppError> {
    let path: LearningPathRow = sqlx::query_as(
        r#"
        UPDATE learning_paths SET
            completed_resources = COALESCE($3, completed_resources),
            current_skill = COALESCE($4, current_skill),
            notes = COALESCE($5, notes),
            updated_at = NOW()
        WHERE id = $1 AND user_id = $2
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(user.id)
    .bind(req.completed_resources.map(SqlJson))
    .bind(req.current_skill)
    .bind(req.notes)
    .fetch_optional(&state.db)
    .await?
    .ok_or_else(|| AppError::not_found("Learning path"))?;

    Ok(ApiResponse::with_message(
        "Learning path progress updated successfully",
        json!({ "learningPath": path }),
    ))
}

/// POST /api/learning-path/:id/regenerate
pub async fn handle_regenerate_path(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(req): Json<RegenerateRequest>,
) -> Result<Json<ApiResponse<Value>>, AppError> {
    let existing = fetch_path(&state.db, user.id, id).await?;
    let gaps = existing.skill_gaps.0;

    let plan = generate_plan(&state.llm, &gaps, req.preferences.as_ref()).await;

    let updated: LearningPathRow = sqlx::query_as(
        r#"
        UPDATE learning_paths SET
            resources = $3,
            estimated_timeline = $4,
            priority_order = $5,
            updated_at = NOW()
        WHERE id = $1 AND user_id = $2
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(user.id)
    .bind(SqlJson(&plan.resources))
    .bind(plan.stored_timeline())
    .bind(plan.stored_priority_order(&gaps))
    .fetch_optional(&state.db)
    .await?
    .ok_or_else(|| AppError::not_found("Learning path"))?;

    Ok(ApiResponse::with_message(
        "Learning path regenerated successfully",
        json!({ "learningPath": updated, "aiRecommendations": plan }),
    ))
}

/// GET /api/learning-path/resources/:skill_name
pub async fn handle_resources_for_skill(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(skill_name): Path<String>,
    Query(filter): Query<ResourceFilter>,
) -> Result<Json<ApiResponse<Value>>, AppError> {
    let resources: Vec<LearningResourceRow> = sqlx::query_as(
        r#"
        SELECT * FROM learning_resources
        WHERE EXISTS (
                SELECT 1 FROM unnest(skills) AS s WHERE s ILIKE '%' || $1 || '%'
              )
          AND ($2::text IS NULL OR difficulty = $2)
          AND ($3::text IS NULL OR type = $3)
          AND ($4::text IS NULL OR cost = $4)
        ORDER BY rating DESC
        "#,
    )
    .bind(skill_name.trim())
    .bind(filter.difficulty)
    .bind(filter.resource_type)
    .bind(filter.cost)
    .fetch_all(&state.db)
    .await?;

    Ok(ApiResponse::ok(json!({ "resources": resources })))
}

/// GET /api/learning-path/recommendations
pub async fn handle_path_recommendations(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<ApiResponse<Value>>, AppError> {
    let recent: Vec<(SqlJson<Vec<SkillGap>>,)> = sqlx::query_as(
        "SELECT skill_gaps FROM skill_gaps WHERE user_id = $1 ORDER BY created_at DESC LIMIT 3",
    )
    .bind(user.id)
    .fetch_all(&state.db)
    .await?;

    let recent: Vec<Vec<SkillGap>> = recent.into_iter().map(|(gaps,)| gaps.0).collect();

    Ok(ApiResponse::ok(
        json!({ "recommendations": recommendations(&recent) }),
    ))
}
