use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use sqlx::{Postgres, QueryBuilder};
use tracing::info;
use uuid::Uuid;

use crate::auth::{require_role, AuthUser};
use crate::errors::AppError;
use crate::learning_resources::extract::extract_resource_skills;
use crate::models::learning::LearningResourceRow;
use crate::routes::ApiResponse;
use crate::state::AppState;
use crate::validation::{in_range, is_http_url, length_between, one_of};

pub const RESOURCE_TYPES: [&str; 7] = [
    "course",
    "tutorial",
    "book",
    "video",
    "documentation",
    "practice",
    "certification",
];
pub const DIFFICULTIES: [&str; 4] = ["beginner", "intermediate", "advanced", "expert"];
pub const COSTS: [&str; 4] = ["free", "paid", "subscription", "one_time"];

/// Roles allowed to change the shared catalogue.
const CATALOGUE_EDITORS: [&str; 2] = ["user", "admin"];

const DEFAULT_PAGE_SIZE: i64 = 20;
const DEFAULT_BY_SKILLS_LIMIT: i64 = 10;
const DEFAULT_RECOMMENDATION_LIMIT: i64 = 5;

// ────────────────────────────────────────────────────────────────────────────
// Request bodies
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ResourceRequest {
    #[serde(default)]
    pub title: String,
    #[serde(rename = "type", default)]
    pub resource_type: String,
    #[serde(default)]
    pub url: String,
    pub difficulty: Option<String>,
    pub estimated_hours: Option<i32>,
    pub cost: Option<String>,
    pub skills: Option<Vec<String>>,
    pub rating: Option<f64>,
    pub description: Option<String>,
}

impl ResourceRequest {
    fn validate(&self) -> Result<(), AppError> {
        length_between(
            &self.title,
            1,
            200,
            "Title is required and must be less than 200 characters",
        )?;
        one_of(&self.resource_type, &RESOURCE_TYPES, "Invalid resource type")?;
        if !is_http_url(&self.url) {
            return Err(AppError::Validation("Valid URL is required".into()));
        }
        if let Some(difficulty) = &self.difficulty {
            one_of(difficulty, &DIFFICULTIES, "Invalid difficulty level")?;
        }
        if let Some(hours) = self.estimated_hours {
            in_range(hours, 1, 1000, "Estimated hours must be between 1 and 1000")?;
        }
        if let Some(cost) = &self.cost {
            one_of(cost, &COSTS, "Invalid cost type")?;
        }
        if let Some(rating) = self.rating {
            in_range(rating, 0.0, 5.0, "Rating must be between 0 and 5")?;
        }
        if let Some(description) = &self.description {
            if description.chars().count() > 2000 {
                return Err(AppError::Validation(
                    "Description must be less than 2000 characters".into(),
                ));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    #[serde(rename = "type")]
    pub resource_type: Option<String>,
    pub difficulty: Option<String>,
    pub cost: Option<String>,
    pub skill: Option<String>,
    pub min_rating: Option<f64>,
    pub max_hours: Option<i32>,
    pub search: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl ListQuery {
    fn validate(&self) -> Result<(), AppError> {
        if let Some(kind) = &self.resource_type {
            one_of(kind, &RESOURCE_TYPES, "Invalid resource type")?;
        }
        if let Some(difficulty) = &self.difficulty {
            one_of(difficulty, &DIFFICULTIES, "Invalid difficulty level")?;
        }
        if let Some(cost) = &self.cost {
            one_of(cost, &COSTS, "Invalid cost type")?;
        }
        if let Some(rating) = self.min_rating {
            in_range(rating, 0.0, 5.0, "Min rating must be between 0 and 5")?;
        }
        if let Some(hours) = self.max_hours {
            if hours < 1 {
                return Err(AppError::Validation(
                    "Max hours must be a positive integer".into(),
                ));
            }
        }
        if let Some(limit) = self.limit {
            in_range(limit, 1, 100, "Limit must be between 1 and 100")?;
        }
        if let Some(offset) = self.offset {
            if offset < 0 {
                return Err(AppError::Validation("Offset must be non-negative".into()));
            }
        }
        Ok(())
    }

    fn page(&self) -> (i64, i64) {
        (
            self.limit.unwrap_or(DEFAULT_PAGE_SIZE),
            self.offset.unwrap_or(0),
        )
    }

    /// Appends one `AND` clause per filter that is set.
    fn push_filters(&self, builder: &mut QueryBuilder<'_, Postgres>) {
        if let Some(kind) = &self.resource_type {
            builder.push(" AND type = ").push_bind(kind.clone());
        }
        if let Some(difficulty) = &self.difficulty {
            builder.push(" AND difficulty = ").push_bind(difficulty.clone());
        }
        if let Some(cost) = &self.cost {
            builder.push(" AND cost = ").push_bind(cost.clone());
        }
        if let Some(skill) = &self.skill {
            builder
                .push(" AND ")
                .push_bind(skill.clone())
                .push(" = ANY(skills)");
        }
        if let Some(rating) = self.min_rating {
            builder.push(" AND rating >= ").push_bind(rating);
        }
        if let Some(hours) = self.max_hours {
            builder.push(" AND estimated_hours <= ").push_bind(hours);
        }
        if let Some(search) = self.search.as_deref().filter(|s| !s.trim().is_empty()) {
            let pattern = format!("%{}%", search.trim());
            builder
                .push(" AND (title ILIKE ")
                .push_bind(pattern.clone())
                .push(" OR description ILIKE ")
                .push_bind(pattern)
                .push(")");
        }
    }
}

#[derive(Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub total: i64,
    pub limit: i64,
    pub offset: i64,
    pub has_more: bool,
}

impl Pagination {
    pub fn new(total: i64, limit: i64, offset: i64) -> Self {
        Self {
            total,
            limit,
            offset,
            has_more: total > offset + limit,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct BySkillsRequest {
    pub skills: Option<Vec<String>>,
    pub difficulty: Option<String>,
    pub limit: Option<i64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationRequest {
    #[serde(default)]
    pub current_skills: Vec<String>,
    #[serde(default)]
    pub target_skills: Vec<String>,
    pub difficulty: Option<String>,
    pub limit: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct AnalyzeResourceRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub resource_type: Option<String>,
}

/// Targets the caller does not already hold, compared case-insensitively.
pub fn missing_skills(current: &[String], targets: &[String]) -> Vec<String> {
    targets
        .iter()
        .filter(|target| {
            !current
                .iter()
                .any(|held| held.to_lowercase() == target.to_lowercase())
        })
        .cloned()
        .collect()
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/learning-resources
///
/// Without supplied skills, the model derives them from the description.
pub async fn handle_create_resource(
    State(state): State<AppState>,
    user: AuthUser,
    Json(req): Json<ResourceRequest>,
) -> Result<(StatusCode, Json<ApiResponse<Value>>), AppError> {
    require_role(&user, &CATALOGUE_EDITORS)?;
    req.validate()?;

    let supplied = req.skills.clone().unwrap_or_default();
    let skills = match non_blank(req.description.as_deref()) {
        Some(description) if supplied.is_empty() => {
            extract_resource_skills(&state.llm, req.title.trim(), description, &req.resource_type)
                .await
        }
        _ => supplied.clone(),
    };

    let resource: LearningResourceRow = sqlx::query_as(
        r#"
        INSERT INTO learning_resources
            (title, type, url, difficulty, estimated_hours, cost, skills, rating, description, created_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, NOW())
        RETURNING *
        "#,
    )
    .bind(req.title.trim())
    .bind(&req.resource_type)
    .bind(req.url.trim())
    .bind(req.difficulty.as_deref().unwrap_or("beginner"))
    .bind(req.estimated_hours.unwrap_or(10))
    .bind(req.cost.as_deref().unwrap_or("free"))
    .bind(&skills)
    .bind(req.rating.unwrap_or(0.0))
    .bind(&req.description)
    .fetch_one(&state.db)
    .await?;

    info!("Learning resource {} created by {}", resource.id, user.id);

    let extracted = (skills.len() > supplied.len()).then_some(skills);

    Ok((
        StatusCode::CREATED,
        ApiResponse::with_message(
            "Learning resource created successfully",
            json!({ "learningResource": resource, "extractedSkills": extracted }),
        ),
    ))
}

/// GET /api/learning-resources
pub async fn handle_list_resources(
    State(state): State<AppState>,
    _user: AuthUser,
    Query(query): Query<ListQuery>,
) -> Result<Json<ApiResponse<Value>>, AppError> {
    query.validate()?;
    let (limit, offset) = query.page();

    let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM learning_resources WHERE TRUE");
    query.push_filters(&mut count);
    let total: i64 = count.build_query_scalar().fetch_one(&state.db).await?;

    let mut select = QueryBuilder::<Postgres>::new("SELECT * FROM learning_resources WHERE TRUE");
    query.push_filters(&mut select);
    select
        .push(" ORDER BY created_at DESC LIMIT ")
        .push_bind(limit)
        .push(" OFFSET ")
        .push_bind(offset);
    let resources: Vec<LearningResourceRow> =
        select.build_query_as().fetch_all(&state.db).await?;

    Ok(ApiResponse::ok(json!({
        "learningResources": resources,
        "pagination": Pagination::new(total, limit, offset),
    })))
}

/// GET /api/learning-resources/:id
pub async fn handle_get_resource(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Value>>, AppError> {
    let resource: LearningResourceRow =
        sqlx::query_as("SELECT * FROM learning_resources WHERE id = $1")
            .bind(id)
            .fetch_optional(&state.db)
            .await?
            .ok_or_else(|| AppError::not_found("Learning resource"))?;

    Ok(ApiResponse::ok(json!({ "learningResource": resource })))
}

/// PUT /api/learning-resources/:id
///
/// Optional fields left out of the body keep their stored value.
pub async fn handle_update_resource(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(req): Json<ResourceRequest>,
) -> Result<Json<ApiResponse<Value>>, AppError> {
    require_role(&user, &CATALOGUE_EDITORS)?;
    req.validate()?;

    let resource: LearningResourceRow = sqlx::query_as(
        r#"
        UPDATE learning_resources SET
            title = $2,
            type = $3,
            url = $4,
            difficulty = COALESCE($5, difficulty),
            estimated_hours = COALESCE($6, estimated_hours),
            cost = COALESCE($7, cost),
            skills = COALESCE($8, skills),
            rating = COALESCE($9, rating),
            description = COALESCE($10, description),
            updated_at = NOW()
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(req.title.trim())
    .bind(&req.resource_type)
    .bind(req.url.trim())
    .bind(&req.difficulty)
    .bind(req.estimated_hours)
    .bind(&req.cost)
    .bind(&req.skills)
    .bind(req.rating)
    .bind(&req.description)
    .fetch_optional(&state.db)
    .await?
    .ok_or_else(|| AppError::not_found("Learning resource"))?;

    Ok(ApiResponse::with_message(
        "Learning resource updated successfully",
        json!({ "learningResource": resource }),
    ))
}

/// DELETE /api/learning-resources/:id
pub async fn handle_delete_resource(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<()>>, AppError> {
    require_role(&user, &CATALOGUE_EDITORS)?;

    let result = sqlx::query("DELETE FROM learning_resources WHERE id = $1")
        .bind(id)
        .execute(&state.db)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::not_found("Learning resource"));
    }

    Ok(ApiResponse::message("Learning resource deleted successfully"))
}

/// POST /api/learning-resources/by-skills
pub async fn handle_resources_by_skills(
    State(state): State<AppState>,
    _user: AuthUser,
    Json(req): Json<BySkillsRequest>,
) -> Result<Json<ApiResponse<Value>>, AppError> {
    let skills = req
        .skills
        .filter(|skills| !skills.is_empty())
        .ok_or_else(|| AppError::Validation("Skills array is required".into()))?;
    let limit = req.limit.unwrap_or(DEFAULT_BY_SKILLS_LIMIT).clamp(1, 100);

    let resources: Vec<LearningResourceRow> = sqlx::query_as(
        r#"
        SELECT * FROM learning_resources
        WHERE skills && $1
          AND ($2::text IS NULL OR difficulty = $2)
        ORDER BY rating DESC
        LIMIT $3
        "#,
    )
    .bind(&skills)
    .bind(&req.difficulty)
    .bind(limit)
    .fetch_all(&state.db)
    .await?;

    Ok(ApiResponse::ok(json!({
        "learningResources": resources,
        "skillsQueried": skills,
    })))
}

/// POST /api/learning-resources/recommendations
pub async fn handle_resource_recommendations(
    State(state): State<AppState>,
    _user: AuthUser,
    Json(req): Json<RecommendationRequest>,
) -> Result<Json<ApiResponse<Value>>, AppError> {
    if req.target_skills.is_empty() {
        return Err(AppError::Validation("Target skills array is required".into()));
    }

    let gaps = missing_skills(&req.current_skills, &req.target_skills);
    if gaps.is_empty() {
        return Ok(ApiResponse::ok(json!({
            "learningResources": [],
            "message": "No skill gaps identified - you already have all target skills!",
        })));
    }

    let difficulty = req.difficulty.as_deref().unwrap_or("beginner");
    let limit = req.limit.unwrap_or(DEFAULT_RECOMMENDATION_LIMIT).clamp(1, 100);

    let resources: Vec<LearningResourceRow> = sqlx::query_as(
        r#"
        SELECT * FROM learning_resources
        WHERE skills && $1 AND difficulty = $2
        ORDER BY rating DESC
        LIMIT $3
        "#,
    )
    .bind(&gaps)
    .bind(difficulty)
    .bind(limit)
    .fetch_all(&state.db)
    .await?;

    Ok(ApiResponse::ok(json!({
        "learningResources": resources,
        "skillGaps": gaps,
        "currentSkills": req.current_skills,
        "targetSkills": req.target_skills,
    })))
}

/// POST /api/learning-resources/analyze
pub async fn handle_analyze_resource(
    State(state): State<AppState>,
    _user: AuthUser,
    Json(req): Json<AnalyzeResourceRequest>,
) -> Result<Json<ApiResponse<Value>>, AppError> {
    let (Some(title), Some(description), Some(kind)) = (
        non_blank(req.title.as_deref()),
        non_blank(req.description.as_deref()),
        non_blank(req.resource_type.as_deref()),
    ) else {
        return Err(AppError::Validation(
            "Title, description, and type are required".into(),
        ));
    };

    let skills = extract_resource_skills(&state.llm, title, description, kind).await;

    Ok(ApiResponse::ok(json!({ "extractedSkills": skills })))
}
