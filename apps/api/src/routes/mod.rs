pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    http::{header, request::Parts, HeaderValue, Method},
    middleware::from_fn_with_state,
    routing::{get, post, put},
    Json, Router,
};
use reqwest::Url;
use serde::Serialize;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::set_header::SetResponseHeaderLayer;

use crate::config::Config;
use crate::errors::AppError;
use crate::rate_limit::rate_limit_middleware;
use crate::state::AppState;
use crate::{analysis, auth, jobs, learning_paths, learning_resources, resumes};

/// Request bodies above this are rejected before any handler runs.
const BODY_LIMIT_BYTES: usize = 10 * 1024 * 1024;

/// Vercel preview deployments of the frontend are allowed by host name.
const PREVIEW_HOST_SUFFIX: &str = ".vercel.app";
const PREVIEW_HOST_MARKER: &str = "skill-gap-analyzer";

/// Success envelope shared by every JSON route.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T) -> Json<Self> {
        Json(Self {
            success: true,
            message: None,
            data: Some(data),
        })
    }

    pub fn with_message(message: impl Into<String>, data: T) -> Json<Self> {
        Json(Self {
            success: true,
            message: Some(message.into()),
            data: Some(data),
        })
    }
}

impl ApiResponse<()> {
    pub fn message(message: impl Into<String>) -> Json<Self> {
        Json(Self {
            success: true,
            message: Some(message.into()),
            data: None,
        })
    }
}

async fn route_not_found() -> AppError {
    AppError::NotFound("Route not found".to_string())
}

// ────────────────────────────────────────────────────────────────────────────
// CORS
// ────────────────────────────────────────────────────────────────────────────

/// Configured frontend origins, plus preview deployments on Vercel.
pub fn is_allowed_origin(origin: &str, frontend_urls: &[String]) -> bool {
    let origin = origin.trim_end_matches('/');
    if frontend_urls
        .iter()
        .any(|allowed| allowed.trim_end_matches('/') == origin)
    {
        return true;
    }

    Url::parse(origin)
        .ok()
        .filter(|url| url.scheme() == "https")
        .and_then(|url| url.host_str().map(str::to_string))
        .is_some_and(|host| {
            host.ends_with(PREVIEW_HOST_SUFFIX) && host.contains(PREVIEW_HOST_MARKER)
        })
}

pub fn cors_layer(config: &Config) -> CorsLayer {
    let frontend_urls = config.frontend_urls.clone();
    CorsLayer::new()
        .allow_origin(AllowOrigin::predicate(
            move |origin: &HeaderValue, _: &Parts| {
                origin
                    .to_str()
                    .is_ok_and(|origin| is_allowed_origin(origin, &frontend_urls))
            },
        ))
        .allow_credentials(true)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
}

// ────────────────────────────────────────────────────────────────────────────
// Router
// ────────────────────────────────────────────────────────────────────────────

fn api_routes() -> Router<AppState> {
    Router::new()
        // Auth
        .route("/api/auth/signup", post(auth::handlers::handle_signup))
        .route("/api/auth/signin", post(auth::handlers::handle_signin))
        .route("/api/auth/signout", post(auth::handlers::handle_signout))
        .route("/api/auth/me", get(auth::handlers::handle_me))
        .route("/api/auth/profile", put(auth::handlers::handle_update_profile))
        .route("/api/auth/refresh", post(auth::handlers::handle_refresh))
        .route(
            "/api/auth/forgot-password",
            post(auth::handlers::handle_forgot_password),
        )
        // Resumes
        .route("/api/resume", get(resumes::handlers::handle_list_resumes))
        .route(
            "/api/resume/upload",
            post(resumes::handlers::handle_upload_resume),
        )
        // Job descriptions
        .route(
            "/api/job-description",
            get(jobs::handlers::handle_list_jobs).post(jobs::handlers::handle_create_job),
        )
        .route(
            "/api/job-description/analyze",
            post(jobs::handlers::handle_analyze_job_text),
        )
        .route(
            "/api/job-description/:id",
            get(jobs::handlers::handle_get_job)
                .put(jobs::handlers::handle_update_job)
                .delete(jobs::handlers::handle_delete_job),
        )
        .route(
            "/api/job-description/:id/reanalyze",
            post(jobs::handlers::handle_reanalyze_job),
        )
        .route(
            "/api/job-description/:id/compare/:resume_id",
            get(jobs::handlers::handle_compare_job),
        )
        // Skill analysis
        .route(
            "/api/skill-analysis",
            get(analysis::handlers::handle_list_analyses),
        )
        .route(
            "/api/skill-analysis/analyze",
            post(analysis::handlers::handle_analyze),
        )
        .route(
            "/api/skill-analysis/history",
            get(analysis::handlers::handle_history),
        )
        .route(
            "/api/skill-analysis/insights",
            get(analysis::handlers::handle_insights),
        )
        .route(
            "/api/skill-analysis/:id",
            get(analysis::handlers::handle_get_analysis),
        )
        .route(
            "/api/skill-analysis/:id/reanalyze",
            post(analysis::handlers::handle_reanalyze),
        )
        // Learning paths
        .route(
            "/api/learning-path",
            get(learning_paths::handlers::handle_list_paths),
        )
        .route(
            "/api/learning-path/generate",
            post(learning_paths::handlers::handle_generate_path),
        )
        .route(
            "/api/learning-path/recommendations",
            get(learning_paths::handlers::handle_path_recommendations),
        )
        .route(
            "/api/learning-path/resources/:skill_name",
            get(learning_paths::handlers::handle_resources_for_skill),
        )
        .route(
            "/api/learning-path/:id",
            get(learning_paths::handlers::handle_get_path),
        )
        .route(
            "/api/learning-path/:id/progress",
            put(learning_paths::handlers::handle_update_progress),
        )
        .route(
            "/api/learning-path/:id/regenerate",
            post(learning_paths::handlers::handle_regenerate_path),
        )
        // Learning resources
        .route(
            "/api/learning-resources",
            get(learning_resources::handlers::handle_list_resources)
                .post(learning_resources::handlers::handle_create_resource),
        )
        .route(
            "/api/learning-resources/by-skills",
            post(learning_resources::handlers::handle_resources_by_skills),
        )
        .route(
            "/api/learning-resources/recommendations",
            post(learning_resources::handlers::handle_resource_recommendations),
        )
        .route(
            "/api/learning-resources/analyze",
            post(learning_resources::handlers::handle_analyze_resource),
        )
        .route(
            "/api/learning-resources/:id",
            get(learning_resources::handlers::handle_get_resource)
                .put(learning_resources::handlers::handle_update_resource)
                .delete(learning_resources::handlers::handle_delete_resource),
        )
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        .merge(api_routes())
        .fallback(route_not_found)
        // After the fallback so unmatched /api paths are counted as well
        .layer(from_fn_with_state(state.clone(), rate_limit_middleware))
        .layer(DefaultBodyLimit::max(BODY_LIMIT_BYTES))
        .layer(SetResponseHeaderLayer::overriding(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::X_FRAME_OPTIONS,
            HeaderValue::from_static("DENY"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::REFERRER_POLICY,
            HeaderValue::from_static("no-referrer"),
        ))
        .with_state(state)
}
