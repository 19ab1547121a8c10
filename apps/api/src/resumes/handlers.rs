use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use serde_json::{json, Value};
use sqlx::PgPool;
use tracing::{error, info};
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::errors::AppError;
use crate::models::resume::ResumeRow;
use crate::models::skill::Skill;
use crate::resumes::extract::{extract_text, validate_upload, ExtractError, UploadedFile};
use crate::resumes::skills::extract_resume_skills;
use crate::routes::ApiResponse;
use crate::state::AppState;
use crate::validation::length_between;

const FILE_FIELD: &str = "resume";
const PREVIEW_CHARS: usize = 500;

/// Parts of the upload form after multipart decoding.
struct UploadForm {
    file: UploadedFile,
    title: Option<String>,
    description: Option<String>,
}

/// Non-blank, trimmed form value.
fn non_blank(value: String) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

async fn read_upload_form(mut multipart: Multipart) -> Result<UploadForm, AppError> {
    let mut file: Option<UploadedFile> = None;
    let mut title = None;
    let mut description = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("File upload error: {e}")))?
    {
        let name = field.name().unwrap_or_default().to_string();

        if field.file_name().is_some() {
            if name != FILE_FIELD {
                return Err(AppError::Validation(
                    "Unexpected file field. Expected field name: \"resume\".".into(),
                ));
            }
            if file.is_some() {
                return Err(AppError::Validation(
                    "Too many files. Only 1 file allowed.".into(),
                ));
            }

            let file_name = field.file_name().unwrap_or_default().to_string();
            let content_type = field.content_type().unwrap_or_default().to_string();
            let bytes = field
                .bytes()
                .await
                .map_err(|e| AppError::Validation(format!("File upload error: {e}")))?;

            file = Some(UploadedFile {
                file_name,
                content_type,
                bytes,
            });
            continue;
        }

        let value = field
            .text()
            .await
            .map_err(|e| AppError::Validation(format!("Invalid form field '{name}': {e}")))?;
        match name.as_str() {
            "title" => title = non_blank(value),
            "description" => description = non_blank(value),
            _ => {}
        }
    }

    let file = file.ok_or(ExtractError::Missing)?;
    Ok(UploadForm {
        file,
        title,
        description,
    })
}

/// `resumes/{user_id}/{millis}-{file_name}`
pub fn resume_object_key(user_id: Uuid, millis: i64, file_name: &str) -> String {
    format!("resumes/{user_id}/{millis}-{file_name}")
}

pub fn text_preview(text: &str) -> String {
    let mut preview: String = text.chars().take(PREVIEW_CHARS).collect();
    preview.push_str("...");
    preview
}

/// Loads a resume owned by `user_id`, or `NotFound`.
pub async fn fetch_resume(db: &PgPool, user_id: Uuid, id: Uuid) -> Result<ResumeRow, AppError> {
    sqlx::query_as("SELECT * FROM resumes WHERE id = $1 AND user_id = $2")
        .bind(id)
        .bind(user_id)
        .fetch_optional(db)
        .await?
        .ok_or_else(|| AppError::not_found("Resume"))
}

/// GET /api/resume
pub async fn handle_list_resumes(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<ApiResponse<Vec<ResumeRow>>>, AppError> {
    let resumes: Vec<ResumeRow> = sqlx::query_as(
        "SELECT * FROM resumes WHERE user_id = $1 ORDER BY uploaded_at DESC",
    )
    .bind(user.id)
    .fetch_all(&state.db)
    .await?;

    Ok(ApiResponse::ok(resumes))
}

/// POST /api/resume/upload
///
/// Multipart form: file field `resume`, optional `title` and `description`.
pub async fn handle_upload_resume(
    State(state): State<AppState>,
    user: AuthUser,
    multipart: Multipart,
) -> Result<(StatusCode, Json<ApiResponse<Value>>), AppError> {
    let form = read_upload_form(multipart).await?;
    validate_upload(&form.file, state.config.max_upload_bytes)?;

    if let Some(title) = &form.title {
        length_between(title, 1, 100, "Title must be between 1 and 100 characters")?;
    }
    if let Some(description) = &form.description {
        length_between(description, 0, 500, "Description must be at most 500 characters")?;
    }

    let file_name = form.file.sanitized_name();
    let file = form.file;

    // PDF parsing is CPU-bound.
    let parse_input = file.clone();
    let extracted_text = tokio::task::spawn_blocking(move || extract_text(&parse_input))
        .await
        .map_err(|e| AppError::Internal(anyhow::anyhow!("text extraction task failed: {e}")))??;

    let skills: Vec<Skill> = extract_resume_skills(&state.llm, &extracted_text).await;

    let key = resume_object_key(user.id, Utc::now().timestamp_millis(), &file_name);
    state
        .storage
        .upload(&key, file.bytes.clone(), &file.content_type)
        .await?;
    let file_url = state.config.public_object_url(&key);

    let inserted: Result<ResumeRow, sqlx::Error> = sqlx::query_as(
        r#"
        INSERT INTO resumes
            (user_id, file_name, file_url, storage_path, title, description,
             extracted_text, extracted_skills, uploaded_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, NOW())
        RETURNING *
        "#,
    )
    .bind(user.id)
    .bind(&file_name)
    .bind(&file_url)
    .bind(&key)
    .bind(form.title.as_deref().unwrap_or(file_name.as_str()))
    .bind(form.description.as_deref().unwrap_or_default())
    .bind(&extracted_text)
    .bind(sqlx::types::Json(&skills))
    .fetch_one(&state.db)
    .await;

    let resume = match inserted {
        Ok(resume) => resume,
        Err(e) => {
            error!("Resume insert failed, removing stored object {key}: {e}");
            state.storage.remove(&key).await;
            return Err(AppError::Database(e));
        }
    };

    info!(
        "Resume {} uploaded by {} ({} skills)",
        resume.id,
        user.id,
        skills.len()
    );

    Ok((
        StatusCode::CREATED,
        ApiResponse::with_message(
            "Resume uploaded and parsed successfully",
            json!({
                "resume": resume,
                "extractedSkills": skills,
                "extractedText": text_preview(&extracted_text),
            }),
        ),
    ))
}
