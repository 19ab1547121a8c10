use axum::{extract::State, http::StatusCode, Json};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{error, info, warn};

use crate::auth::client::AuthError;
use crate::auth::AuthUser;
use crate::errors::AppError;
use crate::models::user::UserProfileRow;
use crate::routes::ApiResponse;
use crate::state::AppState;
use crate::validation::{is_valid_email, length_between, normalize_email, one_of};

const EXPERIENCE_LEVELS: &[&str] = &["entry", "mid", "senior", "lead"];

#[derive(Deserialize)]
pub struct SignupRequest {
    pub email: String,
    pub password: String,
    pub name: String,
}

#[derive(Deserialize)]
pub struct SigninRequest {
    pub email: String,
    pub password: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    pub name: Option<String>,
    pub current_role: Option<String>,
    pub target_role: Option<String>,
    pub experience: Option<String>,
}

#[derive(Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: Option<String>,
}

#[derive(Deserialize)]
pub struct ForgotPasswordRequest {
    pub email: Option<String>,
}

fn upstream(e: AuthError) -> AppError {
    AppError::AuthService(e.to_string())
}

impl SignupRequest {
    fn validate(&self) -> Result<(), AppError> {
        if !is_valid_email(self.email.trim()) {
            return Err(AppError::Validation("A valid email is required".into()));
        }
        if self.password.chars().count() < 6 {
            return Err(AppError::Validation(
                "Password must be at least 6 characters".into(),
            ));
        }
        length_between(&self.name, 2, usize::MAX, "Name must be at least 2 characters")
    }
}

impl UpdateProfileRequest {
    fn validate(&self) -> Result<(), AppError> {
        if let Some(name) = &self.name {
            length_between(name, 2, usize::MAX, "Name must be at least 2 characters")?;
        }
        if let Some(experience) = &self.experience {
            one_of(
                experience,
                EXPERIENCE_LEVELS,
                "Experience must be one of entry, mid, senior, lead",
            )?;
        }
        Ok(())
    }
}

/// POST /api/auth/signup
pub async fn handle_signup(
    State(state): State<AppState>,
    Json(req): Json<SignupRequest>,
) -> Result<(StatusCode, Json<ApiResponse<Value>>), AppError> {
    req.validate()?;
    let email = normalize_email(&req.email);
    let name = req.name.trim();

    let identity = state
        .auth
        .sign_up(&email, &req.password, name)
        .await
        .map_err(|e| match e {
            AuthError::Rejected { message, .. } if message.contains("already registered") => {
                AppError::Conflict("User already exists".into())
            }
            AuthError::Rejected { message, .. } => AppError::Validation(message),
            other => upstream(other),
        })?;

    let profile = sqlx::query(
        r#"
        INSERT INTO users (id, email, name, experience, created_at)
        VALUES ($1, $2, $3, 'entry', NOW())
        ON CONFLICT (id) DO NOTHING
        "#,
    )
    .bind(identity.id)
    .bind(identity.email.as_deref().unwrap_or(email.as_str()))
    .bind(name)
    .execute(&state.db)
    .await;

    if let Err(e) = profile {
        // The account exists upstream; the profile row can be recreated later.
        error!("Profile creation failed for {}: {e}", identity.id);
    }

    info!("User {} signed up", identity.id);

    Ok((
        StatusCode::CREATED,
        ApiResponse::with_message(
            "User created successfully",
            json!({
                "user": { "id": identity.id, "email": identity.email, "name": name }
            }),
        ),
    ))
}

/// POST /api/auth/signin
pub async fn handle_signin(
    State(state): State<AppState>,
    Json(req): Json<SigninRequest>,
) -> Result<Json<ApiResponse<Value>>, AppError> {
    if !is_valid_email(req.email.trim()) || req.password.is_empty() {
        return Err(AppError::Validation("Email and password are required".into()));
    }

    let session = state
        .auth
        .sign_in_with_password(&normalize_email(&req.email), &req.password)
        .await
        .map_err(|e| match e {
            AuthError::Rejected { .. } => AppError::Unauthorized("Invalid credentials".into()),
            other => upstream(other),
        })?;

    let user = session.user.as_ref().map(|u| {
        json!({ "id": u.id, "email": u.email, "name": u.name() })
    });

    Ok(ApiResponse::with_message(
        "Signed in successfully",
        json!({ "user": user, "session": session }),
    ))
}

/// POST /api/auth/signout
pub async fn handle_signout(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<ApiResponse<()>>, AppError> {
    state.auth.sign_out(&user.access_token).await.map_err(|e| {
        warn!("Sign out failed for {}: {e}", user.id);
        AppError::AuthService("Sign out failed".into())
    })?;

    Ok(ApiResponse::message("Signed out successfully"))
}

/// GET /api/auth/me
pub async fn handle_me(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<ApiResponse<Value>>, AppError> {
    let profile: Option<UserProfileRow> = sqlx::query_as("SELECT * FROM users WHERE id = $1")
        .bind(user.id)
        .fetch_optional(&state.db)
        .await?;

    let body = match profile {
        Some(profile) => json!({ "user": profile }),
        None => json!({
            "user": { "id": user.id, "email": user.email, "role": user.role }
        }),
    };

    Ok(ApiResponse::ok(body))
}

/// PUT /api/auth/profile
pub async fn handle_update_profile(
    State(state): State<AppState>,
    user: AuthUser,
    Json(req): Json<UpdateProfileRequest>,
) -> Result<Json<ApiResponse<Value>>, AppError> {
    req.validate()?;

    let trimmed = |value: &Option<String>| value.as_deref().map(|v| v.trim().to_string());

    let updated: Option<UserProfileRow> = sqlx::query_as(
        r#"
        UPDATE users SET
            name = COALESCE($2, name),
            "current_role" = COALESCE($3, "current_role"),
            target_role = COALESCE($4, target_role),
            experience = COALESCE($5, experience),
            updated_at = NOW()
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(user.id)
    .bind(trimmed(&req.name))
    .bind(trimmed(&req.current_role))
    .bind(trimmed(&req.target_role))
    .bind(req.experience.as_deref())
    .fetch_optional(&state.db)
    .await?;

    let updated = updated.ok_or_else(|| AppError::not_found("User profile"))?;

    Ok(ApiResponse::with_message(
        "Profile updated successfully",
        json!({ "user": updated }),
    ))
}

/// POST /api/auth/refresh
pub async fn handle_refresh(
    State(state): State<AppState>,
    Json(req): Json<RefreshRequest>,
) -> Result<Json<ApiResponse<Value>>, AppError> {
    let token = req
        .refresh_token
        .filter(|t| !t.trim().is_empty())
        .ok_or_else(|| AppError::Validation("Refresh token required".into()))?;

    let session = state
        .auth
        .refresh_session(&token)
        .await
        .map_err(|e| match e {
            AuthError::Rejected { .. } => AppError::Unauthorized("Invalid refresh token".into()),
            other => upstream(other),
        })?;

    Ok(ApiResponse::with_message(
        "Token refreshed successfully",
        json!({ "session": session }),
    ))
}

/// POST /api/auth/forgot-password
pub async fn handle_forgot_password(
    State(state): State<AppState>,
    Json(req): Json<ForgotPasswordRequest>,
) -> Result<Json<ApiResponse<()>>, AppError> {
    let email = req
        .email
        .filter(|e| !e.trim().is_empty())
        .ok_or_else(|| AppError::Validation("Email required".into()))?;

    let redirect_to = format!("{}/reset-password", state.config.primary_frontend_url());

    state
        .auth
        .send_password_reset(&normalize_email(&email), &redirect_to)
        .await
        .map_err(|e| {
            warn!("Password reset failed: {e}");
            AppError::AuthService("Password reset failed".into())
        })?;

    Ok(ApiResponse::message("Password reset email sent"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signup(email: &str, password: &str, name: &str) -> SignupRequest {
        SignupRequest {
            email: email.into(),
            password: password.into(),
            name: name.into(),
        }
    }

    #[test]
    fn test_signup_validation() {
        assert!(signup("dev@example.com", "secret", "Al").validate().is_ok());
        assert!(signup("not-an-email", "secret", "Al").validate().is_err());
        assert!(signup("dev@example.com", "12345", "Al").validate().is_err());
        assert!(signup("dev@example.com", "secret", " A ").validate().is_err());
    }

    #[test]
    fn test_profile_validation() {
        let ok = UpdateProfileRequest {
            name: None,
            current_role: Some("Engineer".into()),
            target_role: None,
            experience: Some("senior".into()),
        };
        assert!(ok.validate().is_ok());

        let bad = UpdateProfileRequest {
            name: None,
            current_role: None,
            target_role: None,
            experience: Some("principal".into()),
        };
        assert!(matches!(bad.validate(), Err(AppError::Validation(_))));
    }

    #[test]
    fn test_profile_request_uses_camel_case() {
        let req: UpdateProfileRequest =
            serde_json::from_value(json!({"currentRole": "Dev", "targetRole": "Lead"})).unwrap();
        assert_eq!(req.current_role.as_deref(), Some("Dev"));
        assert_eq!(req.target_role.as_deref(), Some("Lead"));
    }
}
