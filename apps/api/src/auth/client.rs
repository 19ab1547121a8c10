//! Thin client for the hosted auth service (Supabase GoTrue REST API).
//!
//! Only the endpoints the API needs are covered: token verification,
//! sign-up, password and refresh-token grants, logout and password recovery.

use std::time::Duration;

use reqwest::{Client, RequestBuilder, Response};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use thiserror::Error;
use uuid::Uuid;

const REQUEST_TIMEOUT_SECS: u64 = 15;

#[derive(Debug, Error)]
pub enum AuthError {
    /// The service answered with a 4xx: bad credentials, expired token, etc.
    #[error("auth service rejected the request ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected auth service response: {0}")]
    Unexpected(String),
}

/// A user as returned by the auth service.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthIdentity {
    pub id: Uuid,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub user_metadata: Value,
}

impl AuthIdentity {
    /// Role from user metadata; `user` when unset.
    pub fn role(&self) -> String {
        self.user_metadata
            .get("role")
            .and_then(Value::as_str)
            .unwrap_or("user")
            .to_string()
    }

    pub fn name(&self) -> Option<String> {
        self.user_metadata
            .get("name")
            .and_then(Value::as_str)
            .map(str::to_string)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    pub refresh_token: String,
    #[serde(default)]
    pub expires_at: Option<i64>,
    #[serde(default, skip_serializing)]
    pub user: Option<AuthIdentity>,
}

#[derive(Clone)]
pub struct SupabaseAuth {
    client: Client,
    base_url: String,
    anon_key: String,
}

impl SupabaseAuth {
    pub fn new(supabase_url: &str, anon_key: &str) -> Result<Self, AuthError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;
        Ok(Self {
            client,
            base_url: format!("{}/auth/v1", supabase_url.trim_end_matches('/')),
            anon_key: anon_key.to_string(),
        })
    }

    fn request(&self, method: reqwest::Method, path: &str) -> RequestBuilder {
        self.client
            .request(method, format!("{}{}", self.base_url, path))
            .header("apikey", &self.anon_key)
    }

    /// Resolves an access token to its user. Rejected tokens are `Rejected`.
    pub async fn get_user(&self, access_token: &str) -> Result<AuthIdentity, AuthError> {
        let response = self
            .request(reqwest::Method::GET, "/user")
            .bearer_auth(access_token)
            .send()
            .await?;
        Ok(ensure_success(response).await?.json().await?)
    }

    pub async fn sign_up(
        &self,
        email: &str,
        password: &str,
        name: &str,
    ) -> Result<AuthIdentity, AuthError> {
        let response = self
            .request(reqwest::Method::POST, "/signup")
            .json(&json!({
                "email": email,
                "password": password,
                "data": { "name": name, "role": "user" }
            }))
            .send()
            .await?;
        let body: Value = ensure_success(response).await?.json().await?;
        identity_from_signup(body)
    }

    pub async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Session, AuthError> {
        let response = self
            .request(reqwest::Method::POST, "/token")
            .query(&[("grant_type", "password")])
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await?;
        Ok(ensure_success(response).await?.json().await?)
    }

    pub async fn refresh_session(&self, refresh_token: &str) -> Result<Session, AuthError> {
        let response = self
            .request(reqwest::Method::POST, "/token")
            .query(&[("grant_type", "refresh_token")])
            .json(&json!({ "refresh_token": refresh_token }))
            .send()
            .await?;
        Ok(ensure_success(response).await?.json().await?)
    }

    /// Revokes the session that owns `access_token`.
    pub async fn sign_out(&self, access_token: &str) -> Result<(), AuthError> {
        let response = self
            .request(reqwest::Method::POST, "/logout")
            .bearer_auth(access_token)
            .send()
            .await?;
        ensure_success(response).await?;
        Ok(())
    }

    pub async fn send_password_reset(&self, email: &str, redirect_to: &str) -> Result<(), AuthError> {
        let response = self
            .request(reqwest::Method::POST, "/recover")
            .query(&[("redirect_to", redirect_to)])
            .json(&json!({ "email": email }))
            .send()
            .await?;
        ensure_success(response).await?;
        Ok(())
    }
}

async fn ensure_success(response: Response) -> Result<Response, AuthError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = error_message(&body);
    if status.is_client_error() {
        Err(AuthError::Rejected {
            status: status.as_u16(),
            message,
        })
    } else {
        Err(AuthError::Unexpected(format!("{status}: {message}")))
    }
}

/// GoTrue reports errors under several keys depending on the endpoint.
fn error_message(body: &str) -> String {
    let Ok(value) = serde_json::from_str::<Value>(body) else {
        return body.to_string();
    };
    ["msg", "message", "error_description", "error"]
        .iter()
        .find_map(|key| value.get(*key).and_then(Value::as_str))
        .map(str::to_string)
        .unwrap_or_else(|| body.to_string())
}

/// Sign-up returns either a bare user (email confirmation pending) or a
/// session with a nested `user`.
fn identity_from_signup(body: Value) -> Result<AuthIdentity, AuthError> {
    let user = match body.get("user") {
        Some(user) if user.is_object() => user.clone(),
        _ => body,
    };
    serde_json::from_value(user).map_err(|e| AuthError::Unexpected(e.to_string()))
}
