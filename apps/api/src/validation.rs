//! Request field checks shared by the handlers. Each returns
//! `AppError::Validation` carrying a caller-facing message.

use reqwest::Url;

use crate::errors::AppError;

/// Trimmed length in characters must fall within `min..=max`.
pub fn length_between(value: &str, min: usize, max: usize, message: &str) -> Result<(), AppError> {
    let len = value.trim().chars().count();
    if (min..=max).contains(&len) {
        Ok(())
    } else {
        Err(AppError::Validation(message.to_string()))
    }
}

pub fn one_of(value: &str, allowed: &[&str], message: &str) -> Result<(), AppError> {
    if allowed.contains(&value) {
        Ok(())
    } else {
        Err(AppError::Validation(message.to_string()))
    }
}

pub fn in_range<T: PartialOrd>(value: T, min: T, max: T, message: &str) -> Result<(), AppError> {
    if value >= min && value <= max {
        Ok(())
    } else {
        Err(AppError::Validation(message.to_string()))
    }
}

/// Loose structural check: one `@`, a non-empty local part and a dotted domain.
pub fn is_valid_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && !email.chars().any(char::is_whitespace)
        && domain
            .split('.')
            .filter(|part| !part.is_empty())
            .count()
            >= 2
        && !domain.starts_with('.')
        && !domain.ends_with('.')
}

/// Lowercases and trims an address before it is sent anywhere.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

pub fn is_http_url(raw: &str) -> bool {
    Url::parse(raw.trim())
        .map(|url| matches!(url.scheme(), "http" | "https") && url.host_str().is_some())
        .unwrap_or(false)
}
