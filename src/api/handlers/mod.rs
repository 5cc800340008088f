//! API request handlers.
//!
//! This module contains all HTTP request handlers organized by functionality.

/// Account administration handlers (admin only).
pub mod admin;
/// Authentication handlers (register, login, session, profile).
pub mod auth;

use crate::types::{AppError, Result};
use axum::{extract::rejection::JsonRejection, Json};

/// Unwraps a JSON body, turning axum's plain-text rejection into a 400 with
/// the usual `{message}` body.
pub(crate) fn json_body<T>(payload: std::result::Result<Json<T>, JsonRejection>) -> Result<T> {
    payload
        .map(|Json(body)| body)
        .map_err(|e| AppError::Validation(e.body_text()))
}
