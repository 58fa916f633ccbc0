use axum::extract::{Path, State};
use axum::Json;
use chrono::Utc;
use serde::Deserialize;
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::models::{Certificate, EnrolledCourse, StudentStats};

use super::AppState;

#[derive(Debug, Deserialize)]
pub struct ProgressRequest {
    progress: Option<f64>,
}

pub async fn enrolled_courses(
    State(state): State<AppState>,
    auth_user: AuthUser,
) -> Result<Json<Vec<EnrolledCourse>>, ApiError> {
    Ok(Json(state.store.enrolled_courses(auth_user.id).await?))
}

pub async fn stats(
    State(state): State<AppState>,
    auth_user: AuthUser,
) -> Result<Json<StudentStats>, ApiError> {
    Ok(Json(state.store.student_stats(auth_user.id).await?))
}

pub async fn update_progress(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(course_id): Path<Uuid>,
    Json(req): Json<ProgressRequest>,
) -> Result<Json<EnrolledCourse>, ApiError> {
    let progress = req
        .progress
        .ok_or_else(|| ApiError::validation("Progress value is required"))?;
    let updated = state
        .store
        .update_progress(course_id, auth_user.id, progress)
        .await?;
    Ok(Json(updated))
}

pub async fn certificate(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(course_id): Path<Uuid>,
) -> Result<Json<Certificate>, ApiError> {
    let data = state
        .store
        .certificate_data(course_id, auth_user.id)
        .await?;
    Ok(Json(Certificate::issue(
        data,
        auth_user.id,
        course_id,
        Utc::now(),
    )))
}
