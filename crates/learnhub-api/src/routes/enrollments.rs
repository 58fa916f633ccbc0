use axum::extract::{Path, State};
use axum::Json;
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::models::MessageResponse;

use super::AppState;

pub async fn enroll(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<MessageResponse>, ApiError> {
    state.store.enroll(id, auth_user.id).await?;
    Ok(Json(MessageResponse::new("Successfully enrolled in course")))
}

pub async fn unenroll(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(course_id): Path<Uuid>,
) -> Result<Json<MessageResponse>, ApiError> {
    state.store.unenroll(course_id, auth_user.id).await?;
    Ok(Json(MessageResponse::new(
        "Successfully unenrolled from course",
    )))
}
