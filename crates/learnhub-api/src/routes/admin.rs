use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::{self, AuthUser};
use crate::error::ApiError;
use crate::models::{
    AdminStats, MessageResponse, NewUser, Role, UserChanges, UserResponse, UserStatus,
};

use super::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    name: Option<String>,
    email: Option<String>,
    role: Option<String>,
    status: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateUserRequest {
    name: Option<String>,
    email: Option<String>,
    role: Option<String>,
    status: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct StatusRequest {
    status: Option<String>,
}

/// The generated password is returned once so the admin can hand it over;
/// only its hash is stored.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedUserResponse {
    pub message: String,
    pub temp_password: String,
}

// Blank strings mean "leave unchanged", matching how the admin panel
// submits untouched form fields.
fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn parse_role(raw: Option<String>) -> Result<Option<Role>, ApiError> {
    match non_empty(raw) {
        Some(raw) => Role::parse(&raw)
            .map(Some)
            .ok_or_else(|| ApiError::validation("Invalid role value")),
        None => Ok(None),
    }
}

fn parse_status(raw: Option<String>) -> Result<Option<UserStatus>, ApiError> {
    match non_empty(raw) {
        Some(raw) => UserStatus::parse(&raw)
            .map(Some)
            .ok_or_else(|| ApiError::validation("Invalid status value")),
        None => Ok(None),
    }
}

pub async fn list_users(
    State(state): State<AppState>,
    auth_user: AuthUser,
) -> Result<Json<Vec<UserResponse>>, ApiError> {
    auth::require_admin(state.store.as_ref(), &auth_user).await?;
    Ok(Json(state.store.list_users().await?))
}

pub async fn create_user(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Json(req): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<CreatedUserResponse>), ApiError> {
    auth::require_admin(state.store.as_ref(), &auth_user).await?;

    let (Some(name), Some(email)) = (non_empty(req.name), non_empty(req.email)) else {
        return Err(ApiError::validation("Name and email are required"));
    };
    let role = parse_role(req.role)?.unwrap_or(Role::Student);
    let status = parse_status(req.status)?.unwrap_or(UserStatus::Active);

    if state.store.find_user_by_email(&email).await?.is_some() {
        return Err(ApiError::validation("User already exists"));
    }

    let temp_password = auth::temp_password();
    let password_hash = auth::hash_password(&temp_password)?;
    state
        .store
        .create_user(NewUser {
            name,
            email,
            password_hash,
            role,
            status,
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(CreatedUserResponse {
            message: "User created successfully".into(),
            temp_password,
        }),
    ))
}

pub async fn update_user(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateUserRequest>,
) -> Result<Json<UserResponse>, ApiError> {
    auth::require_admin(state.store.as_ref(), &auth_user).await?;

    let changes = UserChanges {
        name: non_empty(req.name),
        email: non_empty(req.email),
        role: parse_role(req.role)?,
        status: parse_status(req.status)?,
    };
    let updated = state.store.update_user(id, changes).await?;
    Ok(Json(updated))
}

pub async fn set_status(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<Uuid>,
    Json(req): Json<StatusRequest>,
) -> Result<Json<UserResponse>, ApiError> {
    auth::require_admin(state.store.as_ref(), &auth_user).await?;

    let status =
        parse_status(req.status)?.ok_or_else(|| ApiError::validation("Invalid status value"))?;
    let updated = state.store.set_user_status(id, status).await?;
    Ok(Json(updated))
}

pub async fn delete_user(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<MessageResponse>, ApiError> {
    auth::require_admin(state.store.as_ref(), &auth_user).await?;
    state.store.delete_user(id).await?;
    Ok(Json(MessageResponse::new("User deleted successfully")))
}

pub async fn stats(
    State(state): State<AppState>,
    auth_user: AuthUser,
) -> Result<Json<AdminStats>, ApiError> {
    auth::require_admin(state.store.as_ref(), &auth_user).await?;
    Ok(Json(state.store.admin_stats().await?))
}
