use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::auth::{self, AuthUser};
use crate::error::ApiError;
use crate::models::{NewUser, Role, UserResponse, UserStatus};

use super::AppState;

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    name: Option<String>,
    email: Option<String>,
    password: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    email: Option<String>,
    password: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: UserResponse,
}

pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), ApiError> {
    let (Some(name), Some(email), Some(password)) = (req.name, req.email, req.password)
    else {
        return Err(ApiError::validation("Please enter all fields"));
    };
    if name.trim().is_empty() || email.trim().is_empty() || password.is_empty() {
        return Err(ApiError::validation("Please enter all fields"));
    }
    if state.store.find_user_by_email(&email).await?.is_some() {
        return Err(ApiError::validation("User already exists"));
    }

    let password_hash = auth::hash_password(&password)?;
    let user = state
        .store
        .create_user(NewUser {
            name,
            email,
            password_hash,
            role: Role::Student,
            status: UserStatus::Active,
        })
        .await?;
    let token = auth::sign_token(user.id, user.role, &state.jwt_secret)?;
    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            token,
            user: UserResponse::from_user(user, vec![]),
        }),
    ))
}

pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    let (Some(email), Some(password)) = (req.email, req.password) else {
        return Err(ApiError::validation("Please enter all fields"));
    };

    // Same message for unknown email and wrong password.
    let user = state
        .store
        .find_user_by_email(&email)
        .await?
        .ok_or_else(|| ApiError::validation("Invalid credentials"))?;
    if !auth::verify_password(&password, &user.password_hash)? {
        return Err(ApiError::validation("Invalid credentials"));
    }
    if user.status == UserStatus::Blocked {
        return Err(ApiError::forbidden(
            "Account is blocked. Contact administrator.",
        ));
    }

    let enrolled = state.store.enrolled_course_ids(user.id).await?;
    let token = auth::sign_token(user.id, user.role, &state.jwt_secret)?;
    Ok(Json(AuthResponse {
        token,
        user: UserResponse::from_user(user, enrolled),
    }))
}

pub async fn me(
    State(state): State<AppState>,
    auth_user: AuthUser,
) -> Result<Json<UserResponse>, ApiError> {
    let user = state
        .store
        .find_user(auth_user.id)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;
    let enrolled = state.store.enrolled_course_ids(user.id).await?;
    Ok(Json(UserResponse::from_user(user, enrolled)))
}
