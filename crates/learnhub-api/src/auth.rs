//! Token issuance and verification, password hashing, and the request
//! extractor that turns a Bearer header into an authenticated identity.

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::RequestPartsExt;
use axum_extra::headers::authorization::Bearer;
use axum_extra::headers::Authorization;
use axum_extra::TypedHeader;
use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation};
use rand::distributions::Alphanumeric;
use rand::Rng;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ApiError;
use crate::models::Role;
use crate::routes::AppState;
use crate::store::Store;

const TOKEN_TTL_HOURS: i64 = 24;
const ADMIN_ONLY: &str = "Access denied. Admin only.";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub role: Role,
    pub iat: i64,
    pub exp: i64,
}

pub fn sign_token(user_id: Uuid, role: Role, secret: &str) -> Result<String, ApiError> {
    let now = Utc::now();
    let claims = Claims {
        sub: user_id,
        role,
        iat: now.timestamp(),
        exp: (now + Duration::hours(TOKEN_TTL_HOURS)).timestamp(),
    };
    let token = jsonwebtoken::encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?;
    Ok(token)
}

pub fn decode_token(token: &str, secret: &str) -> Result<Claims, ApiError> {
    jsonwebtoken::decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|_| ApiError::unauthorized("Token is not valid"))
}

pub fn hash_password(raw: &str) -> Result<String, ApiError> {
    Ok(bcrypt::hash(raw, bcrypt::DEFAULT_COST)?)
}

pub fn verify_password(raw: &str, hash: &str) -> Result<bool, ApiError> {
    Ok(bcrypt::verify(raw, hash)?)
}

/// Eight random alphanumeric characters, handed to admin-created accounts.
pub fn temp_password() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(8)
        .map(char::from)
        .collect()
}

/// Identity carried by a valid token. Handlers trust the claims as-is; only
/// the admin gate re-checks the directory.
#[derive(Debug, Clone, Copy)]
pub struct AuthUser {
    pub id: Uuid,
    pub role: Role,
}

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let TypedHeader(Authorization(bearer)) = parts
            .extract::<TypedHeader<Authorization<Bearer>>>()
            .await
            .map_err(|_| ApiError::unauthorized("No token, authorization denied"))?;
        let claims = decode_token(bearer.token(), &state.jwt_secret)?;
        Ok(AuthUser {
            id: claims.sub,
            role: claims.role,
        })
    }
}

/// Admin routes look the caller up fresh so a demoted or deleted admin loses
/// access as soon as the directory changes, not when the token expires.
pub async fn require_admin(store: &dyn Store, auth: &AuthUser) -> Result<(), ApiError> {
    let user = store
        .find_user(auth.id)
        .await?
        .ok_or_else(|| ApiError::forbidden(ADMIN_ONLY))?;
    if user.role != Role::Admin {
        return Err(ApiError::forbidden(ADMIN_ONLY));
    }
    Ok(())
}
