use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::models::{
    ContentItem, ContentKind, CourseChanges, CourseDetail, CourseLevel, CourseStatus,
    CourseSummary, MessageResponse, NewCourse,
};

use super::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCourseRequest {
    title: Option<String>,
    description: Option<String>,
    price: Option<f64>,
    category: Option<String>,
    level: Option<String>,
    duration: Option<String>,
    content: Option<Vec<ContentItemRequest>>,
    prerequisites: Option<Vec<String>>,
    learning_objectives: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCourseRequest {
    title: Option<String>,
    description: Option<String>,
    price: Option<f64>,
    category: Option<String>,
    level: Option<String>,
    duration: Option<String>,
    status: Option<String>,
    content: Option<Vec<ContentItemRequest>>,
    prerequisites: Option<Vec<String>>,
    learning_objectives: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
pub struct ContentItemRequest {
    title: Option<String>,
    #[serde(rename = "type")]
    kind: Option<String>,
    url: Option<String>,
    duration: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ReviewRequest {
    rating: Option<i32>,
    comment: Option<String>,
}

fn parse_content(items: Vec<ContentItemRequest>) -> Result<Vec<ContentItem>, ApiError> {
    items
        .into_iter()
        .map(|item| {
            let kind = item
                .kind
                .as_deref()
                .and_then(ContentKind::parse)
                .ok_or_else(|| ApiError::validation("Invalid content type"))?;
            Ok(ContentItem {
                title: item.title.unwrap_or_default(),
                kind,
                url: item.url.unwrap_or_default(),
                duration: item.duration.unwrap_or_default(),
            })
        })
        .collect()
}

pub async fn list(State(state): State<AppState>) -> Result<Json<Vec<CourseSummary>>, ApiError> {
    Ok(Json(state.store.list_courses().await?))
}

pub async fn detail(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<CourseDetail>, ApiError> {
    let course = state
        .store
        .course_detail(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Course not found"))?;
    Ok(Json(course))
}

pub async fn create(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Json(req): Json<CreateCourseRequest>,
) -> Result<(StatusCode, Json<CourseDetail>), ApiError> {
    let (Some(title), Some(description), Some(price), Some(level), Some(duration)) =
        (req.title, req.description, req.price, req.level, req.duration)
    else {
        return Err(ApiError::validation("Please provide all required fields"));
    };
    if price < 0.0 {
        return Err(ApiError::validation("Price cannot be negative"));
    }
    let level =
        CourseLevel::parse(&level).ok_or_else(|| ApiError::validation("Invalid level value"))?;
    let content = parse_content(req.content.unwrap_or_default())?;

    let course = state
        .store
        .create_course(NewCourse {
            title,
            description,
            price,
            category: req.category.unwrap_or_else(|| "general".into()),
            level,
            duration,
            instructor_id: auth_user.id,
            content,
            prerequisites: req.prerequisites.unwrap_or_default(),
            learning_objectives: req.learning_objectives.unwrap_or_default(),
        })
        .await?;
    Ok((StatusCode::CREATED, Json(course)))
}

pub async fn update(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateCourseRequest>,
) -> Result<Json<CourseDetail>, ApiError> {
    let course = state
        .store
        .find_course(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Course not found"))?;
    if course.instructor_id != Some(auth_user.id) {
        return Err(ApiError::forbidden("Not authorized"));
    }

    if let Some(price) = req.price {
        if price < 0.0 {
            return Err(ApiError::validation("Price cannot be negative"));
        }
    }
    let level = match req.level {
        Some(raw) => Some(
            CourseLevel::parse(&raw)
                .ok_or_else(|| ApiError::validation("Invalid level value"))?,
        ),
        None => None,
    };
    let status = match req.status {
        Some(raw) => Some(
            CourseStatus::parse(&raw)
                .ok_or_else(|| ApiError::validation("Invalid status value"))?,
        ),
        None => None,
    };
    let content = match req.content {
        Some(items) => Some(parse_content(items)?),
        None => None,
    };

    let updated = state
        .store
        .update_course(
            id,
            CourseChanges {
                title: req.title,
                description: req.description,
                price: req.price,
                category: req.category,
                level,
                duration: req.duration,
                status,
                content,
                prerequisites: req.prerequisites,
                learning_objectives: req.learning_objectives,
            },
        )
        .await?
        .ok_or_else(|| ApiError::not_found("Course not found"))?;
    Ok(Json(updated))
}

pub async fn remove(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<MessageResponse>, ApiError> {
    let course = state
        .store
        .find_course(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Course not found"))?;
    if course.instructor_id != Some(auth_user.id) {
        return Err(ApiError::forbidden("Not authorized"));
    }
    if !state.store.delete_course(id).await? {
        return Err(ApiError::not_found("Course not found"));
    }
    Ok(Json(MessageResponse::new("Course removed")))
}

pub async fn add_review(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<Uuid>,
    Json(req): Json<ReviewRequest>,
) -> Result<(StatusCode, Json<CourseDetail>), ApiError> {
    let rating = req
        .rating
        .filter(|r| (1..=5).contains(r))
        .ok_or_else(|| ApiError::validation("Rating must be between 1 and 5"))?;
    if state.store.find_course(id).await?.is_none() {
        return Err(ApiError::not_found("Course not found"));
    }
    if !state.store.is_enrolled(id, auth_user.id).await? {
        return Err(ApiError::forbidden("Must be enrolled to review this course"));
    }

    let detail = state
        .store
        .add_review(id, auth_user.id, rating, req.comment)
        .await?;
    Ok((StatusCode::CREATED, Json(detail)))
}
