use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;

use crate::error::ApiError;
use crate::models::{Book, NewBook};
use crate::store::BookStore;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn BookStore>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/books", get(list).post(add))
        .route("/api/books/search", get(search))
        .with_state(state)
}

async fn health() -> &'static str {
    "ok"
}

async fn list(State(state): State<AppState>) -> Result<Json<Vec<Book>>, ApiError> {
    Ok(Json(state.store.list_books().await?))
}

#[derive(Deserialize)]
struct SearchParams {
    author: Option<String>,
}

async fn search(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<Vec<Book>>, ApiError> {
    let author = params
        .author
        .filter(|author| !author.is_empty())
        .ok_or_else(|| ApiError::validation("Author query parameter is required"))?;
    Ok(Json(state.store.search_by_author(&author).await?))
}

#[derive(Deserialize)]
struct CreateBookRequest {
    title: Option<String>,
    author: Option<String>,
    price: Option<f64>,
}

async fn add(
    State(state): State<AppState>,
    Json(req): Json<CreateBookRequest>,
) -> Result<(StatusCode, Json<Book>), ApiError> {
    let (Some(title), Some(author), Some(price)) = (
        req.title.filter(|title| !title.trim().is_empty()),
        req.author.filter(|author| !author.trim().is_empty()),
        req.price,
    ) else {
        return Err(ApiError::validation("All fields are required"));
    };
    if price < 0.0 {
        return Err(ApiError::validation("Price cannot be negative"));
    }

    let book = state
        .store
        .add_book(NewBook {
            title,
            author,
            price,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(book)))
}
