use std::sync::Arc;

use axum::routing::{delete, get, post, put};
use axum::Router;

use crate::store::Store;

pub mod admin;
pub mod auth;
pub mod courses;
pub mod enrollments;
pub mod student;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub jwt_secret: String,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        // accounts + sessions
        .route("/api/auth/register", post(auth::register))
        .route("/api/auth/login", post(auth::login))
        .route("/api/auth/me", get(auth::me))
        // catalog
        .route("/api/courses", get(courses::list).post(courses::create))
        .route(
            "/api/courses/:id",
            get(courses::detail).put(courses::update).delete(courses::remove),
        )
        .route("/api/courses/:id/reviews", post(courses::add_review))
        // enrollment lifecycle
        .route("/api/courses/:id/enroll", post(enrollments::enroll))
        .route("/api/enrollments/:course_id", delete(enrollments::unenroll))
        // student dashboard
        .route("/api/student/enrolled-courses", get(student::enrolled_courses))
        .route("/api/student/stats", get(student::stats))
        .route(
            "/api/student/courses/:course_id/progress",
            put(student::update_progress),
        )
        .route(
            "/api/student/courses/:course_id/certificate",
            get(student::certificate),
        )
        // admin panel
        .route("/api/admin/users", get(admin::list_users).post(admin::create_user))
        .route(
            "/api/admin/users/:id",
            put(admin::update_user).delete(admin::delete_user),
        )
        .route("/api/admin/users/:id/status", put(admin::set_status))
        .route("/api/admin/stats", get(admin::stats))
        .with_state(state)
}
