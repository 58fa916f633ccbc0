//! Persistence seam. `PgStore` backs the real server; `MemStore` backs
//! tests and local experiments. Both enforce the same rules by delegating
//! to the shared policy and rating helpers, so behavior cannot drift
//! between backends.

use axum::async_trait;
use uuid::Uuid;

use crate::error::ApiError;
use crate::models::{
    AdminStats, Course, CourseChanges, CourseDetail, CourseSummary, CertificateData,
    EnrolledCourse, NewCourse, NewUser, StudentStats, User, UserChanges, UserResponse,
    UserStatus,
};

mod memory;
mod postgres;

pub use memory::MemStore;
pub use postgres::PgStore;

#[async_trait]
pub trait Store: Send + Sync {
    // --- users ---

    /// Inserts a new account. Email uniqueness is pre-checked by callers;
    /// a concurrent duplicate surfaces as a database error.
    async fn create_user(&self, new: NewUser) -> Result<User, ApiError>;

    async fn find_user(&self, id: Uuid) -> Result<Option<User>, ApiError>;

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, ApiError>;

    /// Course ids the user is enrolled in, oldest enrollment first.
    async fn enrolled_course_ids(&self, user_id: Uuid) -> Result<Vec<Uuid>, ApiError>;

    // --- catalog ---

    /// All courses without their content items, newest first.
    async fn list_courses(&self) -> Result<Vec<CourseSummary>, ApiError>;

    async fn find_course(&self, id: Uuid) -> Result<Option<Course>, ApiError>;

    async fn course_detail(&self, id: Uuid) -> Result<Option<CourseDetail>, ApiError>;

    async fn create_course(&self, new: NewCourse) -> Result<CourseDetail, ApiError>;

    /// Applies the non-`None` fields; returns `None` if the course is gone.
    async fn update_course(
        &self,
        id: Uuid,
        changes: CourseChanges,
    ) -> Result<Option<CourseDetail>, ApiError>;

    /// Returns false if the course did not exist. Enrollments, content and
    /// reviews go with it.
    async fn delete_course(&self, id: Uuid) -> Result<bool, ApiError>;

    /// Stores the review and recomputes the course rating aggregate in the
    /// same write. Returns the updated course detail.
    async fn add_review(
        &self,
        course_id: Uuid,
        student_id: Uuid,
        rating: i32,
        comment: Option<String>,
    ) -> Result<CourseDetail, ApiError>;

    // --- enrollment lifecycle ---

    /// Links the pair in one atomic write. Fails NotFound when either side
    /// is missing, AlreadyEnrolled when the link exists. Progress starts
    /// at zero.
    async fn enroll(&self, course_id: Uuid, user_id: Uuid) -> Result<(), ApiError>;

    /// Removes the link. Fails NotFound when course or user is missing;
    /// removing a non-existent link is a no-op.
    async fn unenroll(&self, course_id: Uuid, user_id: Uuid) -> Result<(), ApiError>;

    async fn is_enrolled(&self, course_id: Uuid, user_id: Uuid) -> Result<bool, ApiError>;

    /// The caller's courses with their per-enrollment progress, content
    /// omitted, newest course first.
    async fn enrolled_courses(&self, user_id: Uuid) -> Result<Vec<EnrolledCourse>, ApiError>;

    /// Stores the clamped value and stamps last-accessed. Fails NotFound
    /// ("Course not found or not enrolled") when the link is missing.
    async fn update_progress(
        &self,
        course_id: Uuid,
        user_id: Uuid,
        progress: f64,
    ) -> Result<EnrolledCourse, ApiError>;

    /// Resolves the names needed for a certificate. Fails NotFound
    /// ("Course not found or not completed") unless the enrollment exists
    /// with progress exactly 100.
    async fn certificate_data(
        &self,
        course_id: Uuid,
        user_id: Uuid,
    ) -> Result<CertificateData, ApiError>;

    async fn student_stats(&self, user_id: Uuid) -> Result<StudentStats, ApiError>;

    // --- admin ---

    async fn list_users(&self) -> Result<Vec<UserResponse>, ApiError>;

    /// Applies the non-`None` fields. Enforces email uniqueness and refuses
    /// to demote or block the last active admin; check and write happen
    /// under the same lock.
    async fn update_user(&self, id: Uuid, changes: UserChanges)
        -> Result<UserResponse, ApiError>;

    /// Status-only update with the same last-active-admin guard as
    /// `update_user`.
    async fn set_user_status(
        &self,
        id: Uuid,
        status: UserStatus,
    ) -> Result<UserResponse, ApiError>;

    /// Deletes the account unless it is the last admin. The user's
    /// enrollments and reviews are removed; authored courses survive with
    /// the instructor reference cleared.
    async fn delete_user(&self, id: Uuid) -> Result<(), ApiError>;

    async fn admin_stats(&self) -> Result<AdminStats, ApiError>;
}
