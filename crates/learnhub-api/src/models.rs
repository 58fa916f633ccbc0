use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "user_role", rename_all = "lowercase")]
pub enum Role {
    Student,
    Instructor,
    Admin,
}

impl Role {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "student" => Some(Role::Student),
            "instructor" => Some(Role::Instructor),
            "admin" => Some(Role::Admin),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "user_status", rename_all = "lowercase")]
pub enum UserStatus {
    Active,
    Blocked,
}

impl UserStatus {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "active" => Some(UserStatus::Active),
            "blocked" => Some(UserStatus::Blocked),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "course_status", rename_all = "lowercase")]
pub enum CourseStatus {
    Draft,
    Pending,
    Active,
    Inactive,
}

impl CourseStatus {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "draft" => Some(CourseStatus::Draft),
            "pending" => Some(CourseStatus::Pending),
            "active" => Some(CourseStatus::Active),
            "inactive" => Some(CourseStatus::Inactive),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "course_level", rename_all = "lowercase")]
pub enum CourseLevel {
    Beginner,
    Intermediate,
    Advanced,
}

impl CourseLevel {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "beginner" => Some(CourseLevel::Beginner),
            "intermediate" => Some(CourseLevel::Intermediate),
            "advanced" => Some(CourseLevel::Advanced),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "content_kind", rename_all = "lowercase")]
pub enum ContentKind {
    Video,
    Document,
    Quiz,
}

impl ContentKind {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "video" => Some(ContentKind::Video),
            "document" => Some(ContentKind::Document),
            "quiz" => Some(ContentKind::Quiz),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
    pub status: UserStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Course {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub price: f64,
    pub category: String,
    pub level: CourseLevel,
    pub duration: String,
    // Nulled out when the instructor account is deleted.
    pub instructor_id: Option<Uuid>,
    pub status: CourseStatus,
    pub rating: f64,
    pub rating_count: i32,
    pub prerequisites: Vec<String>,
    pub learning_objectives: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ContentItem {
    pub title: String,
    #[serde(rename = "type")]
    pub kind: ContentKind,
    pub url: String,
    pub duration: String,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Review {
    pub id: Uuid,
    pub course_id: Uuid,
    pub student_id: Uuid,
    pub rating: i32,
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Enrollment {
    pub course_id: Uuid,
    pub user_id: Uuid,
    pub progress: f64,
    pub enrolled_at: DateTime<Utc>,
    pub last_accessed: Option<DateTime<Utc>>,
}

/// Progress is clamped on every write; values outside [0,100] are never stored.
pub fn clamp_progress(raw: f64) -> f64 {
    raw.clamp(0.0, 100.0)
}

/// Proof of completion. Computed on demand, never persisted; the identifier
/// embeds the issuance time, so re-issuing yields a fresh identifier.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Certificate {
    pub student_name: String,
    pub course_name: String,
    pub instructor_name: Option<String>,
    pub completion_date: DateTime<Utc>,
    pub certificate_id: String,
}

impl Certificate {
    pub fn issue(
        data: CertificateData,
        student_id: Uuid,
        course_id: Uuid,
        issued_at: DateTime<Utc>,
    ) -> Self {
        Certificate {
            student_name: data.student_name,
            course_name: data.course_name,
            instructor_name: data.instructor_name,
            completion_date: issued_at,
            certificate_id: format!(
                "{}-{}-{}",
                course_id,
                student_id,
                issued_at.timestamp_millis()
            ),
        }
    }
}

/// Names resolved by the store once the completion precondition holds.
#[derive(Debug, Clone)]
pub struct CertificateData {
    pub student_name: String,
    pub course_name: String,
    pub instructor_name: Option<String>,
}

// --- store inputs ---

#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
    pub status: UserStatus,
}

#[derive(Debug, Clone)]
pub struct NewCourse {
    pub title: String,
    pub description: String,
    pub price: f64,
    pub category: String,
    pub level: CourseLevel,
    pub duration: String,
    pub instructor_id: Uuid,
    pub content: Vec<ContentItem>,
    pub prerequisites: Vec<String>,
    pub learning_objectives: Vec<String>,
}

/// Partial course update; `None` leaves the field untouched.
#[derive(Debug, Clone, Default)]
pub struct CourseChanges {
    pub title: Option<String>,
    pub description: Option<String>,
    pub price: Option<f64>,
    pub category: Option<String>,
    pub level: Option<CourseLevel>,
    pub duration: Option<String>,
    pub status: Option<CourseStatus>,
    pub content: Option<Vec<ContentItem>>,
    pub prerequisites: Option<Vec<String>>,
    pub learning_objectives: Option<Vec<String>>,
}

/// Partial user update; `None` leaves the field untouched.
#[derive(Debug, Clone, Default)]
pub struct UserChanges {
    pub name: Option<String>,
    pub email: Option<String>,
    pub role: Option<Role>,
    pub status: Option<UserStatus>,
}

// --- response shapes (camelCase on the wire) ---

#[derive(Debug, Clone, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        MessageResponse {
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct InstructorInfo {
    pub id: Uuid,
    pub name: String,
    pub email: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub status: UserStatus,
    pub enrolled_courses: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl UserResponse {
    pub fn from_user(user: User, enrolled_courses: Vec<Uuid>) -> Self {
        UserResponse {
            id: user.id,
            name: user.name,
            email: user.email,
            role: user.role,
            status: user.status,
            enrolled_courses,
            created_at: user.created_at,
        }
    }
}

/// Course as returned by list endpoints: everything except the content items
/// and review bodies (the rating aggregates stand in for the latter).
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseSummary {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub price: f64,
    pub category: String,
    pub level: CourseLevel,
    pub duration: String,
    pub instructor: Option<InstructorInfo>,
    pub status: CourseStatus,
    pub rating: f64,
    pub rating_count: i32,
    pub enrolled_students: Vec<Uuid>,
    pub prerequisites: Vec<String>,
    pub learning_objectives: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CourseSummary {
    pub fn build(
        course: Course,
        instructor: Option<InstructorInfo>,
        enrolled_students: Vec<Uuid>,
    ) -> Self {
        CourseSummary {
            id: course.id,
            title: course.title,
            description: course.description,
            price: course.price,
            category: course.category,
            level: course.level,
            duration: course.duration,
            instructor,
            status: course.status,
            rating: course.rating,
            rating_count: course.rating_count,
            enrolled_students,
            prerequisites: course.prerequisites,
            learning_objectives: course.learning_objectives,
            created_at: course.created_at,
            updated_at: course.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewAuthor {
    pub id: Uuid,
    pub name: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewResponse {
    pub student: ReviewAuthor,
    pub rating: i32,
    pub comment: Option<String>,
    pub date: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CourseDetail {
    #[serde(flatten)]
    pub summary: CourseSummary,
    pub content: Vec<ContentItem>,
    pub reviews: Vec<ReviewResponse>,
}

/// Enrolled-course view: summary plus the caller's own progress.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrolledCourse {
    #[serde(flatten)]
    pub course: CourseSummary,
    pub progress: f64,
    pub last_accessed: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentStats {
    pub total_courses: i64,
    pub completed_courses: i64,
    pub in_progress_courses: i64,
    pub certificates: i64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminStats {
    pub total_users: i64,
    pub total_instructors: i64,
    pub total_students: i64,
    pub total_courses: i64,
    pub total_revenue: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn progress_is_clamped_to_bounds() {
        assert_eq!(clamp_progress(-10.0), 0.0);
        assert_eq!(clamp_progress(150.0), 100.0);
        assert_eq!(clamp_progress(42.0), 42.0);
        assert_eq!(clamp_progress(0.0), 0.0);
        assert_eq!(clamp_progress(100.0), 100.0);
    }

    #[test]
    fn certificate_id_embeds_course_student_and_time() {
        let course_id = Uuid::new_v4();
        let student_id = Uuid::new_v4();
        let issued_at = Utc::now();
        let cert = Certificate::issue(
            CertificateData {
                student_name: "Ada".into(),
                course_name: "Rust".into(),
                instructor_name: Some("Grace".into()),
            },
            student_id,
            course_id,
            issued_at,
        );

        let expected = format!(
            "{}-{}-{}",
            course_id,
            student_id,
            issued_at.timestamp_millis()
        );
        assert_eq!(cert.certificate_id, expected);
        assert_eq!(cert.completion_date, issued_at);
        assert_eq!(cert.student_name, "Ada");
        assert_eq!(cert.course_name, "Rust");
    }

    #[test]
    fn enums_parse_from_wire_strings() {
        assert_eq!(Role::parse("admin"), Some(Role::Admin));
        assert_eq!(Role::parse("teacher"), None);
        assert_eq!(UserStatus::parse("blocked"), Some(UserStatus::Blocked));
        assert_eq!(CourseLevel::parse("intermediate"), Some(CourseLevel::Intermediate));
        assert_eq!(CourseStatus::parse("inactive"), Some(CourseStatus::Inactive));
        assert_eq!(ContentKind::parse("quiz"), Some(ContentKind::Quiz));
        assert_eq!(ContentKind::parse("podcast"), None);
    }

    #[test]
    fn content_item_serializes_type_key() {
        let item = ContentItem {
            title: "Intro".into(),
            kind: ContentKind::Video,
            url: "https://example.com/intro.mp4".into(),
            duration: "10m".into(),
        };
        let value = serde_json::to_value(&item).unwrap();
        assert_eq!(value["type"], "video");
        assert_eq!(value["title"], "Intro");
    }

    #[test]
    fn responses_use_camel_case_keys() {
        let user = User {
            id: Uuid::new_v4(),
            name: "Ada".into(),
            email: "ada@example.com".into(),
            password_hash: "$2b$12$hash".into(),
            role: Role::Student,
            status: UserStatus::Active,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let value = serde_json::to_value(UserResponse::from_user(user, vec![])).unwrap();
        assert!(value.get("enrolledCourses").is_some());
        assert!(value.get("createdAt").is_some());
        assert!(value.get("password_hash").is_none());
        assert!(value.get("passwordHash").is_none());
    }
}
