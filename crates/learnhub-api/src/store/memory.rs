//! In-memory backend. A single `RwLock` guards all maps, so every guarded
//! check-then-act runs under one write lock, mirroring the row locks the
//! Postgres backend takes.

use std::collections::HashMap;

use axum::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::ApiError;
use crate::models::{
    clamp_progress, AdminStats, ContentItem, Course, CourseChanges, CourseDetail,
    CourseSummary, CertificateData, EnrolledCourse, Enrollment, InstructorInfo, NewCourse,
    NewUser, Review, ReviewAuthor, ReviewResponse, Role, StudentStats, User, UserChanges,
    UserResponse, UserStatus,
};
use crate::{policy, rating};

use super::Store;

#[derive(Default)]
struct Inner {
    users: HashMap<Uuid, User>,
    courses: HashMap<Uuid, Course>,
    content: HashMap<Uuid, Vec<ContentItem>>,
    // keyed by (course_id, user_id)
    enrollments: HashMap<(Uuid, Uuid), Enrollment>,
    reviews: Vec<Review>,
}

#[derive(Default)]
pub struct MemStore {
    inner: RwLock<Inner>,
}

impl MemStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Inner {
    fn instructor_info(&self, instructor_id: Option<Uuid>) -> Option<InstructorInfo> {
        instructor_id
            .and_then(|id| self.users.get(&id))
            .map(|user| InstructorInfo {
                id: user.id,
                name: user.name.clone(),
                email: user.email.clone(),
            })
    }

    fn students_of(&self, course_id: Uuid) -> Vec<Uuid> {
        let mut rows: Vec<&Enrollment> = self
            .enrollments
            .values()
            .filter(|e| e.course_id == course_id)
            .collect();
        rows.sort_by_key(|e| e.enrolled_at);
        rows.into_iter().map(|e| e.user_id).collect()
    }

    fn summary(&self, course: &Course) -> CourseSummary {
        CourseSummary::build(
            course.clone(),
            self.instructor_info(course.instructor_id),
            self.students_of(course.id),
        )
    }

    fn detail(&self, course: &Course) -> CourseDetail {
        let content = self.content.get(&course.id).cloned().unwrap_or_default();
        let mut rows: Vec<&Review> = self
            .reviews
            .iter()
            .filter(|r| r.course_id == course.id)
            .collect();
        rows.sort_by_key(|r| r.created_at);
        let reviews = rows
            .into_iter()
            .filter_map(|r| {
                let author = self.users.get(&r.student_id)?;
                Some(ReviewResponse {
                    student: ReviewAuthor {
                        id: author.id,
                        name: author.name.clone(),
                    },
                    rating: r.rating,
                    comment: r.comment.clone(),
                    date: r.created_at,
                })
            })
            .collect();
        CourseDetail {
            summary: self.summary(course),
            content,
            reviews,
        }
    }

    fn enrolled_view(&self, enrollment: &Enrollment) -> Option<EnrolledCourse> {
        let course = self.courses.get(&enrollment.course_id)?;
        Some(EnrolledCourse {
            course: self.summary(course),
            progress: enrollment.progress,
            last_accessed: enrollment.last_accessed,
        })
    }

    fn user_response(&self, user: &User) -> UserResponse {
        let mut rows: Vec<&Enrollment> = self
            .enrollments
            .values()
            .filter(|e| e.user_id == user.id)
            .collect();
        rows.sort_by_key(|e| e.enrolled_at);
        let enrolled = rows.into_iter().map(|e| e.course_id).collect();
        UserResponse::from_user(user.clone(), enrolled)
    }

    fn admin_count(&self) -> i64 {
        self.users
            .values()
            .filter(|u| u.role == Role::Admin)
            .count() as i64
    }

    fn active_admin_count(&self) -> i64 {
        self.users
            .values()
            .filter(|u| u.role == Role::Admin && u.status == UserStatus::Active)
            .count() as i64
    }
}

#[async_trait]
impl Store for MemStore {
    async fn create_user(&self, new: NewUser) -> Result<User, ApiError> {
        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            name: new.name,
            email: new.email,
            password_hash: new.password_hash,
            role: new.role,
            status: new.status,
            created_at: now,
            updated_at: now,
        };
        self.inner.write().await.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_user(&self, id: Uuid) -> Result<Option<User>, ApiError> {
        Ok(self.inner.read().await.users.get(&id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, ApiError> {
        Ok(self
            .inner
            .read()
            .await
            .users
            .values()
            .find(|u| u.email == email)
            .cloned())
    }

    async fn enrolled_course_ids(&self, user_id: Uuid) -> Result<Vec<Uuid>, ApiError> {
        let inner = self.inner.read().await;
        let mut rows: Vec<&Enrollment> = inner
            .enrollments
            .values()
            .filter(|e| e.user_id == user_id)
            .collect();
        rows.sort_by_key(|e| e.enrolled_at);
        Ok(rows.into_iter().map(|e| e.course_id).collect())
    }

    async fn list_courses(&self) -> Result<Vec<CourseSummary>, ApiError> {
        let inner = self.inner.read().await;
        let mut courses: Vec<&Course> = inner.courses.values().collect();
        courses.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(courses.into_iter().map(|c| inner.summary(c)).collect())
    }

    async fn find_course(&self, id: Uuid) -> Result<Option<Course>, ApiError> {
        Ok(self.inner.read().await.courses.get(&id).cloned())
    }

    async fn course_detail(&self, id: Uuid) -> Result<Option<CourseDetail>, ApiError> {
        let inner = self.inner.read().await;
        Ok(inner.courses.get(&id).map(|c| inner.detail(c)))
    }

    async fn create_course(&self, new: NewCourse) -> Result<CourseDetail, ApiError> {
        let now = Utc::now();
        let course = Course {
            id: Uuid::new_v4(),
            title: new.title,
            description: new.description,
            price: new.price,
            category: new.category,
            level: new.level,
            duration: new.duration,
            instructor_id: Some(new.instructor_id),
            status: crate::models::CourseStatus::Draft,
            rating: 0.0,
            rating_count: 0,
            prerequisites: new.prerequisites,
            learning_objectives: new.learning_objectives,
            created_at: now,
            updated_at: now,
        };
        let mut inner = self.inner.write().await;
        inner.content.insert(course.id, new.content);
        inner.courses.insert(course.id, course.clone());
        Ok(inner.detail(&course))
    }

    async fn update_course(
        &self,
        id: Uuid,
        changes: CourseChanges,
    ) -> Result<Option<CourseDetail>, ApiError> {
        let mut inner = self.inner.write().await;
        let Some(course) = inner.courses.get_mut(&id) else {
            return Ok(None);
        };
        if let Some(title) = changes.title {
            course.title = title;
        }
        if let Some(description) = changes.description {
            course.description = description;
        }
        if let Some(price) = changes.price {
            course.price = price;
        }
        if let Some(category) = changes.category {
            course.category = category;
        }
        if let Some(level) = changes.level {
            course.level = level;
        }
        if let Some(duration) = changes.duration {
            course.duration = duration;
        }
        if let Some(status) = changes.status {
            course.status = status;
        }
        if let Some(prerequisites) = changes.prerequisites {
            course.prerequisites = prerequisites;
        }
        if let Some(objectives) = changes.learning_objectives {
            course.learning_objectives = objectives;
        }
        course.updated_at = Utc::now();
        let course = course.clone();
        if let Some(content) = changes.content {
            inner.content.insert(id, content);
        }
        Ok(Some(inner.detail(&course)))
    }

    async fn delete_course(&self, id: Uuid) -> Result<bool, ApiError> {
        let mut inner = self.inner.write().await;
        if inner.courses.remove(&id).is_none() {
            return Ok(false);
        }
        inner.content.remove(&id);
        inner.enrollments.retain(|(course_id, _), _| *course_id != id);
        inner.reviews.retain(|r| r.course_id != id);
        Ok(true)
    }

    async fn add_review(
        &self,
        course_id: Uuid,
        student_id: Uuid,
        rating_value: i32,
        comment: Option<String>,
    ) -> Result<CourseDetail, ApiError> {
        let mut inner = self.inner.write().await;
        if !inner.courses.contains_key(&course_id) {
            return Err(ApiError::not_found("Course not found"));
        }
        inner.reviews.push(Review {
            id: Uuid::new_v4(),
            course_id,
            student_id,
            rating: rating_value,
            comment,
            created_at: Utc::now(),
        });
        let ratings: Vec<i32> = inner
            .reviews
            .iter()
            .filter(|r| r.course_id == course_id)
            .map(|r| r.rating)
            .collect();
        let (average, count) = rating::recompute(&ratings);
        let course = inner
            .courses
            .get_mut(&course_id)
            .ok_or_else(|| ApiError::not_found("Course not found"))?;
        course.rating = average;
        course.rating_count = count;
        course.updated_at = Utc::now();
        let course = course.clone();
        Ok(inner.detail(&course))
    }

    async fn enroll(&self, course_id: Uuid, user_id: Uuid) -> Result<(), ApiError> {
        let mut inner = self.inner.write().await;
        if !inner.courses.contains_key(&course_id) {
            return Err(ApiError::not_found("Course not found"));
        }
        if !inner.users.contains_key(&user_id) {
            return Err(ApiError::not_found("User not found"));
        }
        if inner.enrollments.contains_key(&(course_id, user_id)) {
            return Err(ApiError::validation("Already enrolled in this course"));
        }
        inner.enrollments.insert(
            (course_id, user_id),
            Enrollment {
                course_id,
                user_id,
                progress: 0.0,
                enrolled_at: Utc::now(),
                last_accessed: None,
            },
        );
        Ok(())
    }

    async fn unenroll(&self, course_id: Uuid, user_id: Uuid) -> Result<(), ApiError> {
        let mut inner = self.inner.write().await;
        if !inner.courses.contains_key(&course_id) {
            return Err(ApiError::not_found("Course not found"));
        }
        if !inner.users.contains_key(&user_id) {
            return Err(ApiError::not_found("User not found"));
        }
        inner.enrollments.remove(&(course_id, user_id));
        Ok(())
    }

    async fn is_enrolled(&self, course_id: Uuid, user_id: Uuid) -> Result<bool, ApiError> {
        Ok(self
            .inner
            .read()
            .await
            .enrollments
            .contains_key(&(course_id, user_id)))
    }

    async fn enrolled_courses(&self, user_id: Uuid) -> Result<Vec<EnrolledCourse>, ApiError> {
        let inner = self.inner.read().await;
        let mut views: Vec<EnrolledCourse> = inner
            .enrollments
            .values()
            .filter(|e| e.user_id == user_id)
            .filter_map(|e| inner.enrolled_view(e))
            .collect();
        views.sort_by(|a, b| b.course.created_at.cmp(&a.course.created_at));
        Ok(views)
    }

    async fn update_progress(
        &self,
        course_id: Uuid,
        user_id: Uuid,
        progress: f64,
    ) -> Result<EnrolledCourse, ApiError> {
        let mut inner = self.inner.write().await;
        let enrollment = inner
            .enrollments
            .get_mut(&(course_id, user_id))
            .ok_or_else(|| ApiError::not_found("Course not found or not enrolled"))?;
        enrollment.progress = clamp_progress(progress);
        enrollment.last_accessed = Some(Utc::now());
        let enrollment = enrollment.clone();
        inner
            .enrolled_view(&enrollment)
            .ok_or_else(|| ApiError::not_found("Course not found or not enrolled"))
    }

    async fn certificate_data(
        &self,
        course_id: Uuid,
        user_id: Uuid,
    ) -> Result<CertificateData, ApiError> {
        let inner = self.inner.read().await;
        let enrollment = inner
            .enrollments
            .get(&(course_id, user_id))
            .filter(|e| e.progress == 100.0)
            .ok_or_else(|| ApiError::not_found("Course not found or not completed"))?;
        let course = inner
            .courses
            .get(&enrollment.course_id)
            .ok_or_else(|| ApiError::not_found("Course not found or not completed"))?;
        let student = inner
            .users
            .get(&user_id)
            .ok_or_else(|| ApiError::not_found("Course not found or not completed"))?;
        Ok(CertificateData {
            student_name: student.name.clone(),
            course_name: course.title.clone(),
            instructor_name: course
                .instructor_id
                .and_then(|id| inner.users.get(&id))
                .map(|u| u.name.clone()),
        })
    }

    async fn student_stats(&self, user_id: Uuid) -> Result<StudentStats, ApiError> {
        let inner = self.inner.read().await;
        let progresses: Vec<f64> = inner
            .enrollments
            .values()
            .filter(|e| e.user_id == user_id)
            .map(|e| e.progress)
            .collect();
        let completed = progresses.iter().filter(|&&p| p == 100.0).count() as i64;
        let in_progress = progresses
            .iter()
            .filter(|&&p| p > 0.0 && p < 100.0)
            .count() as i64;
        Ok(StudentStats {
            total_courses: progresses.len() as i64,
            completed_courses: completed,
            in_progress_courses: in_progress,
            certificates: completed,
        })
    }

    async fn list_users(&self) -> Result<Vec<UserResponse>, ApiError> {
        let inner = self.inner.read().await;
        let mut users: Vec<&User> = inner.users.values().collect();
        users.sort_by_key(|u| u.created_at);
        Ok(users.into_iter().map(|u| inner.user_response(u)).collect())
    }

    async fn update_user(
        &self,
        id: Uuid,
        changes: UserChanges,
    ) -> Result<UserResponse, ApiError> {
        let mut inner = self.inner.write().await;
        let target = inner
            .users
            .get(&id)
            .cloned()
            .ok_or_else(|| ApiError::not_found("User not found"))?;
        if let Some(ref email) = changes.email {
            let taken = inner
                .users
                .values()
                .any(|u| u.id != id && &u.email == email);
            if taken {
                return Err(ApiError::validation("Email already in use"));
            }
        }
        if policy::demotes_last_active_admin(&target, &changes, inner.active_admin_count()) {
            return Err(ApiError::validation(
                "Cannot block the last active admin user",
            ));
        }
        let user = inner.users.get_mut(&id).ok_or_else(|| ApiError::not_found("User not found"))?;
        if let Some(name) = changes.name {
            user.name = name;
        }
        if let Some(email) = changes.email {
            user.email = email;
        }
        if let Some(role) = changes.role {
            user.role = role;
        }
        if let Some(status) = changes.status {
            user.status = status;
        }
        user.updated_at = Utc::now();
        let user = user.clone();
        Ok(inner.user_response(&user))
    }

    async fn set_user_status(
        &self,
        id: Uuid,
        status: UserStatus,
    ) -> Result<UserResponse, ApiError> {
        self.update_user(
            id,
            UserChanges {
                status: Some(status),
                ..Default::default()
            },
        )
        .await
    }

    async fn delete_user(&self, id: Uuid) -> Result<(), ApiError> {
        let mut inner = self.inner.write().await;
        let target = inner
            .users
            .get(&id)
            .cloned()
            .ok_or_else(|| ApiError::not_found("User not found"))?;
        if policy::removes_last_admin(&target, inner.admin_count()) {
            return Err(ApiError::validation("Cannot delete the last admin user"));
        }
        inner.users.remove(&id);
        inner.enrollments.retain(|(_, user_id), _| *user_id != id);
        // Reviews go with the account; the stored rating aggregate is left
        // as-is (only review insertion recomputes it).
        inner.reviews.retain(|r| r.student_id != id);
        for course in inner.courses.values_mut() {
            if course.instructor_id == Some(id) {
                course.instructor_id = None;
            }
        }
        Ok(())
    }

    async fn admin_stats(&self) -> Result<AdminStats, ApiError> {
        let inner = self.inner.read().await;
        let total_users = inner.users.len() as i64;
        let total_instructors = inner
            .users
            .values()
            .filter(|u| u.role == Role::Instructor)
            .count() as i64;
        let total_students = inner
            .users
            .values()
            .filter(|u| u.role == Role::Student)
            .count() as i64;
        let total_revenue = inner
            .enrollments
            .values()
            .filter_map(|e| inner.courses.get(&e.course_id))
            .map(|c| c.price)
            .sum();
        Ok(AdminStats {
            total_users,
            total_instructors,
            total_students,
            total_courses: inner.courses.len() as i64,
            total_revenue,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CourseStatus;

    fn new_user(name: &str, email: &str, role: Role) -> NewUser {
        NewUser {
            name: name.into(),
            email: email.into(),
            password_hash: "hash".into(),
            role,
            status: UserStatus::Active,
        }
    }

    fn new_course(title: &str, instructor_id: Uuid) -> NewCourse {
        NewCourse {
            title: title.into(),
            description: "A course".into(),
            price: 19.99,
            category: "programming".into(),
            level: crate::models::CourseLevel::Beginner,
            duration: "8 weeks".into(),
            instructor_id,
            content: vec![],
            prerequisites: vec![],
            learning_objectives: vec![],
        }
    }

    async fn seed(store: &MemStore) -> (User, CourseDetail) {
        let instructor = store
            .create_user(new_user("Grace", "grace@example.com", Role::Instructor))
            .await
            .unwrap();
        let student = store
            .create_user(new_user("Ada", "ada@example.com", Role::Student))
            .await
            .unwrap();
        let course = store
            .create_course(new_course("Rust Basics", instructor.id))
            .await
            .unwrap();
        (student, course)
    }

    #[tokio::test]
    async fn enroll_then_unenroll_restores_both_sides() {
        let store = MemStore::new();
        let (student, course) = seed(&store).await;
        let course_id = course.summary.id;

        store.enroll(course_id, student.id).await.unwrap();
        assert_eq!(
            store.enrolled_course_ids(student.id).await.unwrap(),
            vec![course_id]
        );
        let detail = store.course_detail(course_id).await.unwrap().unwrap();
        assert_eq!(detail.summary.enrolled_students, vec![student.id]);

        store.unenroll(course_id, student.id).await.unwrap();
        assert!(store.enrolled_course_ids(student.id).await.unwrap().is_empty());
        let detail = store.course_detail(course_id).await.unwrap().unwrap();
        assert!(detail.summary.enrolled_students.is_empty());
    }

    #[tokio::test]
    async fn second_enroll_is_rejected() {
        let store = MemStore::new();
        let (student, course) = seed(&store).await;
        let course_id = course.summary.id;

        store.enroll(course_id, student.id).await.unwrap();
        match store.enroll(course_id, student.id).await.unwrap_err() {
            ApiError::Validation(message) => {
                assert_eq!(message, "Already enrolled in this course")
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn enroll_requires_both_entities() {
        let store = MemStore::new();
        let (student, course) = seed(&store).await;

        match store.enroll(Uuid::new_v4(), student.id).await.unwrap_err() {
            ApiError::NotFound(message) => assert_eq!(message, "Course not found"),
            other => panic!("unexpected error: {other:?}"),
        }
        match store
            .enroll(course.summary.id, Uuid::new_v4())
            .await
            .unwrap_err()
        {
            ApiError::NotFound(message) => assert_eq!(message, "User not found"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn unenroll_without_link_is_a_no_op() {
        let store = MemStore::new();
        let (student, course) = seed(&store).await;
        store.unenroll(course.summary.id, student.id).await.unwrap();
        assert!(store.unenroll(Uuid::new_v4(), student.id).await.is_err());
    }

    #[tokio::test]
    async fn progress_updates_are_clamped_and_stamped() {
        let store = MemStore::new();
        let (student, course) = seed(&store).await;
        let course_id = course.summary.id;
        store.enroll(course_id, student.id).await.unwrap();

        let updated = store.update_progress(course_id, student.id, -10.0).await.unwrap();
        assert_eq!(updated.progress, 0.0);
        let updated = store.update_progress(course_id, student.id, 150.0).await.unwrap();
        assert_eq!(updated.progress, 100.0);
        let updated = store.update_progress(course_id, student.id, 42.0).await.unwrap();
        assert_eq!(updated.progress, 42.0);
        assert!(updated.last_accessed.is_some());
    }

    #[tokio::test]
    async fn progress_requires_enrollment() {
        let store = MemStore::new();
        let (student, course) = seed(&store).await;
        match store
            .update_progress(course.summary.id, student.id, 50.0)
            .await
            .unwrap_err()
        {
            ApiError::NotFound(message) => {
                assert_eq!(message, "Course not found or not enrolled")
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn certificate_requires_full_progress() {
        let store = MemStore::new();
        let (student, course) = seed(&store).await;
        let course_id = course.summary.id;
        store.enroll(course_id, student.id).await.unwrap();
        store.update_progress(course_id, student.id, 99.0).await.unwrap();

        match store.certificate_data(course_id, student.id).await.unwrap_err() {
            ApiError::NotFound(message) => {
                assert_eq!(message, "Course not found or not completed")
            }
            other => panic!("unexpected error: {other:?}"),
        }

        store.update_progress(course_id, student.id, 100.0).await.unwrap();
        let data = store.certificate_data(course_id, student.id).await.unwrap();
        assert_eq!(data.student_name, "Ada");
        assert_eq!(data.course_name, "Rust Basics");
        assert_eq!(data.instructor_name.as_deref(), Some("Grace"));
    }

    #[tokio::test]
    async fn last_admin_cannot_be_deleted() {
        let store = MemStore::new();
        let admin = store
            .create_user(new_user("Root", "root@example.com", Role::Admin))
            .await
            .unwrap();

        match store.delete_user(admin.id).await.unwrap_err() {
            ApiError::Validation(message) => {
                assert_eq!(message, "Cannot delete the last admin user")
            }
            other => panic!("unexpected error: {other:?}"),
        }

        let second = store
            .create_user(new_user("Backup", "backup@example.com", Role::Admin))
            .await
            .unwrap();
        store.delete_user(admin.id).await.unwrap();
        assert!(store.find_user(second.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn last_active_admin_cannot_be_blocked_or_demoted() {
        let store = MemStore::new();
        let admin = store
            .create_user(new_user("Root", "root@example.com", Role::Admin))
            .await
            .unwrap();

        match store
            .set_user_status(admin.id, UserStatus::Blocked)
            .await
            .unwrap_err()
        {
            ApiError::Validation(message) => {
                assert_eq!(message, "Cannot block the last active admin user")
            }
            other => panic!("unexpected error: {other:?}"),
        }

        let demote = UserChanges {
            role: Some(Role::Student),
            ..Default::default()
        };
        assert!(store.update_user(admin.id, demote).await.is_err());

        store
            .create_user(new_user("Backup", "backup@example.com", Role::Admin))
            .await
            .unwrap();
        let updated = store
            .set_user_status(admin.id, UserStatus::Blocked)
            .await
            .unwrap();
        assert_eq!(updated.status, UserStatus::Blocked);
    }

    #[tokio::test]
    async fn updating_to_a_taken_email_is_rejected() {
        let store = MemStore::new();
        let (student, _) = seed(&store).await;
        let changes = UserChanges {
            email: Some("grace@example.com".into()),
            ..Default::default()
        };
        match store.update_user(student.id, changes).await.unwrap_err() {
            ApiError::Validation(message) => assert_eq!(message, "Email already in use"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn reviews_recompute_the_rating_aggregate() {
        let store = MemStore::new();
        let (student, course) = seed(&store).await;
        let course_id = course.summary.id;
        let second = store
            .create_user(new_user("Brian", "brian@example.com", Role::Student))
            .await
            .unwrap();

        let detail = store
            .add_review(course_id, student.id, 5, Some("Great".into()))
            .await
            .unwrap();
        assert_eq!(detail.summary.rating, 5.0);
        assert_eq!(detail.summary.rating_count, 1);

        let detail = store.add_review(course_id, second.id, 2, None).await.unwrap();
        assert_eq!(detail.summary.rating, 3.5);
        assert_eq!(detail.summary.rating_count, 2);
        assert_eq!(detail.reviews.len(), 2);
        assert_eq!(detail.reviews[0].student.name, "Ada");
    }

    #[tokio::test]
    async fn deleting_a_user_cleans_up_except_the_rating_aggregate() {
        let store = MemStore::new();
        let (student, course) = seed(&store).await;
        let course_id = course.summary.id;
        store.enroll(course_id, student.id).await.unwrap();
        store.add_review(course_id, student.id, 4, None).await.unwrap();

        store.delete_user(student.id).await.unwrap();

        let detail = store.course_detail(course_id).await.unwrap().unwrap();
        assert!(detail.summary.enrolled_students.is_empty());
        assert!(detail.reviews.is_empty());
        // Aggregate only changes on insertion.
        assert_eq!(detail.summary.rating, 4.0);
        assert_eq!(detail.summary.rating_count, 1);
    }

    #[tokio::test]
    async fn deleting_an_instructor_keeps_their_courses() {
        let store = MemStore::new();
        let instructor = store
            .create_user(new_user("Grace", "grace@example.com", Role::Instructor))
            .await
            .unwrap();
        let course = store
            .create_course(new_course("Rust Basics", instructor.id))
            .await
            .unwrap();

        store.delete_user(instructor.id).await.unwrap();

        let detail = store
            .course_detail(course.summary.id)
            .await
            .unwrap()
            .unwrap();
        assert!(detail.summary.instructor.is_none());
    }

    #[tokio::test]
    async fn deleting_a_course_removes_its_enrollments() {
        let store = MemStore::new();
        let (student, course) = seed(&store).await;
        let course_id = course.summary.id;
        store.enroll(course_id, student.id).await.unwrap();

        assert!(store.delete_course(course_id).await.unwrap());
        assert!(!store.delete_course(course_id).await.unwrap());
        assert!(store.enrolled_course_ids(student.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn new_courses_start_as_drafts_with_no_rating() {
        let store = MemStore::new();
        let (_, course) = seed(&store).await;
        assert_eq!(course.summary.status, CourseStatus::Draft);
        assert_eq!(course.summary.rating, 0.0);
        assert_eq!(course.summary.rating_count, 0);
    }

    #[tokio::test]
    async fn student_stats_bucket_by_progress() {
        let store = MemStore::new();
        let instructor = store
            .create_user(new_user("Grace", "grace@example.com", Role::Instructor))
            .await
            .unwrap();
        let student = store
            .create_user(new_user("Ada", "ada@example.com", Role::Student))
            .await
            .unwrap();
        let mut course_ids = Vec::new();
        for title in ["One", "Two", "Three"] {
            let course = store
                .create_course(new_course(title, instructor.id))
                .await
                .unwrap();
            course_ids.push(course.summary.id);
            store.enroll(course.summary.id, student.id).await.unwrap();
        }
        store.update_progress(course_ids[0], student.id, 100.0).await.unwrap();
        store.update_progress(course_ids[1], student.id, 50.0).await.unwrap();

        let stats = store.student_stats(student.id).await.unwrap();
        assert_eq!(stats.total_courses, 3);
        assert_eq!(stats.completed_courses, 1);
        assert_eq!(stats.in_progress_courses, 1);
        assert_eq!(stats.certificates, 1);
    }

    #[tokio::test]
    async fn admin_stats_sum_revenue_over_enrollments() {
        let store = MemStore::new();
        let (student, course) = seed(&store).await;
        let second = store
            .create_user(new_user("Brian", "brian@example.com", Role::Student))
            .await
            .unwrap();
        store.enroll(course.summary.id, student.id).await.unwrap();
        store.enroll(course.summary.id, second.id).await.unwrap();

        let stats = store.admin_stats().await.unwrap();
        assert_eq!(stats.total_users, 3);
        assert_eq!(stats.total_instructors, 1);
        assert_eq!(stats.total_students, 2);
        assert_eq!(stats.total_courses, 1);
        assert!((stats.total_revenue - 39.98).abs() < 1e-9);
    }
}
