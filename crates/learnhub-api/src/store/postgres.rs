//! Postgres backend. Schema lives in `migrations/`; cascades handle the
//! cleanup that `MemStore` does by hand, and the admin guards take row
//! locks so check and write happen in one transaction.

use std::collections::HashMap;

use axum::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Pool, Postgres};
use uuid::Uuid;

use crate::error::ApiError;
use crate::models::{
    clamp_progress, AdminStats, ContentItem, Course, CourseChanges, CourseDetail,
    CourseSummary, CertificateData, EnrolledCourse, InstructorInfo, NewCourse, NewUser,
    ReviewAuthor, ReviewResponse, StudentStats, User, UserChanges, UserResponse, UserStatus,
};
use crate::{policy, rating};

use super::Store;

#[derive(Clone)]
pub struct PgStore {
    pool: Pool<Postgres>,
}

impl PgStore {
    /// Connects and applies pending migrations. Failures here are fatal to
    /// startup.
    pub async fn connect(database_url: &str) -> anyhow::Result<Self> {
        let pool = Pool::<Postgres>::connect(database_url).await?;
        sqlx::migrate!("./migrations").run(&pool).await?;
        Ok(PgStore { pool })
    }

    pub fn pool(&self) -> &Pool<Postgres> {
        &self.pool
    }

    /// Batches the instructor and enrollment lookups for a page of courses.
    async fn summaries_for(&self, courses: Vec<Course>) -> Result<Vec<CourseSummary>, ApiError> {
        let course_ids: Vec<Uuid> = courses.iter().map(|c| c.id).collect();
        let instructor_ids: Vec<Uuid> =
            courses.iter().filter_map(|c| c.instructor_id).collect();

        let instructors: HashMap<Uuid, InstructorInfo> =
            sqlx::query_as::<_, InstructorInfo>(
                "SELECT id, name, email FROM users WHERE id = ANY($1)",
            )
            .bind(&instructor_ids)
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .map(|info| (info.id, info))
            .collect();

        let mut students: HashMap<Uuid, Vec<Uuid>> = HashMap::new();
        let links = sqlx::query_as::<_, (Uuid, Uuid)>(
            "SELECT course_id, user_id FROM enrollments
             WHERE course_id = ANY($1) ORDER BY enrolled_at",
        )
        .bind(&course_ids)
        .fetch_all(&self.pool)
        .await?;
        for (course_id, user_id) in links {
            students.entry(course_id).or_default().push(user_id);
        }

        Ok(courses
            .into_iter()
            .map(|course| {
                let instructor = course
                    .instructor_id
                    .and_then(|id| instructors.get(&id).cloned());
                let enrolled = students.remove(&course.id).unwrap_or_default();
                CourseSummary::build(course, instructor, enrolled)
            })
            .collect())
    }

    async fn detail_for(&self, course: Course) -> Result<CourseDetail, ApiError> {
        let course_id = course.id;
        let summary = self
            .summaries_for(vec![course])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| ApiError::not_found("Course not found"))?;

        let content = sqlx::query_as::<_, ContentItem>(
            "SELECT title, kind, url, duration FROM course_content
             WHERE course_id = $1 ORDER BY position",
        )
        .bind(course_id)
        .fetch_all(&self.pool)
        .await?;

        let reviews = sqlx::query_as::<_, ReviewRow>(
            "SELECT r.rating, r.comment, r.created_at, u.id AS student_id, u.name AS student_name
             FROM reviews r
             JOIN users u ON u.id = r.student_id
             WHERE r.course_id = $1
             ORDER BY r.created_at",
        )
        .bind(course_id)
        .fetch_all(&self.pool)
        .await?
        .into_iter()
        .map(ReviewRow::into_response)
        .collect();

        Ok(CourseDetail {
            summary,
            content,
            reviews,
        })
    }
}

#[derive(sqlx::FromRow)]
struct ReviewRow {
    rating: i32,
    comment: Option<String>,
    created_at: DateTime<Utc>,
    student_id: Uuid,
    student_name: String,
}

impl ReviewRow {
    fn into_response(self) -> ReviewResponse {
        ReviewResponse {
            student: ReviewAuthor {
                id: self.student_id,
                name: self.student_name,
            },
            rating: self.rating,
            comment: self.comment,
            date: self.created_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct CertificateRow {
    student_name: String,
    course_name: String,
    instructor_name: Option<String>,
}

#[async_trait]
impl Store for PgStore {
    async fn create_user(&self, new: NewUser) -> Result<User, ApiError> {
        let user = sqlx::query_as::<_, User>(
            "INSERT INTO users (id, name, email, password_hash, role, status)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING *",
        )
        .bind(Uuid::new_v4())
        .bind(&new.name)
        .bind(&new.email)
        .bind(&new.password_hash)
        .bind(new.role)
        .bind(new.status)
        .fetch_one(&self.pool)
        .await?;
        Ok(user)
    }

    async fn find_user(&self, id: Uuid) -> Result<Option<User>, ApiError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, ApiError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = $1")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn enrolled_course_ids(&self, user_id: Uuid) -> Result<Vec<Uuid>, ApiError> {
        let ids = sqlx::query_scalar::<_, Uuid>(
            "SELECT course_id FROM enrollments WHERE user_id = $1 ORDER BY enrolled_at",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(ids)
    }

    async fn list_courses(&self) -> Result<Vec<CourseSummary>, ApiError> {
        let courses =
            sqlx::query_as::<_, Course>("SELECT * FROM courses ORDER BY created_at DESC")
                .fetch_all(&self.pool)
                .await?;
        self.summaries_for(courses).await
    }

    async fn find_course(&self, id: Uuid) -> Result<Option<Course>, ApiError> {
        let course = sqlx::query_as::<_, Course>("SELECT * FROM courses WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(course)
    }

    async fn course_detail(&self, id: Uuid) -> Result<Option<CourseDetail>, ApiError> {
        match self.find_course(id).await? {
            Some(course) => Ok(Some(self.detail_for(course).await?)),
            None => Ok(None),
        }
    }

    async fn create_course(&self, new: NewCourse) -> Result<CourseDetail, ApiError> {
        let mut tx = self.pool.begin().await?;
        let course = sqlx::query_as::<_, Course>(
            "INSERT INTO courses
               (id, title, description, price, category, level, duration, instructor_id,
                prerequisites, learning_objectives)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
             RETURNING *",
        )
        .bind(Uuid::new_v4())
        .bind(&new.title)
        .bind(&new.description)
        .bind(new.price)
        .bind(&new.category)
        .bind(new.level)
        .bind(&new.duration)
        .bind(new.instructor_id)
        .bind(&new.prerequisites)
        .bind(&new.learning_objectives)
        .fetch_one(&mut *tx)
        .await?;

        for (position, item) in new.content.iter().enumerate() {
            sqlx::query(
                "INSERT INTO course_content (course_id, position, title, kind, url, duration)
                 VALUES ($1, $2, $3, $4, $5, $6)",
            )
            .bind(course.id)
            .bind(position as i32)
            .bind(&item.title)
            .bind(item.kind)
            .bind(&item.url)
            .bind(&item.duration)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;

        self.detail_for(course).await
    }

    async fn update_course(
        &self,
        id: Uuid,
        changes: CourseChanges,
    ) -> Result<Option<CourseDetail>, ApiError> {
        let mut tx = self.pool.begin().await?;
        let updated = sqlx::query_scalar::<_, Uuid>(
            "UPDATE courses SET
               title = COALESCE($2, title),
               description = COALESCE($3, description),
               price = COALESCE($4, price),
               category = COALESCE($5, category),
               level = COALESCE($6, level),
               duration = COALESCE($7, duration),
               status = COALESCE($8, status),
               prerequisites = COALESCE($9, prerequisites),
               learning_objectives = COALESCE($10, learning_objectives),
               updated_at = now()
             WHERE id = $1
             RETURNING id",
        )
        .bind(id)
        .bind(changes.title)
        .bind(changes.description)
        .bind(changes.price)
        .bind(changes.category)
        .bind(changes.level)
        .bind(changes.duration)
        .bind(changes.status)
        .bind(changes.prerequisites)
        .bind(changes.learning_objectives)
        .fetch_optional(&mut *tx)
        .await?;

        if updated.is_none() {
            return Ok(None);
        }

        if let Some(content) = changes.content {
            sqlx::query("DELETE FROM course_content WHERE course_id = $1")
                .bind(id)
                .execute(&mut *tx)
                .await?;
            for (position, item) in content.iter().enumerate() {
                sqlx::query(
                    "INSERT INTO course_content (course_id, position, title, kind, url, duration)
                     VALUES ($1, $2, $3, $4, $5, $6)",
                )
                .bind(id)
                .bind(position as i32)
                .bind(&item.title)
                .bind(item.kind)
                .bind(&item.url)
                .bind(&item.duration)
                .execute(&mut *tx)
                .await?;
            }
        }
        tx.commit().await?;

        self.course_detail(id).await
    }

    async fn delete_course(&self, id: Uuid) -> Result<bool, ApiError> {
        let result = sqlx::query("DELETE FROM courses WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn add_review(
        &self,
        course_id: Uuid,
        student_id: Uuid,
        rating_value: i32,
        comment: Option<String>,
    ) -> Result<CourseDetail, ApiError> {
        let mut tx = self.pool.begin().await?;
        // Lock the course row so concurrent reviews recompute sequentially.
        let exists =
            sqlx::query_scalar::<_, Uuid>("SELECT id FROM courses WHERE id = $1 FOR UPDATE")
                .bind(course_id)
                .fetch_optional(&mut *tx)
                .await?;
        if exists.is_none() {
            return Err(ApiError::not_found("Course not found"));
        }

        sqlx::query(
            "INSERT INTO reviews (id, course_id, student_id, rating, comment)
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(Uuid::new_v4())
        .bind(course_id)
        .bind(student_id)
        .bind(rating_value)
        .bind(&comment)
        .execute(&mut *tx)
        .await?;

        let ratings =
            sqlx::query_scalar::<_, i32>("SELECT rating FROM reviews WHERE course_id = $1")
                .bind(course_id)
                .fetch_all(&mut *tx)
                .await?;
        let (average, count) = rating::recompute(&ratings);

        sqlx::query(
            "UPDATE courses SET rating = $2, rating_count = $3, updated_at = now()
             WHERE id = $1",
        )
        .bind(course_id)
        .bind(average)
        .bind(count)
        .execute(&mut *tx)
        .await?;
        tx.commit().await?;

        self.course_detail(course_id)
            .await?
            .ok_or_else(|| ApiError::not_found("Course not found"))
    }

    async fn enroll(&self, course_id: Uuid, user_id: Uuid) -> Result<(), ApiError> {
        let mut tx = self.pool.begin().await?;
        let course = sqlx::query_scalar::<_, Uuid>("SELECT id FROM courses WHERE id = $1")
            .bind(course_id)
            .fetch_optional(&mut *tx)
            .await?;
        if course.is_none() {
            return Err(ApiError::not_found("Course not found"));
        }
        let user = sqlx::query_scalar::<_, Uuid>("SELECT id FROM users WHERE id = $1")
            .bind(user_id)
            .fetch_optional(&mut *tx)
            .await?;
        if user.is_none() {
            return Err(ApiError::not_found("User not found"));
        }

        let inserted = sqlx::query(
            "INSERT INTO enrollments (course_id, user_id) VALUES ($1, $2)
             ON CONFLICT DO NOTHING",
        )
        .bind(course_id)
        .bind(user_id)
        .execute(&mut *tx)
        .await?;
        if inserted.rows_affected() == 0 {
            return Err(ApiError::validation("Already enrolled in this course"));
        }
        tx.commit().await?;
        Ok(())
    }

    async fn unenroll(&self, course_id: Uuid, user_id: Uuid) -> Result<(), ApiError> {
        let mut tx = self.pool.begin().await?;
        let course = sqlx::query_scalar::<_, Uuid>("SELECT id FROM courses WHERE id = $1")
            .bind(course_id)
            .fetch_optional(&mut *tx)
            .await?;
        if course.is_none() {
            return Err(ApiError::not_found("Course not found"));
        }
        let user = sqlx::query_scalar::<_, Uuid>("SELECT id FROM users WHERE id = $1")
            .bind(user_id)
            .fetch_optional(&mut *tx)
            .await?;
        if user.is_none() {
            return Err(ApiError::not_found("User not found"));
        }

        // Removing a link that does not exist is a no-op.
        sqlx::query("DELETE FROM enrollments WHERE course_id = $1 AND user_id = $2")
            .bind(course_id)
            .bind(user_id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(())
    }

    async fn is_enrolled(&self, course_id: Uuid, user_id: Uuid) -> Result<bool, ApiError> {
        let enrolled = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM enrollments WHERE course_id = $1 AND user_id = $2)",
        )
        .bind(course_id)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(enrolled)
    }

    async fn enrolled_courses(&self, user_id: Uuid) -> Result<Vec<EnrolledCourse>, ApiError> {
        let rows = sqlx::query_as::<_, (Uuid, f64, Option<DateTime<Utc>>)>(
            "SELECT course_id, progress, last_accessed FROM enrollments WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        let by_course: HashMap<Uuid, (f64, Option<DateTime<Utc>>)> = rows
            .into_iter()
            .map(|(course_id, progress, last_accessed)| (course_id, (progress, last_accessed)))
            .collect();

        let course_ids: Vec<Uuid> = by_course.keys().copied().collect();
        let courses = sqlx::query_as::<_, Course>(
            "SELECT * FROM courses WHERE id = ANY($1) ORDER BY created_at DESC",
        )
        .bind(&course_ids)
        .fetch_all(&self.pool)
        .await?;

        let summaries = self.summaries_for(courses).await?;
        Ok(summaries
            .into_iter()
            .filter_map(|summary| {
                let (progress, last_accessed) = by_course.get(&summary.id).copied()?;
                Some(EnrolledCourse {
                    course: summary,
                    progress,
                    last_accessed,
                })
            })
            .collect())
    }

    async fn update_progress(
        &self,
        course_id: Uuid,
        user_id: Uuid,
        progress: f64,
    ) -> Result<EnrolledCourse, ApiError> {
        let updated = sqlx::query_as::<_, (f64, Option<DateTime<Utc>>)>(
            "UPDATE enrollments SET progress = $3, last_accessed = now()
             WHERE course_id = $1 AND user_id = $2
             RETURNING progress, last_accessed",
        )
        .bind(course_id)
        .bind(user_id)
        .bind(clamp_progress(progress))
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| ApiError::not_found("Course not found or not enrolled"))?;

        let course = self
            .find_course(course_id)
            .await?
            .ok_or_else(|| ApiError::not_found("Course not found or not enrolled"))?;
        let summary = self
            .summaries_for(vec![course])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| ApiError::not_found("Course not found or not enrolled"))?;
        Ok(EnrolledCourse {
            course: summary,
            progress: updated.0,
            last_accessed: updated.1,
        })
    }

    async fn certificate_data(
        &self,
        course_id: Uuid,
        user_id: Uuid,
    ) -> Result<CertificateData, ApiError> {
        let row = sqlx::query_as::<_, CertificateRow>(
            "SELECT u.name AS student_name, c.title AS course_name, i.name AS instructor_name
             FROM enrollments e
             JOIN courses c ON c.id = e.course_id
             JOIN users u ON u.id = e.user_id
             LEFT JOIN users i ON i.id = c.instructor_id
             WHERE e.course_id = $1 AND e.user_id = $2 AND e.progress = 100",
        )
        .bind(course_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| ApiError::not_found("Course not found or not completed"))?;
        Ok(CertificateData {
            student_name: row.student_name,
            course_name: row.course_name,
            instructor_name: row.instructor_name,
        })
    }

    async fn student_stats(&self, user_id: Uuid) -> Result<StudentStats, ApiError> {
        let (total, completed, in_progress) = sqlx::query_as::<_, (i64, i64, i64)>(
            "SELECT COUNT(*),
                    COUNT(*) FILTER (WHERE progress = 100),
                    COUNT(*) FILTER (WHERE progress > 0 AND progress < 100)
             FROM enrollments WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(StudentStats {
            total_courses: total,
            completed_courses: completed,
            in_progress_courses: in_progress,
            certificates: completed,
        })
    }

    async fn list_users(&self) -> Result<Vec<UserResponse>, ApiError> {
        let users = sqlx::query_as::<_, User>("SELECT * FROM users ORDER BY created_at")
            .fetch_all(&self.pool)
            .await?;

        let mut enrolled: HashMap<Uuid, Vec<Uuid>> = HashMap::new();
        let links = sqlx::query_as::<_, (Uuid, Uuid)>(
            "SELECT user_id, course_id FROM enrollments ORDER BY enrolled_at",
        )
        .fetch_all(&self.pool)
        .await?;
        for (user_id, course_id) in links {
            enrolled.entry(user_id).or_default().push(course_id);
        }

        Ok(users
            .into_iter()
            .map(|user| {
                let courses = enrolled.remove(&user.id).unwrap_or_default();
                UserResponse::from_user(user, courses)
            })
            .collect())
    }

    async fn update_user(
        &self,
        id: Uuid,
        changes: UserChanges,
    ) -> Result<UserResponse, ApiError> {
        let mut tx = self.pool.begin().await?;
        // Every admin mutation takes the same locks in the same order: the
        // whole admin set sorted by id, then the target row. Two concurrent
        // demotions cannot both see a count of two, and mutations aimed at
        // different admins cannot deadlock.
        let admin_rows = sqlx::query_as::<_, (Uuid, UserStatus)>(
            "SELECT id, status FROM users WHERE role = 'admin' ORDER BY id FOR UPDATE",
        )
        .fetch_all(&mut *tx)
        .await?;
        let active_admins = admin_rows
            .iter()
            .filter(|(_, status)| *status == UserStatus::Active)
            .count();

        let target =
            sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1 FOR UPDATE")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?
                .ok_or_else(|| ApiError::not_found("User not found"))?;

        if let Some(ref email) = changes.email {
            let taken = sqlx::query_scalar::<_, bool>(
                "SELECT EXISTS(SELECT 1 FROM users WHERE email = $1 AND id <> $2)",
            )
            .bind(email)
            .bind(id)
            .fetch_one(&mut *tx)
            .await?;
            if taken {
                return Err(ApiError::validation("Email already in use"));
            }
        }

        if policy::demotes_last_active_admin(&target, &changes, active_admins as i64) {
            return Err(ApiError::validation(
                "Cannot block the last active admin user",
            ));
        }

        let user = sqlx::query_as::<_, User>(
            "UPDATE users SET
               name = COALESCE($2, name),
               email = COALESCE($3, email),
               role = COALESCE($4, role),
               status = COALESCE($5, status),
               updated_at = now()
             WHERE id = $1
             RETURNING *",
        )
        .bind(id)
        .bind(changes.name)
        .bind(changes.email)
        .bind(changes.role)
        .bind(changes.status)
        .fetch_one(&mut *tx)
        .await?;

        let enrolled = sqlx::query_scalar::<_, Uuid>(
            "SELECT course_id FROM enrollments WHERE user_id = $1 ORDER BY enrolled_at",
        )
        .bind(id)
        .fetch_all(&mut *tx)
        .await?;
        tx.commit().await?;

        Ok(UserResponse::from_user(user, enrolled))
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
        let mut tx = self.pool.begin().await?;
        // Same locks in the same order as update_user: admin set by id, then
        // the target row.
        let admins =
            sqlx::query_scalar::<_, Uuid>(
                "SELECT id FROM users WHERE role = 'admin' ORDER BY id FOR UPDATE",
            )
            .fetch_all(&mut *tx)
            .await?;

        let target =
            sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1 FOR UPDATE")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?
                .ok_or_else(|| ApiError::not_found("User not found"))?;

        if policy::removes_last_admin(&target, admins.len() as i64) {
            return Err(ApiError::validation("Cannot delete the last admin user"));
        }

        // Enrollments and reviews cascade; authored courses keep running
        // with instructor_id nulled by the FK.
        sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(())
    }

    async fn admin_stats(&self) -> Result<AdminStats, ApiError> {
        let (total_users, total_instructors, total_students) =
            sqlx::query_as::<_, (i64, i64, i64)>(
                "SELECT COUNT(*),
                        COUNT(*) FILTER (WHERE role = 'instructor'),
                        COUNT(*) FILTER (WHERE role = 'student')
                 FROM users",
            )
            .fetch_one(&self.pool)
            .await?;
        let total_courses = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM courses")
            .fetch_one(&self.pool)
            .await?;
        let total_revenue = sqlx::query_scalar::<_, f64>(
            "SELECT COALESCE(SUM(c.price), 0)
             FROM enrollments e JOIN courses c ON c.id = e.course_id",
        )
        .fetch_one(&self.pool)
        .await?;
        Ok(AdminStats {
            total_users,
            total_instructors,
            total_students,
            total_courses,
            total_revenue,
        })
    }
}
