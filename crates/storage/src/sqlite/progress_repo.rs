use std::collections::BTreeMap;

use drill_core::model::{CourseId, StudentCourseProgress, UserId};
use sqlx::Row;
use sqlx::sqlite::SqliteRow;

use super::SqliteRepository;
use super::mapping::{conn, map_question_progress_row, ser, u64_to_i64};
use crate::repository::{CourseProgressRepository, StorageError};

impl SqliteRepository {
    async fn progress_from_row(&self, row: &SqliteRow) -> Result<StudentCourseProgress, StorageError> {
        let student_id = UserId::new(row.try_get::<String, _>("student_id").map_err(ser)?);
        let course_id = CourseId::new(row.try_get::<String, _>("course_id").map_err(ser)?);
        let total_time_ms = u64::try_from(row.try_get::<i64, _>("total_time_ms").map_err(ser)?)
            .map_err(|_| StorageError::Serialization("total_time_ms sign overflow".into()))?;

        let rows = sqlx::query(
            r"
            SELECT question_id, status, streak, last_reviewed_at, next_review_on
            FROM question_progress
            WHERE student_id = ?1 AND course_id = ?2
            ",
        )
        .bind(student_id.as_str())
        .bind(course_id.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        let mut question_progress = BTreeMap::new();
        for row in &rows {
            let entry = map_question_progress_row(row)?;
            question_progress.insert(entry.question_id.clone(), entry);
        }

        Ok(StudentCourseProgress {
            student_id,
            course_id,
            total_time_ms,
            question_progress,
        })
    }
}

#[async_trait::async_trait]
impl CourseProgressRepository for SqliteRepository {
    async fn get_progress(
        &self,
        student_id: &UserId,
        course_id: &CourseId,
    ) -> Result<Option<StudentCourseProgress>, StorageError> {
        let row = sqlx::query(
            r"
            SELECT student_id, course_id, total_time_ms
            FROM course_progress
            WHERE student_id = ?1 AND course_id = ?2
            ",
        )
        .bind(student_id.as_str())
        .bind(course_id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(conn)?;

        match row {
            Some(row) => self.progress_from_row(&row).await.map(Some),
            None => Ok(None),
        }
    }

    async fn list_student_progress(
        &self,
        student_id: &UserId,
    ) -> Result<Vec<StudentCourseProgress>, StorageError> {
        let rows = sqlx::query(
            r"
            SELECT student_id, course_id, total_time_ms
            FROM course_progress
            WHERE student_id = ?1
            ORDER BY course_id ASC
            ",
        )
        .bind(student_id.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        let mut out = Vec::with_capacity(rows.len());
        for row in &rows {
            out.push(self.progress_from_row(row).await?);
        }
        Ok(out)
    }

    async fn save_progress(&self, progress: &StudentCourseProgress) -> Result<(), StorageError> {
        let mut tx = self.pool.begin().await.map_err(conn)?;

        sqlx::query(
            r"
            INSERT INTO course_progress (student_id, course_id, total_time_ms)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(student_id, course_id) DO UPDATE SET
                total_time_ms = excluded.total_time_ms
            ",
        )
        .bind(progress.student_id.as_str())
        .bind(progress.course_id.as_str())
        .bind(u64_to_i64("total_time_ms", progress.total_time_ms)?)
        .execute(&mut *tx)
        .await
        .map_err(|e| match e.as_database_error() {
            Some(db) if db.is_foreign_key_violation() => StorageError::NotFound,
            _ => StorageError::Connection(e.to_string()),
        })?;

        for entry in progress.question_progress.values() {
            sqlx::query(
                r"
                INSERT INTO question_progress (
                    student_id, course_id, question_id, status, streak,
                    last_reviewed_at, next_review_on
                )
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                ON CONFLICT(student_id, course_id, question_id) DO UPDATE SET
                    status = excluded.status,
                    streak = excluded.streak,
                    last_reviewed_at = excluded.last_reviewed_at,
                    next_review_on = excluded.next_review_on
                ",
            )
            .bind(progress.student_id.as_str())
            .bind(progress.course_id.as_str())
            .bind(entry.question_id.as_str())
            .bind(entry.status.as_str())
            .bind(i64::from(entry.streak))
            .bind(entry.last_reviewed_at)
            .bind(entry.next_review_on)
            .execute(&mut *tx)
            .await
            .map_err(conn)?;
        }

        tx.commit().await.map_err(conn)?;
        Ok(())
    }
}
