use drill_core::model::{Course, CourseId};
use sqlx::Row;
use sqlx::sqlite::SqliteRow;

use super::SqliteRepository;
use super::mapping::{conn, map_question_row, ser};
use crate::repository::{CourseRepository, StorageError};

impl SqliteRepository {
    async fn course_from_row(&self, row: &SqliteRow) -> Result<Course, StorageError> {
        let id = CourseId::new(row.try_get::<String, _>("id").map_err(ser)?);

        let question_rows = sqlx::query(
            r"
            SELECT id, number, question, answer, teacher_comment
            FROM questions
            WHERE course_id = ?1
            ORDER BY number ASC, rowid ASC
            ",
        )
        .bind(id.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        let questions = question_rows
            .iter()
            .map(map_question_row)
            .collect::<Result<Vec<_>, _>>()?;

        Course::from_persisted(
            id,
            row.try_get::<String, _>("title").map_err(ser)?,
            questions,
            row.try_get("created_at").map_err(ser)?,
        )
        .map_err(ser)
    }
}

#[async_trait::async_trait]
impl CourseRepository for SqliteRepository {
    async fn list_courses(&self) -> Result<Vec<Course>, StorageError> {
        let rows = sqlx::query(
            r"
            SELECT id, title, created_at
            FROM courses
            ORDER BY created_at ASC, id ASC
            ",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        let mut courses = Vec::with_capacity(rows.len());
        for row in &rows {
            courses.push(self.course_from_row(row).await?);
        }
        Ok(courses)
    }

    async fn get_course(&self, id: &CourseId) -> Result<Option<Course>, StorageError> {
        let row = sqlx::query("SELECT id, title, created_at FROM courses WHERE id = ?1")
            .bind(id.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(conn)?;

        match row {
            Some(row) => self.course_from_row(&row).await.map(Some),
            None => Ok(None),
        }
    }

    async fn save_course(&self, course: &Course) -> Result<(), StorageError> {
        let mut tx = self.pool.begin().await.map_err(conn)?;

        sqlx::query(
            r"
            INSERT INTO courses (id, title, created_at)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(id) DO UPDATE SET
                title = excluded.title
            ",
        )
        .bind(course.id().as_str())
        .bind(course.title())
        .bind(course.created_at())
        .execute(&mut *tx)
        .await
        .map_err(conn)?;

        // The question list is replaced wholesale.
        sqlx::query("DELETE FROM questions WHERE course_id = ?1")
            .bind(course.id().as_str())
            .execute(&mut *tx)
            .await
            .map_err(conn)?;

        for question in course.questions() {
            sqlx::query(
                r"
                INSERT INTO questions (course_id, id, number, question, answer, teacher_comment)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                ",
            )
            .bind(course.id().as_str())
            .bind(question.id.as_str())
            .bind(i64::from(question.number))
            .bind(&question.question)
            .bind(&question.answer)
            .bind(question.teacher_comment.as_deref())
            .execute(&mut *tx)
            .await
            .map_err(conn)?;
        }

        tx.commit().await.map_err(conn)?;
        Ok(())
    }

    async fn delete_course(&self, id: &CourseId) -> Result<(), StorageError> {
        let res = sqlx::query("DELETE FROM courses WHERE id = ?1")
            .bind(id.as_str())
            .execute(&self.pool)
            .await
            .map_err(conn)?;

        if res.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }
        Ok(())
    }
}
