use drill_core::model::{Lecture, LectureId, Word, WordId};

use super::SqliteRepository;
use super::mapping::{conn, map_lecture_row, map_word_row, write_err};
use crate::repository::{StorageError, VocabRepository};

const WORD_COLUMNS: &str = "id, class, lecture_id, word, pos, meaning, etymology, derivation, example, pronunciation, image_prompt";

#[async_trait::async_trait]
impl VocabRepository for SqliteRepository {
    async fn list_lectures(&self, class: &str) -> Result<Vec<Lecture>, StorageError> {
        let rows = sqlx::query(
            r"
            SELECT id, class, name, sort_order
            FROM lectures
            WHERE class = ?1
            ORDER BY sort_order ASC, id ASC
            ",
        )
        .bind(class)
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        rows.iter().map(map_lecture_row).collect()
    }

    async fn add_lecture(&self, lecture: &Lecture) -> Result<(), StorageError> {
        sqlx::query(
            r"
            INSERT INTO lectures (id, class, name, sort_order)
            VALUES (?1, ?2, ?3, ?4)
            ",
        )
        .bind(lecture.id.as_str())
        .bind(&lecture.class)
        .bind(&lecture.name)
        .bind(i64::from(lecture.order))
        .execute(&self.pool)
        .await
        .map_err(write_err)?;
        Ok(())
    }

    async fn update_lecture(&self, lecture: &Lecture) -> Result<(), StorageError> {
        let res = sqlx::query(
            r"
            UPDATE lectures
            SET class = ?2, name = ?3, sort_order = ?4
            WHERE id = ?1
            ",
        )
        .bind(lecture.id.as_str())
        .bind(&lecture.class)
        .bind(&lecture.name)
        .bind(i64::from(lecture.order))
        .execute(&self.pool)
        .await
        .map_err(conn)?;

        if res.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }
        Ok(())
    }

    async fn list_words_by_lecture(&self, lecture_id: &LectureId) -> Result<Vec<Word>, StorageError> {
        let sql = format!("SELECT {WORD_COLUMNS} FROM words WHERE lecture_id = ?1 ORDER BY rowid ASC");
        let rows = sqlx::query(&sql)
            .bind(lecture_id.as_str())
            .fetch_all(&self.pool)
            .await
            .map_err(conn)?;

        rows.iter().map(map_word_row).collect()
    }

    async fn list_words_by_class(&self, class: &str) -> Result<Vec<Word>, StorageError> {
        let sql = format!("SELECT {WORD_COLUMNS} FROM words WHERE class = ?1 ORDER BY rowid ASC");
        let rows = sqlx::query(&sql)
            .bind(class)
            .fetch_all(&self.pool)
            .await
            .map_err(conn)?;

        rows.iter().map(map_word_row).collect()
    }

    async fn add_words(&self, words: &[Word]) -> Result<(), StorageError> {
        let mut tx = self.pool.begin().await.map_err(conn)?;

        for word in words {
            sqlx::query(
                r"
                INSERT INTO words (
                    id, class, lecture_id, word, pos, meaning,
                    etymology, derivation, example, pronunciation, image_prompt
                )
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
                ",
            )
            .bind(word.id.as_str())
            .bind(&word.class)
            .bind(word.lecture_id.as_str())
            .bind(&word.word)
            .bind(word.pos.as_str())
            .bind(&word.meaning)
            .bind(word.etymology.as_deref())
            .bind(word.derivation.as_deref())
            .bind(word.example.as_deref())
            .bind(word.pronunciation.as_deref())
            .bind(word.image_prompt.as_deref())
            .execute(&mut *tx)
            .await
            .map_err(write_err)?;
        }

        tx.commit().await.map_err(conn)?;
        Ok(())
    }

    async fn delete_words(&self, ids: &[WordId]) -> Result<usize, StorageError> {
        let mut tx = self.pool.begin().await.map_err(conn)?;
        let mut removed: u64 = 0;

        for id in ids {
            let res = sqlx::query("DELETE FROM words WHERE id = ?1")
                .bind(id.as_str())
                .execute(&mut *tx)
                .await
                .map_err(conn)?;
            removed += res.rows_affected();
        }

        tx.commit().await.map_err(conn)?;
        usize::try_from(removed).map_err(|_| StorageError::Serialization("removed count overflow".into()))
    }
}
