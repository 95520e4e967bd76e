use std::collections::BTreeMap;

use drill_core::model::{UserId, UserWordLog, WordId};
use sqlx::SqliteConnection;

use super::SqliteRepository;
use super::mapping::{conn, map_log_row};
use crate::repository::{LogUpdate, StorageError, WordLogRepository};

async fn upsert_log(db: &mut SqliteConnection, log: &UserWordLog) -> Result<(), StorageError> {
    sqlx::query(
        r"
        INSERT INTO user_word_logs (user_id, word_id, correct_count, wrong_count, last_seen, last_correct)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6)
        ON CONFLICT(user_id, word_id) DO UPDATE SET
            correct_count = excluded.correct_count,
            wrong_count = excluded.wrong_count,
            last_seen = excluded.last_seen,
            last_correct = excluded.last_correct
        ",
    )
    .bind(log.user_id.as_str())
    .bind(log.word_id.as_str())
    .bind(i64::from(log.correct_count))
    .bind(i64::from(log.wrong_count))
    .bind(log.last_seen)
    .bind(log.last_correct)
    .execute(db)
    .await
    .map_err(conn)?;
    Ok(())
}

/// Body of `update_user_log`; runs inside an open write transaction.
async fn read_modify_write(
    db: &mut SqliteConnection,
    user_id: &UserId,
    word_id: &WordId,
    update: LogUpdate<'_>,
) -> Result<UserWordLog, StorageError> {
    let row = sqlx::query(
        r"
        SELECT user_id, word_id, correct_count, wrong_count, last_seen, last_correct
        FROM user_word_logs
        WHERE user_id = ?1 AND word_id = ?2
        ",
    )
    .bind(user_id.as_str())
    .bind(word_id.as_str())
    .fetch_optional(&mut *db)
    .await
    .map_err(conn)?;

    let prior = row.as_ref().map(map_log_row).transpose()?;
    let next = update(prior.as_ref());
    if &next.user_id != user_id || &next.word_id != word_id {
        return Err(StorageError::Conflict);
    }
    upsert_log(db, &next).await?;
    Ok(next)
}

#[async_trait::async_trait]
impl WordLogRepository for SqliteRepository {
    async fn list_user_logs(&self, user_id: &UserId) -> Result<Vec<UserWordLog>, StorageError> {
        let rows = sqlx::query(
            r"
            SELECT user_id, word_id, correct_count, wrong_count, last_seen, last_correct
            FROM user_word_logs
            WHERE user_id = ?1
            ORDER BY word_id ASC
            ",
        )
        .bind(user_id.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        rows.iter().map(map_log_row).collect()
    }

    async fn get_user_log(
        &self,
        user_id: &UserId,
        word_id: &WordId,
    ) -> Result<Option<UserWordLog>, StorageError> {
        let row = sqlx::query(
            r"
            SELECT user_id, word_id, correct_count, wrong_count, last_seen, last_correct
            FROM user_word_logs
            WHERE user_id = ?1 AND word_id = ?2
            ",
        )
        .bind(user_id.as_str())
        .bind(word_id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(conn)?;

        row.as_ref().map(map_log_row).transpose()
    }

    async fn save_user_log(&self, log: &UserWordLog) -> Result<(), StorageError> {
        let mut db = self.pool.acquire().await.map_err(conn)?;
        upsert_log(&mut *db, log).await
    }

    async fn update_user_log(
        &self,
        user_id: &UserId,
        word_id: &WordId,
        update: LogUpdate<'_>,
    ) -> Result<UserWordLog, StorageError> {
        // IMMEDIATE takes the write lock up front so the read below cannot go
        // stale before the write. Dropping `tx` on error rolls back.
        let mut tx = self
            .pool
            .begin_with("BEGIN IMMEDIATE")
            .await
            .map_err(conn)?;
        let log = read_modify_write(&mut *tx, user_id, word_id, update).await?;
        tx.commit().await.map_err(conn)?;
        Ok(log)
    }

    async fn all_student_logs(
        &self,
        class: &str,
    ) -> Result<BTreeMap<UserId, Vec<UserWordLog>>, StorageError> {
        let rows = sqlx::query(
            r"
            SELECT
                l.user_id AS user_id, l.word_id AS word_id,
                l.correct_count AS correct_count, l.wrong_count AS wrong_count,
                l.last_seen AS last_seen, l.last_correct AS last_correct
            FROM user_word_logs l
            JOIN words w ON w.id = l.word_id
            WHERE w.class = ?1
            ORDER BY l.user_id ASC, l.word_id ASC
            ",
        )
        .bind(class)
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        let mut grouped: BTreeMap<UserId, Vec<UserWordLog>> = BTreeMap::new();
        for row in &rows {
            let log = map_log_row(row)?;
            grouped.entry(log.user_id.clone()).or_default().push(log);
        }
        Ok(grouped)
    }
}
