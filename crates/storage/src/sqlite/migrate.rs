use chrono::Utc;
use sqlx::SqlitePool;

use super::SqliteInitError;

const SCHEMA_V1: &[&str] = &[
    r"
        CREATE TABLE IF NOT EXISTS lectures (
            id TEXT PRIMARY KEY,
            class TEXT NOT NULL,
            name TEXT NOT NULL,
            sort_order INTEGER NOT NULL CHECK (sort_order >= 0)
        );
    ",
    r"
        CREATE TABLE IF NOT EXISTS words (
            id TEXT PRIMARY KEY,
            class TEXT NOT NULL,
            lecture_id TEXT NOT NULL,
            word TEXT NOT NULL,
            pos TEXT NOT NULL,
            meaning TEXT NOT NULL,
            etymology TEXT,
            derivation TEXT,
            example TEXT,
            pronunciation TEXT,
            image_prompt TEXT
        );
    ",
    r"
        CREATE TABLE IF NOT EXISTS user_word_logs (
            user_id TEXT NOT NULL,
            word_id TEXT NOT NULL,
            correct_count INTEGER NOT NULL CHECK (correct_count >= 0),
            wrong_count INTEGER NOT NULL CHECK (wrong_count >= 0),
            last_seen TEXT NOT NULL,
            last_correct TEXT NOT NULL,
            PRIMARY KEY (user_id, word_id)
        );
    ",
    r"
        CREATE TABLE IF NOT EXISTS courses (
            id TEXT PRIMARY KEY,
            title TEXT NOT NULL,
            created_at TEXT NOT NULL
        );
    ",
    r"
        CREATE TABLE IF NOT EXISTS questions (
            course_id TEXT NOT NULL,
            id TEXT NOT NULL,
            number INTEGER NOT NULL CHECK (number >= 0),
            question TEXT NOT NULL,
            answer TEXT NOT NULL,
            teacher_comment TEXT,
            PRIMARY KEY (course_id, id),
            FOREIGN KEY (course_id) REFERENCES courses(id) ON DELETE CASCADE
        );
    ",
    r"
        CREATE TABLE IF NOT EXISTS course_progress (
            student_id TEXT NOT NULL,
            course_id TEXT NOT NULL,
            total_time_ms INTEGER NOT NULL CHECK (total_time_ms >= 0),
            PRIMARY KEY (student_id, course_id),
            FOREIGN KEY (course_id) REFERENCES courses(id) ON DELETE CASCADE
        );
    ",
    r"
        CREATE TABLE IF NOT EXISTS question_progress (
            student_id TEXT NOT NULL,
            course_id TEXT NOT NULL,
            question_id TEXT NOT NULL,
            status TEXT NOT NULL,
            streak INTEGER NOT NULL CHECK (streak >= 0),
            last_reviewed_at TEXT,
            next_review_on TEXT,
            PRIMARY KEY (student_id, course_id, question_id),
            FOREIGN KEY (student_id, course_id)
                REFERENCES course_progress(student_id, course_id) ON DELETE CASCADE
        );
    ",
    r"
        CREATE INDEX IF NOT EXISTS idx_words_class ON words(class);
    ",
    r"
        CREATE INDEX IF NOT EXISTS idx_words_lecture ON words(lecture_id);
    ",
    r"
        CREATE INDEX IF NOT EXISTS idx_lectures_class_order ON lectures(class, sort_order, id);
    ",
];

/// Ordered schema versions; each runs once inside its own transaction.
const MIGRATIONS: &[(i64, &[&str])] = &[(1, SCHEMA_V1)];

async fn applied_versions(pool: &SqlitePool) -> Result<Vec<i64>, sqlx::Error> {
    sqlx::query(
        r"
            CREATE TABLE IF NOT EXISTS schema_migrations (
                version INTEGER PRIMARY KEY,
                applied_at TEXT NOT NULL
            );
        ",
    )
    .execute(pool)
    .await?;

    sqlx::query_scalar("SELECT version FROM schema_migrations ORDER BY version")
        .fetch_all(pool)
        .await
}

async fn apply(pool: &SqlitePool, version: i64, statements: &[&str]) -> Result<(), sqlx::Error> {
    let mut tx = pool.begin().await?;
    for statement in statements {
        sqlx::query(statement).execute(&mut *tx).await?;
    }
    sqlx::query("INSERT INTO schema_migrations (version, applied_at) VALUES (?1, ?2)")
        .bind(version)
        .bind(Utc::now())
        .execute(&mut *tx)
        .await?;
    tx.commit().await
}

/// Apply every migration newer than what the database has recorded.
pub async fn run_migrations(pool: &SqlitePool) -> Result<(), SqliteInitError> {
    let applied = applied_versions(pool).await?;

    for &(version, statements) in MIGRATIONS {
        if applied.contains(&version) {
            continue;
        }
        apply(pool, version, statements)
            .await
            .map_err(|source| SqliteInitError::Migration { version, source })?;
        tracing::info!(version, "applied schema migration");
    }
    Ok(())
}
