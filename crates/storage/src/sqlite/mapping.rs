use drill_core::model::{
    LearningStatus, Lecture, LectureId, PartOfSpeech, Question, QuestionId, QuestionProgress,
    UserId, UserWordLog, Word, WordId,
};
use sqlx::Row;
use sqlx::sqlite::SqliteRow;

use crate::repository::StorageError;

pub(crate) fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

pub(crate) fn conn<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Connection(e.to_string())
}

pub(crate) fn u32_from_i64(field: &'static str, v: i64) -> Result<u32, StorageError> {
    u32::try_from(v).map_err(|_| StorageError::Serialization(format!("invalid {field}: {v}")))
}

pub(crate) fn u64_to_i64(field: &'static str, v: u64) -> Result<i64, StorageError> {
    i64::try_from(v).map_err(|_| StorageError::Serialization(format!("{field} overflow")))
}

/// Maps a unique-key violation to `Conflict`, anything else to `Connection`.
pub(crate) fn write_err(e: sqlx::Error) -> StorageError {
    match e.as_database_error() {
        Some(db) if db.is_unique_violation() => StorageError::Conflict,
        _ => StorageError::Connection(e.to_string()),
    }
}

pub(crate) fn map_lecture_row(row: &SqliteRow) -> Result<Lecture, StorageError> {
    Ok(Lecture {
        id: LectureId::new(row.try_get::<String, _>("id").map_err(ser)?),
        class: row.try_get("class").map_err(ser)?,
        name: row.try_get("name").map_err(ser)?,
        order: u32_from_i64("sort_order", row.try_get("sort_order").map_err(ser)?)?,
    })
}

pub(crate) fn map_word_row(row: &SqliteRow) -> Result<Word, StorageError> {
    let pos: PartOfSpeech = row
        .try_get::<String, _>("pos")
        .map_err(ser)?
        .parse()
        .map_err(ser)?;

    Ok(Word {
        id: WordId::new(row.try_get::<String, _>("id").map_err(ser)?),
        class: row.try_get("class").map_err(ser)?,
        lecture_id: LectureId::new(row.try_get::<String, _>("lecture_id").map_err(ser)?),
        word: row.try_get("word").map_err(ser)?,
        pos,
        meaning: row.try_get("meaning").map_err(ser)?,
        etymology: row.try_get("etymology").map_err(ser)?,
        derivation: row.try_get("derivation").map_err(ser)?,
        example: row.try_get("example").map_err(ser)?,
        pronunciation: row.try_get("pronunciation").map_err(ser)?,
        image_prompt: row.try_get("image_prompt").map_err(ser)?,
    })
}

pub(crate) fn map_log_row(row: &SqliteRow) -> Result<UserWordLog, StorageError> {
    Ok(UserWordLog {
        user_id: UserId::new(row.try_get::<String, _>("user_id").map_err(ser)?),
        word_id: WordId::new(row.try_get::<String, _>("word_id").map_err(ser)?),
        correct_count: u32_from_i64("correct_count", row.try_get("correct_count").map_err(ser)?)?,
        wrong_count: u32_from_i64("wrong_count", row.try_get("wrong_count").map_err(ser)?)?,
        last_seen: row.try_get("last_seen").map_err(ser)?,
        last_correct: row.try_get("last_correct").map_err(ser)?,
    })
}

pub(crate) fn map_question_row(row: &SqliteRow) -> Result<Question, StorageError> {
    Ok(Question {
        id: QuestionId::new(row.try_get::<String, _>("id").map_err(ser)?),
        number: u32_from_i64("number", row.try_get("number").map_err(ser)?)?,
        question: row.try_get("question").map_err(ser)?,
        answer: row.try_get("answer").map_err(ser)?,
        teacher_comment: row.try_get("teacher_comment").map_err(ser)?,
    })
}

pub(crate) fn map_question_progress_row(row: &SqliteRow) -> Result<QuestionProgress, StorageError> {
    let status: LearningStatus = row
        .try_get::<String, _>("status")
        .map_err(ser)?
        .parse()
        .map_err(ser)?;
    let streak = u32_from_i64("streak", row.try_get("streak").map_err(ser)?)?;
    if streak > 0 && status != LearningStatus::Known {
        return Err(StorageError::Serialization(format!(
            "streak {streak} stored with status {status}"
        )));
    }

    Ok(QuestionProgress {
        question_id: QuestionId::new(row.try_get::<String, _>("question_id").map_err(ser)?),
        status,
        streak,
        last_reviewed_at: row.try_get("last_reviewed_at").map_err(ser)?,
        next_review_on: row.try_get("next_review_on").map_err(ser)?,
    })
}
