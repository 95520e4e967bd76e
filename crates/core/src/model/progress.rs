use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::model::ids::{CourseId, QuestionId, UserId};
use crate::scheduler;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProgressError {
    #[error("unknown learning status: {0}")]
    UnknownStatus(String),
}

//
// ─── LEARNING STATUS ───────────────────────────────────────────────────────────
//

/// Three-state mastery model for grammar questions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LearningStatus {
    #[default]
    Unlearned,
    Known,
    Weak,
}

impl LearningStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            LearningStatus::Unlearned => "unlearned",
            LearningStatus::Known => "known",
            LearningStatus::Weak => "weak",
        }
    }
}

impl fmt::Display for LearningStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LearningStatus {
    type Err = ProgressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "unlearned" => Ok(LearningStatus::Unlearned),
            "known" => Ok(LearningStatus::Known),
            "weak" => Ok(LearningStatus::Weak),
            other => Err(ProgressError::UnknownStatus(other.to_owned())),
        }
    }
}

//
// ─── QUESTION PROGRESS ─────────────────────────────────────────────────────────
//

/// Mastery state of one question for one student.
///
/// `streak > 0` only ever occurs together with `LearningStatus::Known`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionProgress {
    pub question_id: QuestionId,
    pub status: LearningStatus,
    pub streak: u32,
    pub last_reviewed_at: Option<DateTime<Utc>>,
    /// The question should not be surfaced again before this day.
    pub next_review_on: Option<NaiveDate>,
}

impl QuestionProgress {
    /// Progress for a question that has never been answered.
    #[must_use]
    pub fn unlearned(question_id: QuestionId) -> Self {
        Self {
            question_id,
            status: LearningStatus::Unlearned,
            streak: 0,
            last_reviewed_at: None,
            next_review_on: None,
        }
    }

    /// True when the question has no scheduled date or the date has been reached.
    #[must_use]
    pub fn is_due(&self, today: NaiveDate) -> bool {
        self.next_review_on.is_none_or(|next| next <= today)
    }
}

//
// ─── STUDENT COURSE PROGRESS ───────────────────────────────────────────────────
//

/// Per (student, course) aggregate of question progress and study time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudentCourseProgress {
    pub student_id: UserId,
    pub course_id: CourseId,
    pub total_time_ms: u64,
    pub question_progress: BTreeMap<QuestionId, QuestionProgress>,
}

impl StudentCourseProgress {
    /// Empty progress, created lazily on a student's first session.
    #[must_use]
    pub fn new(student_id: UserId, course_id: CourseId) -> Self {
        Self {
            student_id,
            course_id,
            total_time_ms: 0,
            question_progress: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn get(&self, question_id: &QuestionId) -> Option<&QuestionProgress> {
        self.question_progress.get(question_id)
    }

    /// Status of a question, `Unlearned` when it has never been answered.
    #[must_use]
    pub fn status_of(&self, question_id: &QuestionId) -> LearningStatus {
        self.get(question_id)
            .map_or(LearningStatus::Unlearned, |p| p.status)
    }

    /// Apply a graded answer to a question and add the time spent on it.
    ///
    /// Negative durations are ignored.
    pub fn record_answer(
        &mut self,
        question_id: &QuestionId,
        correct: bool,
        now: DateTime<Utc>,
        time_spent: Duration,
    ) -> &QuestionProgress {
        let next = scheduler::advance(question_id, self.get(question_id), correct, now);
        let spent_ms = u64::try_from(time_spent.num_milliseconds()).unwrap_or(0);
        self.total_time_ms = self.total_time_ms.saturating_add(spent_ms);
        self.question_progress.insert(question_id.clone(), next);
        &self.question_progress[question_id]
    }
}
