use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::ids::{CourseId, QuestionId};

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum CourseError {
    #[error("course title cannot be empty")]
    EmptyTitle,

    #[error("question not found: {0}")]
    QuestionNotFound(QuestionId),
}

//
// ─── QUESTION ──────────────────────────────────────────────────────────────────
//

/// A single grammar drill item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    pub id: QuestionId,
    pub number: u32,
    pub question: String,
    pub answer: String,
    pub teacher_comment: Option<String>,
}

impl Question {
    /// Teacher comment, treating an empty string the same as no comment.
    #[must_use]
    pub fn comment(&self) -> Option<&str> {
        self.teacher_comment
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
    }
}

//
// ─── COURSE ────────────────────────────────────────────────────────────────────
//

/// Ordered list of grammar questions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Course {
    id: CourseId,
    title: String,
    questions: Vec<Question>,
    created_at: DateTime<Utc>,
}

impl Course {
    /// Creates an empty course.
    ///
    /// # Errors
    ///
    /// Returns `CourseError::EmptyTitle` if the trimmed title is empty.
    pub fn new(
        id: CourseId,
        title: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Result<Self, CourseError> {
        Self::from_persisted(id, title, Vec::new(), created_at)
    }

    /// Rehydrate a course from storage. Questions are re-sorted by number.
    ///
    /// # Errors
    ///
    /// Returns `CourseError::EmptyTitle` if the trimmed title is empty.
    pub fn from_persisted(
        id: CourseId,
        title: impl Into<String>,
        mut questions: Vec<Question>,
        created_at: DateTime<Utc>,
    ) -> Result<Self, CourseError> {
        let title = normalize_title(title.into())?;
        questions.sort_by_key(|q| q.number);
        Ok(Self {
            id,
            title,
            questions,
            created_at,
        })
    }

    #[must_use]
    pub fn id(&self) -> &CourseId {
        &self.id
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Questions ordered by `number`.
    #[must_use]
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    #[must_use]
    pub fn question(&self, id: &QuestionId) -> Option<&Question> {
        self.questions.iter().find(|q| &q.id == id)
    }

    #[must_use]
    pub fn has_number(&self, number: u32) -> bool {
        self.questions.iter().any(|q| q.number == number)
    }

    /// Renames the course.
    ///
    /// # Errors
    ///
    /// Returns `CourseError::EmptyTitle` if the trimmed title is empty.
    pub fn rename(&mut self, title: impl Into<String>) -> Result<(), CourseError> {
        self.title = normalize_title(title.into())?;
        Ok(())
    }

    /// Appends questions and keeps the list ordered by number.
    ///
    /// Duplicate numbers are kept; the sort is stable so earlier questions stay first.
    pub fn add_questions(&mut self, questions: impl IntoIterator<Item = Question>) {
        self.questions.extend(questions);
        self.questions.sort_by_key(|q| q.number);
    }

    /// Removes a question by id.
    ///
    /// # Errors
    ///
    /// Returns `CourseError::QuestionNotFound` if no question has that id.
    pub fn remove_question(&mut self, id: &QuestionId) -> Result<Question, CourseError> {
        let index = self
            .questions
            .iter()
            .position(|q| &q.id == id)
            .ok_or_else(|| CourseError::QuestionNotFound(id.clone()))?;
        Ok(self.questions.remove(index))
    }
}

fn normalize_title(title: String) -> Result<String, CourseError> {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        return Err(CourseError::EmptyTitle);
    }
    Ok(trimmed.to_owned())
}
