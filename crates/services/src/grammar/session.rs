use chrono::{DateTime, NaiveDate, Utc};

use drill_core::model::{
    Course, CourseId, LearningStatus, Question, QuestionProgress, StudentCourseProgress, UserId,
};

use crate::error::GrammarSessionError;

//
// ─── MODES & STATES ────────────────────────────────────────────────────────────
//

/// Which questions a study session walks through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StudyMode {
    /// Every question, ordered by number.
    #[default]
    Normal,
    /// Only questions currently marked weak.
    WeakOnly,
    /// Questions never answered or whose review date has arrived.
    Due,
}

/// Screen the learner is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StudyState {
    Question,
    Answer,
    /// Teacher comment shown after a miss.
    Comment,
    Finished,
}

impl StudyState {
    fn label(self) -> &'static str {
        match self {
            StudyState::Question => "showing a question",
            StudyState::Answer => "showing an answer",
            StudyState::Comment => "showing a comment",
            StudyState::Finished => "finished",
        }
    }
}

/// Outcome of grading the current question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GradedQuestion {
    pub progress: QuestionProgress,
    pub state: StudyState,
}

/// Snapshot of how far a study session has progressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StudyProgress {
    pub total: usize,
    pub answered: usize,
    pub correct: usize,
    pub is_complete: bool,
}

//
// ─── SESSION ───────────────────────────────────────────────────────────────────
//

/// One sitting over a grammar course.
///
/// Owns the student's course progress; every grade updates it in place and the
/// caller persists the whole record.
#[derive(Debug, Clone)]
pub struct GrammarSession {
    mode: StudyMode,
    questions: Vec<Question>,
    progress: StudentCourseProgress,
    current: usize,
    state: StudyState,
    shown_at: DateTime<Utc>,
    answered: usize,
    correct: usize,
}

impl GrammarSession {
    /// Build the question queue for `mode`.
    ///
    /// # Errors
    ///
    /// Returns `EmptyCourse`, `NoWeakQuestions` or `NothingDue` when the queue
    /// would be empty.
    pub fn start(
        course: &Course,
        progress: StudentCourseProgress,
        mode: StudyMode,
        now: DateTime<Utc>,
    ) -> Result<Self, GrammarSessionError> {
        if course.questions().is_empty() {
            return Err(GrammarSessionError::EmptyCourse);
        }

        let questions = select_questions(course, &progress, mode, now.date_naive());
        if questions.is_empty() {
            return Err(match mode {
                StudyMode::Normal => GrammarSessionError::EmptyCourse,
                StudyMode::WeakOnly => GrammarSessionError::NoWeakQuestions,
                StudyMode::Due => GrammarSessionError::NothingDue,
            });
        }

        Ok(Self {
            mode,
            questions,
            progress,
            current: 0,
            state: StudyState::Question,
            shown_at: now,
            answered: 0,
            correct: 0,
        })
    }

    #[must_use]
    pub fn mode(&self) -> StudyMode {
        self.mode
    }

    #[must_use]
    pub fn state(&self) -> StudyState {
        self.state
    }

    #[must_use]
    pub fn course_id(&self) -> &CourseId {
        &self.progress.course_id
    }

    #[must_use]
    pub fn student_id(&self) -> &UserId {
        &self.progress.student_id
    }

    #[must_use]
    pub fn course_progress(&self) -> &StudentCourseProgress {
        &self.progress
    }

    #[must_use]
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    #[must_use]
    pub fn current_question(&self) -> Option<&Question> {
        if self.state == StudyState::Finished {
            return None;
        }
        self.questions.get(self.current)
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.state == StudyState::Finished
    }

    #[must_use]
    pub fn progress(&self) -> StudyProgress {
        StudyProgress {
            total: self.questions.len(),
            answered: self.answered,
            correct: self.correct,
            is_complete: self.is_complete(),
        }
    }

    fn expect_state(&self, expected: StudyState, action: &'static str) -> Result<(), GrammarSessionError> {
        match self.state {
            s if s == expected => Ok(()),
            StudyState::Finished => Err(GrammarSessionError::Finished),
            other => Err(GrammarSessionError::InvalidState {
                action,
                state: other.label(),
            }),
        }
    }

    /// Show the answer of the current question.
    ///
    /// # Errors
    ///
    /// Returns `InvalidState` unless a question is showing.
    pub fn reveal(&mut self) -> Result<(), GrammarSessionError> {
        self.expect_state(StudyState::Question, "reveal the answer")?;
        self.state = StudyState::Answer;
        Ok(())
    }

    /// Apply the learner's self-grade to the current question.
    ///
    /// Time since the question was shown is added to the course total. A miss
    /// on a question with a teacher comment moves to `Comment`; otherwise the
    /// session advances.
    ///
    /// # Errors
    ///
    /// Returns `InvalidState` unless the answer is showing.
    pub fn grade(&mut self, correct: bool, now: DateTime<Utc>) -> Result<GradedQuestion, GrammarSessionError> {
        self.expect_state(StudyState::Answer, "grade")?;
        let question = &self.questions[self.current];
        let has_comment = question.comment().is_some();
        let question_id = question.id.clone();

        let updated = self
            .progress
            .record_answer(&question_id, correct, now, now - self.shown_at)
            .clone();

        self.answered += 1;
        if correct {
            self.correct += 1;
        }

        if !correct && has_comment {
            self.state = StudyState::Comment;
        } else {
            self.advance(now);
        }

        Ok(GradedQuestion {
            progress: updated,
            state: self.state,
        })
    }

    /// Leave the comment screen and move on.
    ///
    /// # Errors
    ///
    /// Returns `InvalidState` unless a comment is showing.
    pub fn dismiss_comment(&mut self, now: DateTime<Utc>) -> Result<StudyState, GrammarSessionError> {
        self.expect_state(StudyState::Comment, "dismiss the comment")?;
        self.advance(now);
        Ok(self.state)
    }

    fn advance(&mut self, now: DateTime<Utc>) {
        if self.current + 1 >= self.questions.len() {
            self.state = StudyState::Finished;
        } else {
            self.current += 1;
            self.state = StudyState::Question;
            self.shown_at = now;
        }
    }
}

fn select_questions(
    course: &Course,
    progress: &StudentCourseProgress,
    mode: StudyMode,
    today: NaiveDate,
) -> Vec<Question> {
    course
        .questions()
        .iter()
        .filter(|q| match mode {
            StudyMode::Normal => true,
            StudyMode::WeakOnly => progress.status_of(&q.id) == LearningStatus::Weak,
            StudyMode::Due => progress.get(&q.id).is_none_or(|p| p.is_due(today)),
        })
        .cloned()
        .collect()
}
