use std::sync::Arc;

use drill_core::model::{CourseId, StudentCourseProgress, UserId};
use storage::repository::{CourseProgressRepository, CourseRepository};

use super::session::{GradedQuestion, GrammarSession, StudyMode, StudyState};
use crate::Clock;
use crate::error::GrammarSessionError;

/// Loads courses, runs study sessions, and persists progress after every grade.
#[derive(Clone)]
pub struct GrammarSessionService {
    clock: Clock,
    courses: Arc<dyn CourseRepository>,
    progress: Arc<dyn CourseProgressRepository>,
}

impl GrammarSessionService {
    #[must_use]
    pub fn new(
        clock: Clock,
        courses: Arc<dyn CourseRepository>,
        progress: Arc<dyn CourseProgressRepository>,
    ) -> Self {
        Self {
            clock,
            courses,
            progress,
        }
    }

    /// Start a session for `student_id`. Progress is created on first study.
    ///
    /// # Errors
    ///
    /// Returns `CourseNotFound`, an empty-queue error for the chosen mode, or
    /// `Storage`.
    pub async fn start(
        &self,
        student_id: &UserId,
        course_id: &CourseId,
        mode: StudyMode,
    ) -> Result<GrammarSession, GrammarSessionError> {
        let course = self
            .courses
            .get_course(course_id)
            .await?
            .ok_or_else(|| GrammarSessionError::CourseNotFound(course_id.clone()))?;

        let progress = self
            .progress
            .get_progress(student_id, course_id)
            .await?
            .unwrap_or_else(|| StudentCourseProgress::new(student_id.clone(), course_id.clone()));

        let session = GrammarSession::start(&course, progress, mode, self.clock.now())?;
        tracing::debug!(
            student = %student_id,
            course = %course_id,
            ?mode,
            questions = session.questions().len(),
            "grammar session started"
        );
        Ok(session)
    }

    /// Show the current answer.
    ///
    /// # Errors
    ///
    /// Returns `InvalidState` or `Finished` when no question is showing.
    pub fn reveal(&self, session: &mut GrammarSession) -> Result<(), GrammarSessionError> {
        session.reveal()
    }

    /// Grade the current question and save the student's course progress.
    ///
    /// The session is left untouched when the save fails.
    ///
    /// # Errors
    ///
    /// Returns state errors for out-of-order calls, or `Storage`.
    pub async fn grade(
        &self,
        session: &mut GrammarSession,
        correct: bool,
    ) -> Result<GradedQuestion, GrammarSessionError> {
        let mut next = session.clone();
        let graded = next.grade(correct, self.clock.now())?;

        if let Err(err) = self.progress.save_progress(next.course_progress()).await {
            tracing::warn!(
                student = %session.student_id(),
                course = %session.course_id(),
                error = %err,
                "failed to save course progress"
            );
            return Err(err.into());
        }

        *session = next;
        if graded.state == StudyState::Finished {
            let summary = session.progress();
            tracing::info!(
                student = %session.student_id(),
                course = %session.course_id(),
                answered = summary.answered,
                correct = summary.correct,
                "grammar session completed"
            );
        }
        Ok(graded)
    }

    /// Leave the comment screen.
    ///
    /// # Errors
    ///
    /// Returns `InvalidState` unless a comment is showing.
    pub fn dismiss_comment(&self, session: &mut GrammarSession) -> Result<StudyState, GrammarSessionError> {
        session.dismiss_comment(self.clock.now())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use drill_core::model::{Course, LearningStatus, Question, QuestionId};
    use drill_core::time::{fixed_clock, fixed_now};
    use storage::repository::InMemoryRepository;

    async fn setup() -> (GrammarSessionService, InMemoryRepository) {
        let repo = InMemoryRepository::new();
        let mut course = Course::new(CourseId::new("c1"), "Basics", fixed_now()).unwrap();
        course.add_questions(vec![
            Question {
                id: QuestionId::new("q1"),
                number: 1,
                question: "This is a pen.".into(),
                answer: "これはペンです。".into(),
                teacher_comment: Some("基本文型".into()),
            },
            Question {
                id: QuestionId::new("q2"),
                number: 2,
                question: "I run.".into(),
                answer: "私は走る。".into(),
                teacher_comment: None,
            },
        ]);
        repo.save_course(&course).await.unwrap();
        let svc = GrammarSessionService::new(fixed_clock(), Arc::new(repo.clone()), Arc::new(repo.clone()));
        (svc, repo)
    }

    #[tokio::test]
    async fn unknown_course_is_reported() {
        let (svc, _repo) = setup().await;
        let err = svc
            .start(&UserId::new("s1"), &CourseId::new("nope"), StudyMode::Normal)
            .await
            .unwrap_err();
        assert!(matches!(err, GrammarSessionError::CourseNotFound(_)));
    }

    #[tokio::test]
    async fn grading_persists_progress() {
        let (svc, repo) = setup().await;
        let student = UserId::new("s1");
        let course = CourseId::new("c1");

        let mut session = svc.start(&student, &course, StudyMode::Normal).await.unwrap();
        assert!(repo.get_progress(&student, &course).await.unwrap().is_none());

        svc.reveal(&mut session).unwrap();
        let graded = svc.grade(&mut session, false).await.unwrap();
        assert_eq!(graded.state, StudyState::Comment);

        let stored = repo.get_progress(&student, &course).await.unwrap().unwrap();
        assert_eq!(stored.status_of(&QuestionId::new("q1")), LearningStatus::Weak);

        svc.dismiss_comment(&mut session).unwrap();
        svc.reveal(&mut session).unwrap();
        svc.grade(&mut session, true).await.unwrap();
        assert!(session.is_complete());

        let weak = svc.start(&student, &course, StudyMode::WeakOnly).await.unwrap();
        assert_eq!(weak.questions().len(), 1);
    }
}
