use std::sync::Arc;

use drill_core::import::{ImportReport, parse_questions};
use drill_core::model::{Course, CourseId, Question, QuestionId};
use storage::repository::CourseRepository;
use uuid::Uuid;

use crate::Clock;
use crate::error::CourseServiceError;

/// Creates, edits and imports grammar courses.
#[derive(Clone)]
pub struct CourseService {
    clock: Clock,
    courses: Arc<dyn CourseRepository>,
}

impl CourseService {
    #[must_use]
    pub fn new(clock: Clock, courses: Arc<dyn CourseRepository>) -> Self {
        Self { clock, courses }
    }

    async fn load(&self, id: &CourseId) -> Result<Course, CourseServiceError> {
        self.courses
            .get_course(id)
            .await?
            .ok_or_else(|| CourseServiceError::NotFound(id.clone()))
    }

    /// Create an empty course with a fresh id.
    ///
    /// # Errors
    ///
    /// Returns `CourseServiceError::Course` for a blank title, or `Storage`.
    pub async fn create_course(&self, title: &str) -> Result<Course, CourseServiceError> {
        let id = CourseId::new(Uuid::new_v4().to_string());
        let course = Course::new(id, title, self.clock.now())?;
        self.courses.save_course(&course).await?;
        tracing::info!(course = %course.id(), title = course.title(), "course created");
        Ok(course)
    }

    /// All courses ordered by creation time.
    ///
    /// # Errors
    ///
    /// Returns `CourseServiceError::Storage` if repository access fails.
    pub async fn list_courses(&self) -> Result<Vec<Course>, CourseServiceError> {
        Ok(self.courses.list_courses().await?)
    }

    /// # Errors
    ///
    /// Returns `NotFound` for an unknown id, or `Storage`.
    pub async fn get_course(&self, id: &CourseId) -> Result<Course, CourseServiceError> {
        self.load(id).await
    }

    /// # Errors
    ///
    /// Returns `NotFound`, `Course` for a blank title, or `Storage`.
    pub async fn rename_course(&self, id: &CourseId, title: &str) -> Result<Course, CourseServiceError> {
        let mut course = self.load(id).await?;
        course.rename(title)?;
        self.courses.save_course(&course).await?;
        Ok(course)
    }

    /// Delete a course together with every student's progress on it.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for an unknown id, or `Storage`.
    pub async fn delete_course(&self, id: &CourseId) -> Result<(), CourseServiceError> {
        match self.courses.delete_course(id).await {
            Ok(()) => {
                tracing::info!(course = %id, "course deleted");
                Ok(())
            }
            Err(storage::StorageError::NotFound) => Err(CourseServiceError::NotFound(id.clone())),
            Err(err) => Err(err.into()),
        }
    }

    /// Parse tab-separated questions and append them to the course.
    ///
    /// Rows with problems are reported in the returned warnings; nothing is
    /// saved when no row is usable.
    ///
    /// # Errors
    ///
    /// Returns `NotFound`, `Import` when nothing could be imported, or `Storage`.
    pub async fn import_questions(
        &self,
        id: &CourseId,
        text: &str,
    ) -> Result<ImportReport<Question>, CourseServiceError> {
        let mut course = self.load(id).await?;
        let report = parse_questions(text, &course);
        for warning in &report.warnings {
            tracing::warn!(course = %id, %warning, "question import row");
        }

        let report = report.require_items()?;
        course.add_questions(report.items.iter().cloned());
        self.courses.save_course(&course).await?;
        tracing::info!(
            course = %id,
            imported = report.items.len(),
            skipped = report.skipped(),
            "questions imported"
        );
        Ok(report)
    }

    /// # Errors
    ///
    /// Returns `NotFound` for an unknown course, `Course` for an unknown
    /// question, or `Storage`.
    pub async fn remove_question(
        &self,
        id: &CourseId,
        question_id: &QuestionId,
    ) -> Result<Question, CourseServiceError> {
        let mut course = self.load(id).await?;
        let removed = course.remove_question(question_id)?;
        self.courses.save_course(&course).await?;
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use drill_core::import::ImportError;
    use drill_core::model::CourseError;
    use drill_core::time::fixed_clock;
    use storage::repository::InMemoryRepository;

    fn service() -> CourseService {
        CourseService::new(fixed_clock(), Arc::new(InMemoryRepository::new()))
    }

    #[tokio::test]
    async fn import_appends_and_saves() {
        let svc = service();
        let course = svc.create_course("Tenses").await.unwrap();

        let report = svc
            .import_questions(course.id(), "Unit 1\t2\tI run.\t私は走る。\n1\tHe runs.\t彼は走る。\nbroken")
            .await
            .unwrap();
        assert_eq!(report.items.len(), 2);
        assert_eq!(report.skipped(), 1);

        let stored = svc.get_course(course.id()).await.unwrap();
        let numbers: Vec<u32> = stored.questions().iter().map(|q| q.number).collect();
        assert_eq!(numbers, vec![1, 2]);
    }

    #[tokio::test]
    async fn import_with_no_usable_rows_saves_nothing() {
        let svc = service();
        let course = svc.create_course("Tenses").await.unwrap();

        let err = svc.import_questions(course.id(), "only-one-column").await.unwrap_err();
        assert!(matches!(
            err,
            CourseServiceError::Import(ImportError::NothingImported { .. })
        ));
        assert!(svc.get_course(course.id()).await.unwrap().questions().is_empty());
    }

    #[tokio::test]
    async fn rejected_import_reports_each_line() {
        let svc = service();
        let course = svc.create_course("Tenses").await.unwrap();

        let err = svc
            .import_questions(course.id(), "x\tQ\tA\n3\t\tA\n")
            .await
            .unwrap_err();
        let warnings = err.import_warnings().unwrap();
        let lines: Vec<usize> = warnings.iter().map(|w| w.line).collect();
        assert_eq!(lines, vec![1, 2]);
        assert_eq!(warnings[1].to_string(), "line 2: question or answer is empty");
    }

    #[tokio::test]
    async fn rename_and_delete() {
        let svc = service();
        let course = svc.create_course("Draft").await.unwrap();

        assert!(matches!(
            svc.rename_course(course.id(), "  ").await,
            Err(CourseServiceError::Course(CourseError::EmptyTitle))
        ));
        let renamed = svc.rename_course(course.id(), "Final").await.unwrap();
        assert_eq!(renamed.title(), "Final");

        svc.delete_course(course.id()).await.unwrap();
        assert!(matches!(
            svc.delete_course(course.id()).await,
            Err(CourseServiceError::NotFound(_))
        ));
    }
}
