use std::sync::Arc;

use drill_core::import::{ImportReport, parse_words};
use drill_core::model::{Lecture, LectureId, Word, WordId};
use storage::repository::VocabRepository;

use crate::Clock;
use crate::error::UnitServiceError;

/// Manages lectures and their vocabulary lists.
#[derive(Clone)]
pub struct UnitService {
    clock: Clock,
    vocab: Arc<dyn VocabRepository>,
}

impl UnitService {
    #[must_use]
    pub fn new(clock: Clock, vocab: Arc<dyn VocabRepository>) -> Self {
        Self { clock, vocab }
    }

    /// Append a lecture to the end of `class`.
    ///
    /// # Errors
    ///
    /// Returns `EmptyName` for a blank name, or `Storage`.
    pub async fn create_lecture(&self, class: &str, name: &str) -> Result<Lecture, UnitServiceError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(UnitServiceError::EmptyName);
        }

        let existing = self.vocab.list_lectures(class).await?;
        let order = existing.iter().map(|l| l.order).max().unwrap_or(0) + 1;
        let id = LectureId::new(format!("L_{}", self.clock.now().timestamp_millis()));
        let lecture = Lecture::new(id, class, name, order);

        self.vocab.add_lecture(&lecture).await?;
        tracing::info!(lecture = %lecture.id, class, order, "lecture created");
        Ok(lecture)
    }

    /// # Errors
    ///
    /// Returns `EmptyName`, `LectureNotFound`, or `Storage`.
    pub async fn rename_lecture(
        &self,
        class: &str,
        id: &LectureId,
        name: &str,
    ) -> Result<Lecture, UnitServiceError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(UnitServiceError::EmptyName);
        }

        let mut lecture = self
            .vocab
            .list_lectures(class)
            .await?
            .into_iter()
            .find(|l| &l.id == id)
            .ok_or_else(|| UnitServiceError::LectureNotFound(id.clone()))?;
        lecture.name = name.to_owned();
        self.vocab.update_lecture(&lecture).await?;
        Ok(lecture)
    }

    /// Lectures of `class` in display order.
    ///
    /// # Errors
    ///
    /// Returns `UnitServiceError::Storage` if repository access fails.
    pub async fn list_lectures(&self, class: &str) -> Result<Vec<Lecture>, UnitServiceError> {
        Ok(self.vocab.list_lectures(class).await?)
    }

    /// # Errors
    ///
    /// Returns `UnitServiceError::Storage` if repository access fails.
    pub async fn list_words(&self, lecture_id: &LectureId) -> Result<Vec<Word>, UnitServiceError> {
        Ok(self.vocab.list_words_by_lecture(lecture_id).await?)
    }

    /// Parse tab-separated words into a lecture of `class`.
    ///
    /// # Errors
    ///
    /// Returns `LectureNotFound`, `Import` when no row is usable, or `Storage`.
    pub async fn import_words(
        &self,
        class: &str,
        lecture_id: &LectureId,
        text: &str,
    ) -> Result<ImportReport<Word>, UnitServiceError> {
        let lectures = self.vocab.list_lectures(class).await?;
        if lectures.iter().all(|l| &l.id != lecture_id) {
            return Err(UnitServiceError::LectureNotFound(lecture_id.clone()));
        }

        let stamp = self.clock.now().timestamp_millis();
        let report = parse_words(text, class, lecture_id, stamp);
        for warning in &report.warnings {
            tracing::warn!(lecture = %lecture_id, %warning, "word import row");
        }

        let report = report.require_items()?;
        self.vocab.add_words(&report.items).await?;
        tracing::info!(
            lecture = %lecture_id,
            imported = report.items.len(),
            skipped = report.skipped(),
            "words imported"
        );
        Ok(report)
    }

    /// Delete words by id; returns how many existed.
    ///
    /// # Errors
    ///
    /// Returns `UnitServiceError::Storage` if repository access fails.
    pub async fn delete_words(&self, ids: &[WordId]) -> Result<usize, UnitServiceError> {
        let removed = self.vocab.delete_words(ids).await?;
        tracing::info!(requested = ids.len(), removed, "words deleted");
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use drill_core::import::ImportIssue;
    use drill_core::model::PartOfSpeech;
    use drill_core::time::fixed_clock;
    use storage::repository::InMemoryRepository;

    fn service() -> UnitService {
        UnitService::new(fixed_clock(), Arc::new(InMemoryRepository::new()))
    }

    #[tokio::test]
    async fn lectures_are_appended_in_order() {
        let svc = service();
        let first = svc.create_lecture("Standard", "Unit 1").await.unwrap();
        assert_eq!(first.order, 1);
        assert!(first.id.as_str().starts_with("L_"));

        assert!(matches!(
            svc.create_lecture("Standard", " ").await,
            Err(UnitServiceError::EmptyName)
        ));

        let renamed = svc.rename_lecture("Standard", &first.id, "Verbs").await.unwrap();
        assert_eq!(renamed.name, "Verbs");
        assert!(matches!(
            svc.rename_lecture("Standard", &LectureId::new("missing"), "x").await,
            Err(UnitServiceError::LectureNotFound(_))
        ));
    }

    #[tokio::test]
    async fn import_words_into_lecture() {
        let svc = service();
        let lecture = svc.create_lecture("Standard", "Unit 1").await.unwrap();

        let report = svc
            .import_words("Standard", &lecture.id, "run\t走る\nhappy\t幸せな\tadjective\n\t空\n")
            .await
            .unwrap();
        assert_eq!(report.items.len(), 2);
        assert_eq!(report.skipped(), 1);

        let words = svc.list_words(&lecture.id).await.unwrap();
        assert_eq!(words.len(), 2);
        assert_eq!(words[1].pos, PartOfSpeech::Adjective);

        let ids: Vec<WordId> = words.iter().map(|w| w.id.clone()).collect();
        assert_eq!(svc.delete_words(&ids).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn rejected_import_reports_each_line() {
        let svc = service();
        let lecture = svc.create_lecture("Standard", "Unit 1").await.unwrap();

        let err = svc
            .import_words("Standard", &lecture.id, "onlyword\n\tmeaning\n")
            .await
            .unwrap_err();
        let warnings = err.import_warnings().unwrap();
        assert_eq!(warnings.len(), 2);
        assert_eq!(warnings[0].line, 1);
        assert!(matches!(warnings[0].issue, ImportIssue::TooFewColumns { expected: 2, found: 1 }));
        assert!(matches!(warnings[1].issue, ImportIssue::EmptyWordOrMeaning));
        assert!(svc.list_words(&lecture.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn import_into_unknown_lecture_fails() {
        let svc = service();
        let err = svc
            .import_words("Standard", &LectureId::new("L9"), "run\t走る")
            .await
            .unwrap_err();
        assert!(matches!(err, UnitServiceError::LectureNotFound(_)));
    }
}
