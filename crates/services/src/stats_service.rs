use std::sync::Arc;

use drill_core::model::{CourseId, UserId};
use drill_core::stats::{CourseStats, StudentSummary, VocabStats, class_overview};
use storage::repository::{
    CourseProgressRepository, CourseRepository, VocabRepository, WordLogRepository,
};

use crate::Clock;
use crate::error::StatsError;

/// Weak words listed on a learner's own dashboard.
pub const LEARNER_WEAK_WORDS: usize = 5;

/// Course mastery for one student.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CourseReport {
    pub course_id: CourseId,
    pub title: String,
    pub stats: CourseStats,
}

/// Read-only dashboard figures for learners and teachers.
#[derive(Clone)]
pub struct StatsService {
    clock: Clock,
    vocab: Arc<dyn VocabRepository>,
    logs: Arc<dyn WordLogRepository>,
    courses: Arc<dyn CourseRepository>,
    progress: Arc<dyn CourseProgressRepository>,
}

impl StatsService {
    #[must_use]
    pub fn new(
        clock: Clock,
        vocab: Arc<dyn VocabRepository>,
        logs: Arc<dyn WordLogRepository>,
        courses: Arc<dyn CourseRepository>,
        progress: Arc<dyn CourseProgressRepository>,
    ) -> Self {
        Self {
            clock,
            vocab,
            logs,
            courses,
            progress,
        }
    }

    /// Vocabulary accuracy and weak words for one learner.
    ///
    /// # Errors
    ///
    /// Returns `StatsError::Storage` if repository access fails.
    pub async fn vocab_stats(&self, user_id: &UserId, class: &str) -> Result<VocabStats, StatsError> {
        let catalog = self.vocab.list_words_by_class(class).await?;
        let logs = self.logs.list_user_logs(user_id).await?;
        Ok(VocabStats::from_logs(
            &logs,
            &catalog,
            self.clock.today(),
            LEARNER_WEAK_WORDS,
        ))
    }

    /// Per-student summary of a whole class.
    ///
    /// # Errors
    ///
    /// Returns `StatsError::Storage` if repository access fails.
    pub async fn class_overview(&self, class: &str) -> Result<Vec<StudentSummary>, StatsError> {
        let catalog = self.vocab.list_words_by_class(class).await?;
        let logs = self.logs.all_student_logs(class).await?;
        Ok(class_overview(&logs, &catalog))
    }

    /// # Errors
    ///
    /// Returns `CourseNotFound` for an unknown course, or `Storage`.
    pub async fn course_stats(
        &self,
        student_id: &UserId,
        course_id: &CourseId,
    ) -> Result<CourseStats, StatsError> {
        let course = self
            .courses
            .get_course(course_id)
            .await?
            .ok_or_else(|| StatsError::CourseNotFound(course_id.clone()))?;
        let progress = self.progress.get_progress(student_id, course_id).await?;
        Ok(CourseStats::compute(&course, progress.as_ref()))
    }

    /// Mastery of every course for one student, including courses never studied.
    ///
    /// # Errors
    ///
    /// Returns `StatsError::Storage` if repository access fails.
    pub async fn student_courses(&self, student_id: &UserId) -> Result<Vec<CourseReport>, StatsError> {
        let courses = self.courses.list_courses().await?;
        let progress = self.progress.list_student_progress(student_id).await?;

        Ok(courses
            .iter()
            .map(|course| {
                let own = progress.iter().find(|p| &p.course_id == course.id());
                CourseReport {
                    course_id: course.id().clone(),
                    title: course.title().to_owned(),
                    stats: CourseStats::compute(course, own),
                }
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use drill_core::model::{QuestionId, StudentCourseProgress, WordId};
    use drill_core::scheduler::update_log;
    use drill_core::time::{fixed_clock, fixed_now, fixed_today};
    use storage::repository::InMemoryRepository;
    use storage::seed::{DEMO_CLASS, seed_demo};
    use storage::Storage;

    fn service(repo: &InMemoryRepository) -> StatsService {
        let repo = Arc::new(repo.clone());
        StatsService::new(fixed_clock(), repo.clone(), repo.clone(), repo.clone(), repo)
    }

    async fn seeded() -> InMemoryRepository {
        let repo = InMemoryRepository::new();
        let storage = Storage {
            vocab: Arc::new(repo.clone()),
            word_logs: Arc::new(repo.clone()),
            courses: Arc::new(repo.clone()),
            progress: Arc::new(repo.clone()),
        };
        seed_demo(&storage, fixed_now()).await.unwrap();
        repo
    }

    #[tokio::test]
    async fn vocab_stats_reflect_logs() {
        let repo = seeded().await;
        let user = UserId::new("s1");
        for (word, correct) in [("W001", true), ("W002", false), ("W002", false)] {
            let id = WordId::new(word);
            repo.update_user_log(&user, &id, &|prior| update_log(&user, &id, prior, correct, fixed_today()))
                .await
                .unwrap();
        }

        let stats = service(&repo).vocab_stats(&user, DEMO_CLASS).await.unwrap();
        assert_eq!(stats.total_attempts, 3);
        assert_eq!(stats.accuracy_percent, 33);
        assert_eq!(stats.learned, 1);
        assert!(stats.studied_today);
        assert_eq!(stats.weak_words[0].word, "reject");

        let overview = service(&repo).class_overview(DEMO_CLASS).await.unwrap();
        assert_eq!(overview.len(), 1);
        assert_eq!(overview[0].last_activity, Some(fixed_today()));
    }

    #[tokio::test]
    async fn course_reports_cover_unstudied_courses() {
        let repo = seeded().await;
        let student = UserId::new("s1");
        let course_id = CourseId::new("demo-course-1");

        let mut progress = StudentCourseProgress::new(student.clone(), course_id.clone());
        progress.record_answer(&QuestionId::new("q1"), true, fixed_now(), chrono::Duration::seconds(1));
        repo.save_progress(&progress).await.unwrap();

        let svc = service(&repo);
        let stats = svc.course_stats(&student, &course_id).await.unwrap();
        assert_eq!((stats.known, stats.unlearned, stats.mastery_percent), (1, 2, 33));

        let reports = svc.student_courses(&student).await.unwrap();
        assert_eq!(reports.len(), 2);
        let untouched = reports.iter().find(|r| r.course_id.as_str() == "demo-course-2").unwrap();
        assert_eq!(untouched.stats.unlearned, 3);

        assert!(matches!(
            svc.course_stats(&student, &CourseId::new("missing")).await,
            Err(StatsError::CourseNotFound(_))
        ));
    }
}
