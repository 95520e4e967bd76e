use async_trait::async_trait;
use drill_core::model::{
    Course, CourseId, Lecture, LectureId, StudentCourseProgress, UserId, UserWordLog, Word, WordId,
};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};
use thiserror::Error;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("conflict")]
    Conflict,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Replacement function for a stored log; receives the current log, if any.
pub type LogUpdate<'a> = &'a (dyn Fn(Option<&UserWordLog>) -> UserWordLog + Send + Sync);

/// Lecture and word catalog.
#[async_trait]
pub trait VocabRepository: Send + Sync {
    /// Lectures of a class ordered by `order`, then id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failure.
    async fn list_lectures(&self, class: &str) -> Result<Vec<Lecture>, StorageError>;

    /// Insert a new lecture.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Conflict` if the id is taken.
    async fn add_lecture(&self, lecture: &Lecture) -> Result<(), StorageError>;

    /// Replace an existing lecture.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the lecture does not exist.
    async fn update_lecture(&self, lecture: &Lecture) -> Result<(), StorageError>;

    /// Words of a lecture in insertion order.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failure.
    async fn list_words_by_lecture(&self, lecture_id: &LectureId) -> Result<Vec<Word>, StorageError>;

    /// Every word of a class in insertion order.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failure.
    async fn list_words_by_class(&self, class: &str) -> Result<Vec<Word>, StorageError>;

    /// Append words. Either all are stored or none are.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Conflict` if any id already exists or repeats.
    async fn add_words(&self, words: &[Word]) -> Result<(), StorageError>;

    /// Remove words by id and return how many existed. Logs are left untouched.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failure.
    async fn delete_words(&self, ids: &[WordId]) -> Result<usize, StorageError>;
}

/// Per (user, word) accuracy logs.
#[async_trait]
pub trait WordLogRepository: Send + Sync {
    /// # Errors
    ///
    /// Returns `StorageError` on backend failure.
    async fn list_user_logs(&self, user_id: &UserId) -> Result<Vec<UserWordLog>, StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` on backend failure.
    async fn get_user_log(
        &self,
        user_id: &UserId,
        word_id: &WordId,
    ) -> Result<Option<UserWordLog>, StorageError>;

    /// Insert or replace the log keyed by `(user_id, word_id)`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failure.
    async fn save_user_log(&self, log: &UserWordLog) -> Result<(), StorageError>;

    /// Read the current log, apply `update`, and store the result as one atomic step.
    ///
    /// Concurrent updates for the same key never lose an increment.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Conflict` if `update` changes the key, or other
    /// storage errors.
    async fn update_user_log(
        &self,
        user_id: &UserId,
        word_id: &WordId,
        update: LogUpdate<'_>,
    ) -> Result<UserWordLog, StorageError>;

    /// Logs grouped by user, restricted to words of `class`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failure.
    async fn all_student_logs(
        &self,
        class: &str,
    ) -> Result<BTreeMap<UserId, Vec<UserWordLog>>, StorageError>;
}

/// Grammar courses with their questions.
#[async_trait]
pub trait CourseRepository: Send + Sync {
    /// # Errors
    ///
    /// Returns `StorageError` on backend failure.
    async fn list_courses(&self) -> Result<Vec<Course>, StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` on backend failure.
    async fn get_course(&self, id: &CourseId) -> Result<Option<Course>, StorageError>;

    /// Insert or replace a course and its full question list.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failure.
    async fn save_course(&self, course: &Course) -> Result<(), StorageError>;

    /// Delete a course together with all student progress for it.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the course does not exist.
    async fn delete_course(&self, id: &CourseId) -> Result<(), StorageError>;
}

/// Per (student, course) grammar progress.
#[async_trait]
pub trait CourseProgressRepository: Send + Sync {
    /// # Errors
    ///
    /// Returns `StorageError` on backend failure.
    async fn get_progress(
        &self,
        student_id: &UserId,
        course_id: &CourseId,
    ) -> Result<Option<StudentCourseProgress>, StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` on backend failure.
    async fn list_student_progress(
        &self,
        student_id: &UserId,
    ) -> Result<Vec<StudentCourseProgress>, StorageError>;

    /// Insert or replace the whole progress record.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the course does not exist.
    async fn save_progress(&self, progress: &StudentCourseProgress) -> Result<(), StorageError>;
}

//
// ─── IN-MEMORY ─────────────────────────────────────────────────────────────────
//

/// Simple in-memory repository implementation for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    lectures: Arc<Mutex<Vec<Lecture>>>,
    words: Arc<Mutex<Vec<Word>>>,
    logs: Arc<Mutex<HashMap<(UserId, WordId), UserWordLog>>>,
    courses: Arc<Mutex<BTreeMap<CourseId, Course>>>,
    progress: Arc<Mutex<HashMap<(UserId, CourseId), StudentCourseProgress>>>,
}

fn lock<T>(m: &Mutex<T>) -> Result<MutexGuard<'_, T>, StorageError> {
    m.lock().map_err(|e| StorageError::Connection(e.to_string()))
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl VocabRepository for InMemoryRepository {
    async fn list_lectures(&self, class: &str) -> Result<Vec<Lecture>, StorageError> {
        let guard = lock(&self.lectures)?;
        let mut out: Vec<Lecture> = guard.iter().filter(|l| l.class == class).cloned().collect();
        out.sort_by(|a, b| a.order.cmp(&b.order).then_with(|| a.id.cmp(&b.id)));
        Ok(out)
    }

    async fn add_lecture(&self, lecture: &Lecture) -> Result<(), StorageError> {
        let mut guard = lock(&self.lectures)?;
        if guard.iter().any(|l| l.id == lecture.id) {
            return Err(StorageError::Conflict);
        }
        guard.push(lecture.clone());
        Ok(())
    }

    async fn update_lecture(&self, lecture: &Lecture) -> Result<(), StorageError> {
        let mut guard = lock(&self.lectures)?;
        let slot = guard
            .iter_mut()
            .find(|l| l.id == lecture.id)
            .ok_or(StorageError::NotFound)?;
        *slot = lecture.clone();
        Ok(())
    }

    async fn list_words_by_lecture(&self, lecture_id: &LectureId) -> Result<Vec<Word>, StorageError> {
        let guard = lock(&self.words)?;
        Ok(guard.iter().filter(|w| &w.lecture_id == lecture_id).cloned().collect())
    }

    async fn list_words_by_class(&self, class: &str) -> Result<Vec<Word>, StorageError> {
        let guard = lock(&self.words)?;
        Ok(guard.iter().filter(|w| w.class == class).cloned().collect())
    }

    async fn add_words(&self, words: &[Word]) -> Result<(), StorageError> {
        let mut guard = lock(&self.words)?;
        let mut seen: HashSet<&WordId> = guard.iter().map(|w| &w.id).collect();
        if !words.iter().all(|w| seen.insert(&w.id)) {
            return Err(StorageError::Conflict);
        }
        drop(seen);
        guard.extend(words.iter().cloned());
        Ok(())
    }

    async fn delete_words(&self, ids: &[WordId]) -> Result<usize, StorageError> {
        let mut guard = lock(&self.words)?;
        let before = guard.len();
        guard.retain(|w| !ids.contains(&w.id));
        Ok(before - guard.len())
    }
}

#[async_trait]
impl WordLogRepository for InMemoryRepository {
    async fn list_user_logs(&self, user_id: &UserId) -> Result<Vec<UserWordLog>, StorageError> {
        let guard = lock(&self.logs)?;
        let mut out: Vec<UserWordLog> = guard
            .values()
            .filter(|l| &l.user_id == user_id)
            .cloned()
            .collect();
        out.sort_by(|a, b| a.word_id.cmp(&b.word_id));
        Ok(out)
    }

    async fn get_user_log(
        &self,
        user_id: &UserId,
        word_id: &WordId,
    ) -> Result<Option<UserWordLog>, StorageError> {
        let guard = lock(&self.logs)?;
        Ok(guard.get(&(user_id.clone(), word_id.clone())).cloned())
    }

    async fn save_user_log(&self, log: &UserWordLog) -> Result<(), StorageError> {
        let mut guard = lock(&self.logs)?;
        guard.insert((log.user_id.clone(), log.word_id.clone()), log.clone());
        Ok(())
    }

    async fn update_user_log(
        &self,
        user_id: &UserId,
        word_id: &WordId,
        update: LogUpdate<'_>,
    ) -> Result<UserWordLog, StorageError> {
        let key = (user_id.clone(), word_id.clone());
        let mut guard = lock(&self.logs)?;
        let next = update(guard.get(&key));
        if next.user_id != key.0 || next.word_id != key.1 {
            return Err(StorageError::Conflict);
        }
        guard.insert(key, next.clone());
        Ok(next)
    }

    async fn all_student_logs(
        &self,
        class: &str,
    ) -> Result<BTreeMap<UserId, Vec<UserWordLog>>, StorageError> {
        let class_words: HashSet<WordId> = lock(&self.words)?
            .iter()
            .filter(|w| w.class == class)
            .map(|w| w.id.clone())
            .collect();

        let guard = lock(&self.logs)?;
        let mut grouped: BTreeMap<UserId, Vec<UserWordLog>> = BTreeMap::new();
        for log in guard.values().filter(|l| class_words.contains(&l.word_id)) {
            grouped.entry(log.user_id.clone()).or_default().push(log.clone());
        }
        for logs in grouped.values_mut() {
            logs.sort_by(|a, b| a.word_id.cmp(&b.word_id));
        }
        Ok(grouped)
    }
}

#[async_trait]
impl CourseRepository for InMemoryRepository {
    async fn list_courses(&self) -> Result<Vec<Course>, StorageError> {
        let guard = lock(&self.courses)?;
        let mut out: Vec<Course> = guard.values().cloned().collect();
        out.sort_by(|a, b| a.created_at().cmp(&b.created_at()).then_with(|| a.id().cmp(b.id())));
        Ok(out)
    }

    async fn get_course(&self, id: &CourseId) -> Result<Option<Course>, StorageError> {
        let guard = lock(&self.courses)?;
        Ok(guard.get(id).cloned())
    }

    async fn save_course(&self, course: &Course) -> Result<(), StorageError> {
        let mut guard = lock(&self.courses)?;
        guard.insert(course.id().clone(), course.clone());
        Ok(())
    }

    async fn delete_course(&self, id: &CourseId) -> Result<(), StorageError> {
        lock(&self.courses)?.remove(id).ok_or(StorageError::NotFound)?;
        lock(&self.progress)?.retain(|(_, course_id), _| course_id != id);
        Ok(())
    }
}

#[async_trait]
impl CourseProgressRepository for InMemoryRepository {
    async fn get_progress(
        &self,
        student_id: &UserId,
        course_id: &CourseId,
    ) -> Result<Option<StudentCourseProgress>, StorageError> {
        let guard = lock(&self.progress)?;
        Ok(guard.get(&(student_id.clone(), course_id.clone())).cloned())
    }

    async fn list_student_progress(
        &self,
        student_id: &UserId,
    ) -> Result<Vec<StudentCourseProgress>, StorageError> {
        let guard = lock(&self.progress)?;
        let mut out: Vec<StudentCourseProgress> = guard
            .values()
            .filter(|p| &p.student_id == student_id)
            .cloned()
            .collect();
        out.sort_by(|a, b| a.course_id.cmp(&b.course_id));
        Ok(out)
    }

    async fn save_progress(&self, progress: &StudentCourseProgress) -> Result<(), StorageError> {
        if !lock(&self.courses)?.contains_key(&progress.course_id) {
            return Err(StorageError::NotFound);
        }
        let mut guard = lock(&self.progress)?;
        guard.insert(
            (progress.student_id.clone(), progress.course_id.clone()),
            progress.clone(),
        );
        Ok(())
    }
}

/// Aggregates repositories behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub vocab: Arc<dyn VocabRepository>,
    pub word_logs: Arc<dyn WordLogRepository>,
    pub courses: Arc<dyn CourseRepository>,
    pub progress: Arc<dyn CourseProgressRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        let repo = InMemoryRepository::new();
        Self {
            vocab: Arc::new(repo.clone()),
            word_logs: Arc::new(repo.clone()),
            courses: Arc::new(repo.clone()),
            progress: Arc::new(repo),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use drill_core::model::{PartOfSpeech, QuestionId};
    use drill_core::scheduler::update_log;
    use drill_core::time::{fixed_now, fixed_today};

    fn word(id: &str, class: &str, lecture: &str) -> Word {
        Word::new(
            WordId::new(id),
            class,
            LectureId::new(lecture),
            id.to_lowercase(),
            PartOfSpeech::Verb,
            "m",
        )
    }

    #[tokio::test]
    async fn lectures_conflict_and_update() {
        let repo = InMemoryRepository::new();
        let lecture = Lecture::new(LectureId::new("L2"), "Standard", "Unit 2", 2);
        repo.add_lecture(&lecture).await.unwrap();
        repo.add_lecture(&Lecture::new(LectureId::new("L1"), "Standard", "Unit 1", 1))
            .await
            .unwrap();

        assert!(matches!(
            repo.add_lecture(&lecture).await,
            Err(StorageError::Conflict)
        ));
        assert!(matches!(
            repo.update_lecture(&Lecture::new(LectureId::new("L9"), "Standard", "x", 9)).await,
            Err(StorageError::NotFound)
        ));

        let renamed = Lecture::new(LectureId::new("L2"), "Standard", "Daily Life", 2);
        repo.update_lecture(&renamed).await.unwrap();

        let listed = repo.list_lectures("Standard").await.unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].id, LectureId::new("L1"));
        assert_eq!(listed[1].name, "Daily Life");
        assert!(repo.list_lectures("Advanced").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn add_words_is_all_or_nothing() {
        let repo = InMemoryRepository::new();
        repo.add_words(&[word("W1", "Standard", "L1")]).await.unwrap();

        let clash = [word("W2", "Standard", "L1"), word("W1", "Standard", "L1")];
        assert!(matches!(repo.add_words(&clash).await, Err(StorageError::Conflict)));
        assert_eq!(repo.list_words_by_class("Standard").await.unwrap().len(), 1);

        repo.add_words(&[word("W2", "Standard", "L2"), word("W3", "Other", "L3")])
            .await
            .unwrap();
        assert_eq!(repo.list_words_by_lecture(&LectureId::new("L2")).await.unwrap().len(), 1);

        let removed = repo
            .delete_words(&[WordId::new("W1"), WordId::new("missing")])
            .await
            .unwrap();
        assert_eq!(removed, 1);
        assert_eq!(repo.list_words_by_class("Standard").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn update_user_log_applies_on_top_of_current() {
        let repo = InMemoryRepository::new();
        let user = UserId::new("u1");
        let w = WordId::new("W1");

        for correct in [true, false, true] {
            repo.update_user_log(&user, &w, &|prior| {
                update_log(&user, &w, prior, correct, fixed_today())
            })
            .await
            .unwrap();
        }

        let stored = repo.get_user_log(&user, &w).await.unwrap().unwrap();
        assert_eq!((stored.correct_count, stored.wrong_count), (2, 1));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_updates_keep_every_increment() {
        let repo = InMemoryRepository::new();
        let tasks: Vec<_> = (0..16)
            .map(|_| {
                let repo = repo.clone();
                tokio::spawn(async move {
                    let user = UserId::new("u1");
                    let w = WordId::new("W1");
                    repo.update_user_log(&user, &w, &|prior| {
                        update_log(&user, &w, prior, false, fixed_today())
                    })
                    .await
                })
            })
            .collect();
        for task in tasks {
            task.await.unwrap().unwrap();
        }

        let stored = repo
            .get_user_log(&UserId::new("u1"), &WordId::new("W1"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!((stored.correct_count, stored.wrong_count), (0, 16));
    }

    #[tokio::test]
    async fn update_user_log_rejects_key_change() {
        let repo = InMemoryRepository::new();
        let other = UserId::new("u2");
        let w = WordId::new("W1");

        let result = repo
            .update_user_log(&UserId::new("u1"), &w, &|prior| {
                update_log(&other, &w, prior, true, fixed_today())
            })
            .await;
        assert!(matches!(result, Err(StorageError::Conflict)));
    }

    #[tokio::test]
    async fn all_student_logs_filters_by_class() {
        let repo = InMemoryRepository::new();
        repo.add_words(&[word("W1", "Standard", "L1"), word("W2", "Other", "L2")])
            .await
            .unwrap();
        for (user, w) in [("a", "W1"), ("b", "W1"), ("b", "W2")] {
            let user = UserId::new(user);
            let w = WordId::new(w);
            repo.save_user_log(&update_log(&user, &w, None, true, fixed_today()))
                .await
                .unwrap();
        }

        let grouped = repo.all_student_logs("Standard").await.unwrap();
        assert_eq!(grouped.len(), 2);
        assert_eq!(grouped[&UserId::new("b")].len(), 1);
    }

    #[tokio::test]
    async fn deleting_course_drops_progress() {
        let repo = InMemoryRepository::new();
        let course = Course::new(CourseId::new("c1"), "Tenses", fixed_now()).unwrap();
        repo.save_course(&course).await.unwrap();

        let mut progress = StudentCourseProgress::new(UserId::new("s1"), CourseId::new("c1"));
        progress.record_answer(&QuestionId::new("q1"), true, fixed_now(), chrono::Duration::zero());
        repo.save_progress(&progress).await.unwrap();

        repo.delete_course(&CourseId::new("c1")).await.unwrap();
        assert!(repo.get_course(&CourseId::new("c1")).await.unwrap().is_none());
        assert!(repo
            .get_progress(&UserId::new("s1"), &CourseId::new("c1"))
            .await
            .unwrap()
            .is_none());
        assert!(matches!(
            repo.delete_course(&CourseId::new("c1")).await,
            Err(StorageError::NotFound)
        ));
    }
}
