use std::sync::Arc;

use rand::SeedableRng;
use rand::rngs::StdRng;

use drill_core::model::{LectureId, UserId, UserWordLog};
use drill_core::scheduler::update_log;
use drill_core::selector::{SelectorSettings, SessionSelection, plan_session};
use drill_core::test_flow::{TestStep, VocabTest};
use storage::repository::{VocabRepository, WordLogRepository};

use crate::Clock;
use crate::error::VocabSessionError;

/// Result of grading one phase of the current word.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VocabAnswer {
    pub step: TestStep,
    /// Stored log after a final outcome; `None` when the word moved to recall.
    pub log: Option<UserWordLog>,
}

/// Starts vocabulary tests and records their outcomes.
#[derive(Clone)]
pub struct VocabSessionService {
    clock: Clock,
    vocab: Arc<dyn VocabRepository>,
    logs: Arc<dyn WordLogRepository>,
    settings: SelectorSettings,
    seed: Option<u64>,
}

impl VocabSessionService {
    #[must_use]
    pub fn new(
        clock: Clock,
        vocab: Arc<dyn VocabRepository>,
        logs: Arc<dyn WordLogRepository>,
    ) -> Self {
        Self {
            clock,
            vocab,
            logs,
            settings: SelectorSettings::default(),
            seed: None,
        }
    }

    #[must_use]
    pub fn with_settings(mut self, settings: SelectorSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Fix the shuffle seed so every selection is reproducible.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    #[must_use]
    pub fn settings(&self) -> &SelectorSettings {
        &self.settings
    }

    fn rng(&self) -> StdRng {
        match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        }
    }

    /// Choose the words for a session without starting a test.
    ///
    /// The catalog is every word of `class`; `lecture_id` is the lecture the
    /// learner is focusing on.
    ///
    /// # Errors
    ///
    /// Returns `VocabSessionError::Storage` if the catalog or logs cannot be read.
    pub async fn plan(
        &self,
        user_id: &UserId,
        class: &str,
        lecture_id: &LectureId,
    ) -> Result<SessionSelection, VocabSessionError> {
        let catalog = self.vocab.list_words_by_class(class).await?;
        let logs = self.logs.list_user_logs(user_id).await?;

        let mut rng = self.rng();
        let selection = plan_session(
            &catalog,
            &logs,
            lecture_id,
            &self.settings,
            self.clock.today(),
            &mut rng,
        );

        tracing::debug!(
            user = %user_id,
            lecture = %lecture_id,
            catalog = catalog.len(),
            logs = logs.len(),
            wrong = selection.from_wrong,
            new = selection.from_new,
            old = selection.from_old,
            backfilled = selection.backfilled,
            "planned vocabulary session"
        );
        Ok(selection)
    }

    /// Plan a session and wrap it in a two-phase test.
    ///
    /// # Errors
    ///
    /// Returns `VocabSessionError::Flow(TestFlowError::Empty)` when the class has
    /// no words, or a storage error.
    pub async fn start_test(
        &self,
        user_id: &UserId,
        class: &str,
        lecture_id: &LectureId,
    ) -> Result<VocabTest, VocabSessionError> {
        let selection = self.plan(user_id, class, lecture_id).await?;
        Ok(VocabTest::new(selection.words)?)
    }

    /// Grade the current phase and persist the outcome when the word is finished.
    ///
    /// If persistence fails the test is rolled back, so the same answer can be
    /// graded again.
    ///
    /// # Errors
    ///
    /// Returns flow errors for out-of-order calls, or storage errors.
    pub async fn answer_current(
        &self,
        user_id: &UserId,
        test: &mut VocabTest,
        correct: bool,
    ) -> Result<VocabAnswer, VocabSessionError> {
        let original = test.clone();
        let step = test.grade(correct)?;

        let TestStep::Recorded { outcome, finished } = &step else {
            return Ok(VocabAnswer { step, log: None });
        };

        let today = self.clock.today();
        let word_id = outcome.word_id.clone();
        let hit = outcome.correct;
        let saved = self
            .logs
            .update_user_log(user_id, &word_id, &|prior| {
                update_log(user_id, &word_id, prior, hit, today)
            })
            .await;

        let log = match saved {
            Ok(log) => log,
            Err(err) => {
                *test = original;
                tracing::warn!(user = %user_id, word = %word_id, error = %err, "failed to record outcome");
                return Err(err.into());
            }
        };

        if *finished {
            tracing::info!(
                user = %user_id,
                total = test.words().len(),
                correct = test.correct_count(),
                "vocabulary test completed"
            );
        }

        Ok(VocabAnswer {
            step,
            log: Some(log),
        })
    }
}
