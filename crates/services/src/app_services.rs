use std::sync::Arc;

use drill_core::selector::SelectorSettings;
use storage::repository::Storage;
use storage::seed::{SeedReport, seed_demo};

use crate::course_service::CourseService;
use crate::error::AppServicesError;
use crate::grammar::GrammarSessionService;
use crate::stats_service::StatsService;
use crate::unit_service::UnitService;
use crate::vocab_session::VocabSessionService;
use crate::Clock;

/// Assembles app-facing services over one storage backend.
#[derive(Clone)]
pub struct AppServices {
    clock: Clock,
    storage: Arc<Storage>,
    vocab_sessions: Arc<VocabSessionService>,
    grammar_sessions: Arc<GrammarSessionService>,
    courses: Arc<CourseService>,
    units: Arc<UnitService>,
    stats: Arc<StatsService>,
}

impl AppServices {
    /// Build services backed by `SQLite` storage, running migrations first.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError::Sqlite` if the database cannot be opened or migrated.
    pub async fn new_sqlite(
        db_url: &str,
        clock: Clock,
        settings: SelectorSettings,
        seed: Option<u64>,
    ) -> Result<Self, AppServicesError> {
        let storage = Storage::sqlite(db_url).await?;
        Ok(Self::from_storage(storage, clock, settings, seed))
    }

    /// Build services over an in-memory store.
    #[must_use]
    pub fn in_memory(clock: Clock, settings: SelectorSettings, seed: Option<u64>) -> Self {
        Self::from_storage(Storage::in_memory(), clock, settings, seed)
    }

    #[must_use]
    pub fn from_storage(storage: Storage, clock: Clock, settings: SelectorSettings, seed: Option<u64>) -> Self {
        let mut vocab_sessions = VocabSessionService::new(
            clock,
            Arc::clone(&storage.vocab),
            Arc::clone(&storage.word_logs),
        )
        .with_settings(settings);
        if let Some(seed) = seed {
            vocab_sessions = vocab_sessions.with_seed(seed);
        }

        let grammar_sessions =
            GrammarSessionService::new(clock, Arc::clone(&storage.courses), Arc::clone(&storage.progress));
        let courses = CourseService::new(clock, Arc::clone(&storage.courses));
        let units = UnitService::new(clock, Arc::clone(&storage.vocab));
        let stats = StatsService::new(
            clock,
            Arc::clone(&storage.vocab),
            Arc::clone(&storage.word_logs),
            Arc::clone(&storage.courses),
            Arc::clone(&storage.progress),
        );

        Self {
            clock,
            storage: Arc::new(storage),
            vocab_sessions: Arc::new(vocab_sessions),
            grammar_sessions: Arc::new(grammar_sessions),
            courses: Arc::new(courses),
            units: Arc::new(units),
            stats: Arc::new(stats),
        }
    }

    /// Insert the demo catalog and courses where missing.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError::Storage` if any read or write fails.
    pub async fn seed_demo(&self) -> Result<SeedReport, AppServicesError> {
        Ok(seed_demo(&self.storage, self.clock.now()).await?)
    }

    #[must_use]
    pub fn clock(&self) -> Clock {
        self.clock
    }

    #[must_use]
    pub fn vocab_sessions(&self) -> Arc<VocabSessionService> {
        Arc::clone(&self.vocab_sessions)
    }

    #[must_use]
    pub fn grammar_sessions(&self) -> Arc<GrammarSessionService> {
        Arc::clone(&self.grammar_sessions)
    }

    #[must_use]
    pub fn courses(&self) -> Arc<CourseService> {
        Arc::clone(&self.courses)
    }

    #[must_use]
    pub fn units(&self) -> Arc<UnitService> {
        Arc::clone(&self.units)
    }

    #[must_use]
    pub fn stats(&self) -> Arc<StatsService> {
        Arc::clone(&self.stats)
    }
}
