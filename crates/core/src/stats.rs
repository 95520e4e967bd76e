//! Read-only dashboard figures derived from logs and progress records.

use std::collections::{BTreeMap, HashMap};

use chrono::NaiveDate;
use serde::Serialize;

use crate::model::{Course, LearningStatus, StudentCourseProgress, UserId, UserWordLog, Word, WordId};

/// Weak words listed per student in the class overview.
pub const OVERVIEW_WEAK_WORDS: usize = 3;

/// Rounded percentage, half away from zero. Zero when `whole` is zero.
///
/// ```
/// # use drill_core::stats::percent;
/// assert_eq!(percent(1, 3), 33);
/// assert_eq!(percent(2, 3), 67);
/// assert_eq!(percent(1, 8), 13);
/// assert_eq!(percent(5, 0), 0);
/// ```
#[must_use]
pub fn percent(part: u64, whole: u64) -> u32 {
    if whole == 0 {
        return 0;
    }
    let rounded = (u128::from(part) * 200 + u128::from(whole)) / (u128::from(whole) * 2);
    u32::try_from(rounded).unwrap_or(u32::MAX)
}

//
// ─── VOCABULARY ────────────────────────────────────────────────────────────────
//

/// One word a learner keeps missing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WeakWord {
    pub word_id: WordId,
    /// Catalog spelling, or the id when the word is no longer in the catalog.
    pub word: String,
    pub meaning: Option<String>,
    pub wrong_count: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VocabStats {
    pub accuracy_percent: u32,
    pub total_attempts: u64,
    pub learned: usize,
    pub studied_today: bool,
    pub weak_words: Vec<WeakWord>,
}

impl VocabStats {
    /// Summarize one learner's logs.
    #[must_use]
    pub fn from_logs(logs: &[UserWordLog], catalog: &[Word], today: NaiveDate, weak_limit: usize) -> Self {
        let correct: u64 = logs.iter().map(|l| u64::from(l.correct_count)).sum();
        let total_attempts: u64 = logs.iter().map(UserWordLog::total_attempts).sum();

        Self {
            accuracy_percent: percent(correct, total_attempts),
            total_attempts,
            learned: logs.iter().filter(|l| l.has_been_correct()).count(),
            studied_today: logs.iter().any(|l| l.last_seen == today),
            weak_words: weak_words(logs, catalog, weak_limit),
        }
    }
}

/// Words with at least one miss, most misses first, ties by word id.
#[must_use]
pub fn weak_words(logs: &[UserWordLog], catalog: &[Word], limit: usize) -> Vec<WeakWord> {
    let by_id: HashMap<&WordId, &Word> = catalog.iter().map(|w| (&w.id, w)).collect();

    let mut missed: Vec<&UserWordLog> = logs.iter().filter(|l| l.wrong_count > 0).collect();
    missed.sort_by(|a, b| {
        b.wrong_count
            .cmp(&a.wrong_count)
            .then_with(|| a.word_id.cmp(&b.word_id))
    });

    missed
        .into_iter()
        .take(limit)
        .map(|log| {
            let entry = by_id.get(&log.word_id);
            WeakWord {
                word_id: log.word_id.clone(),
                word: entry.map_or_else(|| log.word_id.to_string(), |w| w.word.clone()),
                meaning: entry.map(|w| w.meaning.clone()),
                wrong_count: log.wrong_count,
            }
        })
        .collect()
}

//
// ─── CLASS OVERVIEW ────────────────────────────────────────────────────────────
//

/// One student's row in the class overview.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StudentSummary {
    pub user_id: UserId,
    pub accuracy_percent: u32,
    pub total_attempts: u64,
    pub last_activity: Option<NaiveDate>,
    pub weak_words: Vec<WeakWord>,
}

/// Per-student summaries ordered by user id.
#[must_use]
pub fn class_overview(logs_by_user: &BTreeMap<UserId, Vec<UserWordLog>>, catalog: &[Word]) -> Vec<StudentSummary> {
    logs_by_user
        .iter()
        .map(|(user_id, logs)| {
            let correct: u64 = logs.iter().map(|l| u64::from(l.correct_count)).sum();
            let total_attempts: u64 = logs.iter().map(UserWordLog::total_attempts).sum();
            StudentSummary {
                user_id: user_id.clone(),
                accuracy_percent: percent(correct, total_attempts),
                total_attempts,
                last_activity: logs.iter().map(|l| l.last_seen).max(),
                weak_words: weak_words(logs, catalog, OVERVIEW_WEAK_WORDS),
            }
        })
        .collect()
}

//
// ─── GRAMMAR ───────────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct CourseStats {
    pub total: usize,
    pub known: usize,
    pub weak: usize,
    pub unlearned: usize,
    pub mastery_percent: u32,
    pub total_time_ms: u64,
}

impl CourseStats {
    /// Counts cover the course's current questions only; progress for deleted
    /// questions is ignored.
    #[must_use]
    pub fn compute(course: &Course, progress: Option<&StudentCourseProgress>) -> Self {
        let mut stats = CourseStats {
            total: course.questions().len(),
            total_time_ms: progress.map_or(0, |p| p.total_time_ms),
            ..CourseStats::default()
        };

        for question in course.questions() {
            let status = progress.map_or(LearningStatus::Unlearned, |p| p.status_of(&question.id));
            match status {
                LearningStatus::Known => stats.known += 1,
                LearningStatus::Weak => stats.weak += 1,
                LearningStatus::Unlearned => stats.unlearned += 1,
            }
        }

        stats.mastery_percent = percent(stats.known as u64, stats.total as u64);
        stats
    }
}
