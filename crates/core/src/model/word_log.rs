use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::model::ids::{UserId, WordId};

/// Date stored in `last_correct` when a word has never been answered correctly.
#[must_use]
pub fn never_correct_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2000, 1, 1).unwrap_or(NaiveDate::MIN)
}

/// Accuracy counters for one (user, word) pair.
///
/// Counters only ever grow; `correct_count + wrong_count` is the number of
/// recorded attempts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserWordLog {
    pub user_id: UserId,
    pub word_id: WordId,
    pub correct_count: u32,
    pub wrong_count: u32,
    pub last_seen: NaiveDate,
    pub last_correct: NaiveDate,
}

impl UserWordLog {
    #[must_use]
    pub fn total_attempts(&self) -> u64 {
        u64::from(self.correct_count) + u64::from(self.wrong_count)
    }

    /// True once the word has been answered correctly at least once.
    #[must_use]
    pub fn has_been_correct(&self) -> bool {
        self.correct_count > 0
    }

    /// Whole days between `last_seen` and `today` (negative if `last_seen` is in the future).
    #[must_use]
    pub fn days_since_seen(&self, today: NaiveDate) -> i64 {
        today.signed_duration_since(self.last_seen).num_days()
    }
}
