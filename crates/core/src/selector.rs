//! Vocabulary session composition.
//!
//! A session mixes three candidate pools drawn from the whole catalog:
//!
//! - **wrong**: words with at least one logged miss, most misses first
//! - **new**: words of the lecture the learner picked, shuffled
//! - **old**: words last seen more than `stale_after_days` ago, stalest first
//!
//! Quotas are filled in that order without duplicates. Short pools are
//! backfilled from the new pool and then from the whole catalog, and the final
//! list is shuffled again.

use chrono::NaiveDate;
use rand::Rng;
use rand::seq::SliceRandom;
use std::collections::{HashMap, HashSet};
use thiserror::Error;

use crate::model::{LectureId, UserWordLog, Word, WordId};

//
// ─── SETTINGS ──────────────────────────────────────────────────────────────────
//

pub const DEFAULT_SESSION_LIMIT: u32 = 20;
pub const DEFAULT_WRONG_PERCENT: u8 = 40;
pub const DEFAULT_NEW_PERCENT: u8 = 40;
pub const DEFAULT_STALE_AFTER_DAYS: u32 = 7;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SelectorSettingsError {
    #[error("session limit must be > 0")]
    InvalidLimit,

    #[error("wrong ({wrong}%) and new ({new}%) shares must not exceed 100%")]
    InvalidShares { wrong: u8, new: u8 },

    #[error("stale threshold must be at least 1 day")]
    InvalidStaleAfterDays,
}

/// Size and mix of a vocabulary session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectorSettings {
    limit: u32,
    wrong_percent: u8,
    new_percent: u8,
    stale_after_days: u32,
}

impl SelectorSettings {
    /// Creates validated settings. The old-word share is whatever remains.
    ///
    /// # Errors
    ///
    /// Returns `SelectorSettingsError` if the limit or the stale threshold is zero,
    /// or the wrong and new shares add up to more than 100%.
    pub fn new(
        limit: u32,
        wrong_percent: u8,
        new_percent: u8,
        stale_after_days: u32,
    ) -> Result<Self, SelectorSettingsError> {
        if limit == 0 {
            return Err(SelectorSettingsError::InvalidLimit);
        }
        if u16::from(wrong_percent) + u16::from(new_percent) > 100 {
            return Err(SelectorSettingsError::InvalidShares {
                wrong: wrong_percent,
                new: new_percent,
            });
        }
        if stale_after_days == 0 {
            return Err(SelectorSettingsError::InvalidStaleAfterDays);
        }
        Ok(Self {
            limit,
            wrong_percent,
            new_percent,
            stale_after_days,
        })
    }

    /// Default mix with a different session size.
    ///
    /// # Errors
    ///
    /// Returns `SelectorSettingsError::InvalidLimit` if `limit` is zero.
    pub fn with_limit(limit: u32) -> Result<Self, SelectorSettingsError> {
        Self::new(
            limit,
            DEFAULT_WRONG_PERCENT,
            DEFAULT_NEW_PERCENT,
            DEFAULT_STALE_AFTER_DAYS,
        )
    }

    #[must_use]
    pub fn limit(&self) -> u32 {
        self.limit
    }

    #[must_use]
    pub fn wrong_percent(&self) -> u8 {
        self.wrong_percent
    }

    #[must_use]
    pub fn new_percent(&self) -> u8 {
        self.new_percent
    }

    #[must_use]
    pub fn stale_after_days(&self) -> u32 {
        self.stale_after_days
    }

    /// Per-pool quotas: shares are floored and the old pool absorbs the remainder.
    #[must_use]
    pub fn quotas(&self) -> Quotas {
        let limit = u64::from(self.limit);
        let share = |percent: u8| {
            usize::try_from(limit * u64::from(percent) / 100).unwrap_or(usize::MAX)
        };
        let total = usize::try_from(self.limit).unwrap_or(usize::MAX);
        let wrong = share(self.wrong_percent);
        let new = share(self.new_percent);
        Quotas {
            wrong,
            new,
            old: total.saturating_sub(wrong + new),
        }
    }
}

impl Default for SelectorSettings {
    fn default() -> Self {
        Self {
            limit: DEFAULT_SESSION_LIMIT,
            wrong_percent: DEFAULT_WRONG_PERCENT,
            new_percent: DEFAULT_NEW_PERCENT,
            stale_after_days: DEFAULT_STALE_AFTER_DAYS,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quotas {
    pub wrong: usize,
    pub new: usize,
    pub old: usize,
}

//
// ─── POOLS ─────────────────────────────────────────────────────────────────────
//

/// Ranked candidate pools built from the catalog. Pools may overlap.
#[derive(Debug, Clone)]
pub struct CandidatePools<'a> {
    pub wrong: Vec<&'a Word>,
    pub new: Vec<&'a Word>,
    pub old: Vec<&'a Word>,
}

impl<'a> CandidatePools<'a> {
    /// Build the three pools.
    ///
    /// Logs are indexed by word id; if a word has several logs the last one wins.
    /// Words without a log never count as old.
    pub fn build<R: Rng + ?Sized>(
        catalog: &'a [Word],
        logs: &[UserWordLog],
        target_lecture: &LectureId,
        stale_after_days: u32,
        today: NaiveDate,
        rng: &mut R,
    ) -> Self {
        let by_word: HashMap<&WordId, &UserWordLog> =
            logs.iter().map(|log| (&log.word_id, log)).collect();

        let mut wrong: Vec<(&Word, u32)> = catalog
            .iter()
            .filter_map(|w| {
                by_word
                    .get(&w.id)
                    .filter(|log| log.wrong_count > 0)
                    .map(|log| (w, log.wrong_count))
            })
            .collect();
        wrong.sort_by(|(a, a_wrong), (b, b_wrong)| {
            b_wrong.cmp(a_wrong).then_with(|| a.id.cmp(&b.id))
        });

        let mut new: Vec<&Word> = catalog
            .iter()
            .filter(|w| &w.lecture_id == target_lecture)
            .collect();
        new.shuffle(rng);

        let mut old: Vec<(&Word, NaiveDate)> = catalog
            .iter()
            .filter_map(|w| {
                by_word
                    .get(&w.id)
                    .filter(|log| log.days_since_seen(today) > i64::from(stale_after_days))
                    .map(|log| (w, log.last_seen))
            })
            .collect();
        old.sort_by(|(a, a_seen), (b, b_seen)| a_seen.cmp(b_seen).then_with(|| a.id.cmp(&b.id)));

        Self {
            wrong: wrong.into_iter().map(|(w, _)| w).collect(),
            new,
            old: old.into_iter().map(|(w, _)| w).collect(),
        }
    }
}

//
// ─── SELECTION ─────────────────────────────────────────────────────────────────
//

/// Result of composing a session, with per-pool counts for logging and tests.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSelection {
    pub words: Vec<Word>,
    pub from_wrong: usize,
    pub from_new: usize,
    pub from_old: usize,
    pub backfilled: usize,
}

impl SessionSelection {
    #[must_use]
    pub fn total(&self) -> usize {
        self.words.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}

/// Accumulates unique words up to the session limit.
struct Picker<'a> {
    limit: usize,
    selected: Vec<&'a Word>,
    seen: HashSet<&'a WordId>,
}

impl<'a> Picker<'a> {
    fn new(limit: usize) -> Self {
        Self {
            limit,
            selected: Vec::new(),
            seen: HashSet::new(),
        }
    }

    fn remaining(&self) -> usize {
        self.limit.saturating_sub(self.selected.len())
    }

    /// Take up to `count` words from `source` that are not already selected.
    fn fill(&mut self, source: &[&'a Word], count: usize) -> usize {
        let count = count.min(self.remaining());
        let mut added = 0;
        for &word in source {
            if added >= count {
                break;
            }
            if self.seen.insert(&word.id) {
                self.selected.push(word);
                added += 1;
            }
        }
        added
    }
}

/// Compose a session and report how many words each pool contributed.
///
/// Never fails: when the catalog holds fewer unique words than the limit, the
/// session is simply shorter.
pub fn plan_session<R: Rng + ?Sized>(
    catalog: &[Word],
    logs: &[UserWordLog],
    target_lecture: &LectureId,
    settings: &SelectorSettings,
    today: NaiveDate,
    rng: &mut R,
) -> SessionSelection {
    let pools = CandidatePools::build(
        catalog,
        logs,
        target_lecture,
        settings.stale_after_days(),
        today,
        rng,
    );
    let quotas = settings.quotas();
    let mut picker = Picker::new(usize::try_from(settings.limit()).unwrap_or(usize::MAX));

    let from_wrong = picker.fill(&pools.wrong, quotas.wrong);
    let from_new = picker.fill(&pools.new, quotas.new);
    let from_old = picker.fill(&pools.old, quotas.old);

    let mut backfilled = picker.fill(&pools.new, picker.remaining());
    if picker.remaining() > 0 {
        let mut everything: Vec<&Word> = catalog.iter().collect();
        everything.shuffle(rng);
        backfilled += picker.fill(&everything, picker.remaining());
    }

    let mut words: Vec<Word> = picker.selected.into_iter().cloned().collect();
    words.shuffle(rng);

    SessionSelection {
        words,
        from_wrong,
        from_new,
        from_old,
        backfilled,
    }
}

/// Select up to `settings.limit()` unique words for a practice session, in random order.
pub fn select_session<R: Rng + ?Sized>(
    catalog: &[Word],
    logs: &[UserWordLog],
    target_lecture: &LectureId,
    settings: &SelectorSettings,
    today: NaiveDate,
    rng: &mut R,
) -> Vec<Word> {
    plan_session(catalog, logs, target_lecture, settings, today, rng).words
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{PartOfSpeech, UserId, never_correct_date};
    use crate::time::fixed_today;
    use chrono::Days;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn word(id: &str, lecture: &str) -> Word {
        Word::new(
            WordId::new(id),
            "Standard",
            LectureId::new(lecture),
            format!("word-{id}"),
            PartOfSpeech::Noun,
            format!("meaning-{id}"),
        )
    }

    fn log(id: &str, wrong: u32, seen_days_ago: u64) -> UserWordLog {
        UserWordLog {
            user_id: UserId::new("u1"),
            word_id: WordId::new(id),
            correct_count: 1,
            wrong_count: wrong,
            last_seen: fixed_today().checked_sub_days(Days::new(seen_days_ago)).unwrap(),
            last_correct: never_correct_date(),
        }
    }

    /// `count` words in lecture `lecture`, ids `<prefix>00`, `<prefix>01`, ...
    fn words(prefix: &str, lecture: &str, count: usize) -> Vec<Word> {
        (0..count)
            .map(|i| word(&format!("{prefix}{i:02}"), lecture))
            .collect()
    }

    fn rng() -> StdRng {
        StdRng::seed_from_u64(7)
    }

    fn ids(words: &[Word]) -> HashSet<WordId> {
        words.iter().map(|w| w.id.clone()).collect()
    }

    #[test]
    fn default_quotas_are_eight_eight_four() {
        let quotas = SelectorSettings::default().quotas();
        assert_eq!(quotas, Quotas { wrong: 8, new: 8, old: 4 });
    }

    #[test]
    fn old_quota_absorbs_rounding() {
        let quotas = SelectorSettings::with_limit(7).unwrap().quotas();
        assert_eq!(quotas, Quotas { wrong: 2, new: 2, old: 3 });
        let quotas = SelectorSettings::with_limit(1).unwrap().quotas();
        assert_eq!(quotas, Quotas { wrong: 0, new: 0, old: 1 });
    }

    #[test]
    fn settings_reject_invalid_values() {
        assert_eq!(
            SelectorSettings::with_limit(0),
            Err(SelectorSettingsError::InvalidLimit)
        );
        assert!(matches!(
            SelectorSettings::new(20, 70, 40, 7),
            Err(SelectorSettingsError::InvalidShares { .. })
        ));
        assert_eq!(
            SelectorSettings::new(20, 40, 40, 0),
            Err(SelectorSettingsError::InvalidStaleAfterDays)
        );
    }

    #[test]
    fn selection_is_unique_bounded_and_from_catalog() {
        let mut catalog = words("A", "L1", 15);
        catalog.extend(words("B", "L2", 15));
        let logs: Vec<UserWordLog> = (0..10)
            .map(|i| log(&format!("B{i:02}"), i % 3, u64::from(i) * 2))
            .collect();
        let catalog_ids = ids(&catalog);

        for limit in [1, 5, 20, 29, 30, 50] {
            let settings = SelectorSettings::with_limit(limit).unwrap();
            let selected = select_session(
                &catalog,
                &logs,
                &LectureId::new("L1"),
                &settings,
                fixed_today(),
                &mut rng(),
            );
            let unique = ids(&selected);
            assert_eq!(unique.len(), selected.len(), "duplicates for limit {limit}");
            assert!(selected.len() <= limit as usize);
            assert_eq!(selected.len(), (limit as usize).min(catalog.len()));
            assert!(unique.is_subset(&catalog_ids));
        }
    }

    #[test]
    fn wrong_quota_is_honoured_when_pool_is_large_enough() {
        let mut catalog = words("N", "L1", 20);
        catalog.extend(words("X", "L0", 20));
        let logs: Vec<UserWordLog> = (0..12).map(|i| log(&format!("X{i:02}"), i + 1, 1)).collect();

        let selection = plan_session(
            &catalog,
            &logs,
            &LectureId::new("L1"),
            &SelectorSettings::default(),
            fixed_today(),
            &mut rng(),
        );

        assert_eq!(selection.from_wrong, 8);
        let with_misses = selection
            .words
            .iter()
            .filter(|w| logs.iter().any(|l| l.word_id == w.id && l.wrong_count > 0))
            .count();
        assert!(with_misses >= 8);
    }

    #[test]
    fn wrong_pool_prefers_most_misses_then_word_id() {
        let catalog = vec![word("C", "L0"), word("A", "L0"), word("B", "L0"), word("D", "L0")];
        let logs = vec![log("A", 2, 1), log("B", 5, 1), log("C", 2, 1), log("D", 1, 1)];

        let pools = CandidatePools::build(
            &catalog,
            &logs,
            &LectureId::new("L9"),
            7,
            fixed_today(),
            &mut rng(),
        );
        let order: Vec<&str> = pools.wrong.iter().map(|w| w.id.as_str()).collect();
        assert_eq!(order, vec!["B", "A", "C", "D"]);
    }

    #[test]
    fn old_pool_excludes_unseen_and_recent_words() {
        let catalog = vec![
            word("fresh", "L0"),
            word("week", "L0"),
            word("stale", "L0"),
            word("ancient", "L0"),
            word("never", "L0"),
        ];
        let logs = vec![
            log("fresh", 0, 1),
            log("week", 0, 7),
            log("stale", 0, 8),
            log("ancient", 0, 90),
        ];

        let pools = CandidatePools::build(
            &catalog,
            &logs,
            &LectureId::new("L9"),
            7,
            fixed_today(),
            &mut rng(),
        );
        let order: Vec<&str> = pools.old.iter().map(|w| w.id.as_str()).collect();
        assert_eq!(order, vec!["ancient", "stale"]);
    }

    #[test]
    fn last_log_wins_for_duplicate_entries() {
        let catalog = vec![word("A", "L0")];
        let logs = vec![log("A", 3, 1), log("A", 0, 1)];
        let pools = CandidatePools::build(
            &catalog,
            &logs,
            &LectureId::new("L9"),
            7,
            fixed_today(),
            &mut rng(),
        );
        assert!(pools.wrong.is_empty());
    }

    #[test]
    fn overlapping_word_counts_once_in_first_pool() {
        // "A" is wrong, in the target lecture, and stale at once.
        let catalog = vec![word("A", "L1"), word("B", "L1"), word("C", "L2")];
        let logs = vec![log("A", 4, 30)];

        let selection = plan_session(
            &catalog,
            &logs,
            &LectureId::new("L1"),
            &SelectorSettings::with_limit(5).unwrap(),
            fixed_today(),
            &mut rng(),
        );

        assert_eq!(selection.from_wrong, 1);
        assert_eq!(selection.from_new, 1);
        assert_eq!(selection.from_old, 0);
        assert_eq!(selection.backfilled, 1);
        assert_eq!(ids(&selection.words).len(), 3);
    }

    #[test]
    fn short_pools_are_backfilled_from_lecture_then_catalog() {
        let mut catalog = words("N", "L1", 12);
        catalog.extend(words("R", "L2", 30));

        let selection = plan_session(
            &catalog,
            &[],
            &LectureId::new("L1"),
            &SelectorSettings::default(),
            fixed_today(),
            &mut rng(),
        );

        assert_eq!(selection.from_wrong, 0);
        assert_eq!(selection.from_new, 8);
        assert_eq!(selection.from_old, 0);
        assert_eq!(selection.backfilled, 12);
        assert_eq!(selection.total(), 20);
        let from_lecture = selection
            .words
            .iter()
            .filter(|w| w.lecture_id == LectureId::new("L1"))
            .count();
        assert_eq!(from_lecture, 12);
    }

    #[test]
    fn small_catalog_yields_short_session() {
        let catalog = words("A", "L1", 3);
        let selection = plan_session(
            &catalog,
            &[],
            &LectureId::new("L1"),
            &SelectorSettings::default(),
            fixed_today(),
            &mut rng(),
        );
        assert_eq!(selection.total(), 3);
    }

    #[test]
    fn empty_catalog_yields_empty_session() {
        let selected = select_session(
            &[],
            &[log("ghost", 3, 30)],
            &LectureId::new("L1"),
            &SelectorSettings::default(),
            fixed_today(),
            &mut rng(),
        );
        assert!(selected.is_empty());
    }

    #[test]
    fn repeated_selection_draws_from_same_priority_pools() {
        let mut catalog = words("N", "L1", 10);
        catalog.extend(words("X", "L0", 30));
        let logs: Vec<UserWordLog> = (0..8).map(|i| log(&format!("X{i:02}"), 1, 1)).collect();
        let settings = SelectorSettings::default();
        let target = LectureId::new("L1");

        let first = plan_session(&catalog, &logs, &target, &settings, fixed_today(), &mut StdRng::seed_from_u64(1));
        let second = plan_session(&catalog, &logs, &target, &settings, fixed_today(), &mut StdRng::seed_from_u64(2));

        // Every wrong word fits the quota, so both sessions must contain all of them.
        let wrong_ids: HashSet<WordId> = logs.iter().map(|l| l.word_id.clone()).collect();
        assert!(wrong_ids.is_subset(&ids(&first.words)));
        assert!(wrong_ids.is_subset(&ids(&second.words)));
        assert_eq!(first.from_wrong, second.from_wrong);
        assert_eq!(first.from_new, second.from_new);
    }

    #[test]
    fn same_seed_reproduces_same_order() {
        let catalog = words("A", "L1", 25);
        let settings = SelectorSettings::default();
        let target = LectureId::new("L1");

        let a = select_session(&catalog, &[], &target, &settings, fixed_today(), &mut rng());
        let b = select_session(&catalog, &[], &target, &settings, fixed_today(), &mut rng());
        assert_eq!(a, b);
    }
}
