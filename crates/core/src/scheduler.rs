//! State transitions applied after each graded answer.
//!
//! Both functions are pure: they take the prior record (if any) and return the
//! replacement record. Callers persist the result.

use chrono::{DateTime, Days, NaiveDate, Utc};

use crate::model::{
    LearningStatus, QuestionId, QuestionProgress, UserId, UserWordLog, WordId, never_correct_date,
};

//
// ─── INTERVALS ─────────────────────────────────────────────────────────────────
//

/// Interval after a first correct answer, after any miss, and after recovering from a miss.
pub const SHORT_INTERVAL_DAYS: u64 = 1;
/// Interval after two consecutive correct answers.
pub const MEDIUM_INTERVAL_DAYS: u64 = 3;
/// Interval for a streak of three or more. Growth stops here.
pub const MAX_INTERVAL_DAYS: u64 = 7;

/// Days until the next review for a given streak of consecutive correct answers.
///
/// ```
/// # use drill_core::scheduler::interval_days_for_streak;
/// assert_eq!(interval_days_for_streak(0), 1);
/// assert_eq!(interval_days_for_streak(2), 3);
/// assert_eq!(interval_days_for_streak(40), 7);
/// ```
#[must_use]
pub fn interval_days_for_streak(streak: u32) -> u64 {
    match streak {
        0 | 1 => SHORT_INTERVAL_DAYS,
        2 => MEDIUM_INTERVAL_DAYS,
        _ => MAX_INTERVAL_DAYS,
    }
}

fn days_after(today: NaiveDate, days: u64) -> NaiveDate {
    today.checked_add_days(Days::new(days)).unwrap_or(NaiveDate::MAX)
}

//
// ─── QUESTION REPETITION ───────────────────────────────────────────────────────
//

/// Compute the next mastery state of a grammar question.
///
/// - No prior state: `known`/streak 1 when correct, `weak`/streak 0 otherwise.
/// - Correct after `weak` or `unlearned`: back to `known` with streak 1.
/// - Correct while `known`: streak grows and the interval follows
///   [`interval_days_for_streak`].
/// - Any miss: `weak`, streak 0, regardless of how long the streak was.
///
/// `next_review_on` is counted from the calendar day of `now`, so several reviews
/// on the same day never push the date further out than one review would.
#[must_use]
pub fn advance(
    question_id: &QuestionId,
    prior: Option<&QuestionProgress>,
    correct: bool,
    now: DateTime<Utc>,
) -> QuestionProgress {
    let today = now.date_naive();

    let (status, streak) = match (prior, correct) {
        (_, false) => (LearningStatus::Weak, 0),
        (None, true) => (LearningStatus::Known, 1),
        (Some(p), true) => match p.status {
            LearningStatus::Weak | LearningStatus::Unlearned => (LearningStatus::Known, 1),
            LearningStatus::Known => (LearningStatus::Known, p.streak.saturating_add(1)),
        },
    };

    QuestionProgress {
        question_id: question_id.clone(),
        status,
        streak,
        last_reviewed_at: Some(now),
        next_review_on: Some(days_after(today, interval_days_for_streak(streak))),
    }
}

//
// ─── WORD LOG ──────────────────────────────────────────────────────────────────
//

/// Apply one final test outcome to a (user, word) accuracy log.
///
/// Exactly one counter grows by one. `last_seen` always moves to `today`;
/// `last_correct` only moves on a correct answer.
#[must_use]
pub fn update_log(
    user_id: &UserId,
    word_id: &WordId,
    prior: Option<&UserWordLog>,
    correct: bool,
    today: NaiveDate,
) -> UserWordLog {
    match prior {
        None => UserWordLog {
            user_id: user_id.clone(),
            word_id: word_id.clone(),
            correct_count: u32::from(correct),
            wrong_count: u32::from(!correct),
            last_seen: today,
            last_correct: if correct { today } else { never_correct_date() },
        },
        Some(log) => UserWordLog {
            correct_count: log.correct_count.saturating_add(u32::from(correct)),
            wrong_count: log.wrong_count.saturating_add(u32::from(!correct)),
            last_seen: today,
            last_correct: if correct { today } else { log.last_correct },
            ..log.clone()
        },
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::{fixed_now, fixed_today};
    use chrono::Duration;

    fn qid() -> QuestionId {
        QuestionId::new("q1")
    }

    fn known(streak: u32) -> QuestionProgress {
        QuestionProgress {
            question_id: qid(),
            status: LearningStatus::Known,
            streak,
            last_reviewed_at: Some(fixed_now() - Duration::days(3)),
            next_review_on: Some(fixed_today()),
        }
    }

    fn plus_days(n: u64) -> NaiveDate {
        fixed_today().checked_add_days(Days::new(n)).unwrap()
    }

    #[test]
    fn first_correct_answer_is_known_for_one_day() {
        let next = advance(&qid(), None, true, fixed_now());
        assert_eq!(next.status, LearningStatus::Known);
        assert_eq!(next.streak, 1);
        assert_eq!(next.next_review_on, Some(plus_days(1)));
        assert_eq!(next.last_reviewed_at, Some(fixed_now()));
    }

    #[test]
    fn first_wrong_answer_is_weak() {
        let next = advance(&qid(), None, false, fixed_now());
        assert_eq!(next.status, LearningStatus::Weak);
        assert_eq!(next.streak, 0);
        assert_eq!(next.next_review_on, Some(plus_days(1)));
    }

    #[test]
    fn known_streak_grows_to_three_days_then_seven() {
        let second = advance(&qid(), Some(&known(1)), true, fixed_now());
        assert_eq!(second.streak, 2);
        assert_eq!(second.next_review_on, Some(plus_days(3)));

        let third = advance(&qid(), Some(&known(2)), true, fixed_now());
        assert_eq!(third.streak, 3);
        assert_eq!(third.next_review_on, Some(plus_days(7)));

        let tenth = advance(&qid(), Some(&known(9)), true, fixed_now());
        assert_eq!(tenth.next_review_on, Some(plus_days(7)));
    }

    #[test]
    fn correct_after_weak_restarts_at_one() {
        let weak = QuestionProgress {
            status: LearningStatus::Weak,
            streak: 0,
            ..known(0)
        };
        let next = advance(&qid(), Some(&weak), true, fixed_now());
        assert_eq!(next.status, LearningStatus::Known);
        assert_eq!(next.streak, 1);
        assert_eq!(next.next_review_on, Some(plus_days(1)));
    }

    #[test]
    fn correct_after_unlearned_restarts_at_one() {
        let unlearned = QuestionProgress::unlearned(qid());
        let next = advance(&qid(), Some(&unlearned), true, fixed_now());
        assert_eq!(next.status, LearningStatus::Known);
        assert_eq!(next.streak, 1);
    }

    #[test]
    fn single_miss_erases_long_streak() {
        let next = advance(&qid(), Some(&known(5)), false, fixed_now());
        assert_eq!(next.status, LearningStatus::Weak);
        assert_eq!(next.streak, 0);
        assert_eq!(next.next_review_on, Some(plus_days(1)));
    }

    #[test]
    fn interval_counts_from_start_of_day() {
        let late = fixed_today().and_hms_opt(23, 59, 0).unwrap().and_utc();
        let early = fixed_today().and_hms_opt(0, 1, 0).unwrap().and_utc();
        let a = advance(&qid(), Some(&known(2)), true, late);
        let b = advance(&qid(), Some(&known(2)), true, early);
        assert_eq!(a.next_review_on, b.next_review_on);
    }

    #[test]
    fn streak_implies_known() {
        let mut state: Option<QuestionProgress> = None;
        for correct in [true, true, false, true, false, false, true, true, true] {
            let next = advance(&qid(), state.as_ref(), correct, fixed_now());
            if next.streak > 0 {
                assert_eq!(next.status, LearningStatus::Known);
            }
            state = Some(next);
        }
    }

    #[test]
    fn update_log_without_prior() {
        let user = UserId::new("u1");
        let word = WordId::new("W001");

        let right = update_log(&user, &word, None, true, fixed_today());
        assert_eq!((right.correct_count, right.wrong_count), (1, 0));
        assert_eq!(right.last_correct, fixed_today());

        let wrong = update_log(&user, &word, None, false, fixed_today());
        assert_eq!((wrong.correct_count, wrong.wrong_count), (0, 1));
        assert_eq!(wrong.last_correct, never_correct_date());
        assert_eq!(wrong.last_seen, fixed_today());
    }

    #[test]
    fn update_log_counters_are_additive() {
        let user = UserId::new("u1");
        let word = WordId::new("W001");
        let day1 = fixed_today();
        let day2 = day1.succ_opt().unwrap();

        let first = update_log(&user, &word, None, true, day1);
        let second = update_log(&user, &word, Some(&first), false, day2);

        assert_eq!((second.correct_count, second.wrong_count), (1, 1));
        assert_eq!(second.last_seen, day2);
        assert_eq!(second.last_correct, day1);
        assert_eq!(second.total_attempts(), 2);
    }

    #[test]
    fn update_log_keeps_identity_of_prior() {
        let prior = update_log(&UserId::new("u1"), &WordId::new("W9"), None, false, fixed_today());
        // Identity always comes from the stored record.
        let next = update_log(&UserId::new("other"), &WordId::new("W9"), Some(&prior), true, fixed_today());
        assert_eq!(next.user_id, UserId::new("u1"));
    }
}
