//! Demo catalog and courses for a fresh database.

use chrono::{DateTime, Utc};
use drill_core::model::{
    Course, CourseId, Lecture, LectureId, PartOfSpeech, Question, QuestionId, Word, WordId,
};

use crate::repository::{Storage, StorageError};

/// Class the demo lectures belong to.
pub const DEMO_CLASS: &str = "Standard";

/// What a seed run inserted. Existing rows are never overwritten.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedReport {
    pub lectures: usize,
    pub words: usize,
    pub courses: usize,
}

#[must_use]
pub fn demo_lectures() -> Vec<Lecture> {
    vec![
        Lecture::new(LectureId::new("L001"), DEMO_CLASS, "Unit 1: Basic Verbs", 1),
        Lecture::new(LectureId::new("L002"), DEMO_CLASS, "Unit 2: Daily Life", 2),
    ]
}

#[must_use]
pub fn demo_words() -> Vec<Word> {
    let rows = [
        ("W001", "L001", "accept", PartOfSpeech::Verb, "受け入れる", "ad(to) + capere(take)", "acceptance", "Please accept my apology.", "A person receiving a gift with a smile"),
        ("W002", "L001", "reject", PartOfSpeech::Verb, "拒絶する", "re(back) + jacere(throw)", "rejection", "He rejected the offer.", "A person pushing away a contract paper"),
        ("W003", "L001", "consider", PartOfSpeech::Verb, "よく考える", "con(with) + sider(star) -> observe stars", "consideration", "We will consider your proposal.", "A person thinking deeply looking at a star chart"),
        ("W004", "L002", "habit", PartOfSpeech::Noun, "習慣", "habere(have)", "habitual", "Early rising is a good habit.", "A person jogging in the morning park"),
    ];

    rows.into_iter()
        .map(|(id, lecture, word, pos, meaning, etymology, derivation, example, prompt)| {
            let mut w = Word::new(WordId::new(id), DEMO_CLASS, LectureId::new(lecture), word, pos, meaning);
            w.etymology = Some(etymology.to_owned());
            w.derivation = Some(derivation.to_owned());
            w.example = Some(example.to_owned());
            w.image_prompt = Some(prompt.to_owned());
            w
        })
        .collect()
}

fn question(id: &str, number: u32, q: &str, a: &str, comment: Option<&str>) -> Question {
    Question {
        id: QuestionId::new(id),
        number,
        question: q.to_owned(),
        answer: a.to_owned(),
        teacher_comment: comment.map(str::to_owned),
    }
}

/// The two sample courses, stamped with `now`.
///
/// # Errors
///
/// Returns `StorageError::Serialization` if a course fails validation.
pub fn demo_courses(now: DateTime<Utc>) -> Result<Vec<Course>, StorageError> {
    let grammar = Course::from_persisted(
        CourseId::new("demo-course-1"),
        "中学英文法 (Sample)",
        vec![
            question("q1", 1, "This is a pen.", "これはペンです。", Some("基本文型")),
            question("q2", 2, "I play soccer.", "私はサッカーをします。", Some("一般動詞")),
            question("q3", 3, "She is happy.", "彼女は幸せです。", Some("Be動詞")),
        ],
        now,
    );
    let vocab = Course::from_persisted(
        CourseId::new("demo-course-2"),
        "英単語ターゲット (Sample)",
        vec![
            question("w1", 1, "Apple", "りんご", None),
            question("w2", 2, "Run", "走る", None),
            question("w3", 3, "Beautiful", "美しい", None),
        ],
        now,
    );

    [grammar, vocab]
        .into_iter()
        .map(|c| c.map_err(|e| StorageError::Serialization(e.to_string())))
        .collect()
}

/// Insert whatever part of the demo data is missing.
///
/// # Errors
///
/// Returns `StorageError` if any read or write fails.
pub async fn seed_demo(storage: &Storage, now: DateTime<Utc>) -> Result<SeedReport, StorageError> {
    let mut report = SeedReport::default();

    let existing_lectures = storage.vocab.list_lectures(DEMO_CLASS).await?;
    for lecture in demo_lectures() {
        if existing_lectures.iter().all(|l| l.id != lecture.id) {
            storage.vocab.add_lecture(&lecture).await?;
            report.lectures += 1;
        }
    }

    let existing_words = storage.vocab.list_words_by_class(DEMO_CLASS).await?;
    let missing: Vec<Word> = demo_words()
        .into_iter()
        .filter(|w| existing_words.iter().all(|e| e.id != w.id))
        .collect();
    if !missing.is_empty() {
        storage.vocab.add_words(&missing).await?;
        report.words = missing.len();
    }

    for course in demo_courses(now)? {
        if storage.courses.get_course(course.id()).await?.is_none() {
            storage.courses.save_course(&course).await?;
            report.courses += 1;
        }
    }

    tracing::info!(
        lectures = report.lectures,
        words = report.words,
        courses = report.courses,
        "demo data seeded"
    );
    Ok(report)
}
