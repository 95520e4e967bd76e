use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::model::ids::{LectureId, WordId};

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum WordError {
    #[error("unknown part of speech: {0}")]
    UnknownPartOfSpeech(String),
}

//
// ─── PART OF SPEECH ────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PartOfSpeech {
    Noun,
    /// Bulk imports without an explicit column land here.
    #[default]
    Verb,
    Adjective,
    Adverb,
    Preposition,
    Conjunction,
    Pronoun,
    Interjection,
    Phrase,
}

impl PartOfSpeech {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            PartOfSpeech::Noun => "noun",
            PartOfSpeech::Verb => "verb",
            PartOfSpeech::Adjective => "adjective",
            PartOfSpeech::Adverb => "adverb",
            PartOfSpeech::Preposition => "preposition",
            PartOfSpeech::Conjunction => "conjunction",
            PartOfSpeech::Pronoun => "pronoun",
            PartOfSpeech::Interjection => "interjection",
            PartOfSpeech::Phrase => "phrase",
        }
    }
}

impl fmt::Display for PartOfSpeech {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PartOfSpeech {
    type Err = WordError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "noun" => Ok(PartOfSpeech::Noun),
            "verb" => Ok(PartOfSpeech::Verb),
            "adjective" => Ok(PartOfSpeech::Adjective),
            "adverb" => Ok(PartOfSpeech::Adverb),
            "preposition" => Ok(PartOfSpeech::Preposition),
            "conjunction" => Ok(PartOfSpeech::Conjunction),
            "pronoun" => Ok(PartOfSpeech::Pronoun),
            "interjection" => Ok(PartOfSpeech::Interjection),
            "phrase" => Ok(PartOfSpeech::Phrase),
            _ => Err(WordError::UnknownPartOfSpeech(s.to_owned())),
        }
    }
}

//
// ─── WORD ──────────────────────────────────────────────────────────────────────
//

/// Vocabulary catalog entry.
///
/// Words are owned by the catalog; the scheduler only reads them and compares
/// them by `id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Word {
    pub id: WordId,
    pub class: String,
    pub lecture_id: LectureId,
    pub word: String,
    pub pos: PartOfSpeech,
    pub meaning: String,
    pub etymology: Option<String>,
    pub derivation: Option<String>,
    pub example: Option<String>,
    pub pronunciation: Option<String>,
    pub image_prompt: Option<String>,
}

impl Word {
    /// Creates a word with only the required lexical fields set.
    #[must_use]
    pub fn new(
        id: WordId,
        class: impl Into<String>,
        lecture_id: LectureId,
        word: impl Into<String>,
        pos: PartOfSpeech,
        meaning: impl Into<String>,
    ) -> Self {
        Self {
            id,
            class: class.into(),
            lecture_id,
            word: word.into(),
            pos,
            meaning: meaning.into(),
            etymology: None,
            derivation: None,
            example: None,
            pronunciation: None,
            image_prompt: None,
        }
    }
}

//
// ─── LECTURE ───────────────────────────────────────────────────────────────────
//

/// Named grouping of words inside a class.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lecture {
    pub id: LectureId,
    pub class: String,
    pub name: String,
    pub order: u32,
}

impl Lecture {
    #[must_use]
    pub fn new(id: LectureId, class: impl Into<String>, name: impl Into<String>, order: u32) -> Self {
        Self {
            id,
            class: class.into(),
            name: name.into(),
            order,
        }
    }
}
