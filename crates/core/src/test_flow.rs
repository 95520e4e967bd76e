//! Two-phase vocabulary test.
//!
//! Each word is first shown for recognition (word -> meaning). A miss there is
//! final for the word. A hit moves the same word to recall (meaning -> word),
//! whose grade is final either way. Exactly one outcome is produced per word.

use thiserror::Error;

use crate::model::{Word, WordId};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum TestFlowError {
    #[error("no words to test")]
    Empty,

    #[error("test already completed")]
    Completed,

    #[error("answer must be revealed before grading")]
    AnswerHidden,
}

/// Which side of the card is being asked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TestPhase {
    /// Word shown, learner recalls the meaning.
    Recognition,
    /// Meaning shown, learner recalls the word.
    Recall,
}

/// Final result for one word.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WordOutcome {
    pub word_id: WordId,
    pub correct: bool,
}

/// What a grade did to the test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TestStep {
    /// Recognition passed; the same word is now asked in recall.
    MovedToRecall,
    /// The word is finished and its outcome must be recorded.
    Recorded {
        outcome: WordOutcome,
        finished: bool,
    },
}

/// Snapshot of how far a test has progressed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestProgress {
    pub total: usize,
    pub answered: usize,
    pub remaining: usize,
    pub is_complete: bool,
}

/// In-memory state machine for one vocabulary test.
///
/// No state survives the test; an abandoned test leaves only the outcomes
/// already recorded by the caller.
#[derive(Debug, Clone)]
pub struct VocabTest {
    words: Vec<Word>,
    current: usize,
    phase: TestPhase,
    answer_shown: bool,
    outcomes: Vec<WordOutcome>,
}

impl VocabTest {
    /// Start a test over the given words, in the given order.
    ///
    /// # Errors
    ///
    /// Returns `TestFlowError::Empty` if `words` is empty.
    pub fn new(words: Vec<Word>) -> Result<Self, TestFlowError> {
        if words.is_empty() {
            return Err(TestFlowError::Empty);
        }
        Ok(Self {
            words,
            current: 0,
            phase: TestPhase::Recognition,
            answer_shown: false,
            outcomes: Vec::new(),
        })
    }

    #[must_use]
    pub fn words(&self) -> &[Word] {
        &self.words
    }

    #[must_use]
    pub fn current_word(&self) -> Option<&Word> {
        self.words.get(self.current)
    }

    /// Zero-based position of the current word.
    #[must_use]
    pub fn position(&self) -> usize {
        self.current
    }

    #[must_use]
    pub fn phase(&self) -> TestPhase {
        self.phase
    }

    #[must_use]
    pub fn answer_shown(&self) -> bool {
        self.answer_shown
    }

    #[must_use]
    pub fn outcomes(&self) -> &[WordOutcome] {
        &self.outcomes
    }

    #[must_use]
    pub fn correct_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.correct).count()
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.current >= self.words.len()
    }

    #[must_use]
    pub fn progress(&self) -> TestProgress {
        TestProgress {
            total: self.words.len(),
            answered: self.outcomes.len(),
            remaining: self.words.len().saturating_sub(self.current),
            is_complete: self.is_complete(),
        }
    }

    /// Flip the card for the current phase.
    ///
    /// # Errors
    ///
    /// Returns `TestFlowError::Completed` once every word has an outcome.
    pub fn reveal(&mut self) -> Result<(), TestFlowError> {
        if self.is_complete() {
            return Err(TestFlowError::Completed);
        }
        self.answer_shown = true;
        Ok(())
    }

    /// Grade the current phase of the current word.
    ///
    /// # Errors
    ///
    /// Returns `TestFlowError::Completed` if the test is over, or
    /// `TestFlowError::AnswerHidden` if the answer has not been revealed.
    pub fn grade(&mut self, correct: bool) -> Result<TestStep, TestFlowError> {
        let Some(word) = self.current_word() else {
            return Err(TestFlowError::Completed);
        };
        if !self.answer_shown {
            return Err(TestFlowError::AnswerHidden);
        }
        let word_id = word.id.clone();

        if self.phase == TestPhase::Recognition && correct {
            self.phase = TestPhase::Recall;
            self.answer_shown = false;
            return Ok(TestStep::MovedToRecall);
        }

        let outcome = WordOutcome { word_id, correct };
        self.outcomes.push(outcome.clone());
        self.current += 1;
        self.phase = TestPhase::Recognition;
        self.answer_shown = false;

        Ok(TestStep::Recorded {
            outcome,
            finished: self.is_complete(),
        })
    }
}
