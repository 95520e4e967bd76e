//! Tab-separated bulk import for course questions and lecture words.
//!
//! Parsing is lenient: bad rows are skipped and reported as warnings, good rows
//! are returned so the caller can commit a partial import.

use thiserror::Error;
use uuid::Uuid;

use crate::model::{Course, LectureId, PartOfSpeech, Question, QuestionId, Word, WordId};

//
// ─── ERRORS & WARNINGS ─────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ImportError {
    #[error("no valid rows found ({} warnings)", warnings.len())]
    NothingImported { warnings: Vec<ImportWarning> },
}

impl ImportError {
    /// Per-line reasons every row was rejected.
    #[must_use]
    pub fn warnings(&self) -> &[ImportWarning] {
        match self {
            ImportError::NothingImported { warnings } => warnings,
        }
    }
}

/// Problem found on a single input row.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ImportIssue {
    #[error("expected at least {expected} tab-separated columns, found {found}")]
    TooFewColumns { expected: usize, found: usize },

    #[error("invalid question number: {raw:?}")]
    InvalidNumber { raw: String },

    #[error("question or answer is empty")]
    EmptyQuestionOrAnswer,

    #[error("word or meaning is empty")]
    EmptyWordOrMeaning,

    #[error("question number {number} already exists or is repeated")]
    DuplicateNumber { number: u32 },

    #[error("unknown part of speech {raw:?}, using the default")]
    UnknownPartOfSpeech { raw: String },
}

impl ImportIssue {
    /// True when the row was dropped; false when it was imported anyway.
    #[must_use]
    pub fn skips_row(&self) -> bool {
        !matches!(
            self,
            ImportIssue::DuplicateNumber { .. } | ImportIssue::UnknownPartOfSpeech { .. }
        )
    }
}

/// Issue tagged with its 1-based line number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportWarning {
    pub line: usize,
    pub issue: ImportIssue,
}

impl std::fmt::Display for ImportWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "line {}: {}", self.line, self.issue)
    }
}

/// Accepted rows plus the warnings raised while reading them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportReport<T> {
    pub items: Vec<T>,
    pub warnings: Vec<ImportWarning>,
}

impl<T> ImportReport<T> {
    /// Number of rows that were dropped.
    #[must_use]
    pub fn skipped(&self) -> usize {
        self.warnings.iter().filter(|w| w.issue.skips_row()).count()
    }

    /// Turn an empty report into an error so callers never commit nothing.
    ///
    /// # Errors
    ///
    /// Returns `ImportError::NothingImported` when no row was accepted.
    pub fn require_items(self) -> Result<Self, ImportError> {
        if self.items.is_empty() {
            return Err(ImportError::NothingImported {
                warnings: self.warnings,
            });
        }
        Ok(self)
    }
}

/// Non-blank lines with their 1-based line numbers, split on tabs and trimmed.
fn rows(text: &str) -> impl Iterator<Item = (usize, Vec<&str>)> {
    text.lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(idx, line)| (idx + 1, line.split('\t').map(str::trim).collect()))
}

//
// ─── QUESTIONS ─────────────────────────────────────────────────────────────────
//

/// Parse pasted grammar questions.
///
/// Row shapes:
/// - `lecture \t number \t question \t answer [\t explanation]`
/// - `number \t question \t answer` (lecture inherited from the previous row)
///
/// An empty lecture column also inherits. Numbers that clash with `course` or an
/// earlier row are accepted with a warning. Accepted questions are sorted by number.
#[must_use]
pub fn parse_questions(text: &str, course: &Course) -> ImportReport<Question> {
    let mut items: Vec<Question> = Vec::new();
    let mut warnings = Vec::new();
    let mut lecture = String::new();

    for (line, cols) in rows(text) {
        let (lecture_col, number_col, question, answer, explanation) = match cols.as_slice() {
            [lec, num, q, a, rest @ ..] => (*lec, *num, *q, *a, rest.first().copied()),
            [num, q, a] => ("", *num, *q, *a, None),
            _ => {
                warnings.push(ImportWarning {
                    line,
                    issue: ImportIssue::TooFewColumns {
                        expected: 3,
                        found: cols.len(),
                    },
                });
                continue;
            }
        };

        if !lecture_col.is_empty() {
            lecture = lecture_col.to_owned();
        }

        let Ok(number) = number_col.parse::<u32>() else {
            warnings.push(ImportWarning {
                line,
                issue: ImportIssue::InvalidNumber {
                    raw: number_col.to_owned(),
                },
            });
            continue;
        };

        if question.is_empty() || answer.is_empty() {
            warnings.push(ImportWarning {
                line,
                issue: ImportIssue::EmptyQuestionOrAnswer,
            });
            continue;
        }

        if course.has_number(number) || items.iter().any(|q| q.number == number) {
            warnings.push(ImportWarning {
                line,
                issue: ImportIssue::DuplicateNumber { number },
            });
        }

        let question = if lecture.is_empty() {
            question.to_owned()
        } else {
            format!("[{lecture}] {question}")
        };

        items.push(Question {
            id: QuestionId::new(Uuid::new_v4().to_string()),
            number,
            question,
            answer: answer.to_owned(),
            teacher_comment: explanation.filter(|e| !e.is_empty()).map(str::to_owned),
        });
    }

    items.sort_by_key(|q| q.number);
    ImportReport { items, warnings }
}

//
// ─── WORDS ─────────────────────────────────────────────────────────────────────
//

/// Parse pasted vocabulary rows: `word \t meaning [\t part-of-speech]`.
///
/// Ids are `W_<batch_stamp>_<row index>`, where `batch_stamp` is normally the
/// import time in unix milliseconds.
#[must_use]
pub fn parse_words(
    text: &str,
    class: &str,
    lecture_id: &LectureId,
    batch_stamp: i64,
) -> ImportReport<Word> {
    let mut items = Vec::new();
    let mut warnings = Vec::new();

    for (line, cols) in rows(text) {
        let (word, meaning, pos_col) = match cols.as_slice() {
            [w, m, rest @ ..] => (*w, *m, rest.first().copied()),
            _ => {
                warnings.push(ImportWarning {
                    line,
                    issue: ImportIssue::TooFewColumns {
                        expected: 2,
                        found: cols.len(),
                    },
                });
                continue;
            }
        };

        if word.is_empty() || meaning.is_empty() {
            warnings.push(ImportWarning {
                line,
                issue: ImportIssue::EmptyWordOrMeaning,
            });
            continue;
        }

        let pos = match pos_col.filter(|p| !p.is_empty()) {
            None => PartOfSpeech::default(),
            Some(raw) => raw.parse().unwrap_or_else(|_| {
                warnings.push(ImportWarning {
                    line,
                    issue: ImportIssue::UnknownPartOfSpeech {
                        raw: raw.to_owned(),
                    },
                });
                PartOfSpeech::default()
            }),
        };

        let mut entry = Word::new(
            WordId::new(format!("W_{batch_stamp}_{}", line - 1)),
            class,
            lecture_id.clone(),
            word,
            pos,
            meaning,
        );
        entry.image_prompt = Some(format!("{word} {meaning}"));
        items.push(entry);
    }

    ImportReport { items, warnings }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::CourseId;
    use crate::time::fixed_now;

    fn course_with(numbers: &[u32]) -> Course {
        let questions = numbers
            .iter()
            .map(|n| Question {
                id: QuestionId::new(format!("existing-{n}")),
                number: *n,
                question: "q".into(),
                answer: "a".into(),
                teacher_comment: None,
            })
            .collect();
        Course::from_persisted(CourseId::new("c1"), "Tenses", questions, fixed_now()).unwrap()
    }

    #[test]
    fn questions_inherit_lecture_and_keep_explanation() {
        let text = "時制(1)\t1\t現在形の意味は？\t現在・過去・未来\t基本\n\t2\t進行形は？\tbe動詞＋ing\n3\tQ3\tA3";
        let report = parse_questions(text, &course_with(&[]));

        assert!(report.warnings.is_empty(), "{:?}", report.warnings);
        assert_eq!(report.items.len(), 3);
        assert_eq!(report.items[0].question, "[時制(1)] 現在形の意味は？");
        assert_eq!(report.items[0].teacher_comment.as_deref(), Some("基本"));
        assert_eq!(report.items[1].question, "[時制(1)] 進行形は？");
        assert_eq!(report.items[1].teacher_comment, None);
        assert_eq!(report.items[2].question, "[時制(1)] Q3");
    }

    #[test]
    fn bad_rows_are_skipped_with_line_numbers() {
        let text = "L\tx\tq\ta\nonly-one-column\nL\t2\t\ta\n\nL\t3\tq\ta";
        let report = parse_questions(text, &course_with(&[]));

        assert_eq!(report.items.len(), 1);
        assert_eq!(report.items[0].number, 3);
        let lines: Vec<usize> = report.warnings.iter().map(|w| w.line).collect();
        assert_eq!(lines, vec![1, 2, 3]);
        assert_eq!(report.skipped(), 3);
        assert!(matches!(
            report.warnings[1].issue,
            ImportIssue::TooFewColumns { expected: 3, found: 1 }
        ));
    }

    #[test]
    fn duplicate_numbers_warn_but_import() {
        let text = "L\t1\tq\ta\nL\t5\tq\ta\nL\t5\tq2\ta2";
        let report = parse_questions(text, &course_with(&[1]));

        assert_eq!(report.items.len(), 3);
        assert_eq!(report.warnings.len(), 2);
        assert_eq!(report.skipped(), 0);
        assert!(report
            .warnings
            .iter()
            .all(|w| matches!(w.issue, ImportIssue::DuplicateNumber { .. })));
    }

    #[test]
    fn questions_without_lecture_are_not_prefixed() {
        let report = parse_questions("7\tWhat?\tThat.", &course_with(&[]));
        assert_eq!(report.items[0].question, "What?");
    }

    #[test]
    fn imported_questions_are_sorted() {
        let report = parse_questions("9\tq\ta\n2\tq\ta\n5\tq\ta", &course_with(&[]));
        let numbers: Vec<u32> = report.items.iter().map(|q| q.number).collect();
        assert_eq!(numbers, vec![2, 5, 9]);
    }

    #[test]
    fn words_parse_with_default_part_of_speech() {
        let text = "estimate\t推定する\nspecies\t種\tnoun\nbad-row\nrun\t走る\tgerund";
        let report = parse_words(text, "Standard", &LectureId::new("L9"), 1_700);

        assert_eq!(report.items.len(), 3);
        assert_eq!(report.items[0].id, WordId::new("W_1700_0"));
        assert_eq!(report.items[0].pos, PartOfSpeech::Verb);
        assert_eq!(report.items[0].image_prompt.as_deref(), Some("estimate 推定する"));
        assert_eq!(report.items[1].pos, PartOfSpeech::Noun);
        assert_eq!(report.items[2].id, WordId::new("W_1700_3"));
        assert_eq!(report.skipped(), 1);
        assert!(matches!(
            report.warnings[1].issue,
            ImportIssue::UnknownPartOfSpeech { .. }
        ));
    }

    #[test]
    fn empty_report_is_an_error() {
        let report = parse_words("\t\n", "Standard", &LectureId::new("L9"), 0);
        let err = report.require_items().unwrap_err();
        assert!(matches!(err, ImportError::NothingImported { .. }));
    }

    #[test]
    fn warning_display_includes_line() {
        let warning = ImportWarning {
            line: 4,
            issue: ImportIssue::EmptyWordOrMeaning,
        };
        assert_eq!(warning.to_string(), "line 4: word or meaning is empty");
    }
}
