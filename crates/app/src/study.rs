//! Line-based study loops for the terminal.

use std::io::{self, BufRead, Write};

use drill_core::model::{CourseId, LectureId, UserId};
use drill_core::test_flow::TestPhase;
use services::{AppServices, StudyMode, StudyState};

pub type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

/// Reads one-line answers; `q` or end of input stops the session.
pub struct Prompter<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> Prompter<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    fn say(&mut self, text: &str) -> io::Result<()> {
        writeln!(self.output, "{text}")
    }

    fn read(&mut self, prompt: &str) -> io::Result<Option<String>> {
        write!(self.output, "{prompt}")?;
        self.output.flush()?;
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        let line = line.trim().to_ascii_lowercase();
        Ok((line != "q").then_some(line))
    }

    /// Wait for Enter; `false` when the learner quits.
    fn pause(&mut self, prompt: &str) -> io::Result<bool> {
        Ok(self.read(prompt)?.is_some())
    }

    /// Ask until `y` or `n`; `None` when the learner quits.
    fn grade(&mut self) -> io::Result<Option<bool>> {
        loop {
            match self.read("correct? [y/n/q] ")?.as_deref() {
                None => return Ok(None),
                Some("y" | "yes") => return Ok(Some(true)),
                Some("n" | "no") => return Ok(Some(false)),
                Some(_) => {}
            }
        }
    }
}

/// Run a two-phase vocabulary test; returns (answered, correct).
pub async fn run_vocab<R: BufRead, W: Write>(
    app: &AppServices,
    prompter: &mut Prompter<R, W>,
    user: &UserId,
    class: &str,
    lecture: &LectureId,
) -> CliResult<(usize, usize)> {
    let vocab = app.vocab_sessions();
    let mut test = vocab.start_test(user, class, lecture).await?;
    let total = test.words().len();

    while let Some(word) = test.current_word().cloned() {
        let (front, back) = match test.phase() {
            TestPhase::Recognition => (word.word.clone(), word.meaning.clone()),
            TestPhase::Recall => (word.meaning.clone(), word.word.clone()),
        };
        prompter.say(&format!("\n[{}/{}] {front}", test.position() + 1, total))?;
        if !prompter.pause("(enter to reveal) ")? {
            break;
        }
        test.reveal()?;
        prompter.say(&format!("  -> {back}"))?;
        if let Some(example) = word.example.as_deref().filter(|_| test.phase() == TestPhase::Recognition) {
            prompter.say(&format!("     e.g. {example}"))?;
        }

        let Some(correct) = prompter.grade()? else {
            break;
        };
        vocab.answer_current(user, &mut test, correct).await?;
    }

    let summary = (test.outcomes().len(), test.correct_count());
    prompter.say(&format!("\n{} / {} correct", summary.1, summary.0))?;
    Ok(summary)
}

/// Run a grammar study session; returns (answered, correct).
pub async fn run_grammar<R: BufRead, W: Write>(
    app: &AppServices,
    prompter: &mut Prompter<R, W>,
    student: &UserId,
    course: &CourseId,
    mode: StudyMode,
) -> CliResult<(usize, usize)> {
    let grammar = app.grammar_sessions();
    let mut session = grammar.start(student, course, mode).await?;
    let total = session.questions().len();

    while let Some(question) = session.current_question().cloned() {
        let position = session.progress().answered + 1;
        prompter.say(&format!("\n[{position}/{total}] Q{}. {}", question.number, question.question))?;
        if !prompter.pause("(enter to reveal) ")? {
            break;
        }
        grammar.reveal(&mut session)?;
        prompter.say(&format!("  -> {}", question.answer))?;

        let Some(correct) = prompter.grade()? else {
            break;
        };
        let graded = grammar.grade(&mut session, correct).await?;
        if graded.state == StudyState::Comment {
            prompter.say(&format!("  note: {}", question.comment().unwrap_or_default()))?;
            if !prompter.pause("(enter to continue) ")? {
                break;
            }
            grammar.dismiss_comment(&mut session)?;
        }
    }

    let progress = session.progress();
    prompter.say(&format!("\n{} / {} correct", progress.correct, progress.answered))?;
    Ok((progress.answered, progress.correct))
}
