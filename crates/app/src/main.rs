use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

use drill_core::import::ImportWarning;
use drill_core::model::{CourseId, LectureId, UserId};
use drill_core::selector::SelectorSettings;
use services::{AppServices, Clock, StudyMode};

mod db_url;
mod study;

use db_url::{normalize_sqlite_url, prepare_sqlite_file};
use study::{CliResult, Prompter, run_grammar, run_vocab};

#[derive(Parser)]
#[command(name = "drill", version, about = "Vocabulary and grammar drills with spaced repetition")]
struct Cli {
    /// SQLite database URL or path
    #[arg(long = "db", env = "DRILL_DB_URL", default_value = "sqlite://drill.sqlite3", global = true)]
    db_url: String,

    /// Learner id used for sessions and stats
    #[arg(long = "user", env = "DRILL_USER_ID", default_value = "student", global = true)]
    user_id: String,

    /// Class whose lectures and words are used
    #[arg(long, env = "DRILL_CLASS", default_value = "Standard", global = true)]
    class: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Insert the demo lectures, words and courses
    Seed,

    /// List lectures of the class
    Lectures,

    /// List grammar courses
    Courses,

    /// Create a lecture at the end of the class
    AddLecture { name: String },

    /// Create an empty grammar course
    AddCourse { title: String },

    /// Take a vocabulary test focused on one lecture
    Vocab {
        #[arg(long)]
        lecture: String,

        /// Number of words in the session
        #[arg(long)]
        limit: Option<u32>,

        /// Fix the shuffle for a reproducible session
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Study a grammar course
    Grammar {
        #[arg(long)]
        course: String,

        #[arg(long, value_enum, default_value = "normal")]
        mode: ModeArg,
    },

    /// Import tab-separated words (`word  meaning  [pos]`); `-` reads stdin
    ImportWords {
        #[arg(long)]
        lecture: String,

        file: PathBuf,
    },

    /// Import tab-separated questions (`[lecture]  number  question  answer  [note]`); `-` reads stdin
    ImportQuestions {
        #[arg(long)]
        course: String,

        file: PathBuf,
    },

    /// Show learner statistics
    Stats {
        /// Report on one grammar course instead of vocabulary
        #[arg(long)]
        course: Option<String>,

        /// Teacher view: every student in the class
        #[arg(long, conflicts_with = "course")]
        overview: bool,

        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ModeArg {
    Normal,
    Weak,
    Due,
}

impl From<ModeArg> for StudyMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Normal => StudyMode::Normal,
            ModeArg::Weak => StudyMode::WeakOnly,
            ModeArg::Due => StudyMode::Due,
        }
    }
}

fn read_input(file: &Path) -> io::Result<String> {
    if file.as_os_str() == "-" {
        let mut text = String::new();
        io::stdin().read_to_string(&mut text)?;
        return Ok(text);
    }
    std::fs::read_to_string(file)
}

fn write_warnings(out: &mut impl Write, warnings: &[ImportWarning]) -> io::Result<()> {
    for warning in warnings {
        writeln!(out, "  skipped or adjusted {warning}")?;
    }
    Ok(())
}

fn print_warnings(warnings: &[ImportWarning]) {
    // Nothing useful to do if stderr itself is gone.
    let _ = write_warnings(&mut io::stderr().lock(), warnings);
}

async fn run() -> CliResult<()> {
    let cli = Cli::parse();
    let user = UserId::new(cli.user_id.trim());
    let class = cli.class.trim().to_owned();

    let db_url = normalize_sqlite_url(&cli.db_url);
    prepare_sqlite_file(&db_url)?;

    let (settings, seed) = match &cli.command {
        Command::Vocab { limit, seed, .. } => (
            limit.map_or_else(|| Ok(SelectorSettings::default()), SelectorSettings::with_limit)?,
            *seed,
        ),
        _ => (SelectorSettings::default(), None),
    };

    let app = AppServices::new_sqlite(&db_url, Clock::default_clock(), settings, seed).await?;
    tracing::debug!(db = %db_url, user = %user, class = %class, "storage ready");

    match cli.command {
        Command::Seed => {
            let report = app.seed_demo().await?;
            println!(
                "seeded {} lectures, {} words, {} courses",
                report.lectures, report.words, report.courses
            );
        }
        Command::Lectures => {
            let units = app.units();
            for lecture in units.list_lectures(&class).await? {
                let words = units.list_words(&lecture.id).await?;
                println!("{:>3}  {:<12} {} ({} words)", lecture.order, lecture.id.as_str(), lecture.name, words.len());
            }
        }
        Command::Courses => {
            for course in app.courses().list_courses().await? {
                println!("{}  {} ({} questions)", course.id(), course.title(), course.questions().len());
            }
        }
        Command::AddLecture { name } => {
            let lecture = app.units().create_lecture(&class, &name).await?;
            println!("created lecture {} ({})", lecture.id, lecture.name);
        }
        Command::AddCourse { title } => {
            let course = app.courses().create_course(&title).await?;
            println!("created course {} ({})", course.id(), course.title());
        }
        Command::Vocab { lecture, .. } => {
            let stdin = io::stdin();
            let mut prompter = Prompter::new(stdin.lock(), io::stdout());
            run_vocab(&app, &mut prompter, &user, &class, &LectureId::new(lecture)).await?;
        }
        Command::Grammar { course, mode } => {
            let stdin = io::stdin();
            let mut prompter = Prompter::new(stdin.lock(), io::stdout());
            run_grammar(&app, &mut prompter, &user, &CourseId::new(course), mode.into()).await?;
        }
        Command::ImportWords { lecture, file } => {
            let text = read_input(&file)?;
            let report = app
                .units()
                .import_words(&class, &LectureId::new(lecture), &text)
                .await
                .inspect_err(|err| print_warnings(err.import_warnings().unwrap_or_default()))?;
            println!("imported {} words", report.items.len());
            print_warnings(&report.warnings);
        }
        Command::ImportQuestions { course, file } => {
            let text = read_input(&file)?;
            let report = app
                .courses()
                .import_questions(&CourseId::new(course), &text)
                .await
                .inspect_err(|err| print_warnings(err.import_warnings().unwrap_or_default()))?;
            println!("imported {} questions", report.items.len());
            print_warnings(&report.warnings);
        }
        Command::Stats {
            course,
            overview,
            json,
        } => print_stats(&app, &user, &class, course, overview, json).await?,
    }
    Ok(())
}

async fn print_stats(
    app: &AppServices,
    user: &UserId,
    class: &str,
    course: Option<String>,
    overview: bool,
    json: bool,
) -> CliResult<()> {
    let stats = app.stats();

    if overview {
        let rows = stats.class_overview(class).await?;
        if json {
            println!("{}", serde_json::to_string_pretty(&rows)?);
            return Ok(());
        }
        for row in rows {
            let last = row
                .last_activity
                .map_or_else(|| "-".to_owned(), |d| d.to_string());
            let weak: Vec<&str> = row.weak_words.iter().map(|w| w.word.as_str()).collect();
            println!(
                "{:<16} {:>3}% of {:>4}  last {}  weak: {}",
                row.user_id.as_str(),
                row.accuracy_percent,
                row.total_attempts,
                last,
                weak.join(", ")
            );
        }
        return Ok(());
    }

    if let Some(course) = course {
        let report = stats.course_stats(user, &CourseId::new(course)).await?;
        if json {
            println!("{}", serde_json::to_string_pretty(&report)?);
        } else {
            println!(
                "mastery {}%  known {}  weak {}  unlearned {}  time {}s",
                report.mastery_percent,
                report.known,
                report.weak,
                report.unlearned,
                report.total_time_ms / 1000
            );
        }
        return Ok(());
    }

    let vocab = stats.vocab_stats(user, class).await?;
    if json {
        println!("{}", serde_json::to_string_pretty(&vocab)?);
        return Ok(());
    }
    println!(
        "accuracy {}% over {} attempts, {} words learned{}",
        vocab.accuracy_percent,
        vocab.total_attempts,
        vocab.learned,
        if vocab.studied_today { ", studied today" } else { "" }
    );
    for weak in &vocab.weak_words {
        println!(
            "  {:<16} {:<16} missed {}",
            weak.word,
            weak.meaning.as_deref().unwrap_or("-"),
            weak.wrong_count
        );
    }
    for report in stats.student_courses(user).await? {
        println!("  course {}: {}% mastered", report.title, report.stats.mastery_percent);
    }
    Ok(())
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(io::stderr)
        .init();

    if let Err(err) = run().await {
        eprintln!("{err}");
        std::process::exit(2);
    }
}
