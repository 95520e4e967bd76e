//! Self-graded study sessions over grammar courses.

mod service;
mod session;

pub use service::GrammarSessionService;
pub use session::{GradedQuestion, GrammarSession, StudyMode, StudyProgress, StudyState};
