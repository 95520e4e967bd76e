#![forbid(unsafe_code)]

pub mod app_services;
pub mod course_service;
pub mod error;
pub mod grammar;
pub mod stats_service;
pub mod unit_service;
pub mod vocab_session;

pub use drill_core::Clock;

pub use app_services::AppServices;
pub use course_service::CourseService;
pub use error::{
    AppServicesError, CourseServiceError, GrammarSessionError, StatsError, UnitServiceError,
    VocabSessionError,
};
pub use grammar::{GradedQuestion, GrammarSession, GrammarSessionService, StudyMode, StudyState};
pub use stats_service::{CourseReport, StatsService};
pub use unit_service::UnitService;
pub use vocab_session::{VocabAnswer, VocabSessionService};
