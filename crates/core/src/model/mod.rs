mod course;
mod ids;
mod progress;
mod word;
mod word_log;

pub use ids::{CourseId, LectureId, ParseIdError, QuestionId, UserId, WordId};

pub use course::{Course, CourseError, Question};
pub use progress::{LearningStatus, ProgressError, QuestionProgress, StudentCourseProgress};
pub use word::{Lecture, PartOfSpeech, Word, WordError};
pub use word_log::{UserWordLog, never_correct_date};
