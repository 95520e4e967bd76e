use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// Catalog and progress records are keyed by opaque strings handed out by the
// store (sheet row ids, uuids, "W_<millis>_<n>" import ids), so every id here
// wraps a non-empty `String`.
macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            #[doc = concat!("Creates a new `", stringify!($name), "`")]
            #[must_use]
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Returns the underlying string value
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!(stringify!($name), "({:?})"), self.0)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self::new(value)
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }

        impl FromStr for $name {
            type Err = ParseIdError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    return Err(ParseIdError {
                        kind: stringify!($name),
                    });
                }
                Ok(Self::new(trimmed))
            }
        }
    };
}

string_id!(
    /// Unique identifier for a learner or teacher
    UserId
);
string_id!(
    /// Unique identifier for a vocabulary Word
    WordId
);
string_id!(
    /// Unique identifier for a Lecture (vocabulary unit)
    LectureId
);
string_id!(
    /// Unique identifier for a grammar Course
    CourseId
);
string_id!(
    /// Unique identifier for a Question inside a Course
    QuestionId
);

/// Error type for parsing ID from string
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseIdError {
    kind: &'static str,
}

impl fmt::Display for ParseIdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "failed to parse {} from string", self.kind)
    }
}

impl std::error::Error for ParseIdError {}

// ─── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_word_id_display() {
        let id = WordId::new("W001");
        assert_eq!(id.to_string(), "W001");
        assert_eq!(format!("{id:?}"), "WordId(\"W001\")");
    }

    #[test]
    fn test_lecture_id_from_str_trims() {
        let id: LectureId = "  L002 ".parse().unwrap();
        assert_eq!(id, LectureId::new("L002"));
    }

    #[test]
    fn test_id_from_str_rejects_blank() {
        let err = "   ".parse::<QuestionId>().unwrap_err();
        assert_eq!(err.to_string(), "failed to parse QuestionId from string");
    }

    #[test]
    fn test_ids_order_lexicographically() {
        assert!(WordId::new("W001") < WordId::new("W002"));
    }

    #[test]
    fn test_id_from_string_keeps_value() {
        let id = UserId::from(String::from("student-demo"));
        assert_eq!(id.as_str(), "student-demo");
    }
}
