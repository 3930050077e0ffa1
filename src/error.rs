use std::fmt;

use serde::Serialize;
use ts_rs::TS;

/// Structured error type for the template pipeline. Front-ends can match on
/// the `code` tag instead of parsing messages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, TS)]
#[serde(tag = "code", content = "detail")]
#[ts(export)]
pub enum StacheError {
    /// Malformed tag-tree input.
    Decode { message: String },
    CyclicDependency { names: Vec<String> },
    DuplicateTemplate { name: String },
    InvalidSectionValue { section: String, found: String },
    PropElement { element: String, prop: String },
    Io { message: String },
    Json { message: String },
}

pub type Result<T, E = StacheError> = std::result::Result<T, E>;

impl StacheError {
    pub fn decode(message: impl Into<String>) -> Self {
        StacheError::Decode {
            message: message.into(),
        }
    }

    /// Sorts and deduplicates so reports are stable across runs.
    pub fn cyclic<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut names: Vec<String> = names.into_iter().map(Into::into).collect();
        names.sort();
        names.dedup();
        StacheError::CyclicDependency { names }
    }

    pub fn is_decode(&self) -> bool {
        matches!(self, StacheError::Decode { .. })
    }
}

impl fmt::Display for StacheError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StacheError::Decode { message } => write!(f, "{message}"),
            StacheError::CyclicDependency { names } => {
                write!(f, "cyclic template dependency: {}", names.join(", "))
            }
            StacheError::DuplicateTemplate { name } => {
                write!(f, "duplicated template name: {name:?}")
            }
            StacheError::InvalidSectionValue { section, found } => write!(
                f,
                "section: {section}: expected a boolean, array, or an object value, got {found}"
            ),
            StacheError::PropElement { element, prop } => {
                write!(f, "{element}: elements are not valid as prop children (in {prop:?})")
            }
            StacheError::Io { message } => write!(f, "I/O error: {message}"),
            StacheError::Json { message } => write!(f, "JSON error: {message}"),
        }
    }
}

impl std::error::Error for StacheError {}

impl From<std::io::Error> for StacheError {
    fn from(e: std::io::Error) -> Self {
        StacheError::Io {
            message: e.to_string(),
        }
    }
}

impl From<serde_json::Error> for StacheError {
    fn from(e: serde_json::Error) -> Self {
        StacheError::Json {
            message: e.to_string(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn cyclic_names_are_sorted_and_unique() {
        let err = StacheError::cyclic(["b", "a", "b"]);
        assert_eq!(
            err,
            StacheError::CyclicDependency {
                names: vec!["a".to_string(), "b".to_string()]
            }
        );
        assert_eq!(err.to_string(), "cyclic template dependency: a, b");
    }

    #[test]
    fn serializes_with_code_tag() {
        let err = StacheError::DuplicateTemplate { name: "foo".into() };
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["code"], "DuplicateTemplate");
        assert_eq!(json["detail"]["name"], "foo");
    }

    #[test]
    fn prop_element_message_names_the_element() {
        let err = StacheError::PropElement {
            element: "span".into(),
            prop: "id".into(),
        };
        assert!(err.to_string().starts_with("span: elements are not valid as prop children"));
    }
}
