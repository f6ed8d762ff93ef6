use std::fmt;

use serde::{Deserialize, Serialize};

/// Canvas course reference as used in API paths.
///
/// Usually the numeric course id, but Canvas also accepts SIS-prefixed
/// references such as `sis_course_id:ENG101`, so it is kept as a string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CourseId(pub String);

impl CourseId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CourseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CourseId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// The course handed to a reorganization run and returned to the caller on completion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Course {
    pub id: CourseId,
}

impl Course {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: CourseId::new(id),
        }
    }
}
