use serde::{Deserialize, Serialize};

/// A single requirement line extracted upstream from a job posting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequirementEntry {
    pub raw_text: String,
}

impl RequirementEntry {
    pub fn new(raw_text: impl Into<String>) -> Self {
        Self {
            raw_text: raw_text.into(),
        }
    }
}

impl From<String> for RequirementEntry {
    fn from(raw_text: String) -> Self {
        Self { raw_text }
    }
}
