#![allow(dead_code)]

use std::fmt;
use std::str::FromStr;

use anyhow::anyhow;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::matching::taxonomy::SkillTaxonomy;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkillCategory {
    #[default]
    Technical,
    Soft,
    Tool,
    Concept,
}

impl SkillCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            SkillCategory::Technical => "technical",
            SkillCategory::Soft => "soft",
            SkillCategory::Tool => "tool",
            SkillCategory::Concept => "concept",
        }
    }
}

impl FromStr for SkillCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "technical" => Ok(SkillCategory::Technical),
            "soft" => Ok(SkillCategory::Soft),
            "tool" => Ok(SkillCategory::Tool),
            "concept" => Ok(SkillCategory::Concept),
            other => Err(format!("unknown skill category '{other}'")),
        }
    }
}

impl fmt::Display for SkillCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkillLevel {
    Beginner,
    Intermediate,
    Advanced,
}

impl SkillLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            SkillLevel::Beginner => "beginner",
            SkillLevel::Intermediate => "intermediate",
            SkillLevel::Advanced => "advanced",
        }
    }
}

impl FromStr for SkillLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "beginner" => Ok(SkillLevel::Beginner),
            "intermediate" => Ok(SkillLevel::Intermediate),
            "advanced" => Ok(SkillLevel::Advanced),
            other => Err(format!("unknown skill level '{other}'")),
        }
    }
}

/// A skill on a candidate profile, as extracted upstream from the resume.
///
/// `raw_text` is kept verbatim for display. The canonical id is derived at
/// scoring time through the taxonomy, never stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillEntry {
    pub raw_text: String,
    #[serde(default)]
    pub category: SkillCategory,
    #[serde(default)]
    pub level: Option<SkillLevel>,
    #[serde(default)]
    pub years: Option<f64>,
}

impl SkillEntry {
    pub fn new(raw_text: impl Into<String>) -> Self {
        Self {
            raw_text: raw_text.into(),
            category: SkillCategory::default(),
            level: None,
            years: None,
        }
    }

    pub fn canonical_id(&self, taxonomy: &SkillTaxonomy) -> String {
        taxonomy.canonicalize(&self.raw_text)
    }
}

/// Row shape of `profile_skills`. Enum columns are TEXT with CHECK constraints.
#[derive(Debug, Clone, FromRow)]
pub struct SkillRow {
    pub raw_text: String,
    pub category: String,
    pub level: Option<String>,
    pub years: Option<f64>,
}

impl TryFrom<SkillRow> for SkillEntry {
    type Error = anyhow::Error;

    fn try_from(row: SkillRow) -> Result<Self, Self::Error> {
        let category = row.category.parse::<SkillCategory>().map_err(|e| anyhow!(e))?;
        let level = row
            .level
            .as_deref()
            .map(str::parse::<SkillLevel>)
            .transpose()
            .map_err(|e| anyhow!(e))?;

        Ok(SkillEntry {
            raw_text: row.raw_text,
            category,
            level,
            years: row.years,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_skill_row_converts_with_level() {
        let row = SkillRow {
            raw_text: "Python".to_string(),
            category: "technical".to_string(),
            level: Some("Advanced".to_string()),
            years: Some(5.0),
        };
        let entry = SkillEntry::try_from(row).unwrap();
        assert_eq!(entry.category, SkillCategory::Technical);
        assert_eq!(entry.level, Some(SkillLevel::Advanced));
        assert_eq!(entry.years, Some(5.0));
        assert_eq!(entry.raw_text, "Python");
    }

    #[test]
    fn test_skill_row_rejects_unknown_category() {
        let row = SkillRow {
            raw_text: "Juggling".to_string(),
            category: "hobby".to_string(),
            level: None,
            years: None,
        };
        assert!(SkillEntry::try_from(row).is_err());
    }

    #[test]
    fn test_skill_entry_deserializes_with_defaults() {
        let entry: SkillEntry = serde_json::from_str(r#"{"raw_text": "SQL"}"#).unwrap();
        assert_eq!(entry, SkillEntry::new("SQL"));
    }
}
