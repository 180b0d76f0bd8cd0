// src/models/theme.rs

use std::fmt;

use serde::{Deserialize, Serialize};

/// Which half of the syllabus a theme belongs to.
/// Only the simulacro composition cares about it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(type_name = "theme_category", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ThemeCategory {
    General,
    Specific,
}

impl ThemeCategory {
    /// Lowercase label used in user-facing messages.
    pub fn label(self) -> &'static str {
        match self {
            ThemeCategory::General => "general",
            ThemeCategory::Specific => "specific",
        }
    }
}

impl fmt::Display for ThemeCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ThemeCategory::General => f.write_str("GENERAL"),
            ThemeCategory::Specific => f.write_str("SPECIFIC"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Theme {
    pub id: String,
    /// Short human code (e.g. "T01"), unique across themes.
    pub code: String,
    pub name: String,
    pub category: ThemeCategory,
}
