//! Bilingual promotional copy.

use serde::{Deserialize, Serialize};

/// The two fixed copy languages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CopyLanguage {
    /// English
    Primary,
    /// Spanish
    Secondary,
}

impl CopyLanguage {
    pub const BOTH: [CopyLanguage; 2] = [CopyLanguage::Primary, CopyLanguage::Secondary];

    pub fn as_str(&self) -> &'static str {
        match self {
            CopyLanguage::Primary => "en",
            CopyLanguage::Secondary => "es",
        }
    }

    pub fn english_name(&self) -> &'static str {
        match self {
            CopyLanguage::Primary => "English",
            CopyLanguage::Secondary => "Spanish",
        }
    }
}

/// How a copy text was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CopyOrigin {
    Generated,
    Template,
}

/// Promotional text in both languages. Never empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromotionalCopy {
    pub text_primary: String,
    pub text_secondary: String,
    pub primary_origin: CopyOrigin,
    pub secondary_origin: CopyOrigin,
}

impl PromotionalCopy {
    pub fn text(&self, language: CopyLanguage) -> &str {
        match language {
            CopyLanguage::Primary => &self.text_primary,
            CopyLanguage::Secondary => &self.text_secondary,
        }
    }

    /// True if either language fell back to a template.
    pub fn is_degraded(&self) -> bool {
        self.primary_origin == CopyOrigin::Template || self.secondary_origin == CopyOrigin::Template
    }
}
