use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Target languages offered to users. The engine itself accepts any label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Language {
    English,
    Vietnamese,
    Japanese,
    Chinese,
    French,
    German,
    Spanish,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unsupported language: {0}")]
pub struct UnknownLanguage(pub String);

impl Language {
    pub const ALL: [Language; 7] = [
        Language::English,
        Language::Vietnamese,
        Language::Japanese,
        Language::Chinese,
        Language::French,
        Language::German,
        Language::Spanish,
    ];

    /// Label used in prompts and cache keys.
    pub fn label(&self) -> &'static str {
        match self {
            Language::English => "English",
            Language::Vietnamese => "Vietnamese",
            Language::Japanese => "Japanese",
            Language::Chinese => "Chinese",
            Language::French => "French",
            Language::German => "German",
            Language::Spanish => "Spanish",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Language {
    type Err = UnknownLanguage;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        Language::ALL
            .into_iter()
            .find(|language| language.label().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| UnknownLanguage(trimmed.to_string()))
    }
}

impl AsRef<str> for Language {
    fn as_ref(&self) -> &str {
        self.label()
    }
}
