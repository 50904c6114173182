//! Region and language tags
//!
//! Both are opaque tags as far as the client is concerned: they are attached
//! to sessions and requests and shown in the header, nothing more.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Service region selected in the header
///
/// `None` is a real selection ("No Region") and travels on the wire as
/// `"none"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Region {
    #[default]
    #[serde(rename = "none")]
    None,
    West,
    Ontario,
    Atlantic,
    Quebec,
}

impl Region {
    /// Header order
    pub const ALL: [Region; 5] = [
        Region::None,
        Region::West,
        Region::Ontario,
        Region::Atlantic,
        Region::Quebec,
    ];

    /// Wire tag
    pub fn as_str(&self) -> &'static str {
        match self {
            Region::None => "none",
            Region::West => "West",
            Region::Ontario => "Ontario",
            Region::Atlantic => "Atlantic",
            Region::Quebec => "Quebec",
        }
    }

    /// Human readable label for selectors
    pub fn label(&self) -> &'static str {
        match self {
            Region::None => "No Region",
            other => other.as_str(),
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Region::None)
    }

    /// Next region in header order, wrapping around
    pub fn next(self) -> Self {
        let idx = Self::ALL.iter().position(|r| *r == self).unwrap_or(0);
        Self::ALL[(idx + 1) % Self::ALL.len()]
    }
}

impl std::fmt::Display for Region {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Region {
    type Err = ParseTagError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|r| r.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ParseTagError::Region(s.to_string()))
    }
}

/// UI and conversation language
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    En,
    Fr,
}

impl Language {
    pub const ALL: [Language; 2] = [Language::En, Language::Fr];

    /// Wire tag
    pub fn as_str(&self) -> &'static str {
        match self {
            Language::En => "en",
            Language::Fr => "fr",
        }
    }

    /// Label in the language itself
    pub fn label(&self) -> &'static str {
        match self {
            Language::En => "English",
            Language::Fr => "Français",
        }
    }

    pub fn next(self) -> Self {
        match self {
            Language::En => Language::Fr,
            Language::Fr => Language::En,
        }
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Language {
    type Err = ParseTagError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "en" | "english" => Ok(Language::En),
            "fr" | "french" | "français" | "francais" => Ok(Language::Fr),
            _ => Err(ParseTagError::Language(s.to_string())),
        }
    }
}

/// Unknown region or language tag
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseTagError {
    #[error("Unknown region: {0}")]
    Region(String),
    #[error("Unknown language: {0}")]
    Language(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_region_wire_tags() {
        assert_eq!(serde_json::to_string(&Region::None).unwrap(), "\"none\"");
        assert_eq!(serde_json::to_string(&Region::Quebec).unwrap(), "\"Quebec\"");

        let parsed: Region = serde_json::from_str("\"Atlantic\"").unwrap();
        assert_eq!(parsed, Region::Atlantic);
    }

    #[test]
    fn test_region_from_str_is_case_insensitive() {
        assert_eq!("ontario".parse::<Region>().unwrap(), Region::Ontario);
        assert_eq!("NONE".parse::<Region>().unwrap(), Region::None);
        assert!("Yukon".parse::<Region>().is_err());
    }

    #[test]
    fn test_region_cycle_wraps() {
        assert_eq!(Region::None.next(), Region::West);
        assert_eq!(Region::Quebec.next(), Region::None);
        assert_eq!(Region::None.label(), "No Region");
    }

    #[test]
    fn test_language_tags() {
        assert_eq!(serde_json::to_string(&Language::Fr).unwrap(), "\"fr\"");
        assert_eq!("Français".parse::<Language>().unwrap(), Language::Fr);
        assert_eq!(Language::En.next(), Language::Fr);
        assert_eq!(Language::Fr.label(), "Français");
    }
}
