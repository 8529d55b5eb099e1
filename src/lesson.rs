//! Lesson selection: the language and grade a session is bound to

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::LessonError;

/// Languages offered by the tutor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Language {
    #[default]
    English,
    Sinhala,
    Tamil,
}

impl Language {
    pub const ALL: [Language; 3] = [Language::English, Language::Sinhala, Language::Tamil];

    pub fn as_str(&self) -> &'static str {
        match self {
            Language::English => "English",
            Language::Sinhala => "Sinhala",
            Language::Tamil => "Tamil",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Language {
    type Err = LessonError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        Language::ALL
            .into_iter()
            .find(|lang| lang.as_str().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| LessonError::UnknownLanguage(s.to_string()))
    }
}

/// School grade, 1 through 13
///
/// Travels on the wire as its decimal string ("1".."13").
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Grade(u8);

impl Grade {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 13;

    pub fn new(level: u8) -> Result<Self, LessonError> {
        if (Self::MIN..=Self::MAX).contains(&level) {
            Ok(Self(level))
        } else {
            Err(LessonError::InvalidGrade(level.to_string()))
        }
    }

    pub fn level(&self) -> u8 {
        self.0
    }

    /// All grades in ascending order
    pub fn all() -> impl Iterator<Item = Grade> {
        (Self::MIN..=Self::MAX).map(Grade)
    }
}

impl Default for Grade {
    fn default() -> Self {
        Grade(Self::MIN)
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Grade {
    type Err = LessonError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let level: u8 = s
            .trim()
            .parse()
            .map_err(|_| LessonError::InvalidGrade(s.to_string()))?;
        Grade::new(level).map_err(|_| LessonError::InvalidGrade(s.to_string()))
    }
}

impl TryFrom<String> for Grade {
    type Error = LessonError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Grade> for String {
    fn from(grade: Grade) -> Self {
        grade.to_string()
    }
}

/// Selection fixed for the lifetime of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SessionContext {
    pub language: Language,
    pub grade: Grade,
}

impl SessionContext {
    pub fn new(language: Language, grade: Grade) -> Self {
        Self { language, grade }
    }
}
