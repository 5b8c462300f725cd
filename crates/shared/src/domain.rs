use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::error::UnknownLabel;

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub i64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = UnknownLabel;

            fn from_str(raw: &str) -> Result<Self, Self::Err> {
                raw.trim()
                    .parse::<i64>()
                    .map($name)
                    .map_err(|_| UnknownLabel::new(stringify!($name), raw))
            }
        }
    };
}

id_newtype!(SessionId);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum GradeLevel {
    #[serde(rename = "Kindergarten")]
    Kindergarten,
    #[default]
    #[serde(rename = "1st grade")]
    First,
    #[serde(rename = "2nd grade")]
    Second,
    #[serde(rename = "3rd grade")]
    Third,
    #[serde(rename = "4th grade")]
    Fourth,
    #[serde(rename = "5th grade")]
    Fifth,
}

impl GradeLevel {
    pub const ALL: [GradeLevel; 6] = [
        GradeLevel::Kindergarten,
        GradeLevel::First,
        GradeLevel::Second,
        GradeLevel::Third,
        GradeLevel::Fourth,
        GradeLevel::Fifth,
    ];

    pub fn label(self) -> &'static str {
        match self {
            GradeLevel::Kindergarten => "Kindergarten",
            GradeLevel::First => "1st grade",
            GradeLevel::Second => "2nd grade",
            GradeLevel::Third => "3rd grade",
            GradeLevel::Fourth => "4th grade",
            GradeLevel::Fifth => "5th grade",
        }
    }

    /// Lenient lookup used for URL and preference values; unknown input is `None`.
    pub fn from_label(raw: &str) -> Option<Self> {
        raw.parse().ok()
    }
}

impl fmt::Display for GradeLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for GradeLevel {
    type Err = UnknownLabel;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let wanted = raw.trim();
        Self::ALL
            .into_iter()
            .find(|grade| grade.label().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| UnknownLabel::new("grade level", raw))
    }
}

pub const DEFAULT_PERSONA: &str = "coach";

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Persona(String);

impl Persona {
    /// Blank tags are rejected so the backend never sees an empty persona.
    pub fn new(tag: impl Into<String>) -> Option<Self> {
        let tag = tag.into();
        let trimmed = tag.trim();
        if trimmed.is_empty() {
            return None;
        }
        Some(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for Persona {
    fn default() -> Self {
        Self(DEFAULT_PERSONA.to_string())
    }
}

impl fmt::Display for Persona {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn from_wire(raw: &str) -> Self {
        if raw.trim().eq_ignore_ascii_case("user") {
            Role::User
        } else {
            Role::Assistant
        }
    }

    pub fn css_class(self) -> &'static str {
        match self {
            Role::User => "user-message",
            Role::Assistant => "bot-message",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn as_str(self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Theme::Light => "Light",
            Theme::Dark => "Dark",
        }
    }

    pub fn from_label(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "light" => Some(Theme::Light),
            "dark" => Some(Theme::Dark),
            _ => None,
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }
}
