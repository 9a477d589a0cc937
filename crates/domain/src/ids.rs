use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// Numeric identifiers issued by the remote metadata source.
///
/// Both anime and character ids are globally unique integers, so the
/// newtypes exist only to keep the two from being mixed up.
macro_rules! define_id {
    ($name:ident, $label:literal) => {
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(i64);

        impl $name {
            pub const fn new(raw: i64) -> Self {
                Self(raw)
            }

            pub const fn get(self) -> i64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<i64> for $name {
            fn from(value: i64) -> Self {
                Self(value)
            }
        }

        impl From<$name> for i64 {
            fn from(value: $name) -> Self {
                value.0
            }
        }

        impl FromStr for $name {
            type Err = DomainError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                s.trim()
                    .parse::<i64>()
                    .map(Self)
                    .map_err(|_| DomainError::invalid_id(format!("{} id: {}", $label, s)))
            }
        }
    };
}

define_id!(AnimeId, "anime");
define_id!(CharacterId, "character");

/// Identity of an authenticated user, as issued by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    pub fn new(raw: impl Into<String>) -> Result<Self, DomainError> {
        let raw = raw.into();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(DomainError::invalid_id("user id cannot be empty"));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for UserId {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_ids_parse_from_strings() {
        assert_eq!("42".parse::<AnimeId>().ok(), Some(AnimeId::new(42)));
        assert_eq!(" 7 ".parse::<CharacterId>().ok(), Some(CharacterId::new(7)));
        assert!("abc".parse::<AnimeId>().is_err());
    }

    #[test]
    fn user_id_rejects_blank_values() {
        assert!(UserId::new("   ").is_err());
        let id = UserId::new(" uid-1 ").expect("valid id");
        assert_eq!(id.as_str(), "uid-1");
    }

    #[test]
    fn anime_id_serializes_as_plain_integer() {
        let json = serde_json::to_string(&AnimeId::new(5)).expect("serialize");
        assert_eq!(json, "5");
    }
}
