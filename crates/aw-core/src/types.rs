//! Validated identifier types.

use std::fmt;

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// Validation errors for core types.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// The provided value was empty.
    #[error("{field} cannot be empty")]
    Empty { field: &'static str },

    /// The value was not a decimal snowflake.
    #[error("{field} must be a numeric snowflake, got {value:?}")]
    NotSnowflake { field: &'static str, value: String },
}

/// Generates a validated snowflake ID newtype with common trait implementations.
///
/// Snowflakes arrive as JSON strings from the gateway but as integers from TOML
/// or environment configuration, so both forms deserialize.
macro_rules! define_snowflake_id {
    (
        $(#[$meta:meta])*
        $name:ident, $field_name:literal
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash)]
        pub struct $name(String);

        impl $name {
            /// Creates a new ID after validation.
            pub fn new(id: impl Into<String>) -> Result<Self, ValidationError> {
                let id = id.into();
                let trimmed = id.trim();
                if trimmed.is_empty() {
                    return Err(ValidationError::Empty { field: $field_name });
                }
                if !trimmed.bytes().all(|b| b.is_ascii_digit()) {
                    return Err(ValidationError::NotSnowflake {
                        field: $field_name,
                        value: id,
                    });
                }
                Ok(Self(trimmed.to_string()))
            }

            /// Returns the ID as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl From<u64> for $name {
            fn from(value: u64) -> Self {
                Self(value.to_string())
            }
        }

        impl TryFrom<String> for $name {
            type Error = ValidationError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }

        impl std::str::FromStr for $name {
            type Err = ValidationError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::new(s)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl Serialize for $name {
            fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
            where
                S: Serializer,
            {
                serializer.serialize_str(&self.0)
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: Deserializer<'de>,
            {
                struct IdVisitor;

                impl Visitor<'_> for IdVisitor {
                    type Value = $name;

                    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                        write!(f, "a snowflake string or unsigned integer")
                    }

                    fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
                        $name::new(v).map_err(E::custom)
                    }

                    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
                        Ok($name::from(v))
                    }

                    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
                        u64::try_from(v)
                            .map($name::from)
                            .map_err(|_| E::custom(format!("{} cannot be negative", $field_name)))
                    }
                }

                deserializer.deserialize_any(IdVisitor)
            }
        }
    };
}

define_snowflake_id!(
    /// Gateway user identifier.
    UserId,
    "user_id"
);

define_snowflake_id!(
    /// Identifier of the channel that receives notifications.
    ChannelId,
    "channel_id"
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_id_rejects_empty() {
        assert_eq!(
            UserId::new("  "),
            Err(ValidationError::Empty { field: "user_id" })
        );
    }

    #[test]
    fn channel_id_rejects_non_numeric() {
        let err = ChannelId::new("general").unwrap_err();
        assert_eq!(
            err.to_string(),
            r#"channel_id must be a numeric snowflake, got "general""#
        );
    }

    #[test]
    fn ids_deserialize_from_string_or_integer() {
        let from_str: UserId = serde_json::from_str(r#""861974078431821885""#).unwrap();
        let from_int: UserId = serde_json::from_str("861974078431821885").unwrap();
        assert_eq!(from_str, from_int);
        assert_eq!(from_int.as_str(), "861974078431821885");
    }

    #[test]
    fn ids_serialize_as_strings() {
        let id = ChannelId::from(866_699_773_700_341_760);
        assert_eq!(
            serde_json::to_string(&id).unwrap(),
            r#""866699773700341760""#
        );
    }

    #[test]
    fn negative_integer_is_rejected() {
        let result: Result<UserId, _> = serde_json::from_str("-4");
        assert!(result.is_err());
    }
}
