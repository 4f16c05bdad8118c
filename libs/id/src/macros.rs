//! Macros for defining typed key types.

/// Maximum length of a key in bytes.
pub const MAX_KEY_LEN: usize = 255;

/// Validates a caller-supplied key.
#[doc(hidden)]
pub fn validate_key(kind: &'static str, s: &str) -> Result<(), crate::IdError> {
    if s.is_empty() {
        return Err(crate::IdError::Empty { kind });
    }
    if s.len() > MAX_KEY_LEN {
        return Err(crate::IdError::TooLong {
            kind,
            len: s.len(),
            max: MAX_KEY_LEN,
        });
    }
    if s.trim() != s {
        return Err(crate::IdError::Whitespace { kind });
    }
    if s.chars().any(char::is_control) {
        return Err(crate::IdError::ControlCharacter { kind });
    }
    Ok(())
}

/// Macro to define a typed, caller-assigned string key.
///
/// This generates a newtype wrapper around `String` with:
/// - A `KIND` constant used in error messages
/// - `parse()` as the only constructor
/// - `Display`, `FromStr` and `AsRef<str>` implementations
/// - `Serialize` and validating `Deserialize` implementations
/// - `Ord`, `Hash`, and other standard traits
///
/// # Example
///
/// ```ignore
/// define_key!(UserId, "user_id");
///
/// let user: UserId = "u1".parse()?;
/// assert_eq!(user.as_str(), "u1");
/// ```
#[macro_export]
macro_rules! define_key {
    ($name:ident, $kind:literal) => {
        /// A typed key for this resource type.
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub struct $name(String);

        impl $name {
            /// Human readable name of the key, used in error messages.
            pub const KIND: &'static str = $kind;

            /// Parses and validates a key.
            pub fn parse(s: &str) -> Result<Self, $crate::IdError> {
                $crate::validate_key(Self::KIND, s)?;
                Ok(Self(s.to_string()))
            }

            /// Returns the key as a string slice.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Consumes the key and returns the underlying string.
            #[must_use]
            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl std::str::FromStr for $name {
            type Err = $crate::IdError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::parse(s)
            }
        }

        impl serde::Serialize for $name {
            fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
            where
                S: serde::Serializer,
            {
                serializer.serialize_str(&self.0)
            }
        }

        impl<'de> serde::Deserialize<'de> for $name {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: serde::Deserializer<'de>,
            {
                let s = String::deserialize(deserializer)?;
                Self::parse(&s).map_err(serde::de::Error::custom)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}
