//! Typed key definitions for the service's resources.

use crate::define_key;

// =============================================================================
// Directory
// =============================================================================

define_key!(UserId, "user_id");
define_key!(TeamName, "team_name");

// =============================================================================
// Pull Requests
// =============================================================================

define_key!(PullRequestId, "pull_request_id");

// =============================================================================
// Requests
// =============================================================================

/// Correlation id attached to every HTTP request.
///
/// Unlike the keys above this is generated by the service: `req_{ulid}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequestId(crate::Ulid);

impl RequestId {
    /// The prefix for request ids.
    pub const PREFIX: &'static str = "req";

    /// Creates a new request id with a fresh ULID.
    #[must_use]
    pub fn new() -> Self {
        Self(crate::Ulid::new())
    }

    /// Parses a request id from a string in the format `req_{ulid}`.
    pub fn parse(s: &str) -> Result<Self, crate::IdError> {
        if s.is_empty() {
            return Err(crate::IdError::Empty { kind: "request_id" });
        }

        let Some((prefix, ulid_str)) = s.split_once('_') else {
            return Err(crate::IdError::MissingSeparator);
        };

        if prefix != Self::PREFIX {
            return Err(crate::IdError::InvalidPrefix {
                expected: Self::PREFIX,
                actual: prefix.to_string(),
            });
        }

        let ulid = ulid_str
            .parse::<crate::Ulid>()
            .map_err(|e| crate::IdError::InvalidUlid(e.to_string()))?;

        Ok(Self(ulid))
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}_{}", Self::PREFIX, self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{IdError, MAX_KEY_LEN};
    use proptest::prelude::*;

    #[test]
    fn test_parse_accepts_caller_keys() {
        assert_eq!(UserId::parse("u1").unwrap().as_str(), "u1");
        assert_eq!(PullRequestId::parse("pr-1001").unwrap().to_string(), "pr-1001");
        assert_eq!(TeamName::parse("backend team").unwrap().as_str(), "backend team");
    }

    #[test]
    fn test_parse_rejects_malformed_keys() {
        assert_eq!(
            UserId::parse("").unwrap_err(),
            IdError::Empty { kind: "user_id" }
        );
        assert_eq!(
            TeamName::parse(" core").unwrap_err(),
            IdError::Whitespace { kind: "team_name" }
        );
        assert_eq!(
            PullRequestId::parse("pr\n1").unwrap_err(),
            IdError::ControlCharacter {
                kind: "pull_request_id"
            }
        );

        let long = "x".repeat(MAX_KEY_LEN + 1);
        assert!(matches!(
            UserId::parse(&long),
            Err(IdError::TooLong { len, .. }) if len == MAX_KEY_LEN + 1
        ));
    }

    #[test]
    fn test_deserialize_validates() {
        let ok: UserId = serde_json::from_str("\"alice\"").unwrap();
        assert_eq!(ok.as_str(), "alice");

        let err = serde_json::from_str::<UserId>("\"\"").unwrap_err();
        assert!(err.to_string().contains("user_id cannot be empty"));
    }

    #[test]
    fn test_keys_order_by_string() {
        let mut ids = vec![
            UserId::parse("carol").unwrap(),
            UserId::parse("alice").unwrap(),
            UserId::parse("bob").unwrap(),
        ];
        ids.sort();
        let ids: Vec<&str> = ids.iter().map(UserId::as_str).collect();
        assert_eq!(ids, ["alice", "bob", "carol"]);
    }

    #[test]
    fn test_request_id_roundtrip() {
        let id = RequestId::new();
        let text = id.to_string();
        assert!(text.starts_with("req_"));
        assert_eq!(RequestId::parse(&text).unwrap(), id);

        assert_eq!(
            RequestId::parse("org_01HV4Z2WQXKJNM8GPQY6VBKC3D").unwrap_err(),
            IdError::InvalidPrefix {
                expected: "req",
                actual: "org".to_string()
            }
        );
        assert_eq!(
            RequestId::parse("req01HV4Z2WQXKJNM8GPQY6VBKC3D").unwrap_err(),
            IdError::MissingSeparator
        );
    }

    proptest! {
        #[test]
        fn prop_parsed_keys_display_verbatim(s in "[a-zA-Z0-9][a-zA-Z0-9 _.-]{0,40}[a-zA-Z0-9]") {
            let id = PullRequestId::parse(&s).unwrap();
            prop_assert_eq!(id.to_string(), s);
        }

        #[test]
        fn prop_padded_keys_rejected(s in "[a-z0-9]{1,20}") {
            let padded = format!("{s} ");
            prop_assert!(UserId::parse(&padded).is_err());
        }
    }
}
