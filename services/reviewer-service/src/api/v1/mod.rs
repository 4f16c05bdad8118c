//! API v1 routes.
//!
//! Paths are rooted at `/` (`/team/add`, `/pullRequest/create`, ...).

mod pull_requests;
mod stats;
mod teams;
mod users;

use std::str::FromStr;

use axum::Router;
use prr_id::IdError;

use crate::api::error::{ApiError, FieldError};
use crate::state::AppState;

pub const MISSING_FIELD: &str = "MISSING_FIELD";
pub const INVALID_FIELD: &str = "INVALID_FIELD";

/// Create API v1 routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .merge(teams::routes())
        .merge(users::routes())
        .merge(pull_requests::routes())
        .merge(stats::routes())
}

fn missing(field: &str, request_id: &str) -> ApiError {
    ApiError::bad_request(MISSING_FIELD, format!("{field} field is required"))
        .with_details(vec![FieldError {
            field: field.to_string(),
            message: "required".to_string(),
        }])
        .with_request_id(request_id)
}

/// Parse a required identifier from a body or query field.
fn required_key<K>(field: &str, value: Option<String>, request_id: &str) -> Result<K, ApiError>
where
    K: FromStr<Err = IdError>,
{
    let value = value.ok_or_else(|| missing(field, request_id))?;
    value.parse().map_err(|e: IdError| {
        if e.is_empty() {
            return missing(field, request_id);
        }
        ApiError::bad_request(INVALID_FIELD, format!("{field} is invalid"))
            .with_details(vec![FieldError {
                field: field.to_string(),
                message: e.to_string(),
            }])
            .with_request_id(request_id)
    })
}

/// Require a non-key field to be present.
fn required<T>(field: &str, value: Option<T>, request_id: &str) -> Result<T, ApiError> {
    value.ok_or_else(|| missing(field, request_id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use prr_id::UserId;

    #[test]
    fn test_required_key_classifies_failures() {
        let ok: UserId = required_key("user_id", Some("u1".into()), "req_1").unwrap();
        assert_eq!(ok.as_str(), "u1");

        let err = required_key::<UserId>("user_id", None, "req_1").unwrap_err();
        assert_eq!(err.problem.code, MISSING_FIELD);

        let err = required_key::<UserId>("user_id", Some(String::new()), "req_1").unwrap_err();
        assert_eq!(err.problem.code, MISSING_FIELD);

        let err = required_key::<UserId>("user_id", Some(" u1".into()), "req_1").unwrap_err();
        assert_eq!(err.problem.code, INVALID_FIELD);
        assert_eq!(err.problem.request_id, "req_1");
    }
}
