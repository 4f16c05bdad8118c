//! Request-scoped context extracted from HTTP requests.

use std::convert::Infallible;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::HeaderMap;
use prr_id::RequestId;

pub const REQUEST_ID_HEADER: &str = "x-request-id";

#[derive(Debug, Clone)]
pub struct RequestContext {
    pub request_id: String,
}

fn header_string(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

impl RequestContext {
    /// Context for this request, created once and cached in the extensions
    /// so every extractor reports the same request id.
    pub fn from_parts(parts: &mut Parts) -> Self {
        if let Some(ctx) = parts.extensions.get::<Self>() {
            return ctx.clone();
        }

        let request_id = header_string(&parts.headers, REQUEST_ID_HEADER)
            .unwrap_or_else(|| RequestId::new().to_string());
        let ctx = Self { request_id };
        parts.extensions.insert(ctx.clone());
        ctx
    }
}

impl<S> FromRequestParts<S> for RequestContext
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self::from_parts(parts))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    fn parts(request_id: Option<&str>) -> Parts {
        let mut builder = Request::builder().uri("/team/get");
        if let Some(id) = request_id {
            builder = builder.header(REQUEST_ID_HEADER, id);
        }
        builder.body(()).unwrap().into_parts().0
    }

    #[test]
    fn test_propagates_caller_request_id() {
        let mut parts = parts(Some("abc-123"));
        assert_eq!(RequestContext::from_parts(&mut parts).request_id, "abc-123");
    }

    #[test]
    fn test_generates_once_per_request() {
        let mut parts = parts(None);
        let first = RequestContext::from_parts(&mut parts);
        let second = RequestContext::from_parts(&mut parts);

        assert!(first.request_id.starts_with("req_"));
        assert_eq!(first.request_id, second.request_id);
    }
}
