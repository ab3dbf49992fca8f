//! Front-door authorization.
//!
//! The service trusts an external session store: requests carry a
//! `connect.sid` cookie whose decoded id must exist under
//! `<prefix>:<id>` in Redis. Anything else is a 401; a store outage is a
//! 500, not a silent pass.

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use redis::AsyncCommands;
use std::sync::Arc;
use tracing::{debug, error};

use crate::AppState;

pub const SESSION_COOKIE: &str = "connect.sid";

pub async fn require_session(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Response {
    let Some(session_id) = session_id_from_headers(request.headers()) else {
        debug!("missing or undecodable session cookie");
        return StatusCode::UNAUTHORIZED.into_response();
    };

    let key = format!("{}:{}", state.config.redis_prefix, session_id);
    let mut conn = state.redis.clone();
    let known: Result<bool, _> = conn.exists(&key).await;

    match known {
        Ok(true) => next.run(request).await,
        Ok(false) => {
            debug!("session not found in store");
            StatusCode::UNAUTHORIZED.into_response()
        }
        Err(e) => {
            error!(error = %e, "session store lookup failed");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

fn session_id_from_headers(headers: &HeaderMap) -> Option<String> {
    let cookies = headers.get(header::COOKIE)?.to_str().ok()?;
    let raw = cookies.split(';').find_map(|pair| {
        let (name, value) = pair.trim().split_once('=')?;
        (name == SESSION_COOKIE).then_some(value)
    })?;
    session_id_from_cookie(raw)
}

/// Decode a signed session cookie value to the bare session id:
/// percent-decode, strip the `s:` prefix when present, and drop the
/// `.`-delimited signature.
fn session_id_from_cookie(raw: &str) -> Option<String> {
    let decoded = urlencoding::decode(raw).ok()?;
    let unsigned = decoded.strip_prefix("s:").unwrap_or(&decoded);
    let id = unsigned.split('.').next().unwrap_or(unsigned);
    if id.is_empty() {
        return None;
    }
    Some(id.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_signed_cookie_is_decoded_and_unsigned() {
        let id = session_id_from_cookie("s%3AabcDEF123.h4sh%2Fsig%3D").unwrap();
        assert_eq!(id, "abcDEF123");
    }

    #[test]
    fn test_unsigned_cookie_passes_through() {
        assert_eq!(session_id_from_cookie("plain-id").unwrap(), "plain-id");
    }

    #[test]
    fn test_prefix_without_signature() {
        assert_eq!(session_id_from_cookie("s%3Aonly-id").unwrap(), "only-id");
    }

    #[test]
    fn test_empty_id_is_rejected() {
        assert_eq!(session_id_from_cookie("s%3A.sig"), None);
        assert_eq!(session_id_from_cookie(""), None);
    }

    #[test]
    fn test_cookie_extracted_among_others() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("theme=dark; connect.sid=s%3Asid42.sig; lang=en"),
        );
        assert_eq!(session_id_from_headers(&headers).unwrap(), "sid42");
    }

    #[test]
    fn test_missing_cookie_header() {
        let headers = HeaderMap::new();
        assert_eq!(session_id_from_headers(&headers), None);
    }

    #[test]
    fn test_other_cookies_only() {
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_static("theme=dark"));
        assert_eq!(session_id_from_headers(&headers), None);
    }
}
