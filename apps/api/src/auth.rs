//! Caller identity middleware.
//!
//! Authentication happens upstream. The gateway forwards the authenticated
//! caller as three headers, which are trusted as-is:
//!
//! ```text
//! X-Tenant-Id:   tenant-a
//! X-User-Id:     user-42
//! X-User-Role:   admin | manager | staff
//! ```
//!
//! A request missing any of them, or naming an unknown role, is answered
//! with 401 before reaching a handler.

use axum::extract::Request;
use axum::http::HeaderMap;
use axum::middleware::Next;
use axum::response::Response;
use kardex_core::{CallerIdentity, Role};
use tracing::debug;

use crate::error::ApiError;

pub const TENANT_HEADER: &str = "x-tenant-id";
pub const USER_HEADER: &str = "x-user-id";
pub const ROLE_HEADER: &str = "x-user-role";

/// Resolves the caller and stores it as a request extension.
pub async fn require_identity(mut request: Request, next: Next) -> Result<Response, ApiError> {
    let caller = identity_from_headers(request.headers())?;
    debug!(
        tenant_id = %caller.tenant_id,
        user_id = %caller.user_id,
        role = %caller.role,
        "Caller resolved"
    );

    request.extensions_mut().insert(caller);
    Ok(next.run(request).await)
}

fn identity_from_headers(headers: &HeaderMap) -> Result<CallerIdentity, ApiError> {
    let tenant_id = header_value(headers, TENANT_HEADER)?;
    let user_id = header_value(headers, USER_HEADER)?;
    let role = Role::parse(header_value(headers, ROLE_HEADER)?)
        .ok_or_else(|| ApiError::unauthorized("X-User-Role"))?;

    Ok(CallerIdentity::new(tenant_id, user_id, role))
}

fn header_value<'a>(headers: &'a HeaderMap, name: &str) -> Result<&'a str, ApiError> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ApiError::unauthorized(display_name(name)))
}

fn display_name(name: &str) -> &'static str {
    match name {
        TENANT_HEADER => "X-Tenant-Id",
        USER_HEADER => "X-User-Id",
        _ => "X-User-Role",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(tenant: &str, user: &str, role: &str) -> HeaderMap {
        let mut map = HeaderMap::new();
        map.insert(TENANT_HEADER, HeaderValue::from_str(tenant).unwrap());
        map.insert(USER_HEADER, HeaderValue::from_str(user).unwrap());
        map.insert(ROLE_HEADER, HeaderValue::from_str(role).unwrap());
        map
    }

    #[test]
    fn test_valid_identity() {
        let caller = identity_from_headers(&headers("tenant-a", "user-1", "Manager")).unwrap();
        assert_eq!(caller.tenant_id, "tenant-a");
        assert_eq!(caller.role, Role::Manager);
    }

    #[test]
    fn test_missing_or_invalid_headers_are_unauthorized() {
        let err = identity_from_headers(&HeaderMap::new()).unwrap_err();
        assert_eq!(err.code, "UNAUTHORIZED");

        let err = identity_from_headers(&headers("tenant-a", " ", "admin")).unwrap_err();
        assert_eq!(err.status, axum::http::StatusCode::UNAUTHORIZED);

        let err = identity_from_headers(&headers("tenant-a", "user-1", "owner")).unwrap_err();
        assert_eq!(err.code, "UNAUTHORIZED");
    }
}
