/// Bearer token middleware for protected routes
///
/// Reads `Authorization: Bearer <token>`, resolves it through the
/// [`AuthGuard`](volunteer_shared::auth::AuthGuard) and inserts the resulting
/// [`Identity`] into request extensions. Handlers pick it up with
/// `Extension<Identity>`.
///
/// Every failure is a 401 with `WWW-Authenticate: Bearer`.
///
/// # Example
///
/// ```no_run
/// use axum::{routing::get, Extension, Router};
/// use volunteer_api::{app::AppState, middleware::auth::require_auth};
/// use volunteer_shared::auth::Identity;
///
/// async fn whoami(Extension(identity): Extension<Identity>) -> String {
///     identity.email
/// }
///
/// fn routes(state: AppState) -> Router<AppState> {
///     Router::new()
///         .route("/whoami", get(whoami))
///         .route_layer(axum::middleware::from_fn_with_state(state, require_auth))
/// }
/// ```

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::Response,
};

use crate::{app::AppState, error::ApiError};

/// Extracts the token from an `Authorization: Bearer` header
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;

    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }

    let token = token.trim();
    (!token.is_empty()).then_some(token)
}

/// Authenticates the request or rejects it with 401
pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = bearer_token(req.headers())
        .map(str::to_owned)
        .ok_or_else(|| ApiError::Unauthorized("Not authenticated".to_string()))?;

    let identity = state
        .guard
        .authenticate(&token)
        .await
        .map_err(ApiError::from_guard)?;

    tracing::debug!(user_id = identity.user_id, "Request authenticated");
    req.extensions_mut().insert(identity);

    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(value: &'static str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static(value));
        headers
    }

    #[test]
    fn test_bearer_token() {
        assert_eq!(bearer_token(&headers("Bearer abc.def")), Some("abc.def"));
        assert_eq!(bearer_token(&headers("bearer abc.def")), Some("abc.def"));
    }

    #[test]
    fn test_bearer_token_rejects_other_schemes() {
        assert_eq!(bearer_token(&headers("Basic dXNlcjpwYXNz")), None);
        assert_eq!(bearer_token(&headers("Bearer ")), None);
        assert_eq!(bearer_token(&headers("Bearer")), None);
        assert_eq!(bearer_token(&HeaderMap::new()), None);
    }
}
