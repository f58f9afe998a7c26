//! Bearer-token extraction middleware (§4.3 step 3), grounded on the
//! teacher's `middleware/auth.rs` Bearer/Basic parsing but trimmed to the
//! one thing the router needs up front: the raw token string. The mask
//! check itself happens per-handler, once the target bucket's
//! `access_mask` is known, via [`ob_auth::Authorizer`].

use axum::body::Body;
use axum::extract::Request;
use axum::middleware::Next;
use axum::response::Response;

/// Request extension carrying whatever bearer token accompanied the
/// request, if any. Absence is not itself a rejection — `AllowAll`
/// deployments and anonymous-read buckets both depend on handlers deciding
/// whether a missing token matters.
#[derive(Debug, Clone, Default)]
pub struct BearerToken(pub Option<String>);

pub async fn extract_bearer_token(mut request: Request<Body>, next: Next) -> Response {
    let token = request
        .headers()
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(|s| s.to_string());
    request.extensions_mut().insert(BearerToken(token));
    next.run(request).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bearer_token_default_is_none() {
        assert!(BearerToken::default().0.is_none());
    }
}
