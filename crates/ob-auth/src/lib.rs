//! Access-mask authorization, the thin seam the request router calls before
//! bucket-init (§4.3 step 3). The auth manager proper — credential issuance,
//! LDAP, request signing — is out of scope here; this crate only carries the
//! trait and the bitmask the router and `ob-core`'s `BucketProps` share.
//!
//! Grounded on the teacher's `middleware/auth.rs` for the bearer/anonymous
//! shape of the check, trimmed to the one decision the router needs: does
//! this caller's token grant `required` against a bucket whose own
//! `access_mask` may itself further restrict what's grantable.

use thiserror::Error;

/// Bit-flag permissions a bucket or a token can carry (§3 "access mask").
/// Kept as plain bits, not an enum, so `BucketProps::access_mask` and a
/// token's grant can be intersected with `&`.
pub mod access {
    pub const GET: u64 = 1 << 0;
    pub const PUT: u64 = 1 << 1;
    pub const DELETE: u64 = 1 << 2;
    pub const LIST: u64 = 1 << 3;
    pub const CREATE_BUCKET: u64 = 1 << 4;
    pub const DESTROY_BUCKET: u64 = 1 << 5;
    pub const ADMIN: u64 = 1 << 6;
}

pub type AccessMask = u64;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("missing bearer token")]
    MissingToken,
    #[error("invalid or expired token")]
    InvalidToken,
    #[error("token does not grant the requested permission")]
    InsufficientGrant,
}

/// Implemented by whatever credential store a deployment wires in. The
/// router only ever calls [`Authorizer::authorize`]; it never sees how
/// tokens are issued or stored (§1 Non-goals: "auth manager").
pub trait Authorizer: Send + Sync {
    /// `bucket_mask` is the bucket's own `access_mask` (a bucket can narrow
    /// what's grantable below what the token itself carries, e.g. a
    /// read-only bucket rejects PUT regardless of the caller's token).
    fn authorize(
        &self,
        bearer_token: Option<&str>,
        bucket_mask: AccessMask,
        required: AccessMask,
    ) -> Result<(), AuthError>;
}

/// Every request is granted every permission (§6.4-adjacent "no auth
/// manager configured" default). Named analogously to the teacher's
/// dev-mode bypass in `middleware/auth.rs`, but as a real `Authorizer`
/// rather than a config flag threaded through every call site.
#[derive(Debug, Default, Clone, Copy)]
pub struct AllowAll;

impl Authorizer for AllowAll {
    fn authorize(&self, _bearer_token: Option<&str>, _bucket_mask: AccessMask, _required: AccessMask) -> Result<(), AuthError> {
        Ok(())
    }
}

/// Bearer-token authorizer backed by a fixed table of `token -> grant`
/// (§6.4 "static credentials file", the trimmed analogue of the teacher's
/// metadata-store credential lookup).
#[derive(Debug, Default)]
pub struct StaticTokenAuthorizer {
    grants: std::collections::HashMap<String, AccessMask>,
}

impl StaticTokenAuthorizer {
    pub fn new() -> Self {
        Self {
            grants: std::collections::HashMap::new(),
        }
    }

    pub fn with_token(mut self, token: impl Into<String>, grant: AccessMask) -> Self {
        self.grants.insert(token.into(), grant);
        self
    }
}

impl Authorizer for StaticTokenAuthorizer {
    fn authorize(&self, bearer_token: Option<&str>, bucket_mask: AccessMask, required: AccessMask) -> Result<(), AuthError> {
        let token = bearer_token.ok_or(AuthError::MissingToken)?;
        let grant = self.grants.get(token).ok_or(AuthError::InvalidToken)?;
        let allowed = grant & bucket_mask & required;
        if allowed == required {
            Ok(())
        } else {
            Err(AuthError::InsufficientGrant)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allow_all_grants_everything() {
        let auth = AllowAll;
        assert!(auth.authorize(None, 0, access::ADMIN).is_ok());
    }

    #[test]
    fn static_authorizer_rejects_missing_token() {
        let auth = StaticTokenAuthorizer::new();
        assert!(matches!(
            auth.authorize(None, access::GET, access::GET).unwrap_err(),
            AuthError::MissingToken
        ));
    }

    #[test]
    fn static_authorizer_rejects_unknown_token() {
        let auth = StaticTokenAuthorizer::new().with_token("tok-1", access::GET);
        assert!(matches!(
            auth.authorize(Some("tok-2"), access::GET, access::GET).unwrap_err(),
            AuthError::InvalidToken
        ));
    }

    #[test]
    fn static_authorizer_intersects_token_grant_with_bucket_mask() {
        let auth = StaticTokenAuthorizer::new().with_token("tok-1", access::GET | access::PUT);
        // bucket_mask only allows GET, so a PUT request must fail even
        // though the token itself grants PUT.
        let err = auth.authorize(Some("tok-1"), access::GET, access::PUT).unwrap_err();
        assert!(matches!(err, AuthError::InsufficientGrant));
        assert!(auth.authorize(Some("tok-1"), access::GET, access::GET).is_ok());
    }
}
