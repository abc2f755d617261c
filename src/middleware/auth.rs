use axum::extract::FromRequestParts;
use axum::http::{HeaderMap, request::Parts};
use axum_extra::TypedHeader;
use axum_extra::extract::cookie::{Key, PrivateCookieJar};
use headers::Authorization;
use headers::authorization::Bearer;
use subtle::ConstantTimeEq;
use tracing::warn;

use crate::db::Account;
use crate::error::ForgeError;
use crate::router::ForgeState;

/// Name of the encrypted cookie holding the signed-in email.
pub const SESSION_COOKIE: &str = "villain_session";

fn secret_matches(given: &str, expected: &str) -> bool {
    !expected.is_empty() && bool::from(given.as_bytes().ct_eq(expected.as_bytes()))
}

/// The account behind the session cookie.
#[derive(Debug, Clone)]
pub struct SignedIn(pub Account);

impl FromRequestParts<ForgeState> for SignedIn {
    type Rejection = ForgeError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &ForgeState,
    ) -> Result<Self, Self::Rejection> {
        let Ok(jar) = PrivateCookieJar::<Key>::from_request_parts(parts, state).await;
        let Some(email) = jar.get(SESSION_COOKIE).map(|c| c.value().to_owned()) else {
            return Err(ForgeError::Unauthorized);
        };
        let account = state
            .storage
            .get_account(&email)
            .await?
            .ok_or(ForgeError::Unauthorized)?;
        Ok(Self(account))
    }
}

/// `Authorization: Bearer <admin_key>`. Always rejects when no admin key is configured.
#[derive(Debug, Clone, Copy)]
pub struct RequireAdmin;

impl FromRequestParts<ForgeState> for RequireAdmin {
    type Rejection = ForgeError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &ForgeState,
    ) -> Result<Self, Self::Rejection> {
        let TypedHeader(Authorization(bearer)) =
            TypedHeader::<Authorization<Bearer>>::from_request_parts(parts, state)
                .await
                .map_err(|_| ForgeError::Unauthorized)?;
        if !secret_matches(bearer.token(), &state.config.admin_key) {
            warn!("rejected admin request");
            return Err(ForgeError::Unauthorized);
        }
        Ok(Self)
    }
}

/// Webhook secret from the `X-Support-Secret` header or the `secret` query param.
pub fn ensure_support_secret(
    headers: &HeaderMap,
    query: Option<&str>,
    expected: &str,
) -> Result<(), ForgeError> {
    if let Some(hv) = headers.get("x-support-secret").and_then(|v| v.to_str().ok())
        && secret_matches(hv.trim(), expected)
    {
        return Ok(());
    }

    if let Some(qs) = query {
        for (k, v) in url::form_urlencoded::parse(qs.as_bytes()) {
            if k == "secret" && secret_matches(&v, expected) {
                return Ok(());
            }
        }
    }

    warn!("support webhook with missing or invalid secret");
    Err(ForgeError::Unauthorized)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn support_secret_from_header_or_query() {
        let mut headers = HeaderMap::new();
        assert!(ensure_support_secret(&headers, Some("secret=s3cret"), "s3cret").is_ok());
        assert!(ensure_support_secret(&headers, Some("secret=nope"), "s3cret").is_err());

        headers.insert("x-support-secret", HeaderValue::from_static("s3cret"));
        assert!(ensure_support_secret(&headers, None, "s3cret").is_ok());
    }

    #[test]
    fn empty_expected_secret_never_matches() {
        let headers = HeaderMap::new();
        assert!(ensure_support_secret(&headers, Some("secret="), "").is_err());
    }
}
