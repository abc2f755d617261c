use crate::config::Config;
use crate::db::Account;
use crate::middleware::SESSION_COOKIE;
use crate::{ForgeError, router::ForgeState};
use axum::{Json, extract::State, response::IntoResponse};
use axum_extra::extract::cookie::{Cookie, PrivateCookieJar, SameSite};
use serde::{Deserialize, Serialize};
use serde_json::json;
use time::Duration;
use tracing::info;

/// Session cookie lifetime.
const SESSION_DAYS: i64 = 30;

#[derive(Debug, Deserialize)]
pub struct CodeRequest {
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct VerifyRequest {
    pub email: String,
    pub code: String,
}

#[derive(Debug, Serialize)]
pub struct AccountView {
    pub email: String,
    pub credits: i64,
    pub verified: bool,
    pub uber_unlocked: bool,
}

impl AccountView {
    pub fn new(account: &Account, uber_unlocked: bool) -> Self {
        Self {
            email: account.email.clone(),
            credits: account.credits,
            verified: account.verified,
            uber_unlocked,
        }
    }
}

/// POST /api/auth/code -> issues a one-time code for the email.
pub async fn request_code(
    State(state): State<ForgeState>,
    Json(req): Json<CodeRequest>,
) -> Result<impl IntoResponse, ForgeError> {
    let email = state.sign_in.request_code(&req.email).await?;
    Ok(Json(json!({
        "ok": true,
        "email": email,
        "expires_in_secs": state.config.otp_ttl_secs,
    })))
}

/// POST /api/auth/verify -> checks the code and sets the session cookie.
pub async fn verify_code(
    State(state): State<ForgeState>,
    jar: PrivateCookieJar,
    Json(req): Json<VerifyRequest>,
) -> Result<impl IntoResponse, ForgeError> {
    let account = state.sign_in.verify(&req.email, &req.code).await?;
    let view = AccountView::new(&account, state.forge.uber_unlocked(&account));
    let jar = jar.add(build_cookie(account.email, &state.config));
    info!(email = %view.email, "session cookie issued");
    Ok((jar, Json(view)))
}

/// POST /api/auth/logout
pub async fn logout(
    State(state): State<ForgeState>,
    jar: PrivateCookieJar,
) -> impl IntoResponse {
    let jar = jar.remove(clear_cookie(&state.config));
    (jar, Json(json!({ "ok": true })))
}

fn build_cookie(email: String, cfg: &Config) -> Cookie<'static> {
    Cookie::build(Cookie::new(SESSION_COOKIE, email))
        .path("/")
        .http_only(true)
        .secure(!cfg.insecure_cookie)
        .same_site(SameSite::Lax)
        .max_age(Duration::days(SESSION_DAYS))
        .build()
}

fn clear_cookie(cfg: &Config) -> Cookie<'static> {
    Cookie::build(Cookie::new(SESSION_COOKIE, ""))
        .path("/")
        .http_only(true)
        .secure(!cfg.insecure_cookie)
        .same_site(SameSite::Lax)
        .build()
}
