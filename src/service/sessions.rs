use crate::config::Config;
use crate::db::{Account, Storage};
use crate::error::ForgeError;
use crate::service::mailer::CodeSender;
use chrono::Utc;
use governor::clock::{Clock, DefaultClock};
use governor::{DefaultKeyedRateLimiter, Quota, RateLimiter};
use rand::Rng;
use std::num::NonZeroU32;
use std::sync::Arc;
use subtle::ConstantTimeEq;
use tracing::{info, warn};

/// Email one-time-code sign-in.
#[derive(Clone)]
pub struct SignInService {
    storage: Storage,
    sender: Arc<dyn CodeSender>,
    limiter: Arc<DefaultKeyedRateLimiter<String>>,
    clock: DefaultClock,
    ttl_secs: i64,
    max_attempts: i64,
    signup_credits: i64,
}

impl SignInService {
    pub fn new(storage: Storage, sender: Arc<dyn CodeSender>, cfg: &Config) -> Self {
        let quota = Quota::with_period(cfg.otp_resend_cooldown())
            .unwrap_or_else(|| Quota::per_minute(NonZeroU32::MIN))
            .allow_burst(NonZeroU32::MIN);
        Self {
            storage,
            sender,
            limiter: Arc::new(RateLimiter::keyed(quota)),
            clock: DefaultClock::default(),
            ttl_secs: i64::try_from(cfg.otp_ttl().as_secs()).unwrap_or(i64::MAX),
            max_attempts: i64::from(cfg.otp_max_attempts.max(1)),
            signup_credits: i64::from(cfg.signup_credits),
        }
    }

    /// Issue and deliver a fresh code. Returns the normalized email.
    pub async fn request_code(&self, raw_email: &str) -> Result<String, ForgeError> {
        let email = normalize_email(raw_email)?;

        if let Err(not_until) = self.limiter.check_key(&email) {
            let wait = not_until.wait_time_from(self.clock.now());
            warn!(email = %email, wait_secs = wait.as_secs(), "code resend throttled");
            return Err(ForgeError::RateLimited(wait.as_secs().max(1)));
        }
        self.limiter.retain_recent();

        let now = Utc::now().timestamp();
        let purged = self.storage.purge_expired_sessions(now).await?;
        if purged > 0 {
            info!(purged, "expired sign-in sessions removed");
        }

        let code = generate_code();
        self.storage
            .insert_session(&email, &code, now, now.saturating_add(self.ttl_secs))
            .await?;
        self.sender.send(&email, &code)?;
        Ok(email)
    }

    /// Check a code against the newest unexpired session for the email.
    pub async fn verify(&self, raw_email: &str, code: &str) -> Result<Account, ForgeError> {
        let email = normalize_email(raw_email)?;
        let now = Utc::now().timestamp();

        let Some(session) = self.storage.latest_active_session(&email, now).await? else {
            return Err(ForgeError::InvalidSession(
                "No active code for this email.".to_string(),
            ));
        };
        if session.attempts >= self.max_attempts {
            return Err(ForgeError::InvalidSession(
                "Too many incorrect attempts.".to_string(),
            ));
        }

        if !bool::from(code.trim().as_bytes().ct_eq(session.code.as_bytes())) {
            self.storage.bump_session_attempts(session.id).await?;
            warn!(email = %email, attempts = session.attempts + 1, "incorrect sign-in code");
            return Err(ForgeError::InvalidSession("Incorrect code.".to_string()));
        }

        self.storage.delete_sessions_for(&email).await?;
        let (account, created) = self
            .storage
            .ensure_account(&email, self.signup_credits, true)
            .await?;
        info!(email = %email, created, credits = account.credits, "signed in");
        Ok(account)
    }
}

/// Lowercased, trimmed; exactly one `@` with something on both sides.
pub fn normalize_email(raw: &str) -> Result<String, ForgeError> {
    let email = raw.trim().to_lowercase();
    let mut parts = email.split('@');
    let (Some(local), Some(domain), None) = (parts.next(), parts.next(), parts.next()) else {
        return Err(ForgeError::InvalidEmail);
    };
    if local.is_empty() || domain.is_empty() || email.contains(char::is_whitespace) {
        return Err(ForgeError::InvalidEmail);
    }
    Ok(email)
}

fn generate_code() -> String {
    format!("{:06}", rand::thread_rng().gen_range(0..1_000_000u32))
}
