use axum_extra::extract::cookie::Key;
use figment::{
    Figment,
    providers::{Env, Serialized},
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::LazyLock;
use std::time::Duration;
use tracing::warn;
use url::Url;

/// Runtime configuration.
///
/// Defaults are overridden by `VILLAIN_`-prefixed environment variables
/// (for example `VILLAIN_OPENAI_API_KEY`, `VILLAIN_SIGNUP_CREDITS`).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub listen_addr: String,
    pub database_url: String,
    pub loglevel: String,

    pub openai_api_key: String,
    pub openai_base_url: Url,
    pub text_model: String,
    pub image_model: String,
    pub image_size: String,
    pub proxy: Option<Url>,
    pub connect_timeout_secs: u64,
    pub request_timeout_secs: u64,

    /// Secret used to encrypt the session cookie; needs at least 64 bytes.
    pub cookie_secret: String,
    pub insecure_cookie: bool,
    pub otp_ttl_secs: u64,
    pub otp_resend_cooldown_secs: u64,
    pub otp_max_attempts: u32,

    /// Credits granted when an account is first created by sign-in.
    pub signup_credits: u32,
    /// Unlocks the Uber tier for every account.
    pub uber_enabled: bool,

    pub admin_key: String,
    pub support_webhook_secret: String,
    pub credits_per_coffee: u32,
    pub membership_credits: HashMap<String, u32>,
    pub shop_credits: HashMap<String, u32>,

    pub upload_limit_bytes: usize,
    pub history_limit: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:8000".to_string(),
            database_url: "sqlite:villains.sqlite".to_string(),
            loglevel: "info".to_string(),
            openai_api_key: String::new(),
            openai_base_url: Url::parse("https://api.openai.com/v1/")
                .expect("static OpenAI base url"),
            text_model: "gpt-4o-mini".to_string(),
            image_model: "dall-e-3".to_string(),
            image_size: "1024x1024".to_string(),
            proxy: None,
            connect_timeout_secs: 5,
            request_timeout_secs: 90,
            cookie_secret: String::new(),
            insecure_cookie: false,
            otp_ttl_secs: 600,
            otp_resend_cooldown_secs: 60,
            otp_max_attempts: 5,
            signup_credits: 1,
            uber_enabled: false,
            admin_key: String::new(),
            support_webhook_secret: String::new(),
            credits_per_coffee: 0,
            membership_credits: HashMap::new(),
            shop_credits: HashMap::new(),
            upload_limit_bytes: 8 * 1024 * 1024,
            history_limit: 50,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self, figment::Error> {
        Figment::from(Serialized::defaults(Config::default()))
            .merge(Env::prefixed("VILLAIN_"))
            .extract()
    }

    pub fn chat_completions_url(&self) -> Result<Url, url::ParseError> {
        self.endpoint("chat/completions")
    }

    pub fn image_generations_url(&self) -> Result<Url, url::ParseError> {
        self.endpoint("images/generations")
    }

    fn endpoint(&self, path: &str) -> Result<Url, url::ParseError> {
        let mut base = self.openai_base_url.clone();
        if !base.path().ends_with('/') {
            let with_slash = format!("{}/", base.path());
            base.set_path(&with_slash);
        }
        base.join(path)
    }

    pub fn otp_ttl(&self) -> Duration {
        Duration::from_secs(self.otp_ttl_secs)
    }

    pub fn otp_resend_cooldown(&self) -> Duration {
        Duration::from_secs(self.otp_resend_cooldown_secs.max(1))
    }

    /// Cookie encryption key; a random key is used (sessions do not survive
    /// restarts) when the configured secret is too short.
    pub fn cookie_key(&self) -> Key {
        match Key::try_from(self.cookie_secret.as_bytes()) {
            Ok(key) => key,
            Err(_) => {
                warn!("cookie_secret shorter than 64 bytes; using an ephemeral key");
                Key::generate()
            }
        }
    }
}

pub static CONFIG: LazyLock<Config> =
    LazyLock::new(|| Config::load().expect("FATAL: invalid VILLAIN_* configuration"));

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoints_join_under_base_path() {
        let mut cfg = Config::default();
        assert_eq!(
            cfg.chat_completions_url().unwrap().as_str(),
            "https://api.openai.com/v1/chat/completions"
        );

        cfg.openai_base_url = Url::parse("http://127.0.0.1:9000/v1").unwrap();
        assert_eq!(
            cfg.image_generations_url().unwrap().as_str(),
            "http://127.0.0.1:9000/v1/images/generations"
        );
    }
}
