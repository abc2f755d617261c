use crate::api::openai_api::OpenAiApi;
use crate::compose::ComposedPrompt;
use crate::config::Config;
use crate::error::ForgeError;
use crate::service::classifier::{KeywordThreatClassifier, ThreatClassifier};
use crate::types::openai::{
    ChatMessage, ChatRequest, ChatResponse, ImageRequest, ImageResponse, ResponseFormat,
};
use crate::types::villain::coerce_json;
use crate::types::{VillainDraft, VillainProfile};
use base64::Engine;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info};
use url::Url;

const PNG_MAGIC: &[u8] = b"\x89PNG\r\n\x1a\n";

/// Calls the text and image models. Cheap to clone.
#[derive(Clone)]
pub struct GenerationClient {
    http: reqwest::Client,
    api_key: Arc<str>,
    chat_url: Url,
    image_url: Url,
    text_model: Arc<str>,
    image_model: Arc<str>,
    image_size: Arc<str>,
    classifier: Arc<dyn ThreatClassifier>,
}

impl GenerationClient {
    /// Build the HTTP client from config. Panics on an invalid proxy or base url.
    pub fn new(cfg: &Config) -> Self {
        let mut builder = reqwest::Client::builder()
            .user_agent(concat!("villain-forge/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(Duration::from_secs(cfg.connect_timeout_secs))
            .timeout(Duration::from_secs(cfg.request_timeout_secs));
        // only the configured proxy is used, never the *_PROXY environment
        builder = match cfg.proxy.as_ref() {
            Some(proxy_url) => builder.proxy(
                reqwest::Proxy::all(proxy_url.as_str())
                    .expect("invalid VILLAIN_PROXY url for reqwest client"),
            ),
            None => builder.no_proxy(),
        };
        let http = builder
            .build()
            .expect("FATAL: initialize GenerationClient HTTP client failed");

        Self {
            http,
            api_key: Arc::from(cfg.openai_api_key.as_str()),
            chat_url: cfg
                .chat_completions_url()
                .expect("FATAL: invalid VILLAIN_OPENAI_BASE_URL"),
            image_url: cfg
                .image_generations_url()
                .expect("FATAL: invalid VILLAIN_OPENAI_BASE_URL"),
            text_model: Arc::from(cfg.text_model.as_str()),
            image_model: Arc::from(cfg.image_model.as_str()),
            image_size: Arc::from(cfg.image_size.as_str()),
            classifier: Arc::new(KeywordThreatClassifier),
        }
    }

    pub fn with_classifier(mut self, classifier: Arc<dyn ThreatClassifier>) -> Self {
        self.classifier = classifier;
        self
    }

    /// One chat-completions call in JSON mode; returns the message content.
    async fn chat(&self, prompt: &ComposedPrompt) -> Result<String, ForgeError> {
        let body = ChatRequest {
            model: &self.text_model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: prompt.system,
                },
                ChatMessage {
                    role: "user",
                    content: &prompt.user,
                },
            ],
            max_tokens: prompt.max_tokens,
            temperature: prompt.temperature,
            response_format: ResponseFormat::json_object(),
        };

        let resp: ChatResponse =
            OpenAiApi::post_json(&self.http, self.chat_url.clone(), &self.api_key, &body).await?;
        let Some(content) = resp.first_content() else {
            return Err(ForgeError::GenerationFailed(
                "text model returned no content".to_string(),
            ));
        };
        debug!(content, "text model reply");
        Ok(content.to_string())
    }

    /// Generate and normalize a villain profile.
    ///
    /// `selected_power` overrides whatever power the model wrote.
    pub async fn generate_text(
        &self,
        prompt: &ComposedPrompt,
        selected_power: Option<&str>,
    ) -> Result<VillainProfile, ForgeError> {
        let started = Instant::now();
        let content = self.chat(prompt).await?;

        let draft = VillainDraft::parse(&content).ok_or_else(|| {
            ForgeError::GenerationFailed("text model reply is not a JSON object".to_string())
        })?;
        let profile = draft.into_profile(selected_power, self.classifier.as_ref());
        info!(
            alias = %profile.alias,
            threat = %profile.threat_level,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "profile generated"
        );
        Ok(profile)
    }

    /// Generate a replacement origin paragraph.
    pub async fn generate_origin(&self, prompt: &ComposedPrompt) -> Result<String, ForgeError> {
        let started = Instant::now();
        let content = self.chat(prompt).await?;
        let origin = coerce_json(&content)
            .and_then(|v| {
                v.get("origin")
                    .or_else(|| v.get("bio"))
                    .and_then(|o| o.as_str())
                    .map(|o| o.trim().to_string())
            })
            .filter(|o| !o.is_empty())
            .ok_or_else(|| {
                ForgeError::GenerationFailed("text model reply has no origin".to_string())
            })?;
        info!(
            chars = origin.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "origin generated"
        );
        Ok(origin)
    }

    /// Generate one portrait and return the PNG bytes.
    pub async fn generate_image(&self, prompt: &str) -> Result<Vec<u8>, ForgeError> {
        let body = ImageRequest {
            model: &self.image_model,
            prompt,
            n: 1,
            size: &self.image_size,
            response_format: "b64_json",
            style: "vivid",
        };

        let started = Instant::now();
        let resp: ImageResponse =
            OpenAiApi::post_json(&self.http, self.image_url.clone(), &self.api_key, &body).await?;
        let Some(datum) = resp.data.into_iter().next() else {
            return Err(ForgeError::GenerationFailed(
                "image model returned no data".to_string(),
            ));
        };
        if let Some(revised) = datum.revised_prompt.as_deref() {
            debug!(revised, "image prompt revised upstream");
        }
        let Some(b64) = datum.b64_json else {
            return Err(ForgeError::GenerationFailed(
                "image model returned no b64_json payload".to_string(),
            ));
        };

        let bytes = base64::engine::general_purpose::STANDARD
            .decode(b64.trim())
            .map_err(|e| ForgeError::GenerationFailed(format!("image payload not base64: {e}")))?;
        if !bytes.starts_with(PNG_MAGIC) {
            return Err(ForgeError::GenerationFailed(
                "image payload is not a PNG".to_string(),
            ));
        }
        info!(
            size = bytes.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "portrait generated"
        );
        Ok(bytes)
    }
}
