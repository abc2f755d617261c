use crate::error::{ForgeError, OpenAiError};
use serde::{Serialize, de::DeserializeOwned};
use tracing::{error, warn};
use url::Url;

const ERROR_SNIPPET_LEN: usize = 300;

pub struct OpenAiApi;

impl OpenAiApi {
    /// POST a JSON body and decode the JSON reply. One attempt only.
    pub async fn post_json<T, R>(
        client: &reqwest::Client,
        url: Url,
        api_key: &str,
        body: &T,
    ) -> Result<R, ForgeError>
    where
        T: Serialize,
        R: DeserializeOwned,
    {
        let resp = client
            .post(url.clone())
            .bearer_auth(api_key)
            .json(body)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(match serde_json::from_str::<OpenAiError>(&text) {
                Ok(api_err) => {
                    if api_err.is_quota() {
                        warn!(%status, url = %url, "upstream quota exhausted");
                    } else {
                        error!(%status, url = %url, message = %api_err.error.message, "upstream rejected request");
                    }
                    api_err.into()
                }
                Err(_) => {
                    let snippet: String = text.chars().take(ERROR_SNIPPET_LEN).collect();
                    ForgeError::GenerationFailed(format!("upstream status {status}: {snippet}"))
                }
            });
        }

        let bytes = resp.bytes().await?;
        serde_json::from_slice(&bytes)
            .map_err(|e| ForgeError::GenerationFailed(format!("malformed upstream body: {e}")))
    }
}
