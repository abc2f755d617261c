use crate::middleware::ensure_support_secret;
use crate::service::support::SupportReceipt;
use crate::{ForgeError, router::ForgeState};
use axum::{
    Json,
    body::Bytes,
    extract::{RawQuery, State},
    http::HeaderMap,
};

/// POST /webhooks/support -> credit a supporter's account.
pub async fn support_webhook(
    State(state): State<ForgeState>,
    headers: HeaderMap,
    RawQuery(query): RawQuery,
    body: Bytes,
) -> Result<Json<SupportReceipt>, ForgeError> {
    ensure_support_secret(
        &headers,
        query.as_deref(),
        &state.config.support_webhook_secret,
    )?;
    let raw = String::from_utf8_lossy(&body);
    let receipt = state.support.handle(&raw, &state.config).await?;
    Ok(Json(receipt))
}
