use crate::middleware::RequireAdmin;
use crate::service::sessions::normalize_email;
use crate::{ForgeError, router::ForgeState};
use axum::{
    Json,
    extract::{Path, State},
};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::info;

#[derive(Debug, Deserialize)]
pub struct CreditAdjustment {
    pub delta: i64,
}

#[derive(Debug, Deserialize)]
pub struct UberToggle {
    pub enabled: bool,
}

/// POST /admin/accounts/{email}/credits {delta}
pub async fn adjust_credits(
    State(state): State<ForgeState>,
    _admin: RequireAdmin,
    Path(email): Path<String>,
    Json(req): Json<CreditAdjustment>,
) -> Result<Json<Value>, ForgeError> {
    let email = normalize_email(&email)?;
    let credits = state.forge.ledger().adjust(&email, req.delta).await?;
    Ok(Json(json!({ "email": email, "credits": credits })))
}

/// PUT /admin/accounts/{email}/uber {enabled}
pub async fn set_uber(
    State(state): State<ForgeState>,
    _admin: RequireAdmin,
    Path(email): Path<String>,
    Json(req): Json<UberToggle>,
) -> Result<Json<Value>, ForgeError> {
    let email = normalize_email(&email)?;
    if !state.storage.set_uber_enabled(&email, req.enabled).await? {
        return Err(ForgeError::NotFound("account"));
    }
    info!(email = %email, enabled = req.enabled, "uber tier toggled");
    Ok(Json(json!({ "email": email, "uber_enabled": req.enabled })))
}
