use crate::ForgeError;
use crate::compose::catalog::{ThemeOption, options_for};
use crate::types::Tier;
use axum::{Json, extract::Query};
use serde::{Deserialize, Serialize};
use serde_json::json;

#[derive(Debug, Deserialize)]
pub struct OptionsQuery {
    pub tier: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct OptionsResponse {
    pub tier: Tier,
    pub themes: Vec<ThemeOption>,
}

/// GET /api/options?tier= -> themes and powers selectable on the tier.
pub async fn options_handler(
    Query(query): Query<OptionsQuery>,
) -> Result<Json<OptionsResponse>, ForgeError> {
    let tier: Tier = query.tier.as_deref().unwrap_or_default().parse()?;
    Ok(Json(OptionsResponse {
        tier,
        themes: options_for(tier),
    }))
}

/// GET /health
pub async fn health_handler() -> Json<serde_json::Value> {
    Json(json!({ "ok": true }))
}
