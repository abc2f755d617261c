use crate::db::GenerationRecord;
use crate::handlers::villains::card_response;
use crate::middleware::SignedIn;
use crate::types::{Theme, Tier, VillainProfile};
use crate::{ForgeError, router::ForgeState};
use axum::{
    Json,
    extract::{Path, State},
    http::header,
    response::IntoResponse,
};
use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct ShareLink {
    pub token: String,
    pub path: String,
}

/// Public view of a shared record; the owner's email is left out.
#[derive(Debug, Serialize)]
pub struct SharedVillain {
    pub id: i64,
    pub theme: Theme,
    pub tier: Tier,
    pub profile: VillainProfile,
    pub portrait_path: Option<String>,
    pub card_path: String,
    pub created_at: DateTime<Utc>,
    pub shared: bool,
}

impl SharedVillain {
    fn new(token: &str, record: GenerationRecord) -> Self {
        Self {
            id: record.id,
            theme: record.theme,
            tier: record.tier,
            profile: record.profile,
            portrait_path: record.portrait_id.map(|_| format!("/v/{token}/portrait")),
            card_path: format!("/v/{token}/card"),
            created_at: record.created_at,
            shared: true,
        }
    }
}

/// POST /api/villains/{id}/share -> public token, created once per record.
pub async fn share_villain(
    State(state): State<ForgeState>,
    SignedIn(account): SignedIn,
    Path(id): Path<i64>,
) -> Result<Json<ShareLink>, ForgeError> {
    let token = state.forge.share(&account, id).await?;
    Ok(Json(ShareLink {
        path: format!("/v/{token}"),
        token,
    }))
}

/// GET /v/{token}
pub async fn view_shared(
    State(state): State<ForgeState>,
    Path(token): Path<String>,
) -> Result<Json<SharedVillain>, ForgeError> {
    let (record, _) = state.forge.shared(&token).await?;
    Ok(Json(SharedVillain::new(&token, record)))
}

/// GET /v/{token}/card
pub async fn shared_card(
    State(state): State<ForgeState>,
    Path(token): Path<String>,
) -> Result<impl IntoResponse, ForgeError> {
    let (record, portrait) = state.forge.shared(&token).await?;
    Ok(card_response(&record, portrait.as_ref()))
}

/// GET /v/{token}/portrait
pub async fn shared_portrait(
    State(state): State<ForgeState>,
    Path(token): Path<String>,
) -> Result<impl IntoResponse, ForgeError> {
    let (_, portrait) = state.forge.shared(&token).await?;
    let Some(portrait) = portrait else {
        return Err(ForgeError::NotFound("portrait"));
    };
    Ok((
        [
            (header::CONTENT_TYPE, portrait.mime),
            (header::CACHE_CONTROL, "public, max-age=86400".to_string()),
        ],
        portrait.bytes,
    ))
}
