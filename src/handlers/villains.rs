use crate::card::{card_filename, render_card};
use crate::db::{GenerationRecord, Portrait};
use crate::middleware::{SignedIn, VillainRequest};
use crate::{ForgeError, router::ForgeState};
use axum::{
    Json,
    extract::{Path, Query, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    pub limit: Option<u32>,
}

/// POST /api/villains -> generate a villain, optionally with an AI or uploaded portrait.
pub async fn create_villain(
    State(state): State<ForgeState>,
    SignedIn(account): SignedIn,
    VillainRequest(order): VillainRequest,
) -> Result<impl IntoResponse, ForgeError> {
    let record = state.forge.generate(&account, order).await?;
    Ok((StatusCode::CREATED, Json(record)))
}

/// GET /api/villains?limit= -> newest first.
pub async fn list_villains(
    State(state): State<ForgeState>,
    SignedIn(account): SignedIn,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<Vec<GenerationRecord>>, ForgeError> {
    let max = state.config.history_limit.max(1);
    let limit = query.limit.unwrap_or(max).clamp(1, max);
    Ok(Json(state.forge.history(&account.email, limit).await?))
}

pub async fn get_villain(
    State(state): State<ForgeState>,
    SignedIn(account): SignedIn,
    Path(id): Path<i64>,
) -> Result<Json<GenerationRecord>, ForgeError> {
    Ok(Json(state.forge.owned_record(&account.email, id).await?))
}

/// SVG attachment response for a record.
pub(crate) fn card_response(record: &GenerationRecord, portrait: Option<&Portrait>) -> Response {
    let svg = render_card(record, portrait);
    let disposition = format!(
        "attachment; filename=\"{}\"",
        card_filename(&record.profile.name)
    );
    (
        [
            (header::CONTENT_TYPE, "image/svg+xml".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        svg,
    )
        .into_response()
}

/// GET /api/villains/{id}/card -> SVG attachment.
pub async fn villain_card(
    State(state): State<ForgeState>,
    SignedIn(account): SignedIn,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ForgeError> {
    let record = state.forge.owned_record(&account.email, id).await?;
    let portrait = match record.portrait_id {
        Some(pid) => Some(state.forge.owned_portrait(&account.email, pid).await?),
        None => None,
    };
    Ok(card_response(&record, portrait.as_ref()))
}

/// POST /api/villains/{id}/portrait -> new record with an AI portrait (1 credit).
pub async fn paint_villain(
    State(state): State<ForgeState>,
    SignedIn(account): SignedIn,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ForgeError> {
    let record = state.forge.portrait_for(&account, id).await?;
    Ok((StatusCode::CREATED, Json(record)))
}

/// POST /api/villains/{id}/upload/{portrait_id} -> new record with an uploaded portrait.
pub async fn attach_upload(
    State(state): State<ForgeState>,
    SignedIn(account): SignedIn,
    Path((id, portrait_id)): Path<(i64, i64)>,
) -> Result<impl IntoResponse, ForgeError> {
    let record = state.forge.attach_upload(&account, id, portrait_id).await?;
    Ok((StatusCode::CREATED, Json(record)))
}

/// POST /api/villains/{id}/reroll/name -> new record with another real name.
pub async fn reroll_name(
    State(state): State<ForgeState>,
    SignedIn(account): SignedIn,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ForgeError> {
    let record = state.forge.reroll_name(&account, id).await?;
    Ok((StatusCode::CREATED, Json(record)))
}

/// POST /api/villains/{id}/reroll/origin -> new record with a regenerated origin.
pub async fn reroll_origin(
    State(state): State<ForgeState>,
    SignedIn(account): SignedIn,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ForgeError> {
    let record = state.forge.reroll_origin(&account, id).await?;
    Ok((StatusCode::CREATED, Json(record)))
}
