use crate::api::GenerationClient;
use crate::config::Config;
use crate::db::Storage;
use crate::handlers::{
    account::account_handler,
    admin::{adjust_credits, set_uber},
    auth::{logout, request_code, verify_code},
    options::{health_handler, options_handler},
    portraits::{get_portrait, upload_portrait},
    share::{share_villain, shared_card, shared_portrait, view_shared},
    support::support_webhook,
    villains::{
        attach_upload, create_villain, get_villain, list_villains, paint_villain, reroll_name,
        reroll_origin, villain_card,
    },
};
use crate::service::{CodeSender, Forge, SignInService, SupportDesk};
use axum::{
    Router,
    extract::{DefaultBodyLimit, FromRef},
    routing::{get, post, put},
};
use axum_extra::extract::cookie::Key;
use std::sync::Arc;

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct ForgeState {
    pub storage: Storage,
    pub config: Arc<Config>,
    pub forge: Forge,
    pub sign_in: SignInService,
    pub support: SupportDesk,
    key: Key,
}

impl ForgeState {
    pub fn new(
        storage: Storage,
        config: Arc<Config>,
        client: GenerationClient,
        sender: Arc<dyn CodeSender>,
    ) -> Self {
        Self {
            forge: Forge::new(storage.clone(), client, &config),
            sign_in: SignInService::new(storage.clone(), sender, &config),
            support: SupportDesk::new(storage.clone()),
            key: config.cookie_key(),
            storage,
            config,
        }
    }
}

impl FromRef<ForgeState> for Key {
    fn from_ref(state: &ForgeState) -> Self {
        state.key.clone()
    }
}

pub fn forge_router(state: ForgeState) -> Router {
    let upload_limit = state.config.upload_limit_bytes;

    Router::new()
        .route("/health", get(health_handler))
        .route("/api/options", get(options_handler))
        .route("/api/auth/code", post(request_code))
        .route("/api/auth/verify", post(verify_code))
        .route("/api/auth/logout", post(logout))
        .route("/api/account", get(account_handler))
        .route("/api/villains", post(create_villain).get(list_villains))
        .route("/api/villains/{id}", get(get_villain))
        .route("/api/villains/{id}/card", get(villain_card))
        .route("/api/villains/{id}/portrait", post(paint_villain))
        .route(
            "/api/villains/{id}/upload/{portrait_id}",
            post(attach_upload),
        )
        .route("/api/villains/{id}/reroll/name", post(reroll_name))
        .route("/api/villains/{id}/reroll/origin", post(reroll_origin))
        .route("/api/villains/{id}/share", post(share_villain))
        .route("/v/{token}", get(view_shared))
        .route("/v/{token}/card", get(shared_card))
        .route("/v/{token}/portrait", get(shared_portrait))
        .route(
            "/api/portraits",
            post(upload_portrait).layer(DefaultBodyLimit::max(upload_limit)),
        )
        .route("/api/portraits/{id}", get(get_portrait))
        .route("/webhooks/support", post(support_webhook))
        .route("/admin/accounts/{email}/credits", post(adjust_credits))
        .route("/admin/accounts/{email}/uber", put(set_uber))
        .with_state(state)
}
