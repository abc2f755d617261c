use crate::db::LedgerEntry;
use crate::handlers::auth::AccountView;
use crate::middleware::SignedIn;
use crate::{ForgeError, router::ForgeState};
use axum::{Json, extract::State};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct AccountDetails {
    #[serde(flatten)]
    pub account: AccountView,
    pub ledger: Vec<LedgerEntry>,
}

/// GET /api/account -> balance, flags and credit history of the signed-in user.
pub async fn account_handler(
    State(state): State<ForgeState>,
    SignedIn(account): SignedIn,
) -> Result<Json<AccountDetails>, ForgeError> {
    let ledger = state.forge.ledger().history(&account.email).await?;
    Ok(Json(AccountDetails {
        account: AccountView::new(&account, state.forge.uber_unlocked(&account)),
        ledger,
    }))
}
