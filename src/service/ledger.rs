use crate::db::{LedgerEntry, LedgerReason, Storage};
use crate::error::ForgeError;
use tracing::info;

/// Credit balances. Every movement is one storage transaction plus a ledger row.
#[derive(Clone)]
pub struct CreditLedger {
    storage: Storage,
}

impl CreditLedger {
    pub fn new(storage: Storage) -> Self {
        Self { storage }
    }

    /// Take `amount` credits, or fail with `InsufficientCredit` leaving the balance as is.
    pub async fn debit(
        &self,
        email: &str,
        amount: i64,
        reason: LedgerReason,
    ) -> Result<i64, ForgeError> {
        match self.storage.debit(email, amount, reason).await? {
            Some(balance) => {
                info!(email, amount, balance, reason = reason.as_str(), "credits debited");
                Ok(balance)
            }
            None => Err(ForgeError::InsufficientCredit),
        }
    }

    pub async fn credit(
        &self,
        email: &str,
        amount: i64,
        reason: LedgerReason,
    ) -> Result<i64, ForgeError> {
        let balance = self.storage.credit(email, amount, reason).await?;
        info!(email, amount, balance, reason = reason.as_str(), "credits added");
        Ok(balance)
    }

    /// Signed admin adjustment; the balance never goes below zero.
    pub async fn adjust(&self, email: &str, delta: i64) -> Result<i64, ForgeError> {
        let balance = self.storage.adjust(email, delta).await?;
        info!(email, delta, balance, "credits adjusted");
        Ok(balance)
    }

    /// Zero for unknown accounts.
    pub async fn balance(&self, email: &str) -> Result<i64, ForgeError> {
        Ok(self
            .storage
            .get_account(email)
            .await?
            .map(|a| a.credits)
            .unwrap_or(0))
    }

    pub async fn history(&self, email: &str) -> Result<Vec<LedgerEntry>, ForgeError> {
        self.storage.ledger_for(email).await
    }
}
