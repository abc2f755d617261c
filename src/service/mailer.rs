use crate::error::ForgeError;
use tracing::info;

/// Delivers one-time sign-in codes.
pub trait CodeSender: Send + Sync {
    fn send(&self, email: &str, code: &str) -> Result<(), ForgeError>;
}

/// Writes the code to the log. Used when no mail relay is configured.
pub struct TracingCodeSender;

impl CodeSender for TracingCodeSender {
    fn send(&self, email: &str, code: &str) -> Result<(), ForgeError> {
        info!(email, code, "sign-in code issued");
        Ok(())
    }
}
