pub mod classifier;
pub mod forge;
pub mod ledger;
pub mod mailer;
pub mod reroll;
pub mod sessions;
pub mod support;

pub use forge::{Forge, VillainOrder};
pub use ledger::CreditLedger;
pub use mailer::{CodeSender, TracingCodeSender};
pub use sessions::SignInService;
pub use support::SupportDesk;
