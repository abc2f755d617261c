pub mod openai;
pub mod options;
pub mod villain;

pub use options::{Selection, Theme, Tier};
pub use villain::{Gender, ThreatLevel, VillainDraft, VillainProfile};
