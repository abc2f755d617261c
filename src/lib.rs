pub mod api;
pub mod card;
pub mod compose;
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod service;
pub mod types;

pub use error::ForgeError;
pub use router::{ForgeState, forge_router};
