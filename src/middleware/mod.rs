pub mod auth;
pub mod villain_request;

pub use auth::{RequireAdmin, SESSION_COOKIE, SignedIn, ensure_support_secret};
pub use villain_request::{GenerateBody, VillainRequest};
