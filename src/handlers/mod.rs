pub mod account;
pub mod admin;
pub mod auth;
pub mod options;
pub mod portraits;
pub mod share;
pub mod support;
pub mod villains;
