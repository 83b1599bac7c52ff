//! Client library for the SIMIG warehouse inventory API.
//!
//! [`app::App`] wires the shared pieces together; each list screen gets its
//! own [`resource::ResourceController`].

pub mod app;
pub mod auth;
pub mod cli;
pub mod client;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod events;
pub mod gate;
pub mod inventory;
pub mod profile;
pub mod reports;
pub mod resource;
pub mod session;
pub mod user_cache;
pub mod users;
