//! Vitrine Kernel Library
//!
//! Image hosting and translation editing behind an OAuth login.
//! The main entry point for running the server is the `vitrine` binary.

pub mod auth;
pub mod config;
pub mod error;
pub mod images;
pub mod routes;
pub mod session;
pub mod state;
pub mod storage;
pub mod theme;
pub mod translation;

pub use config::Config;
pub use state::AppState;
