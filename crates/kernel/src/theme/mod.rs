//! Theme engine and template rendering.
//!
//! Provides Tera-based page rendering for the dashboard.

mod engine;

pub use engine::ThemeEngine;
