// Idea Board - ideas, comments and one-vote-per-voter endorsements over a document store

// Store contract, SQLite implementation and persistence helpers
pub mod infrastructure;

// Board entities and request/response shapes
pub mod models;

// Board operations and diagnostics
pub mod services;

// HTTP routes and handlers
pub mod idea_interface;

pub mod app_state;
pub mod config;

// Common utilities
pub mod error;
pub mod data_seeder;

// Re-exports for convenience
pub use error::{AppError, AppResult};
