pub mod diagnostics_service;
pub mod idea_service;

pub use idea_service::IdeaService;
