// Persistence infrastructure - document store contract and its SQLite backing

pub mod document_store;
pub mod sqlite_document_store;

// Record-level helpers over any DocumentStore
pub mod persistence;
pub mod serialization;

pub mod middleware;
