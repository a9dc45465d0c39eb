pub mod client_addr_extractor;

pub use client_addr_extractor::ClientAddr;
