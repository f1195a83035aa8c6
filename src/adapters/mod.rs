// Adapters layer: concrete implementations for external systems (registrar http, listing stores, corpus dumps)

pub mod corpus;
pub mod registrar;
pub mod store;

pub use registrar::HttpRegistrarFeed;
pub use store::{JsonListingStore, MemoryListingStore};
