// Adapters layer: concrete implementations of the domain ports.
// Database-backed stores live with the deployment; this crate ships the in-memory one.

pub mod memory;

pub use memory::InMemoryStore;
