//! Adapter implementations
//!
//! Concrete implementations of the port traits. The hosted record store is
//! an external collaborator wired in by the application shell; this crate
//! ships an in-memory backend used by the integration tests and for
//! embedding without a hosted store.

pub mod memory;

pub use memory::MemoryBackend;
