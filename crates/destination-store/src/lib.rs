//! Destination store for pheno-sync.
//!
//! - [`DestinationStore`]: the trait the sync engine writes through
//! - [`MemoryStore`]: in-process implementation
//! - [`SurrealStore`]: SurrealDB v2 SDK implementation, plus
//!   [`surreal_connect`] to open its client with retries

pub mod connect;
pub mod memory;
pub mod store;
pub mod surreal;

pub use connect::{surreal_connect, surreal_connect_with_retries, SurrealOpts};
pub use memory::MemoryStore;
pub use store::DestinationStore;
pub use surreal::SurrealStore;
