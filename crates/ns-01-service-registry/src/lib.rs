//! # Service Registry (ns-01)
//!
//! Durable record of every node started through the sandbox, keyed by service
//! name, so later commands and other tools can resolve a running node.
//!
//! ## Storage Layout
//!
//! A single JSON document (`services.json` in the working directory) mapping
//! service name to record:
//!
//! ```text
//! {
//!   "icon-1": {
//!     "serviceName": "icon-1",
//!     "endpoint": "http://node:9000",
//!     "keystorePath": "/ks/icon-1.json",
//!     "keyPassword": "pw",
//!     "networkId": "0x3"
//!   }
//! }
//! ```
//!
//! ## Domain Invariants
//!
//! | ID | Invariant | Description |
//! |----|-----------|-------------|
//! | 1 | Keyed by name | The key is always the descriptor's own service name |
//! | 2 | Atomic per key | A reader never observes a half-written record |
//! | 3 | Key isolation | Concurrent writes to different keys never lose each other |
//! | 4 | Last writer wins | Concurrent writes to the same key are not serialized further |
//! | 5 | Foreign records kept | Entries this crate cannot decode are preserved on rewrite |
//!
//! ## Crate Structure (Hexagonal Architecture)
//!
//! - `domain/` - Record shape and errors
//! - `ports/` - The `ServiceRegistry` trait
//! - `adapters/` - JSON file store (production) and in-memory store (tests)

pub mod adapters;
pub mod domain;
pub mod ports;

pub use adapters::json_file::{JsonFileRegistry, DEFAULT_REGISTRY_FILE};
pub use adapters::memory::InMemoryRegistry;
pub use domain::errors::RegistryError;
pub use domain::record::ServiceRecord;
pub use ports::ServiceRegistry;
