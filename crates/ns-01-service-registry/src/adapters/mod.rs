//! # Adapters
//!
//! - `json_file` - `services.json` store guarded by an advisory file lock
//! - `memory` - in-process store for tests and dry runs
//! - `lock` - RAII wrapper over `fs2` exclusive locks

pub mod json_file;
pub mod lock;
pub mod memory;
