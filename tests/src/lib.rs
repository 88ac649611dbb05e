//! # Node-Sandbox Test Suite
//!
//! Cross-crate scenarios run against the real JSON registry.
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! └── integration/
//!     ├── workflow_flows.rs    # start / decentralize flows end to end
//!     └── registry_sharing.rs  # concurrent runs sharing one services.json
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p ns-tests
//! cargo test -p ns-tests integration::workflow_flows
//! ```

pub mod integration;
