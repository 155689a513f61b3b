//! # fal-dummy Architecture
//!
//! fal-dummy is a **storage driver decorator** for development and testing.
//! Content-managed sites reference thousands of images that a developer's
//! checkout does not have. Instead of failing on every missing file, the
//! [`driver::DummyDriver`] serves a placeholder image in its place, sized like
//! the original.
//!
//! ## Layers
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  CLI (main.rs, cli/)                                        │
//! │  - Wires a LocalDriver, a JSON index and an HTTP fetcher    │
//! │  - The ONLY place that knows about stdout/stderr/exit codes │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  DummyDriver (driver/)                                      │
//! │  - Gate: delegate to the real driver, or intercept          │
//! │  - Placeholder resolver: dummy file or remote placeholder   │
//! │  - Dimension clamping                                       │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Capabilities                                               │
//! │  - StorageDriver (store/): LocalDriver, InMemoryDriver      │
//! │  - FileIndex (index.rs): JsonFileIndex, InMemoryIndex       │
//! │  - HttpFetcher (fetch.rs): BlockingFetcher                  │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every capability is a trait, so the decorator can be tested against
//! in-memory doubles and hosts can plug in their own driver, index or
//! transport.
//!
//! ## When is a file intercepted?
//!
//! Only when all of these hold: the identifier is not a folder, no real file
//! exists at it, it is outside the processing folder, and the host's index
//! knows it as an image. Anything else goes to the real driver unchanged, so
//! the decorator is safe to leave in place over a complete volume.
//!
//! ## Module Overview
//!
//! - [`driver`]: The decorator, gate, resolver and dimension clamp
//! - [`store`]: Storage driver trait and implementations
//! - [`index`]: Indexed file records lookup
//! - [`fetch`]: Remote placeholder retrieval
//! - [`config`]: Driver configuration
//! - [`model`]: Identifiers, records, permissions, folder info
//! - [`hash`]: Supported hash algorithms
//! - [`error`]: Error types

pub mod config;
pub mod driver;
pub mod error;
pub mod fetch;
pub mod hash;
pub mod index;
pub mod model;
pub mod store;

#[cfg(test)]
pub(crate) mod test_utils;
