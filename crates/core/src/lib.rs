//! # DataLens Core
//!
//! Domain types, traits, and error definitions for the DataLens analysis
//! assistant. Nothing in here talks to the network or the file system; the
//! other crates implement against these definitions.
//!
//! ## Layout
//!
//! - [`message`]: chat messages and session identifiers
//! - [`provider`]: the language-model backend abstraction
//! - [`storage`]: the key/value blob store used for charts and datasets
//! - [`error`]: the error taxonomy shared by every crate

pub mod error;
pub mod message;
pub mod provider;
pub mod storage;

// Re-export key types at crate root for ergonomics
pub use error::{Error, ProviderError, Result, StorageError};
pub use message::{Message, Role, SessionId};
pub use provider::{Generation, GenerationRequest, Provider, ProviderKind};
pub use storage::BlobStore;
