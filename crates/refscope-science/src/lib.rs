//! Refscope Science: identifier parsing, metadata fetchers and the cleanup
//! and duplicate checks applied to imported entries.

pub mod arxiv;
pub mod cleanup;
pub mod config;
pub mod dedup;
pub mod error;
pub mod formats;
pub mod http;
pub mod identifiers;
pub mod sources;

pub use cleanup::ImportCleanup;
pub use config::ScienceConfig;
pub use dedup::DuplicateCheck;
pub use error::{Result, ScienceError};
pub use identifiers::Identifier;
pub use sources::{CompositeIdFetcher, IdBasedFetcher};
