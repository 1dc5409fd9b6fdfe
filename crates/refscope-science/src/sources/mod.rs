//! Metadata sources that resolve a single identifier to an [`Entry`].

use async_trait::async_trait;
use refscope_core::Entry;

use crate::error::Result;

/// A fetcher that turns one identifier into at most one entry.
///
/// `Ok(None)` means the source has no record for the identifier (or the
/// identifier is not one this source understands). `Err` is reserved for
/// transport, service and parse failures.
#[async_trait]
pub trait IdBasedFetcher: Send + Sync {
    fn name(&self) -> &str;

    async fn perform_search_by_id(&self, identifier: &str) -> Result<Option<Entry>>;
}

pub mod composite;
pub mod crossref;
pub mod openlibrary;

pub use composite::CompositeIdFetcher;
pub use crossref::CrossRefSource;
pub use openlibrary::OpenLibrarySource;
