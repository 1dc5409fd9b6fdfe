use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use refscope_core::Entry;
use tracing::{debug, info};

use crate::arxiv::ArxivClient;
use crate::config::ScienceConfig;
use crate::error::Result;
use crate::http::DiskCache;
use crate::identifiers::Identifier;
use crate::sources::{CrossRefSource, IdBasedFetcher, OpenLibrarySource};

/// Routes an identifier to the source that understands it: DOIs go to
/// Crossref, arXiv ids to arXiv, ISBNs to Open Library.
pub struct CompositeIdFetcher {
    doi: Arc<dyn IdBasedFetcher>,
    arxiv: Arc<dyn IdBasedFetcher>,
    isbn: Arc<dyn IdBasedFetcher>,
}

impl CompositeIdFetcher {
    pub fn new(
        doi: Arc<dyn IdBasedFetcher>,
        arxiv: Arc<dyn IdBasedFetcher>,
        isbn: Arc<dyn IdBasedFetcher>,
    ) -> Self {
        Self { doi, arxiv, isbn }
    }

    pub fn from_config(config: &ScienceConfig) -> Result<Self> {
        let cache = |namespace: &str| {
            config
                .cache
                .enabled
                .then(|| DiskCache::new(namespace, config.cache.ttl()))
        };
        let interval = Duration::from_millis;

        let crossref = CrossRefSource::with_params(
            &config.crossref_base_url,
            interval(config.rate_limit.crossref_interval_ms),
            config.polite_pool_email.clone(),
            cache("crossref"),
        )?;
        let arxiv = ArxivClient::with_params(
            &config.arxiv_base_url,
            interval(config.rate_limit.arxiv_interval_ms),
            cache("arxiv"),
        )?;
        let openlibrary = OpenLibrarySource::with_params(
            &config.openlibrary_base_url,
            interval(config.rate_limit.openlibrary_interval_ms),
            cache("openlibrary"),
        )?;

        Ok(Self::new(
            Arc::new(crossref),
            Arc::new(arxiv),
            Arc::new(openlibrary),
        ))
    }

    fn fetcher_for(&self, identifier: &Identifier) -> &dyn IdBasedFetcher {
        match identifier {
            Identifier::Doi(_) => self.doi.as_ref(),
            Identifier::Arxiv(_) => self.arxiv.as_ref(),
            Identifier::Isbn(_) => self.isbn.as_ref(),
        }
    }
}

#[async_trait]
impl IdBasedFetcher for CompositeIdFetcher {
    fn name(&self) -> &str {
        "Identifier lookup"
    }

    async fn perform_search_by_id(&self, identifier: &str) -> Result<Option<Entry>> {
        let Some(parsed) = Identifier::parse(identifier) else {
            debug!(identifier, "not a DOI, arXiv id or ISBN");
            return Ok(None);
        };
        let fetcher = self.fetcher_for(&parsed);
        info!(kind = parsed.kind(), id = %parsed, source = fetcher.name(), "looking up identifier");
        fetcher.perform_search_by_id(&parsed.to_string()).await
    }
}
