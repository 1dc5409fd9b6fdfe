use std::time::Duration;

use async_trait::async_trait;
use refscope_core::Entry;
use tracing::debug;

use crate::arxiv::parser::parse_atom_response;
use crate::arxiv::types::ArxivMetadata;
use crate::error::{Result, ScienceError};
use crate::http::{DiskCache, RateLimitedClient};
use crate::identifiers::arxiv::ArxivId;
use crate::sources::IdBasedFetcher;

pub const DEFAULT_BASE_URL: &str = "http://export.arxiv.org/api/query";
const USER_AGENT: &str = "refscope/0.1";

pub struct ArxivClient {
    client: RateLimitedClient,
    cache: Option<DiskCache>,
    base_url: String,
}

impl ArxivClient {
    pub fn new() -> Result<Self> {
        Self::with_params(DEFAULT_BASE_URL, Duration::from_secs(3), None)
    }

    pub fn with_params(
        base_url: &str,
        min_interval: Duration,
        cache: Option<DiskCache>,
    ) -> Result<Self> {
        Ok(Self {
            client: RateLimitedClient::new(min_interval, 3, USER_AGENT)?,
            cache,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Metadata for one id, or `None` when arXiv returns an empty feed.
    pub async fn fetch_metadata(&self, id: &ArxivId) -> Result<Option<ArxivMetadata>> {
        let key = format!("metadata:{}", id.versioned());
        if let Some(cache) = &self.cache
            && let Some(cached) = cache.get::<ArxivMetadata>(&key).await
        {
            return Ok(Some(cached));
        }

        let separator = if self.base_url.contains('?') { '&' } else { '?' };
        let url = format!("{}{separator}id_list={}", self.base_url, id.versioned());

        let xml = self.client.get(&url).await?;
        let Some(metadata) = parse_atom_response(&xml)?.into_iter().next() else {
            debug!(id = %id, "arXiv returned no entries");
            return Ok(None);
        };

        if let Some(cache) = &self.cache {
            cache.set(&key, &metadata).await;
        }
        Ok(Some(metadata))
    }
}

#[async_trait]
impl IdBasedFetcher for ArxivClient {
    fn name(&self) -> &str {
        "arXiv"
    }

    async fn perform_search_by_id(&self, identifier: &str) -> Result<Option<Entry>> {
        let id = match ArxivId::parse(identifier) {
            Ok(id) => id,
            Err(_) => return Ok(None),
        };
        match self.fetch_metadata(&id).await {
            Ok(metadata) => Ok(metadata.map(ArxivMetadata::into_entry)),
            Err(ScienceError::IdentifierNotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Server;
    use refscope_core::fields;

    const FEED: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<feed xmlns="http://www.w3.org/2005/Atom">
  <entry>
    <id>http://arxiv.org/abs/1706.03762v5</id>
    <updated>2023-08-02T03:09:44Z</updated>
    <published>2017-06-12T17:57:34Z</published>
    <title>Attention Is All You Need</title>
    <summary>Abstract</summary>
    <author><name>Ashish Vaswani</name></author>
    <arxiv:primary_category xmlns:arxiv="http://arxiv.org/schemas/atom" term="cs.CL"/>
    <category term="cs.CL"/>
  </entry>
</feed>"#;

    #[tokio::test]
    async fn fetches_entry_by_id() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("GET", "/query?id_list=1706.03762")
            .with_status(200)
            .with_header("content-type", "application/atom+xml")
            .with_body(FEED)
            .create_async()
            .await;

        let client = ArxivClient::with_params(
            &format!("{}/query", server.url()),
            Duration::from_secs(0),
            None,
        )
        .unwrap();
        let entry = client
            .perform_search_by_id("arXiv:1706.03762")
            .await
            .unwrap()
            .unwrap();

        assert_eq!(entry.title(), Some("Attention Is All You Need"));
        assert_eq!(entry.field(fields::EPRINT), Some("1706.03762v5"));
    }

    #[tokio::test]
    async fn empty_feed_is_not_found() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("GET", "/query?id_list=2301.00001")
            .with_status(200)
            .with_body(r#"<feed xmlns="http://www.w3.org/2005/Atom"><id>q</id></feed>"#)
            .create_async()
            .await;

        let client = ArxivClient::with_params(
            &format!("{}/query", server.url()),
            Duration::from_secs(0),
            None,
        )
        .unwrap();
        assert!(client.perform_search_by_id("2301.00001").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn non_arxiv_input_is_skipped() {
        let client =
            ArxivClient::with_params("http://127.0.0.1:9/query", Duration::from_secs(0), None)
                .unwrap();
        assert!(client.perform_search_by_id("10.1000/xyz").await.unwrap().is_none());
    }
}
