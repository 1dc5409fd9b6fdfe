use std::time::Duration;

use async_trait::async_trait;
use once_cell::sync::Lazy;
use refscope_core::{Entry, EntryType, fields};
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::error::{Result, ScienceError};
use crate::http::{DiskCache, RateLimitedClient};
use crate::identifiers::isbn::Isbn;
use crate::sources::IdBasedFetcher;

pub const DEFAULT_BASE_URL: &str = "https://openlibrary.org";
const USER_AGENT: &str = "refscope/0.1";

static YEAR: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b(1[5-9]\d{2}|20\d{2})\b").expect("valid regex"));

pub struct OpenLibrarySource {
    client: RateLimitedClient,
    cache: Option<DiskCache>,
    base_url: String,
}

impl OpenLibrarySource {
    pub fn new() -> Result<Self> {
        Self::with_params(DEFAULT_BASE_URL, Duration::from_millis(350), None)
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

    /// Looks a book up through the `api/books` endpoint. Open Library answers
    /// an unknown ISBN with an empty object, not a 404.
    pub async fn fetch_by_isbn(&self, isbn: &Isbn) -> Result<Option<OpenLibraryBook>> {
        let key = format!("isbn:{}", isbn.isbn13);
        if let Some(cache) = &self.cache
            && let Some(cached) = cache.get::<OpenLibraryBook>(&key).await
        {
            return Ok(Some(cached));
        }

        let url = format!(
            "{}/api/books?bibkeys=ISBN:{}&format=json&jscmd=data",
            self.base_url, isbn.isbn13
        );
        let val: Value = self.client.get_json(&url).await?;

        let Some(record) = val.get(format!("ISBN:{}", isbn.isbn13)) else {
            debug!(isbn = %isbn, "Open Library has no record");
            return Ok(None);
        };
        let book = OpenLibraryBook::from_json(record, &isbn.isbn13);

        if let Some(cache) = &self.cache {
            cache.set(&key, &book).await;
        }
        Ok(Some(book))
    }
}

#[async_trait]
impl IdBasedFetcher for OpenLibrarySource {
    fn name(&self) -> &str {
        "Open Library"
    }

    async fn perform_search_by_id(&self, identifier: &str) -> Result<Option<Entry>> {
        let isbn = match Isbn::parse(identifier) {
            Ok(isbn) => isbn,
            Err(_) => return Ok(None),
        };
        match self.fetch_by_isbn(&isbn).await {
            Ok(book) => Ok(book.map(OpenLibraryBook::into_entry)),
            Err(ScienceError::IdentifierNotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct OpenLibraryBook {
    pub isbn13: String,
    pub title: String,
    pub subtitle: Option<String>,
    pub authors: Vec<String>,
    pub publishers: Vec<String>,
    pub publish_places: Vec<String>,
    pub publish_date: Option<String>,
    pub number_of_pages: Option<u64>,
    pub subjects: Vec<String>,
    pub url: Option<String>,
}

impl OpenLibraryBook {
    pub fn from_json(v: &Value, isbn13: &str) -> Self {
        Self {
            isbn13: isbn13.to_string(),
            title: v
                .get("title")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
            subtitle: v.get("subtitle").and_then(Value::as_str).map(ToOwned::to_owned),
            authors: names(v.get("authors")),
            publishers: names(v.get("publishers")),
            publish_places: names(v.get("publish_places")),
            publish_date: v
                .get("publish_date")
                .and_then(Value::as_str)
                .map(ToOwned::to_owned),
            number_of_pages: v.get("number_of_pages").and_then(Value::as_u64),
            subjects: names(v.get("subjects")),
            url: v.get("url").and_then(Value::as_str).map(ToOwned::to_owned),
        }
    }

    /// Four-digit year pulled out of free-form dates like "March 1981".
    pub fn year(&self) -> Option<&str> {
        let date = self.publish_date.as_deref()?;
        YEAR.captures(date).and_then(|c| c.get(1)).map(|m| m.as_str())
    }

    pub fn into_entry(self) -> Entry {
        let mut entry = Entry::new(EntryType::Book)
            .with_field(fields::TITLE, self.title.clone())
            .with_field(fields::AUTHOR, self.authors.join(" and "))
            .with_field(fields::ISBN, self.isbn13.clone());

        if let Some(year) = self.year() {
            entry.set_field(fields::YEAR, year.to_string());
        }
        if let Some(subtitle) = self.subtitle {
            entry.set_field(fields::SUBTITLE, subtitle);
        }
        if let Some(publisher) = self.publishers.first() {
            entry.set_field(fields::PUBLISHER, publisher.clone());
        }
        if let Some(place) = self.publish_places.first() {
            entry.set_field(fields::ADDRESS, place.clone());
        }
        if !self.subjects.is_empty() {
            entry.set_field(fields::KEYWORDS, self.subjects.join(", "));
        }
        if let Some(url) = self.url {
            entry.set_field(fields::URL, url);
        }
        entry
    }
}

/// Open Library lists authors, publishers and places as `[{"name": ..}]`,
/// older records as plain strings.
fn names(v: Option<&Value>) -> Vec<String> {
    v.and_then(Value::as_array)
        .map(|arr| {
            arr.iter()
                .filter_map(|item| {
                    item.get("name")
                        .and_then(Value::as_str)
                        .or_else(|| item.as_str())
                })
                .map(ToOwned::to_owned)
                .collect()
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};

    const BOOK: &str = r#"{
        "ISBN:9780306406157": {
            "url": "https://openlibrary.org/books/OL4571426M/Fundamentals_of_convolution",
            "title": "Fundamentals of convolution",
            "authors": [{"url": "https://openlibrary.org/authors/OL1A", "name": "Jane Doe"}],
            "publishers": [{"name": "Plenum Press"}],
            "publish_places": [{"name": "New York"}],
            "publish_date": "March 1981",
            "number_of_pages": 312,
            "subjects": [{"name": "Convolutions (Mathematics)"}]
        }
    }"#;

    fn source(server: &Server) -> OpenLibrarySource {
        OpenLibrarySource::with_params(&server.url(), Duration::from_secs(0), None).unwrap()
    }

    #[tokio::test]
    async fn fetches_book_by_isbn10() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("GET", "/api/books")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("bibkeys".into(), "ISBN:9780306406157".into()),
                Matcher::UrlEncoded("jscmd".into(), "data".into()),
            ]))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(BOOK)
            .create_async()
            .await;

        let entry = source(&server)
            .perform_search_by_id("0-306-40615-2")
            .await
            .unwrap()
            .unwrap();

        assert_eq!(entry.entry_type, EntryType::Book);
        assert_eq!(entry.title(), Some("Fundamentals of convolution"));
        assert_eq!(entry.field(fields::AUTHOR), Some("Jane Doe"));
        assert_eq!(entry.field(fields::PUBLISHER), Some("Plenum Press"));
        assert_eq!(entry.field(fields::ADDRESS), Some("New York"));
        assert_eq!(entry.field(fields::YEAR), Some("1981"));
        assert_eq!(entry.field(fields::ISBN), Some("9780306406157"));
    }

    #[tokio::test]
    async fn empty_response_is_not_found() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("GET", "/api/books")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body("{}")
            .create_async()
            .await;

        let result = source(&server).perform_search_by_id("9780306406157").await.unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn server_error_is_propagated() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("GET", "/api/books")
            .match_query(Matcher::Any)
            .with_status(500)
            .with_body("boom")
            .create_async()
            .await;

        let err = source(&server).perform_search_by_id("9780306406157").await.unwrap_err();
        assert!(matches!(err, ScienceError::ApiError(_, _)));
    }

    #[test]
    fn string_publishers_are_accepted() {
        let book = OpenLibraryBook::from_json(
            &serde_json::json!({"title": "T", "publishers": ["Old House"], "publish_date": "n.d."}),
            "9780306406157",
        );
        assert_eq!(book.publishers, vec!["Old House"]);
        assert_eq!(book.year(), None);
    }
}
