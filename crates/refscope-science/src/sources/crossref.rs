use std::time::Duration;

use async_trait::async_trait;
use once_cell::sync::Lazy;
use refscope_core::{Entry, EntryType, fields};
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Result, ScienceError};
use crate::http::{DiskCache, RateLimitedClient};
use crate::identifiers::doi::Doi;
use crate::sources::IdBasedFetcher;

pub const DEFAULT_BASE_URL: &str = "https://api.crossref.org";

static JATS_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"</?jats:[^>]*>").expect("valid regex"));

pub struct CrossRefSource {
    client: RateLimitedClient,
    cache: Option<DiskCache>,
    base_url: String,
}

impl CrossRefSource {
    pub fn new(polite_email: Option<String>) -> Result<Self> {
        Self::with_params(DEFAULT_BASE_URL, Duration::from_millis(100), polite_email, None)
    }

    pub fn with_params(
        base_url: &str,
        min_interval: Duration,
        polite_email: Option<String>,
        cache: Option<DiskCache>,
    ) -> Result<Self> {
        // Crossref routes requests carrying a mailto to its "polite" pool.
        let user_agent = match &polite_email {
            Some(email) => format!("refscope/0.1 (mailto:{email})"),
            None => "refscope/0.1".to_string(),
        };

        Ok(Self {
            client: RateLimitedClient::new(min_interval, 3, &user_agent)?,
            cache,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub async fn fetch_by_doi(&self, doi: &Doi) -> Result<CrossRefWork> {
        let key = format!("doi:{}", doi.normalized);
        if let Some(cache) = &self.cache
            && let Some(cached) = cache.get::<CrossRefWork>(&key).await
        {
            return Ok(cached);
        }

        let url = format!("{}/works/{}", self.base_url, doi.normalized);
        let val: Value = self.client.get_json(&url).await?;

        let work = CrossRefWork::from_json(&val["message"])?;
        if let Some(cache) = &self.cache {
            cache.set(&key, &work).await;
        }
        Ok(work)
    }
}

#[async_trait]
impl IdBasedFetcher for CrossRefSource {
    fn name(&self) -> &str {
        "Crossref"
    }

    async fn perform_search_by_id(&self, identifier: &str) -> Result<Option<Entry>> {
        let doi = match Doi::parse(identifier) {
            Ok(doi) => doi,
            Err(_) => return Ok(None),
        };
        match self.fetch_by_doi(&doi).await {
            Ok(work) => Ok(Some(work.into_entry())),
            Err(ScienceError::IdentifierNotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrossRefWork {
    pub doi: String,
    pub title: Vec<String>,
    pub author: Vec<CrossRefAuthor>,
    pub published_year: Option<i32>,
    pub published_month: Option<u32>,
    pub work_type: String,
    pub container_title: Vec<String>,
    pub publisher: Option<String>,
    pub volume: Option<String>,
    pub issue: Option<String>,
    pub page: Option<String>,
    pub issn: Vec<String>,
    pub isbn: Vec<String>,
    pub url: Option<String>,
    pub abstract_text: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrossRefAuthor {
    pub given: Option<String>,
    pub family: Option<String>,
    pub name: Option<String>,
}

impl CrossRefWork {
    pub fn from_json(v: &Value) -> Result<Self> {
        let doi = v["DOI"]
            .as_str()
            .ok_or_else(|| ScienceError::Parse("Missing DOI in CrossRef response".to_string()))?
            .to_string();

        let (published_year, published_month) = parse_date(v);

        Ok(Self {
            doi,
            title: string_array(&v["title"]),
            author: v["author"]
                .as_array()
                .map(|a| a.iter().map(CrossRefAuthor::from_json).collect())
                .unwrap_or_default(),
            published_year,
            published_month,
            work_type: v["type"].as_str().unwrap_or("other").to_string(),
            container_title: string_array(&v["container-title"]),
            publisher: string_field(v, "publisher"),
            volume: string_field(v, "volume"),
            issue: string_field(v, "issue"),
            page: string_field(v, "page"),
            issn: string_array(&v["ISSN"]),
            isbn: string_array(&v["ISBN"]),
            url: string_field(v, "URL"),
            abstract_text: string_field(v, "abstract"),
        })
    }

    pub fn entry_type(&self) -> EntryType {
        match self.work_type.as_str() {
            "journal-article" => EntryType::Article,
            "book" | "monograph" | "edited-book" | "reference-book" => EntryType::Book,
            "book-chapter" | "book-section" | "book-part" => EntryType::InCollection,
            "proceedings-article" => EntryType::InProceedings,
            "proceedings" => EntryType::Proceedings,
            "dissertation" => EntryType::PhdThesis,
            "report" | "report-series" => EntryType::TechReport,
            _ => EntryType::Misc,
        }
    }

    pub fn into_entry(self) -> Entry {
        let entry_type = self.entry_type();
        let authors = self
            .author
            .iter()
            .map(CrossRefAuthor::display_name)
            .filter(|name| !name.is_empty())
            .collect::<Vec<_>>()
            .join(" and ");

        let mut entry = Entry::new(entry_type)
            .with_field(fields::TITLE, self.title.first().cloned().unwrap_or_default())
            .with_field(fields::AUTHOR, authors)
            .with_field(fields::DOI, self.doi);

        if let Some(year) = self.published_year {
            entry.set_field(fields::YEAR, year.to_string());
        }
        if let Some(month) = self.published_month {
            entry.set_field(fields::MONTH, month.to_string());
        }
        if let Some(container) = self.container_title.first() {
            let field = match entry_type {
                EntryType::Article => fields::JOURNAL,
                EntryType::InProceedings | EntryType::InCollection => fields::BOOKTITLE,
                _ => fields::NOTE,
            };
            entry.set_field(field, container.clone());
        }
        let optional = [
            (fields::PUBLISHER, self.publisher),
            (fields::VOLUME, self.volume),
            (fields::NUMBER, self.issue),
            (fields::PAGES, self.page.map(|p| p.replace('-', "--"))),
            (fields::URL, self.url),
            (fields::ABSTRACT, self.abstract_text.map(|a| strip_jats(&a))),
            (fields::ISBN, self.isbn.first().cloned()),
            (fields::ISSN, self.issn.first().cloned()),
        ];
        for (name, value) in optional {
            if let Some(value) = value {
                entry.set_field(name, value);
            }
        }
        entry
    }
}

impl CrossRefAuthor {
    fn from_json(v: &Value) -> Self {
        Self {
            given: string_field(v, "given"),
            family: string_field(v, "family"),
            name: string_field(v, "name"),
        }
    }

    /// `Family, Given` as BibTeX expects; organisations keep their name.
    fn display_name(&self) -> String {
        match (&self.family, &self.given) {
            (Some(f), Some(g)) => format!("{f}, {g}"),
            (Some(f), None) => f.clone(),
            (None, Some(g)) => g.clone(),
            (None, None) => self.name.clone().unwrap_or_default(),
        }
    }
}

fn string_field(v: &Value, key: &str) -> Option<String> {
    v[key].as_str().map(str::trim).filter(|s| !s.is_empty()).map(ToOwned::to_owned)
}

fn string_array(v: &Value) -> Vec<String> {
    v.as_array()
        .map(|a| a.iter().filter_map(Value::as_str).map(ToOwned::to_owned).collect())
        .unwrap_or_default()
}

fn parse_date(v: &Value) -> (Option<i32>, Option<u32>) {
    // "published-print": {"date-parts": [[2017, 6, 12]]}
    for key in ["published-print", "published-online", "issued", "created"] {
        let parts = &v[key]["date-parts"][0];
        if let Some(year) = parts[0].as_i64() {
            let month = parts[1].as_u64().map(|m| m as u32);
            return (Some(year as i32), month);
        }
    }
    (None, None)
}

fn strip_jats(text: &str) -> String {
    JATS_TAG
        .replace_all(text, "")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}
