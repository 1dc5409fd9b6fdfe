use chrono::{DateTime, Utc};
use quick_xml::de::from_str;
use serde::Deserialize;

use crate::arxiv::types::ArxivMetadata;
use crate::error::{Result, ScienceError};
use crate::identifiers::{arxiv::ArxivId, doi::Doi};

const API_ERROR_MARKER: &str = "/api/errors";

#[derive(Debug, Deserialize)]
struct AtomFeed {
    #[serde(rename = "entry", default)]
    entries: Vec<AtomEntry>,
}

#[derive(Debug, Deserialize)]
struct AtomEntry {
    id: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    summary: String,
    #[serde(default)]
    published: String,
    #[serde(rename = "author", default)]
    authors: Vec<AtomAuthor>,
    #[serde(rename = "category", default)]
    categories: Vec<AtomCategory>,
    #[serde(rename = "arxiv:primary_category", alias = "primary_category")]
    primary_category: Option<AtomCategory>,
    #[serde(rename = "arxiv:comment", alias = "comment")]
    comment: Option<String>,
    #[serde(rename = "arxiv:journal_ref", alias = "journal_ref")]
    journal_ref: Option<String>,
    #[serde(rename = "arxiv:doi", alias = "doi")]
    doi: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AtomAuthor {
    name: String,
}

#[derive(Debug, Deserialize)]
struct AtomCategory {
    #[serde(rename = "@term")]
    term: Option<String>,
}

/// Parses an arXiv API Atom feed. The API reports bad queries as a single
/// entry whose id points at `/api/errors`; that is surfaced as an API error.
pub fn parse_atom_response(xml: &str) -> Result<Vec<ArxivMetadata>> {
    let feed: AtomFeed =
        from_str(xml).map_err(|e| ScienceError::Parse(format!("invalid atom xml: {e}")))?;

    if let Some(error) = feed.entries.iter().find(|e| e.id.contains(API_ERROR_MARKER)) {
        return Err(ScienceError::ApiError(
            "arXiv".to_string(),
            clean_text(&error.summary),
        ));
    }

    feed.entries.into_iter().map(parse_entry).collect()
}

fn parse_entry(entry: AtomEntry) -> Result<ArxivMetadata> {
    let arxiv_id = ArxivId::parse(entry.id.trim())
        .map_err(|_| ScienceError::Parse(format!("invalid arXiv id in entry: {}", entry.id)))?;

    let published = DateTime::parse_from_rfc3339(entry.published.trim())
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| ScienceError::Parse(format!("invalid published datetime: {e}")))?;

    let categories: Vec<String> = entry
        .categories
        .into_iter()
        .filter_map(|category| clean_optional(category.term))
        .collect();

    let primary_category = entry
        .primary_category
        .and_then(|category| clean_optional(category.term))
        .or_else(|| categories.first().cloned())
        .unwrap_or_default();

    Ok(ArxivMetadata {
        doi: entry.doi.and_then(|value| Doi::parse(value.trim()).ok()),
        title: clean_text(&entry.title),
        authors: entry
            .authors
            .into_iter()
            .map(|author| clean_text(&author.name))
            .filter(|name| !name.is_empty())
            .collect(),
        abstract_text: clean_text(&entry.summary),
        published,
        categories,
        primary_category,
        comment: clean_optional(entry.comment),
        journal_ref: clean_optional(entry.journal_ref),
        arxiv_id,
    })
}

fn clean_text(input: &str) -> String {
    input.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn clean_optional(value: Option<String>) -> Option<String> {
    value.map(|v| clean_text(&v)).filter(|v| !v.is_empty())
}
