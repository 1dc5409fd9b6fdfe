use chrono::{DateTime, Datelike, Utc};
use refscope_core::{Entry, EntryType, fields};
use serde::{Deserialize, Serialize};

use crate::identifiers::{arxiv::ArxivId, doi::Doi};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArxivMetadata {
    pub arxiv_id: ArxivId,
    pub doi: Option<Doi>,
    pub title: String,
    pub authors: Vec<String>,
    pub abstract_text: String,
    pub published: DateTime<Utc>,
    pub categories: Vec<String>,
    pub primary_category: String,
    pub comment: Option<String>,
    pub journal_ref: Option<String>,
}

impl ArxivMetadata {
    /// BibTeX-style entry; cleanup later renames the eprint fields for BibLaTeX.
    pub fn into_entry(self) -> Entry {
        let mut entry = Entry::new(EntryType::Article)
            .with_field(fields::TITLE, self.title)
            .with_field(fields::AUTHOR, self.authors.join(" and "))
            .with_field(fields::YEAR, self.published.year().to_string())
            .with_field(fields::MONTH, self.published.month().to_string())
            .with_field(fields::ABSTRACT, self.abstract_text)
            .with_field(fields::EPRINT, self.arxiv_id.versioned())
            .with_field(fields::ARCHIVEPREFIX, "arXiv")
            .with_field(fields::PRIMARYCLASS, self.primary_category)
            .with_field(fields::URL, self.arxiv_id.abs_url.clone())
            .with_field(fields::KEYWORDS, self.categories.join(", "));

        if let Some(doi) = self.doi {
            entry.set_field(fields::DOI, doi.normalized);
        }
        if let Some(journal) = self.journal_ref {
            entry.set_field(fields::JOURNAL, journal);
        }
        if let Some(comment) = self.comment {
            entry.set_field(fields::NOTE, comment);
        }
        entry
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn entry_carries_eprint_fields() {
        let metadata = ArxivMetadata {
            arxiv_id: ArxivId::parse("1706.03762v7").unwrap(),
            doi: None,
            title: "Attention Is All You Need".to_string(),
            authors: vec!["Ashish Vaswani".to_string(), "Noam Shazeer".to_string()],
            abstract_text: "Transformers.".to_string(),
            published: Utc.with_ymd_and_hms(2017, 6, 12, 17, 57, 40).unwrap(),
            categories: vec!["cs.CL".to_string(), "cs.LG".to_string()],
            primary_category: "cs.CL".to_string(),
            comment: None,
            journal_ref: None,
        };

        let entry = metadata.into_entry();
        assert_eq!(entry.entry_type, EntryType::Article);
        assert_eq!(entry.field(fields::AUTHOR), Some("Ashish Vaswani and Noam Shazeer"));
        assert_eq!(entry.field(fields::EPRINT), Some("1706.03762v7"));
        assert_eq!(entry.field(fields::ARCHIVEPREFIX), Some("arXiv"));
        assert_eq!(entry.field(fields::YEAR), Some("2017"));
        assert_eq!(entry.field(fields::MONTH), Some("6"));
        assert!(!entry.has_field(fields::DOI));
        assert!(!entry.has_field(fields::NOTE));
    }
}
