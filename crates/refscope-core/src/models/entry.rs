use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::RefscopeError;

// ─── EntryType ──────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryType {
    #[default]
    Article,
    Book,
    InBook,
    InCollection,
    InProceedings,
    Proceedings,
    PhdThesis,
    MastersThesis,
    TechReport,
    Online,
    Misc,
}

impl EntryType {
    pub const ALL: &[EntryType] = &[
        Self::Article,
        Self::Book,
        Self::InBook,
        Self::InCollection,
        Self::InProceedings,
        Self::Proceedings,
        Self::PhdThesis,
        Self::MastersThesis,
        Self::TechReport,
        Self::Online,
        Self::Misc,
    ];

    /// Name as written after `@` in a `.bib` file.
    pub fn bibtex_name(&self) -> &'static str {
        match self {
            Self::Article => "article",
            Self::Book => "book",
            Self::InBook => "inbook",
            Self::InCollection => "incollection",
            Self::InProceedings => "inproceedings",
            Self::Proceedings => "proceedings",
            Self::PhdThesis => "phdthesis",
            Self::MastersThesis => "mastersthesis",
            Self::TechReport => "techreport",
            Self::Online => "online",
            Self::Misc => "misc",
        }
    }

    /// Human readable name used in notifications.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Article => "Article",
            Self::Book => "Book",
            Self::InBook => "InBook",
            Self::InCollection => "InCollection",
            Self::InProceedings => "InProceedings",
            Self::Proceedings => "Proceedings",
            Self::PhdThesis => "PhdThesis",
            Self::MastersThesis => "MastersThesis",
            Self::TechReport => "TechReport",
            Self::Online => "Online",
            Self::Misc => "Misc",
        }
    }
}

impl fmt::Display for EntryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.bibtex_name())
    }
}

impl FromStr for EntryType {
    type Err = RefscopeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "article" => Ok(Self::Article),
            "book" => Ok(Self::Book),
            "inbook" => Ok(Self::InBook),
            "incollection" => Ok(Self::InCollection),
            "inproceedings" | "conference" => Ok(Self::InProceedings),
            "proceedings" => Ok(Self::Proceedings),
            "phdthesis" => Ok(Self::PhdThesis),
            "mastersthesis" => Ok(Self::MastersThesis),
            "techreport" | "report" => Ok(Self::TechReport),
            "online" | "electronic" | "www" => Ok(Self::Online),
            "misc" => Ok(Self::Misc),
            other => Err(RefscopeError::UnknownEntryType(other.to_string())),
        }
    }
}

// ─── Entry ──────────────────────────────────────────────────

/// A single bibliographic entry: a type plus a set of named fields.
///
/// Field names are stored lowercase; values are kept verbatim so that
/// cleanup steps decide how to normalize them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    pub id: Uuid,
    pub entry_type: EntryType,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub citation_key: Option<String>,

    #[serde(default)]
    pub fields: BTreeMap<String, String>,

    pub created_at: DateTime<Utc>,
}

impl Entry {
    pub fn new(entry_type: EntryType) -> Self {
        Self {
            id: Uuid::now_v7(),
            entry_type,
            citation_key: None,
            fields: BTreeMap::new(),
            created_at: Utc::now(),
        }
    }

    pub fn with_field(mut self, name: &str, value: impl Into<String>) -> Self {
        self.set_field(name, value);
        self
    }

    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(&name.to_lowercase()).map(String::as_str)
    }

    pub fn has_field(&self, name: &str) -> bool {
        self.fields.contains_key(&name.to_lowercase())
    }

    /// Sets a field; an empty (or whitespace-only) value removes it instead.
    pub fn set_field(&mut self, name: &str, value: impl Into<String>) {
        let value = value.into();
        let key = name.to_lowercase();
        if value.trim().is_empty() {
            self.fields.remove(&key);
        } else {
            self.fields.insert(key, value);
        }
    }

    pub fn remove_field(&mut self, name: &str) -> Option<String> {
        self.fields.remove(&name.to_lowercase())
    }

    /// Moves the value of `from` to `to` unless `to` is already set.
    pub fn rename_field(&mut self, from: &str, to: &str) {
        if self.has_field(to) {
            return;
        }
        if let Some(value) = self.remove_field(from) {
            self.set_field(to, value);
        }
    }

    pub fn title(&self) -> Option<&str> {
        self.field(super::fields::TITLE)
    }
}
