use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::RefscopeError;
use crate::models::entry::Entry;

/// Field conventions a library follows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseMode {
    #[default]
    #[serde(alias = "BibTeX")]
    BibTeX,
    #[serde(alias = "BibLaTeX")]
    BibLaTeX,
}

impl fmt::Display for DatabaseMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BibTeX => write!(f, "BibTeX"),
            Self::BibLaTeX => write!(f, "BibLaTeX"),
        }
    }
}

impl FromStr for DatabaseMode {
    type Err = RefscopeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "bibtex" => Ok(Self::BibTeX),
            "biblatex" => Ok(Self::BibLaTeX),
            other => Err(RefscopeError::UnknownMode(other.to_string())),
        }
    }
}

/// A library is an ordered collection of entries sharing one [`DatabaseMode`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Library {
    #[serde(default)]
    pub mode: DatabaseMode,

    #[serde(default)]
    entries: Vec<Entry>,
}

impl Library {
    pub fn new(mode: DatabaseMode) -> Self {
        Self {
            mode,
            entries: Vec::new(),
        }
    }

    /// Appends an entry and returns its position.
    pub fn insert_entry(&mut self, entry: Entry) -> usize {
        self.entries.push(entry);
        self.entries.len() - 1
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn find_by_id(&self, id: &Uuid) -> Option<&Entry> {
        self.entries.iter().find(|entry| entry.id == *id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
