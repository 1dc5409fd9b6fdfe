use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{Result, ScienceError};

// YYMM.NNNN or YYMM.NNNNN, optional version
static NEW_FORMAT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{4}\.\d{4,5})(?:v(\d+))?$").expect("valid arXiv regex"));

// archive[.SUBJ]/YYMMNNN, optional version
static OLD_FORMAT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([a-zA-Z\-]+(?:\.[A-Z]{2})?)/(\d{7})(?:v(\d+))?$").expect("valid arXiv regex")
});

const URL_PREFIXES: &[&str] = &[
    "https://arxiv.org/abs/",
    "http://arxiv.org/abs/",
    "https://arxiv.org/pdf/",
    "http://arxiv.org/pdf/",
    "arxiv.org/abs/",
];

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ArxivId {
    pub raw: String,
    /// Identifier without version, e.g. `1706.03762` or `hep-th/9901001`.
    pub id: String,
    pub version: Option<u8>,
    pub abs_url: String,
    pub pdf_url: String,
    pub category: Option<String>,
}

impl ArxivId {
    pub fn parse(input: &str) -> Result<Self> {
        let input = input.trim();
        let stripped = strip_arxiv_prefix(input);

        if let Some(caps) = NEW_FORMAT.captures(stripped) {
            let id = caps[1].to_string();
            let version = caps.get(2).and_then(|v| v.as_str().parse::<u8>().ok());
            return Ok(Self::build(input, id, version, None));
        }

        if let Some(caps) = OLD_FORMAT.captures(stripped) {
            let category = caps[1].to_string();
            let id = format!("{}/{}", &caps[1], &caps[2]);
            let version = caps.get(3).and_then(|v| v.as_str().parse::<u8>().ok());
            return Ok(Self::build(input, id, version, Some(category)));
        }

        Err(ScienceError::InvalidArxivId(input.to_string()))
    }

    fn build(raw: &str, id: String, version: Option<u8>, category: Option<String>) -> Self {
        Self {
            raw: raw.to_string(),
            abs_url: format!("https://arxiv.org/abs/{id}"),
            pdf_url: format!("https://arxiv.org/pdf/{id}"),
            id,
            version,
            category,
        }
    }

    /// Identifier including the version suffix when one was given.
    pub fn versioned(&self) -> String {
        match self.version {
            Some(v) => format!("{}v{v}", self.id),
            None => self.id.clone(),
        }
    }
}

impl fmt::Display for ArxivId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.versioned())
    }
}

fn strip_arxiv_prefix(input: &str) -> &str {
    for prefix in URL_PREFIXES {
        if let Some(rest) = input.strip_prefix(prefix) {
            return rest.trim_end_matches(".pdf");
        }
    }
    match (input.get(..6), input.get(6..)) {
        (Some(scheme), Some(rest)) if scheme.eq_ignore_ascii_case("arxiv:") => rest.trim_start(),
        _ => input,
    }
}
