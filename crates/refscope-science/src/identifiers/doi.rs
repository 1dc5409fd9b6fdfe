use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{Result, ScienceError};

const RESOLVER_PREFIXES: &[&str] = &[
    "https://doi.org/",
    "http://doi.org/",
    "https://dx.doi.org/",
    "http://dx.doi.org/",
    "doi.org/",
];

static DOI_SHAPE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^10\.\d{4,9}/\S+$").expect("valid DOI regex"));

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Doi {
    pub raw: String,
    pub normalized: String,
    pub url: String,
}

impl Doi {
    /// Accepts bare DOIs, `doi:` prefixes and resolver URLs. The normalized
    /// form is lowercase since DOIs compare case-insensitively.
    pub fn parse(input: &str) -> Result<Self> {
        let input = input.trim();
        let bare = strip_doi_prefix(input);

        if !DOI_SHAPE.is_match(bare) {
            return Err(ScienceError::InvalidDoi(input.to_string()));
        }

        let normalized = bare.to_lowercase();
        let url = format!("https://doi.org/{normalized}");
        Ok(Self {
            raw: input.to_string(),
            normalized,
            url,
        })
    }
}

impl fmt::Display for Doi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.normalized)
    }
}

fn strip_doi_prefix(input: &str) -> &str {
    for prefix in RESOLVER_PREFIXES {
        if let Some(rest) = input.strip_prefix(prefix) {
            return rest;
        }
    }
    match (input.get(..4), input.get(4..)) {
        (Some(scheme), Some(rest)) if scheme.eq_ignore_ascii_case("doi:") => rest.trim_start(),
        _ => input,
    }
}
