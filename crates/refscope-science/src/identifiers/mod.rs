pub mod arxiv;
pub mod doi;
pub mod isbn;

use std::fmt;

use arxiv::ArxivId;
use doi::Doi;
use isbn::Isbn;

/// An identifier typed by the user, classified by the scheme it matches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Identifier {
    Doi(Doi),
    Arxiv(ArxivId),
    Isbn(Isbn),
}

impl Identifier {
    /// Tries DOI, then arXiv, then ISBN. Returns `None` when nothing matches.
    pub fn parse(input: &str) -> Option<Self> {
        let input = input.trim();
        if input.is_empty() {
            return None;
        }
        Doi::parse(input)
            .map(Self::Doi)
            .or_else(|_| ArxivId::parse(input).map(Self::Arxiv))
            .or_else(|_| Isbn::parse(input).map(Self::Isbn))
            .ok()
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Doi(_) => "DOI",
            Self::Arxiv(_) => "arXiv",
            Self::Isbn(_) => "ISBN",
        }
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Doi(doi) => write!(f, "{doi}"),
            Self::Arxiv(id) => write!(f, "{id}"),
            Self::Isbn(isbn) => write!(f, "{isbn}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_each_scheme() {
        assert_eq!(Identifier::parse("10.1038/nature14539").unwrap().kind(), "DOI");
        assert_eq!(Identifier::parse("arXiv:1706.03762").unwrap().kind(), "arXiv");
        assert_eq!(Identifier::parse("978-0-306-40615-7").unwrap().kind(), "ISBN");
    }

    #[test]
    fn arxiv_doi_is_a_doi() {
        let id = Identifier::parse("10.48550/arXiv.1706.03762").unwrap();
        assert!(matches!(id, Identifier::Doi(_)));
    }

    #[test]
    fn unknown_input() {
        assert!(Identifier::parse("").is_none());
        assert!(Identifier::parse("   ").is_none());
        assert!(Identifier::parse("some random title").is_none());
    }

    #[test]
    fn display_uses_normalized_form() {
        let id = Identifier::parse("https://doi.org/10.1000/ABC").unwrap();
        assert_eq!(id.to_string(), "10.1000/abc");
    }
}
