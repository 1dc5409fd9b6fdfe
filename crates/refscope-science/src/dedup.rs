use std::collections::HashSet;

use refscope_core::{DatabaseMode, Entry, Library, fields};
use tracing::debug;

use crate::identifiers::{doi::Doi, isbn::Isbn};

/// Looks for an entry in a library that describes the same work as a
/// candidate. Only hard identifiers count: the DOI and any ISBN.
pub struct DuplicateCheck;

impl DuplicateCheck {
    /// First entry of `library` sharing the candidate's DOI or one of its
    /// ISBN-13 values, after normalisation.
    pub fn contains_duplicate(
        library: &Library,
        candidate: &Entry,
        mode: DatabaseMode,
    ) -> Option<Entry> {
        let doi = normalized_doi(candidate);
        let isbns = normalized_isbn13_values(candidate);
        if doi.is_none() && isbns.is_empty() {
            return None;
        }

        let found = library.entries().iter().find(|existing| {
            if doi.is_some() && normalized_doi(existing) == doi {
                return true;
            }
            !isbns.is_empty() && !normalized_isbn13_values(existing).is_disjoint(&isbns)
        });

        if let Some(existing) = found {
            debug!(%mode, existing = %existing.id, "duplicate by identifier");
        }
        found.cloned()
    }
}

fn normalized_doi(entry: &Entry) -> Option<String> {
    entry
        .field(fields::DOI)
        .and_then(|raw| Doi::parse(raw).ok().map(|doi| doi.normalized))
}

/// Every valid ISBN listed in the `isbn` field, as ISBN-13. Some records
/// carry several separated by commas or semicolons.
fn normalized_isbn13_values(entry: &Entry) -> HashSet<String> {
    entry
        .field(fields::ISBN)
        .map(|raw| {
            raw.split([',', ';'])
                .filter_map(|part| Isbn::parse(part).ok())
                .map(|isbn| isbn.isbn13)
                .collect()
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use refscope_core::EntryType;

    fn library_with(entries: Vec<Entry>) -> Library {
        let mut library = Library::new(DatabaseMode::BibTeX);
        for entry in entries {
            library.insert_entry(entry);
        }
        library
    }

    #[test]
    fn same_doi_is_duplicate() {
        let existing = Entry::new(EntryType::Article).with_field(fields::DOI, "10.1038/nature14539");
        let existing_id = existing.id;
        let library = library_with(vec![existing]);

        let candidate = Entry::new(EntryType::Article)
            .with_field(fields::DOI, "https://doi.org/10.1038/NATURE14539");
        let found = DuplicateCheck::contains_duplicate(&library, &candidate, DatabaseMode::BibTeX);
        assert_eq!(found.map(|e| e.id), Some(existing_id));
    }

    #[test]
    fn isbn10_matches_isbn13() {
        let library = library_with(vec![
            Entry::new(EntryType::Book).with_field(fields::ISBN, "978-0-306-40615-7"),
        ]);
        let candidate = Entry::new(EntryType::Book).with_field(fields::ISBN, "0306406152");
        assert!(
            DuplicateCheck::contains_duplicate(&library, &candidate, DatabaseMode::BibTeX).is_some()
        );
    }

    #[test]
    fn any_shared_isbn_matches() {
        let library = library_with(vec![
            Entry::new(EntryType::Book).with_field(fields::ISBN, "9780804429573, 9780306406157"),
        ]);
        let candidate = Entry::new(EntryType::Book).with_field(fields::ISBN, "9780306406157");
        assert!(
            DuplicateCheck::contains_duplicate(&library, &candidate, DatabaseMode::BibLaTeX).is_some()
        );
    }

    #[test]
    fn same_title_is_not_duplicate() {
        let library = library_with(vec![
            Entry::new(EntryType::Article)
                .with_field(fields::TITLE, "Deep learning")
                .with_field(fields::DOI, "10.1000/one"),
        ]);
        let candidate = Entry::new(EntryType::Article)
            .with_field(fields::TITLE, "Deep learning")
            .with_field(fields::DOI, "10.1000/two");
        assert!(
            DuplicateCheck::contains_duplicate(&library, &candidate, DatabaseMode::BibTeX).is_none()
        );
    }

    #[test]
    fn candidate_without_identifiers_never_matches() {
        let library = library_with(vec![Entry::new(EntryType::Misc)]);
        let candidate = Entry::new(EntryType::Misc).with_field(fields::TITLE, "Notes");
        assert!(
            DuplicateCheck::contains_duplicate(&library, &candidate, DatabaseMode::BibTeX).is_none()
        );
    }
}
