//! Normalisation applied to freshly fetched entries before they are checked
//! against the library and inserted.

use refscope_core::{DatabaseMode, Entry, EntryTypes, fields};
use tracing::debug;

use crate::identifiers::{doi::Doi, isbn::Isbn};

const MONTHS: [&str; 12] = [
    "jan", "feb", "mar", "apr", "may", "jun", "jul", "aug", "sep", "oct", "nov", "dec",
];

/// Field pairs renamed when converting between BibTeX and BibLaTeX.
const BIBLATEX_RENAMES: [(&str, &str); 4] = [
    (fields::JOURNAL, fields::JOURNALTITLE),
    (fields::ADDRESS, fields::LOCATION),
    (fields::ARCHIVEPREFIX, fields::EPRINTTYPE),
    (fields::PRIMARYCLASS, fields::EPRINTCLASS),
];

pub struct ImportCleanup<'a> {
    mode: DatabaseMode,
    entry_types: &'a EntryTypes,
}

impl<'a> ImportCleanup<'a> {
    pub fn new(mode: DatabaseMode, entry_types: &'a EntryTypes) -> Self {
        Self { mode, entry_types }
    }

    pub fn do_post_cleanup(&self, entry: &mut Entry) {
        trim_fields(entry);
        normalize_doi(entry);
        normalize_isbn(entry);

        match self.mode {
            DatabaseMode::BibLaTeX => convert_to_biblatex(entry),
            DatabaseMode::BibTeX => convert_to_bibtex(entry),
        }

        let entry_type = self.entry_types.closest(self.mode, entry.entry_type);
        if entry_type != entry.entry_type {
            debug!(from = %entry.entry_type, to = %entry_type, mode = %self.mode, "remapped entry type");
            entry.entry_type = entry_type;
        }
    }
}

fn trim_fields(entry: &mut Entry) {
    entry.fields.retain(|_, value| {
        let trimmed = value.trim();
        if trimmed.len() != value.len() {
            *value = trimmed.to_string();
        }
        !value.is_empty()
    });
}

fn normalize_doi(entry: &mut Entry) {
    if let Some(doi) = entry.field(fields::DOI).and_then(|raw| Doi::parse(raw).ok()) {
        entry.set_field(fields::DOI, doi.normalized);
    }
}

fn normalize_isbn(entry: &mut Entry) {
    if let Some(isbn) = entry.field(fields::ISBN).and_then(|raw| Isbn::parse(raw).ok()) {
        entry.set_field(fields::ISBN, isbn.isbn13);
    }
}

fn convert_to_biblatex(entry: &mut Entry) {
    for (bibtex, biblatex) in BIBLATEX_RENAMES {
        entry.rename_field(bibtex, biblatex);
    }

    if entry.has_field(fields::DATE) {
        return;
    }
    let Some(year) = entry.remove_field(fields::YEAR) else {
        return;
    };
    let date = match entry.remove_field(fields::MONTH).as_deref().and_then(month_number) {
        Some(month) => format!("{year}-{month:02}"),
        None => year,
    };
    entry.set_field(fields::DATE, date);
}

fn convert_to_bibtex(entry: &mut Entry) {
    for (bibtex, biblatex) in BIBLATEX_RENAMES {
        entry.rename_field(biblatex, bibtex);
    }

    if entry.has_field(fields::YEAR) {
        return;
    }
    let Some((year, month)) = entry.field(fields::DATE).and_then(split_date) else {
        return;
    };
    entry.remove_field(fields::DATE);
    entry.set_field(fields::YEAR, year);
    if let Some(month) = month {
        entry.set_field(fields::MONTH, month.to_string());
    }
}

/// Accepts `1`..`12`, zero-padded numbers and English month names.
fn month_number(raw: &str) -> Option<u32> {
    let raw = raw.trim();
    if let Ok(n) = raw.parse::<u32>() {
        return (1..=12).contains(&n).then_some(n);
    }
    let prefix = raw.get(..3)?.to_ascii_lowercase();
    MONTHS
        .iter()
        .position(|m| *m == prefix)
        .map(|i| i as u32 + 1)
}

/// Splits an ISO-8601 style `YYYY`, `YYYY-MM` or `YYYY-MM-DD` date.
fn split_date(date: &str) -> Option<(String, Option<u32>)> {
    let mut parts = date.trim().split('-');
    let year = parts.next().filter(|y| y.len() == 4 && y.chars().all(|c| c.is_ascii_digit()))?;
    let month = match parts.next() {
        Some(m) => Some(month_number(m)?),
        None => None,
    };
    Some((year.to_string(), month))
}

#[cfg(test)]
mod tests {
    use super::*;
    use refscope_core::EntryType;

    fn clean(mode: DatabaseMode, mut entry: Entry) -> Entry {
        let types = EntryTypes::standard();
        ImportCleanup::new(mode, &types).do_post_cleanup(&mut entry);
        entry
    }

    #[test]
    fn trims_and_drops_empty_fields() {
        let mut entry = Entry::new(EntryType::Article).with_field(fields::TITLE, "  Deep learning \n");
        entry.fields.insert(fields::NOTE.to_string(), "   ".to_string());

        let entry = clean(DatabaseMode::BibTeX, entry);
        assert_eq!(entry.title(), Some("Deep learning"));
        assert!(!entry.has_field(fields::NOTE));
    }

    #[test]
    fn normalizes_identifiers() {
        let entry = Entry::new(EntryType::Book)
            .with_field(fields::DOI, "https://doi.org/10.1000/ABC")
            .with_field(fields::ISBN, "0-306-40615-2");

        let entry = clean(DatabaseMode::BibTeX, entry);
        assert_eq!(entry.field(fields::DOI), Some("10.1000/abc"));
        assert_eq!(entry.field(fields::ISBN), Some("9780306406157"));
    }

    #[test]
    fn invalid_isbn_is_left_alone() {
        let entry = Entry::new(EntryType::Book).with_field(fields::ISBN, "12345");
        let entry = clean(DatabaseMode::BibTeX, entry);
        assert_eq!(entry.field(fields::ISBN), Some("12345"));
    }

    #[test]
    fn converts_to_biblatex() {
        let entry = Entry::new(EntryType::Article)
            .with_field(fields::JOURNAL, "Nature")
            .with_field(fields::ADDRESS, "London")
            .with_field(fields::YEAR, "2015")
            .with_field(fields::MONTH, "may")
            .with_field(fields::ARCHIVEPREFIX, "arXiv")
            .with_field(fields::PRIMARYCLASS, "cs.LG");

        let entry = clean(DatabaseMode::BibLaTeX, entry);
        assert_eq!(entry.field(fields::JOURNALTITLE), Some("Nature"));
        assert_eq!(entry.field(fields::LOCATION), Some("London"));
        assert_eq!(entry.field(fields::DATE), Some("2015-05"));
        assert_eq!(entry.field(fields::EPRINTTYPE), Some("arXiv"));
        assert_eq!(entry.field(fields::EPRINTCLASS), Some("cs.LG"));
        for gone in [fields::JOURNAL, fields::ADDRESS, fields::YEAR, fields::MONTH] {
            assert!(!entry.has_field(gone), "{gone} should be converted");
        }
    }

    #[test]
    fn converts_to_bibtex() {
        let entry = Entry::new(EntryType::Online)
            .with_field(fields::JOURNALTITLE, "Nature")
            .with_field(fields::DATE, "2015-05-28")
            .with_field(fields::EPRINTTYPE, "arXiv");

        let entry = clean(DatabaseMode::BibTeX, entry);
        assert_eq!(entry.entry_type, EntryType::Misc);
        assert_eq!(entry.field(fields::JOURNAL), Some("Nature"));
        assert_eq!(entry.field(fields::YEAR), Some("2015"));
        assert_eq!(entry.field(fields::MONTH), Some("5"));
        assert_eq!(entry.field(fields::ARCHIVEPREFIX), Some("arXiv"));
        assert!(!entry.has_field(fields::DATE));
    }

    #[test]
    fn unparseable_date_is_kept() {
        let entry = Entry::new(EntryType::Misc).with_field(fields::DATE, "circa 1900");
        let entry = clean(DatabaseMode::BibTeX, entry);
        assert_eq!(entry.field(fields::DATE), Some("circa 1900"));
        assert!(!entry.has_field(fields::YEAR));
    }

    #[test]
    fn year_without_month_becomes_plain_date() {
        let entry = Entry::new(EntryType::Book).with_field(fields::YEAR, "1999");
        let entry = clean(DatabaseMode::BibLaTeX, entry);
        assert_eq!(entry.field(fields::DATE), Some("1999"));
        assert_eq!(entry.entry_type, EntryType::Book);
    }

    #[test]
    fn month_names() {
        assert_eq!(month_number("September"), Some(9));
        assert_eq!(month_number("03"), Some(3));
        assert_eq!(month_number("13"), None);
        assert_eq!(month_number("x"), None);
    }
}
