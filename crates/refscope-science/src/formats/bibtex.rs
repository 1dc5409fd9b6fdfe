use refscope_core::{Entry, fields};

/// Fields printed verbatim; braces and TeX specials in them are meaningful.
const RAW_FIELDS: &[&str] = &[fields::DOI, fields::URL, fields::EPRINT];

/// Renders an entry as a BibTeX record. Title and author come first, the rest
/// in field-name order.
pub fn to_bibtex(entry: &Entry) -> String {
    let cite_key = entry
        .citation_key
        .clone()
        .unwrap_or_else(|| generate_cite_key(entry));

    let mut bib = format!("@{}{{{},\n", entry.entry_type.bibtex_name(), cite_key);

    let leading = [fields::TITLE, fields::AUTHOR];
    let ordered = leading
        .iter()
        .filter_map(|name| entry.field(name).map(|value| (*name, value)))
        .chain(
            entry
                .fields
                .iter()
                .filter(|(name, _)| !leading.contains(&name.as_str()))
                .map(|(name, value)| (name.as_str(), value.as_str())),
        );

    for (name, value) in ordered {
        let value = if RAW_FIELDS.contains(&name) {
            value.to_string()
        } else {
            escape_bibtex(value)
        };
        bib.push_str(&format!("  {name} = {{{value}}},\n"));
    }

    bib.push_str("}\n");
    bib
}

/// `authorYEARword`: first author's family name, the year and the first
/// word of the title, lowercase ASCII alphanumerics only.
pub fn generate_cite_key(entry: &Entry) -> String {
    let author = entry
        .field(fields::AUTHOR)
        .and_then(|authors| authors.split(" and ").next())
        .map(family_name)
        .map(|name| key_part(&name))
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| "unknown".to_string());

    let year = entry
        .field(fields::YEAR)
        .or_else(|| entry.field(fields::DATE).and_then(|d| d.get(..4)))
        .unwrap_or_default();

    let title_word = entry
        .title()
        .and_then(|t| t.split_whitespace().next())
        .map(key_part)
        .unwrap_or_default();

    format!("{author}{year}{title_word}")
}

fn family_name(author: &str) -> String {
    let author = author.trim();
    match author.split_once(',') {
        Some((family, _)) => family.to_string(),
        None => author.split_whitespace().last().unwrap_or(author).to_string(),
    }
}

fn key_part(s: &str) -> String {
    s.to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect()
}

fn escape_bibtex(s: &str) -> String {
    s.replace('&', "\\&")
        .replace('_', "\\_")
        .replace('$', "\\$")
        .replace('%', "\\%")
        .replace('#', "\\#")
}

#[cfg(test)]
mod tests {
    use super::*;
    use refscope_core::EntryType;

    #[test]
    fn test_to_bibtex() {
        let entry = Entry::new(EntryType::Article)
            .with_field(fields::TITLE, "Attention Is All You Need")
            .with_field(fields::AUTHOR, "Vaswani, Ashish and Shazeer, Noam")
            .with_field(fields::YEAR, "2017")
            .with_field(fields::DOI, "10.48550/arxiv.1706_03762");

        let bib = to_bibtex(&entry);
        assert!(bib.starts_with("@article{vaswani2017attention,\n  title = {Attention Is All You Need},\n  author = "));
        assert!(bib.contains("author = {Vaswani, Ashish and Shazeer, Noam}"));
        assert!(bib.contains("doi = {10.48550/arxiv.1706_03762}"));
        assert!(bib.ends_with("}\n"));
    }

    #[test]
    fn existing_citation_key_wins() {
        let mut entry = Entry::new(EntryType::Book).with_field(fields::TITLE, "R&D");
        entry.citation_key = Some("mykey".to_string());

        let bib = to_bibtex(&entry);
        assert!(bib.starts_with("@book{mykey,"));
        assert!(bib.contains("title = {R\\&D}"));
    }

    #[test]
    fn cite_key_from_given_family_and_date() {
        let entry = Entry::new(EntryType::Online)
            .with_field(fields::AUTHOR, "Ada Lovelace")
            .with_field(fields::DATE, "1843-09")
            .with_field(fields::TITLE, "Notes: on the engine");
        assert_eq!(generate_cite_key(&entry), "lovelace1843notes");
    }

    #[test]
    fn cite_key_without_author() {
        let entry = Entry::new(EntryType::Misc);
        assert_eq!(generate_cite_key(&entry), "unknown");
    }
}
