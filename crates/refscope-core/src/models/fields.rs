//! Standard field names, lowercase as stored in [`Entry::fields`](super::Entry).

pub const ABSTRACT: &str = "abstract";
pub const ADDRESS: &str = "address";
pub const ARCHIVEPREFIX: &str = "archiveprefix";
pub const AUTHOR: &str = "author";
pub const BOOKTITLE: &str = "booktitle";
pub const DATE: &str = "date";
pub const DOI: &str = "doi";
pub const EDITION: &str = "edition";
pub const EDITOR: &str = "editor";
pub const EPRINT: &str = "eprint";
pub const EPRINTCLASS: &str = "eprintclass";
pub const EPRINTTYPE: &str = "eprinttype";
pub const INSTITUTION: &str = "institution";
pub const ISBN: &str = "isbn";
pub const ISSN: &str = "issn";
pub const JOURNAL: &str = "journal";
pub const JOURNALTITLE: &str = "journaltitle";
pub const KEYWORDS: &str = "keywords";
pub const LOCATION: &str = "location";
pub const MONTH: &str = "month";
pub const NOTE: &str = "note";
pub const NUMBER: &str = "number";
pub const PAGES: &str = "pages";
pub const PRIMARYCLASS: &str = "primaryclass";
pub const PUBLISHER: &str = "publisher";
pub const SCHOOL: &str = "school";
pub const SUBTITLE: &str = "subtitle";
pub const TITLE: &str = "title";
pub const URL: &str = "url";
pub const VOLUME: &str = "volume";
pub const YEAR: &str = "year";
