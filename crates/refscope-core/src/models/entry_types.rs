use std::collections::HashMap;

use crate::error::{RefscopeError, Result};
use crate::models::entry::EntryType;
use crate::models::library::DatabaseMode;

/// Registry of entry types available in each [`DatabaseMode`].
///
/// Passed explicitly to the components that need it instead of living in a
/// process-wide global.
#[derive(Debug, Clone)]
pub struct EntryTypes {
    by_mode: HashMap<DatabaseMode, Vec<EntryType>>,
}

impl EntryTypes {
    /// Standard BibTeX and BibLaTeX type sets. `online` is BibLaTeX-only.
    pub fn standard() -> Self {
        let bibtex = EntryType::ALL
            .iter()
            .copied()
            .filter(|t| *t != EntryType::Online)
            .collect();
        let biblatex = EntryType::ALL.to_vec();

        let mut by_mode = HashMap::new();
        by_mode.insert(DatabaseMode::BibTeX, bibtex);
        by_mode.insert(DatabaseMode::BibLaTeX, biblatex);
        Self { by_mode }
    }

    pub fn types_for(&self, mode: DatabaseMode) -> &[EntryType] {
        self.by_mode.get(&mode).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn is_known(&self, mode: DatabaseMode, entry_type: EntryType) -> bool {
        self.types_for(mode).contains(&entry_type)
    }

    pub fn ensure_known(&self, mode: DatabaseMode, entry_type: EntryType) -> Result<()> {
        if self.is_known(mode, entry_type) {
            Ok(())
        } else {
            Err(RefscopeError::EntryTypeNotAllowed {
                entry_type: entry_type.to_string(),
                mode: mode.to_string(),
            })
        }
    }

    /// Closest type available in `mode`; unknown types fall back to `misc`.
    pub fn closest(&self, mode: DatabaseMode, entry_type: EntryType) -> EntryType {
        if self.is_known(mode, entry_type) {
            entry_type
        } else {
            EntryType::Misc
        }
    }
}

impl Default for EntryTypes {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_online_only_in_biblatex() {
        let types = EntryTypes::standard();
        assert!(types.is_known(DatabaseMode::BibLaTeX, EntryType::Online));
        assert!(!types.is_known(DatabaseMode::BibTeX, EntryType::Online));
        assert_eq!(
            types.closest(DatabaseMode::BibTeX, EntryType::Online),
            EntryType::Misc
        );
    }

    #[test]
    fn test_article_everywhere() {
        let types = EntryTypes::standard();
        assert!(types.ensure_known(DatabaseMode::BibTeX, EntryType::Article).is_ok());
        assert!(types.ensure_known(DatabaseMode::BibLaTeX, EntryType::Article).is_ok());
    }

    #[test]
    fn test_ensure_known_reports_mode() {
        let err = EntryTypes::standard()
            .ensure_known(DatabaseMode::BibTeX, EntryType::Online)
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Entry type 'online' is not available in BibTeX mode"
        );
    }
}
