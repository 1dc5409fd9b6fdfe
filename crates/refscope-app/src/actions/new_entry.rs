use std::sync::Arc;

use refscope_core::{Entry, EntryType, EntryTypes};
use tracing::warn;

use crate::actions::ManualEntryAction;
use crate::library_tab::LibraryTab;
use crate::ui::DialogService;

/// Inserts an empty entry of a given type into the library.
pub struct NewEntryAction {
    tab: LibraryTab,
    dialog: Arc<dyn DialogService>,
    entry_types: Arc<EntryTypes>,
}

impl NewEntryAction {
    pub fn new(tab: LibraryTab, dialog: Arc<dyn DialogService>, entry_types: Arc<EntryTypes>) -> Self {
        Self {
            tab,
            dialog,
            entry_types,
        }
    }

    /// Adds the entry and returns its index, or fails when the type does not
    /// exist in the library's mode.
    pub fn create(&self, entry_type: EntryType) -> refscope_core::Result<usize> {
        self.entry_types.ensure_known(self.tab.mode(), entry_type)?;
        Ok(self.tab.insert_entry(Entry::new(entry_type)))
    }
}

impl ManualEntryAction for NewEntryAction {
    fn execute(&self, entry_type: EntryType) {
        match self.create(entry_type) {
            Ok(_) => self
                .dialog
                .notify(&format!("Added new '{}' entry.", entry_type.display_name())),
            Err(e) => {
                warn!(%entry_type, error = %e, "cannot create entry");
                self.dialog.notify(&e.to_string());
            }
        }
    }
}
