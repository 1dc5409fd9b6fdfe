pub mod generate_from_id;
pub mod new_entry;

use refscope_core::EntryType;

pub use generate_from_id::GenerateEntryFromIdAction;
pub use new_entry::NewEntryAction;

/// Creates an entry the user fills in by hand.
pub trait ManualEntryAction: Send + Sync {
    fn execute(&self, entry_type: EntryType);
}
