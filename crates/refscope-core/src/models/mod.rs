pub mod entry;
pub mod entry_types;
pub mod fields;
pub mod library;

pub use entry::*;
pub use entry_types::*;
pub use library::*;
