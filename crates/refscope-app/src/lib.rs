//! Refscope App: background tasks, the library tab and the user-facing
//! import actions, independent of any particular front end.

pub mod actions;
pub mod error;
pub mod library_tab;
pub mod task;
pub mod ui;

pub use actions::{GenerateEntryFromIdAction, ManualEntryAction, NewEntryAction};
pub use error::{ImportError, Result};
pub use library_tab::LibraryTab;
pub use task::{
    BackgroundTask, TaskAborted, TaskContext, TaskExecutor, TaskHandle, TaskSnapshot, TaskState, UiQueue,
    UiSender,
};
pub use ui::{DialogService, Popover};
