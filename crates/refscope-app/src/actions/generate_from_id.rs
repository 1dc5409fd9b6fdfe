use std::sync::{Arc, Mutex, PoisonError};

use refscope_core::{Entry, EntryType, EntryTypes, ImportConfig};
use refscope_science::{DuplicateCheck, IdBasedFetcher, ImportCleanup};
use tracing::{debug, info};

use crate::actions::ManualEntryAction;
use crate::error::ImportError;
use crate::library_tab::LibraryTab;
use crate::task::{BackgroundTask, TaskContext, TaskExecutor, TaskHandle};
use crate::ui::{DialogService, Popover};

pub const TASK_TITLE: &str = "Import by ID";

/// Looks an identifier up, cleans the record and adds it to the library,
/// falling back to manual entry creation when nothing usable comes back.
pub struct GenerateEntryFromIdAction {
    tab: LibraryTab,
    dialog: Arc<dyn DialogService>,
    fetcher: Arc<dyn IdBasedFetcher>,
    executor: TaskExecutor,
    popover: Arc<dyn Popover>,
    manual_entry: Arc<dyn ManualEntryAction>,
    entry_types: Arc<EntryTypes>,
    config: ImportConfig,
    last_error: Arc<Mutex<Option<ImportError>>>,
}

impl GenerateEntryFromIdAction {
    pub fn new(
        tab: LibraryTab,
        dialog: Arc<dyn DialogService>,
        fetcher: Arc<dyn IdBasedFetcher>,
        executor: TaskExecutor,
        popover: Arc<dyn Popover>,
        manual_entry: Arc<dyn ManualEntryAction>,
        entry_types: Arc<EntryTypes>,
    ) -> Self {
        Self {
            tab,
            dialog,
            fetcher,
            executor,
            popover,
            manual_entry,
            entry_types,
            config: ImportConfig::default(),
            last_error: Arc::new(Mutex::new(None)),
        }
    }

    pub fn with_import_config(mut self, config: ImportConfig) -> Self {
        self.config = config;
        self
    }

    /// Starts the import in the background. Outcomes are reported through the
    /// dialog service once the UI queue is drained.
    pub fn execute(&self, identifier: &str) -> TaskHandle {
        info!(identifier, "import by id");
        *self.last_error.lock().unwrap_or_else(PoisonError::into_inner) = None;
        self.import_task(identifier).execute_with(&self.executor)
    }

    /// Why the most recent import failed, once its failure callback has run.
    /// Recorded whether or not manual entry was offered.
    pub fn last_error(&self) -> Option<ImportError> {
        self.last_error
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// The import task with its user-facing callbacks attached, not yet
    /// started. Cancelling its token before execution makes it a no-op.
    pub fn import_task(&self, identifier: &str) -> BackgroundTask<Option<Entry>, ImportError> {
        let running_dialog = Arc::clone(&self.dialog);
        let failure_dialog = Arc::clone(&self.dialog);
        let success_dialog = Arc::clone(&self.dialog);
        let manual_entry = Arc::clone(&self.manual_entry);
        let popover = Arc::clone(&self.popover);
        let tab = self.tab.clone();
        let last_error = Arc::clone(&self.last_error);
        let offer_manual_entry = self.config.offer_manual_entry;
        let hide_popover = self.config.hide_popover_on_success;

        self.search_and_import(identifier)
            .with_title(TASK_TITLE)
            .show_to_user(true)
            .on_running(move |message| running_dialog.notify(&message))
            .on_failure(move |err| {
                *last_error.lock().unwrap_or_else(PoisonError::into_inner) = Some(err.clone());
                if !offer_manual_entry {
                    failure_dialog.notify(&err.to_string());
                    return;
                }
                let add_manually = failure_dialog.confirm(
                    "Failed to import by ID",
                    &err.to_string(),
                    "Add entry manually",
                );
                if add_manually {
                    manual_entry.execute(EntryType::Article);
                }
            })
            .on_success(move |entry| match entry {
                Some(entry) => {
                    tab.insert_entry(entry);
                    if hide_popover {
                        popover.hide();
                    }
                    success_dialog.notify("Imported one entry");
                }
                None => success_dialog.notify("Import canceled"),
            })
    }

    /// The bare background search: fetch, clean up, reject duplicates. Reads
    /// the library but never changes it.
    pub fn search_and_import(&self, identifier: &str) -> BackgroundTask<Option<Entry>, ImportError> {
        let identifier = identifier.trim().to_string();
        let fetcher = Arc::clone(&self.fetcher);
        let entry_types = Arc::clone(&self.entry_types);
        let tab = self.tab.clone();

        BackgroundTask::new(move |ctx: TaskContext| {
            run_search(ctx, identifier, fetcher, tab, entry_types)
        })
    }
}

async fn run_search(
    ctx: TaskContext,
    identifier: String,
    fetcher: Arc<dyn IdBasedFetcher>,
    tab: LibraryTab,
    entry_types: Arc<EntryTypes>,
) -> Result<Option<Entry>, ImportError> {
    if ctx.is_canceled() {
        return Ok(None);
    }
    ctx.update_message("Searching...");

    let Some(mut entry) = fetcher.perform_search_by_id(&identifier).await? else {
        return Err(ImportError::NotFound);
    };

    let mode = tab.mode();
    ImportCleanup::new(mode, &entry_types).do_post_cleanup(&mut entry);

    // Only DOI and ISBN are compared.
    let duplicate = DuplicateCheck::contains_duplicate(&tab.read(), &entry, mode);
    if let Some(existing) = duplicate {
        debug!(existing = %existing.id, "identifier already in library");
        return Err(ImportError::DuplicateExists);
    }

    ctx.update_message("Imported one entry");
    Ok(Some(entry))
}
