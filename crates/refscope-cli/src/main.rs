mod terminal;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use refscope_app::{
    GenerateEntryFromIdAction, LibraryTab, NewEntryAction, TaskExecutor, TaskState, UiQueue,
};
use refscope_core::{AppConfig, DatabaseMode, EntryTypes, ExitCode};
use refscope_science::formats::to_bibtex;
use refscope_science::{CompositeIdFetcher, Identifier, ScienceConfig};

use terminal::{PromptLine, TerminalDialog};

// ─── CLI Definition ─────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(
    name = "refscope",
    about = "Import bibliographic entries by DOI, ISBN or arXiv id",
    version,
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output in JSON format (for scripts).
    /// Also enabled by setting REFSCOPE_JSON=1.
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Look an identifier up and add the entry to the library.
    Import {
        identifier: String,
        /// Library file (defaults to the configured one).
        #[arg(long)]
        library: Option<PathBuf>,
        /// Mode for a library file that does not exist yet.
        #[arg(long)]
        mode: Option<DatabaseMode>,
    },

    /// Show which kind of identifier the input is and its normalised form.
    Identify { identifier: String },

    /// Print the library as BibTeX.
    List {
        #[arg(long)]
        library: Option<PathBuf>,
    },

    /// Show the effective configuration.
    Config,
}

// ─── Main ────────────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    let start = Instant::now();
    let cli = Cli::parse();

    init_logging();

    let json_output = cli.json || std::env::var("REFSCOPE_JSON").as_deref() == Ok("1");
    let config = AppConfig::load()?;

    match cli.command {
        // ── Import ─────────────────────────────────────────────────────────
        Commands::Import {
            identifier,
            library,
            mode,
        } => {
            let path = library.unwrap_or_else(|| config.library_path());
            let mode = mode.unwrap_or(config.core.default_mode);
            let library = refscope_core::load_or_create(&path, mode)
                .with_context(|| format!("cannot open library {}", path.display()))?;
            let before = library.len();

            let science = ScienceConfig::load()?;
            let fetcher = Arc::new(CompositeIdFetcher::from_config(&science)?);

            let runtime = tokio::runtime::Runtime::new()?;
            let mut queue = UiQueue::new();
            let executor = TaskExecutor::new(runtime.handle().clone(), queue.sender());

            let tab = LibraryTab::new(library);
            let dialog = Arc::new(TerminalDialog::new(json_output));
            let entry_types = Arc::new(EntryTypes::standard());
            let manual = Arc::new(NewEntryAction::new(
                tab.clone(),
                dialog.clone(),
                entry_types.clone(),
            ));
            let action = GenerateEntryFromIdAction::new(
                tab.clone(),
                dialog.clone(),
                fetcher,
                executor,
                Arc::new(PromptLine),
                manual,
                entry_types,
            )
            .with_import_config(config.import.clone());

            // Callbacks run here on the main thread while the lookup is in flight.
            let mut handle = action.execute(&identifier);
            let state = runtime.block_on(async {
                loop {
                    tokio::select! {
                        state = handle.join() => break state,
                        () = queue.next() => {}
                    }
                }
            });
            queue.run_pending();

            let library = tab.snapshot();
            if tab.is_modified() {
                refscope_core::save_library(&path, &library)?;
            }
            let added = &library.entries()[before.min(library.len())..];
            let error = action.last_error();

            let exit = match (state, &error) {
                (TaskState::Succeeded, _) => ExitCode::Success,
                _ if !added.is_empty() => ExitCode::Success,
                (_, Some(err)) => err.exit_code(),
                _ => ExitCode::GeneralError,
            };

            let dur = start.elapsed().as_millis();
            if json_output {
                print_json(&serde_json::json!({
                    "status": if exit == ExitCode::Success { "ok" } else { "error" },
                    "data": {
                        "state": format!("{state:?}").to_lowercase(),
                        "added": added,
                        "messages": dialog.notifications(),
                        "error": error.as_ref().map(ToString::to_string),
                        "library": path,
                    },
                    "meta": { "duration_ms": dur }
                }))?;
            } else {
                for entry in added {
                    print!("{}", to_bibtex(entry));
                }
            }

            if exit != ExitCode::Success {
                std::process::exit(exit as i32);
            }
        }

        // ── Identify ───────────────────────────────────────────────────────
        Commands::Identify { identifier } => match Identifier::parse(&identifier) {
            Some(id) => {
                if json_output {
                    print_json(&serde_json::json!({
                        "status": "ok",
                        "data": { "kind": id.kind(), "normalized": id.to_string() }
                    }))?;
                } else {
                    println!("{}  {}", id.kind(), id);
                }
            }
            None => {
                if json_output {
                    print_json(&serde_json::json!({
                        "status": "error",
                        "error": "invalid_identifier",
                        "message": format!("Not a DOI, arXiv id or ISBN: {identifier}")
                    }))?;
                } else {
                    eprintln!("Not a DOI, arXiv id or ISBN: {identifier}");
                }
                std::process::exit(ExitCode::InvalidArgs as i32);
            }
        },

        // ── List ───────────────────────────────────────────────────────────
        Commands::List { library } => {
            let path = library.unwrap_or_else(|| config.library_path());
            let library = refscope_core::load_or_create(&path, config.core.default_mode)
                .with_context(|| format!("cannot read library {}", path.display()))?;
            let dur = start.elapsed().as_millis();

            if json_output {
                print_json(&serde_json::json!({
                    "status": "ok",
                    "data": { "mode": library.mode, "items": library.entries(), "total": library.len() },
                    "meta": { "duration_ms": dur }
                }))?;
            } else if library.is_empty() {
                println!("No entries in {}. Use `refscope import <ID>` to add one.", path.display());
            } else {
                for entry in library.entries() {
                    println!("{}", to_bibtex(entry));
                }
            }
        }

        // ── Config ─────────────────────────────────────────────────────────
        Commands::Config => {
            let science = ScienceConfig::load()?;
            if json_output {
                print_json(&serde_json::json!({
                    "status": "ok",
                    "data": {
                        "config_path": AppConfig::config_path(),
                        "science_config_path": ScienceConfig::config_path(),
                        "app": config,
                        "science": science,
                    }
                }))?;
            } else {
                println!("config_path = {}", AppConfig::config_path().display());
                println!("library_path = {}", config.library_path().display());
                println!("default_mode = {}", config.core.default_mode);
                println!("import.offer_manual_entry = {}", config.import.offer_manual_entry);
                println!(
                    "import.hide_popover_on_success = {}",
                    config.import.hide_popover_on_success
                );
                println!("science_config_path = {}", ScienceConfig::config_path().display());
                println!(
                    "polite_pool_email = {}",
                    science.polite_pool_email.as_deref().unwrap_or("")
                );
                println!("crossref_base_url = {}", science.crossref_base_url);
                println!("arxiv_base_url = {}", science.arxiv_base_url);
                println!("openlibrary_base_url = {}", science.openlibrary_base_url);
                println!("cache.enabled = {}", science.cache.enabled);
                println!("cache.ttl_secs = {}", science.cache.ttl_secs);
            }
        }
    }

    Ok(())
}

// ─── Helpers ────────────────────────────────────────────────────────────────

fn init_logging() {
    let filter = EnvFilter::try_from_env("REFSCOPE_LOG")
        .unwrap_or_else(|_| EnvFilter::new("refscope=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn print_json(val: &serde_json::Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(val)?);
    Ok(())
}
