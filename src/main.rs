mod app;
mod board;
mod config;
mod input;
mod ui;

use std::fs::File;
use std::io::stdout;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use color_eyre::eyre::{bail, WrapErr};
use crossterm::event::{DisableMouseCapture, EnableMouseCapture};
use crossterm::execute;
use log::info;
use simplelog::{ConfigBuilder, WriteLogger};

use board::storage::{FileStore, KvStore, MemoryStore};
use board::sync::Synchronizer;
use board::ColumnId;
use config::Config;

#[derive(Parser)]
#[command(name = "laneboard", about = "A four-lane kanban board for the terminal")]
struct Cli {
    /// Board file to use instead of the configured one
    #[arg(long, global = true)]
    store: Option<PathBuf>,

    /// Config file to read instead of the default
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Keep the board in memory only; nothing is written to disk
    #[arg(long, global = true)]
    ephemeral: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Append an item to a column
    Add {
        /// Column (backlog, progress, complete, on-hold)
        column: ColumnId,
        /// Item text
        text: String,
    },
    /// List items with their indices
    List {
        /// Only show this column
        #[arg(short, long)]
        column: Option<ColumnId>,
    },
    /// Replace an item's text; empty text deletes it
    Edit {
        column: ColumnId,
        index: usize,
        text: String,
    },
    /// Move an item to the end of another column
    Move {
        column: ColumnId,
        index: usize,
        to: ColumnId,
    },
    /// Clear the board and reseed the sample items
    Reset,
    /// Print the board file location
    Path,
}

fn main() {
    // Install color_eyre for unexpected panics/errors (developer bugs).
    let _ = color_eyre::install();
    let cli = Cli::parse();

    let result = Config::load(cli.config.as_deref())
        .wrap_err("could not load config")
        .and_then(|mut config| {
            if let Some(path) = cli.store.clone() {
                config.store_path = path;
            }
            init_logging(&config);
            dispatch(cli, &config)
        });

    if let Err(e) = result {
        print_user_error(&e);
        std::process::exit(1);
    }
}

/// Log to a file: the terminal belongs to the TUI.
fn init_logging(config: &Config) {
    if let Some(parent) = config.log_file.parent() {
        let _ = std::fs::create_dir_all(parent);
    }
    let log_config = ConfigBuilder::new().set_time_format_rfc3339().build();
    if let Ok(log_file) = File::create(&config.log_file) {
        let _ = WriteLogger::init(config.log_level, log_config, log_file);
    }
}

fn dispatch(cli: Cli, config: &Config) -> color_eyre::Result<()> {
    if let Some(Command::Path) = cli.command {
        if cli.ephemeral {
            println!("(in memory)");
        } else {
            println!("{}", config.store_path.display());
        }
        return Ok(());
    }

    if cli.ephemeral {
        info!("laneboard starting with an in-memory store");
        let mut sync = Synchronizer::open(MemoryStore::new())?;
        run_command(cli.command, &mut sync, config)
    } else {
        let store = FileStore::open(&config.store_path)?;
        info!("laneboard starting with store {}", store.path().display());
        let mut sync = Synchronizer::open(store)?;
        run_command(cli.command, &mut sync, config)
    }
}

fn run_command<S: KvStore>(
    command: Option<Command>,
    sync: &mut Synchronizer<S>,
    config: &Config,
) -> color_eyre::Result<()> {
    match command {
        Some(Command::Add { column, text }) => cmd_add(sync, column, &text),
        Some(Command::List { column }) => {
            print!("{}", cmd_list(sync, column));
            Ok(())
        }
        Some(Command::Edit { column, index, text }) => cmd_edit(sync, column, index, &text),
        Some(Command::Move { column, index, to }) => cmd_move(sync, column, index, to),
        Some(Command::Reset) => cmd_reset(sync),
        Some(Command::Path) => Ok(()),
        None => cmd_tui(sync, config.mouse),
    }
}

/// Print a user-friendly error message, with actionable hints for known error types.
fn print_user_error(error: &color_eyre::Report) {
    if let Some(storage_err) = error.downcast_ref::<board::storage::StorageError>() {
        match storage_err {
            board::storage::StorageError::Io(e) => {
                eprintln!("error: could not read or write the board file.");
                eprintln!("  {e}");
                eprintln!("  Run `laneboard path` to see where it lives.");
            }
            board::storage::StorageError::Json(e) => {
                eprintln!("error: failed to encode the board.");
                eprintln!("  {e}");
            }
            board::storage::StorageError::MissingKey(key) => {
                eprintln!("error: the board file has no {key:?} entry.");
                eprintln!("  Run `laneboard reset` to start over.");
            }
        }
        return;
    }

    if let Some(config_err) = error.downcast_ref::<config::ConfigError>() {
        eprintln!("error: {config_err}");
        eprintln!("  Fix or remove {}.", config_hint_path(config_err).display());
        return;
    }

    // For eyre::eyre!() / bail!() messages, print the full error chain.
    eprintln!("error: {e:#}", e = error);
}

/// The config file a [`config::ConfigError`] should point the user at.
fn config_hint_path(error: &config::ConfigError) -> PathBuf {
    error
        .path()
        .map(PathBuf::from)
        .unwrap_or_else(config::default_config_path)
}

fn cmd_add<S: KvStore>(sync: &mut Synchronizer<S>, column: ColumnId, text: &str) -> color_eyre::Result<()> {
    if text.trim().is_empty() {
        bail!("Item text cannot be empty");
    }
    sync.set_pending(column, text);
    sync.append_item(column)?;
    println!("Added to {}: {text}", column.title());
    Ok(())
}

fn cmd_list<S: KvStore>(sync: &Synchronizer<S>, column: Option<ColumnId>) -> String {
    let mut out = String::new();
    for col in ColumnId::ALL {
        if column.is_some_and(|c| c != col) {
            continue;
        }
        let items = sync.board().items(col);
        out.push_str(&format!("\n{} ({})\n", col.title(), items.len()));
        out.push_str(&"─".repeat(40));
        out.push('\n');
        for (idx, text) in items.iter().enumerate() {
            out.push_str(&format!("  {idx:>3}  {text}\n"));
        }
    }
    out.push('\n');
    out
}

fn cmd_edit<S: KvStore>(
    sync: &mut Synchronizer<S>,
    column: ColumnId,
    index: usize,
    text: &str,
) -> color_eyre::Result<()> {
    let Some(node) = sync.tree().child_at(column, index) else {
        bail!("No item {index} in {}", column.title());
    };
    sync.edit_node_text(node, text);
    sync.apply_edit(column, index)?;
    if text.is_empty() {
        println!("Deleted {} item {index}", column.title());
    } else {
        println!("Updated {} item {index}", column.title());
    }
    Ok(())
}

fn cmd_move<S: KvStore>(
    sync: &mut Synchronizer<S>,
    column: ColumnId,
    index: usize,
    to: ColumnId,
) -> color_eyre::Result<()> {
    if !sync.move_item(column, index, to)? {
        bail!("No item {index} in {}", column.title());
    }
    println!("Moved {} item {index} to {}", column.title(), to.title());
    Ok(())
}

fn cmd_reset<S: KvStore>(sync: &mut Synchronizer<S>) -> color_eyre::Result<()> {
    sync.reset()?;
    println!("Board reset");
    Ok(())
}

fn cmd_tui<S: KvStore>(sync: &mut Synchronizer<S>, mouse: bool) -> color_eyre::Result<()> {
    let mut terminal = ratatui::init();
    if mouse {
        setup_or_restore(|| execute!(stdout(), EnableMouseCapture), ratatui::restore)?;
    }
    let result = app::run(&mut terminal, sync, mouse);
    if mouse {
        let _ = execute!(stdout(), DisableMouseCapture);
    }
    ratatui::restore();
    result
}

/// Run a terminal setup step; on failure, restore the terminal before
/// returning the error.
fn setup_or_restore<E>(setup: impl FnOnce() -> Result<(), E>, restore: impl FnOnce()) -> Result<(), E> {
    setup().inspect_err(|_| restore())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    fn open(path: &Path) -> Synchronizer<FileStore> {
        Synchronizer::open(FileStore::open(path).unwrap()).unwrap()
    }

    #[test]
    fn cmd_add_persists_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("board.json");
        cmd_add(&mut open(&path), ColumnId::Complete, "ship it").unwrap();

        let reopened = open(&path);
        assert_eq!(
            reopened.board().items(ColumnId::Complete),
            vec!["Complete Test entry", "ship it"]
        );
    }

    #[test]
    fn cmd_add_rejects_blank_text() {
        let dir = tempfile::tempdir().unwrap();
        let mut sync = open(&dir.path().join("board.json"));
        assert!(cmd_add(&mut sync, ColumnId::Backlog, "  ").is_err());
        assert_eq!(sync.board().len(ColumnId::Backlog), 1);
    }

    #[test]
    fn cmd_edit_updates_and_deletes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("board.json");
        let mut sync = open(&path);
        cmd_add(&mut sync, ColumnId::Backlog, "second").unwrap();
        cmd_edit(&mut sync, ColumnId::Backlog, 1, "2nd").unwrap();
        cmd_edit(&mut sync, ColumnId::Backlog, 0, "").unwrap();

        assert_eq!(open(&path).board().items(ColumnId::Backlog), vec!["2nd"]);
    }

    #[test]
    fn cmd_edit_out_of_range_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut sync = open(&dir.path().join("board.json"));
        assert!(cmd_edit(&mut sync, ColumnId::OnHold, 4, "x").is_err());
    }

    #[test]
    fn cmd_move_appends_to_target() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("board.json");
        cmd_move(&mut open(&path), ColumnId::Backlog, 0, ColumnId::Progress).unwrap();

        let reopened = open(&path);
        assert!(reopened.board().items(ColumnId::Backlog).is_empty());
        assert_eq!(
            reopened.board().items(ColumnId::Progress),
            vec!["Progress Test entry", "Backlog Test entry"]
        );
    }

    #[test]
    fn cmd_move_missing_item_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut sync = open(&dir.path().join("board.json"));
        assert!(cmd_move(&mut sync, ColumnId::Backlog, 7, ColumnId::Progress).is_err());
    }

    #[test]
    fn cmd_reset_reseeds() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("board.json");
        let mut sync = open(&path);
        cmd_edit(&mut sync, ColumnId::Progress, 0, "").unwrap();
        cmd_reset(&mut sync).unwrap();
        assert_eq!(open(&path).board().items(ColumnId::Progress), vec!["Progress Test entry"]);
    }

    #[test]
    fn cmd_list_filters_by_column() {
        let sync = Synchronizer::open(MemoryStore::new()).unwrap();
        let all = cmd_list(&sync, None);
        assert!(all.contains("Backlog Test entry"));
        assert!(all.contains("On Hold Test entry"));

        let one = cmd_list(&sync, Some(ColumnId::Complete));
        assert!(one.contains("Complete (1)"));
        assert!(one.contains("    0  Complete Test entry"));
        assert!(!one.contains("Backlog"));
    }

    #[test]
    fn cli_parses_columns_and_global_flags() {
        let cli = Cli::try_parse_from(["laneboard", "move", "backlog", "2", "on-hold", "--ephemeral"]).unwrap();
        assert!(cli.ephemeral);
        match cli.command {
            Some(Command::Move { column, index, to }) => {
                assert_eq!((column, index, to), (ColumnId::Backlog, 2, ColumnId::OnHold));
            }
            _ => panic!("expected move"),
        }
        assert!(Cli::try_parse_from(["laneboard", "add", "doing", "x"]).is_err());
    }

    #[test]
    fn config_hint_names_the_failing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("custom.toml");
        std::fs::write(&path, "mouse = [").unwrap();
        let err = Config::load(Some(&path)).unwrap_err();
        assert_eq!(config_hint_path(&err), path);

        let level_err = config::ConfigError::LogLevel("loud".into());
        assert_eq!(config_hint_path(&level_err), config::default_config_path());
    }

    #[test]
    fn failed_terminal_setup_restores_first() {
        let mut restored = false;
        let result = setup_or_restore(|| Err(std::io::Error::other("no tty")), || restored = true);
        assert!(result.is_err());
        assert!(restored);

        let mut restored = false;
        setup_or_restore(|| Ok::<(), std::io::Error>(()), || restored = true).unwrap();
        assert!(!restored);
    }
}
