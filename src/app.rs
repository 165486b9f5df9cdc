//! Terminal driver for the viewer.
//!
//! Scans a directory, opens a [`Viewer`] on it and feeds it commands typed on
//! stdin. Stdin is read on a dedicated thread and forwarded over a flume
//! channel; the control loop selects between typed lines and viewer events
//! and prints the viewer state after each one.

use std::fmt::Write as _;
use std::io::BufRead;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use parking_lot::Mutex;
use tokio::sync::oneshot;
use tracing::{debug, info, warn};

use crate::backend::FsBackend;
use crate::config::ViewerConfig;
use crate::editor::{ColorFilter, CropRegion, PixelRect};
use crate::models::{FavoritesStore, SqliteKvStore};
use crate::scanner::FileScanner;
use crate::services::{Route, ViewerShell};
use crate::ui::{parse_key, InputEvent, PointerTarget};
use crate::viewer::{EditPhase, PageRef, Viewer, ViewerAction, ViewerOptions};

const HELP: &str = "\
keys:     esc left right + - r f
pointer:  drag X1 Y1 X2 Y2 | backdrop
nav:      jump N | reset | slideshow
edit:     edit | crop X Y W H | filter none|grayscale|sepia|invert
          brightness N | contrast N | save | cancel
files:    share | secure | setup PASSWORD
other:    status | help | quit";

/// Shell that asks for credentials on the terminal.
///
/// A pending prompt captures the next typed line instead of it being
/// interpreted as a command.
#[derive(Default)]
pub struct TerminalShell {
    pending: Mutex<Option<oneshot::Sender<Option<String>>>>,
}

impl TerminalShell {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hands `line` to a waiting prompt. Returns false if nothing was waiting.
    pub fn answer(&self, line: &str) -> bool {
        match self.pending.lock().take() {
            Some(tx) => {
                let credential = Some(line.trim().to_string()).filter(|c| !c.is_empty());
                let _ = tx.send(credential);
                true
            }
            None => false,
        }
    }

    pub fn is_prompting(&self) -> bool {
        self.pending.lock().is_some()
    }
}

impl ViewerShell for TerminalShell {
    async fn prompt_credential(&self) -> Option<String> {
        let (tx, rx) = oneshot::channel();
        *self.pending.lock() = Some(tx);
        println!("password (empty line cancels):");
        rx.await.ok().flatten()
    }

    fn navigate_to(&self, route: Route) {
        match route {
            Route::SecureFolderSetup => {
                println!(
                    "secure folder is not set up ({}); run `setup PASSWORD` first",
                    route.as_str()
                );
            }
        }
    }
}

/// One parsed line of terminal input.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Inputs(Vec<InputEvent>),
    Action(ViewerAction),
    Setup(String),
    Status,
    Help,
    Quit,
}

impl Command {
    pub fn parse(line: &str) -> Option<Self> {
        let mut words = line.split_whitespace();
        let head = words.next()?;
        let args: Vec<&str> = words.collect();
        let num = |i: usize| args.get(i).and_then(|a| a.parse::<f64>().ok());
        let int = |i: usize| args.get(i).and_then(|a| a.parse::<u32>().ok());

        let command = match head {
            "quit" | "q" => Command::Quit,
            "help" | "?" => Command::Help,
            "status" => Command::Status,
            "setup" => Command::Setup(args.first()?.to_string()),
            "backdrop" => Command::Inputs(vec![InputEvent::Click(PointerTarget::Backdrop)]),
            "drag" => Command::Inputs(vec![
                InputEvent::PointerDown {
                    x: num(0)?,
                    y: num(1)?,
                    target: PointerTarget::Media,
                },
                InputEvent::PointerMove {
                    x: num(2)?,
                    y: num(3)?,
                },
                InputEvent::PointerUp,
            ]),
            "jump" => Command::Action(ViewerAction::JumpTo(args.first()?.parse().ok()?)),
            "reset" => Command::Action(ViewerAction::ResetView),
            "slideshow" => Command::Action(ViewerAction::ToggleSlideshow),
            "share" => Command::Action(ViewerAction::Share),
            "secure" => Command::Action(ViewerAction::MoveToProtected),
            "edit" => Command::Action(ViewerAction::BeginEdit),
            "crop" => Command::Action(ViewerAction::SetCrop(Some(CropRegion::Source(
                PixelRect::new(int(0)?, int(1)?, int(2)?, int(3)?),
            )))),
            "filter" => Command::Action(ViewerAction::SetFilter(ColorFilter::from_name(
                args.first().copied().unwrap_or(""),
            )?)),
            "brightness" => Command::Action(ViewerAction::SetBrightness(args.first()?.parse().ok()?)),
            "contrast" => Command::Action(ViewerAction::SetContrast(args.first()?.parse().ok()?)),
            "save" => Command::Action(ViewerAction::CommitEdit),
            "cancel" => Command::Action(ViewerAction::CancelEdit),
            key => Command::Inputs(vec![InputEvent::Key(parse_key(key)?)]),
        };
        Some(command)
    }
}

pub struct App {
    dir: PathBuf,
    options: ViewerOptions,
    config: ViewerConfig,
}

impl App {
    pub fn new(dir: PathBuf, secure_folder: bool, config: ViewerConfig) -> Self {
        Self {
            dir,
            options: ViewerOptions { secure_folder },
            config,
        }
    }

    pub async fn run(self) -> Result<()> {
        let data_dir = self.config.resolve_data_dir()?;
        info!("Using data directory {:?}", data_dir);

        let items = FileScanner::new().scan(&self.dir).await?;
        anyhow::ensure!(!items.is_empty(), "No media found in {:?}", self.dir);

        let store = SqliteKvStore::open_or_recover(&data_dir.join(SqliteKvStore::FILE_NAME))?;
        let favorites = FavoritesStore::load(Box::new(store));
        let backend = Arc::new(FsBackend::new(&data_dir));
        let shell = Arc::new(TerminalShell::new());

        let page = PageRef::new(1, items.len(), 0);
        let mut viewer = Viewer::new(
            items,
            page,
            self.options,
            self.config.clone(),
            favorites,
            Arc::clone(&backend),
            Arc::clone(&shell),
        )
        .context("Failed to open viewer")?;

        let lines = spawn_stdin_reader();
        let events = viewer.events();
        println!("{}", HELP);
        println!("{}", describe(&viewer));

        loop {
            tokio::select! {
                line = lines.recv_async() => {
                    let Ok(line) = line else {
                        debug!("stdin closed");
                        break;
                    };
                    if shell.answer(&line) {
                        continue;
                    }
                    match Command::parse(&line) {
                        Some(Command::Quit) => break,
                        Some(Command::Help) => println!("{}", HELP),
                        Some(Command::Status) => {}
                        Some(Command::Setup(credential)) => {
                            match backend.setup_protected_area(&credential).await {
                                Ok(()) => println!("secure folder ready"),
                                Err(e) => println!("setup failed: {:#}", e),
                            }
                        }
                        Some(Command::Inputs(inputs)) => {
                            for input in inputs {
                                viewer.handle_input(input);
                            }
                        }
                        Some(Command::Action(action)) => viewer.dispatch(action),
                        None => {
                            println!("unrecognised command: {}", line.trim());
                            continue;
                        }
                    }
                }
                event = events.recv() => {
                    match event {
                        Ok(event) => viewer.handle_event(event),
                        Err(_) => break,
                    }
                }
            }

            if !shell.is_prompting() {
                println!("{}", describe(&viewer));
            }
            if !viewer.is_open() {
                break;
            }
        }

        viewer.close();
        Ok(())
    }
}

fn spawn_stdin_reader() -> flume::Receiver<String> {
    let (tx, rx) = flume::unbounded();
    std::thread::spawn(move || {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            match line {
                Ok(line) => {
                    if tx.send(line).is_err() {
                        break;
                    }
                }
                Err(e) => {
                    warn!("Failed to read stdin: {}", e);
                    break;
                }
            }
        }
    });
    rx
}

/// One-line summary of the viewer state.
pub fn describe<B, S>(viewer: &Viewer<B, S>) -> String
where
    B: crate::services::MediaBackend,
    S: ViewerShell,
{
    let mut out = String::new();
    let (Some(item), Some(index)) = (viewer.current_item(), viewer.global_index()) else {
        out.push_str("viewer closed");
        if let Some(note) = viewer.notification() {
            let _ = write!(out, " | {}", note.message);
        }
        return out;
    };

    let kind = if item.is_image() { "image" } else { "video" };
    let star = if viewer.is_current_favorite() { " *" } else { "" };
    let _ = write!(
        out,
        "[{}/{}] {} ({}){} | {}",
        index + 1,
        viewer.items().len(),
        item.url,
        kind,
        star,
        viewer.transform()
    );

    match viewer.edit_phase() {
        EditPhase::Viewing => {}
        EditPhase::Editing(session) => {
            let _ = write!(out, " | editing [{}]", session.preview_css());
            if let Some(crop) = session.crop {
                let _ = write!(out, " crop {:?}", crop);
            }
        }
        EditPhase::Committing(_) => out.push_str(" | saving"),
    }
    if viewer.slideshow_active() {
        out.push_str(" | slideshow");
    }
    if let Some(note) = viewer.notification() {
        let tag = if note.is_error() { "error" } else { "ok" };
        let _ = write!(out, " | {}: {}", tag, note.message);
    }
    out
}
