//! The adapter surface the driver drives: one trait per side for the
//! fallible, imperative operations an `Action` resolves into, and one trait
//! per side for the background task that turns native callbacks into
//! `Event`s on the driver's channel.
//!
//! The notification traits mirror the async-event-source idiom: a boxed
//! self, a `Sender<Event>`, and a spawned task that forwards until the
//! channel closes. Commands stay synchronous trait methods returning
//! `anyhow::Result` — the transport itself may be async underneath, but the
//! trait doesn't force every implementor through `async fn`.

use anyhow::Result;
use tokio::sync::mpsc::Sender;
use tokio::task::JoinHandle;

use core_coords::EnginePos;
use core_sync_events::{Event, SyncError};

#[cfg(feature = "demo")]
pub mod demo;

/// Commands the driver issues against the engine process.
pub trait EngineTransport: Send + 'static {
    /// Overwrite the whole buffer.
    fn replace_lines(&mut self, lines: &[String]) -> Result<()>;
    /// Replace `[first_line, last_line)` with `lines`; `last_line == -1` means end-of-buffer.
    fn set_lines(&mut self, first_line: i64, last_line: i64, lines: &[String]) -> Result<()>;
    fn move_cursor(&mut self, pos: EnginePos) -> Result<()>;
    /// Enter Visual with the selection spanning `[start, end]`.
    fn start_visual(&mut self, start: EnginePos, end: EnginePos) -> Result<()>;
    /// Run an engine command, e.g. to leave Visual.
    fn run_command(&mut self, command: &str) -> Result<()>;
    /// Feed a key-notation string (`"<Esc>"`, `"x"`, ...) as if typed.
    fn send_input(&mut self, keys: &str) -> Result<()>;
    fn undo(&mut self) -> Result<()>;
    fn redo(&mut self) -> Result<()>;
    fn paste(&mut self) -> Result<()>;
}

/// Background task that converts the engine's native line/cursor/mode/flush
/// notifications into `Event`s.
pub trait EngineNotifications: Send + 'static {
    fn name(&self) -> &'static str;
    fn spawn(self: Box<Self>, tx: Sender<Event>) -> JoinHandle<()>;
}

/// A half-open character range `[start, end)` into the host widget's text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CharRange {
    pub start: usize,
    pub end: usize,
}

impl CharRange {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }
}

/// Commands the driver issues against the host's text widget.
pub trait HostTextAdapter: Send + 'static {
    fn read_text(&self) -> Result<Vec<String>>;
    fn read_selection(&self) -> Result<CharRange>;
    /// 0-indexed line containing character `index`.
    fn line_for_index(&self, index: usize) -> Result<u32>;
    /// Character range spanned by 0-indexed `line`.
    fn range_for_line(&self, line: u32) -> Result<CharRange>;
    /// Move the selection to `range` without touching buffer content.
    fn set_selected_range(&mut self, range: CharRange) -> Result<()>;
    fn write_selected_range(&mut self, range: CharRange, text: &str) -> Result<()>;
    fn write_selected_text(&mut self, text: &str) -> Result<()>;
    fn write_full_value(&mut self, lines: &[String]) -> Result<()>;
    fn scroll_into_view(&mut self, range: CharRange) -> Result<()>;
}

/// Background task that converts the host's native value-changed /
/// selection-changed notifications into `Event`s.
pub trait HostNotifications: Send + 'static {
    fn name(&self) -> &'static str;
    fn spawn(self: Box<Self>, tx: Sender<Event>) -> JoinHandle<()>;
}

/// Where `Action::Bell` and `Action::Alert` land. Kept separate from
/// `HostTextAdapter` since a host may surface these through a different
/// channel (status bar, system bell) than the one it exposes its text value
/// through.
pub trait AlertSink: Send + 'static {
    fn bell(&mut self) -> Result<()>;
    fn alert(&mut self, err: &SyncError) -> Result<()>;
}
