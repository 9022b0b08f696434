//! The buffer synchronization core's data model: `State` and its pieces.
//!
//! This crate is a container, not a component with behavior — the reducer
//! crate owns every mutation rule. The only logic kept here is the handful
//! of small helpers (flush adoption, the trailing-empty-line equality rule)
//! that are really just accessors on the shape of the data.

#![forbid(unsafe_code)]

use core_coords::{Cursor, EnginePos, Mode, Selection};
use core_sync_events::LineDelta;
pub use core_sync_events::Side;

/// Staged engine-side changes accumulated between flushes. Not exposed
/// outside this crate; `EngineState` exposes `stage_*`/`flush` instead so the
/// atomic-adoption invariant can't be bypassed.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
struct PendingEngine {
    lines: Option<Vec<String>>,
    mode: Option<Mode>,
    cursor: Option<(EnginePos, EnginePos)>,
}

/// Which dimensions adopted a pending value during a flush.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlushedDims {
    pub lines_changed: bool,
    pub cursor_changed: bool,
}

impl FlushedDims {
    pub fn none() -> Self {
        Self {
            lines_changed: false,
            cursor_changed: false,
        }
    }
}

/// Shadow of the engine buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineState {
    pub lines: Vec<String>,
    pub cursor: Cursor,
    pending: PendingEngine,
}

impl EngineState {
    pub fn new(lines: Vec<String>, cursor: Cursor) -> Self {
        Self {
            lines,
            cursor,
            pending: PendingEngine::default(),
        }
    }

    /// Stage a line-range replacement. Subsequent calls before a flush apply
    /// cumulatively to the staged copy, never to `self.lines` directly.
    pub fn stage_lines_delta(&mut self, delta: &LineDelta) {
        let mut buf = self.pending.lines.take().unwrap_or_else(|| self.lines.clone());
        delta.apply(&mut buf);
        self.pending.lines = Some(buf);
    }

    pub fn stage_mode(&mut self, mode: Mode) {
        self.pending.mode = Some(mode);
    }

    pub fn stage_cursor(&mut self, position: EnginePos, visual: EnginePos) {
        self.pending.cursor = Some((position, visual));
    }

    pub fn has_pending(&self) -> bool {
        self.pending.lines.is_some() || self.pending.mode.is_some() || self.pending.cursor.is_some()
    }

    /// Adopt all staged values atomically, clearing the pending fields, and
    /// report which dimensions had something staged.
    pub fn flush(&mut self) -> FlushedDims {
        let dims = FlushedDims {
            lines_changed: self.pending.lines.is_some(),
            cursor_changed: self.pending.mode.is_some() || self.pending.cursor.is_some(),
        };
        if let Some(lines) = self.pending.lines.take() {
            self.lines = lines;
        }
        if let Some(mode) = self.pending.mode.take() {
            self.cursor.mode = mode;
        }
        if let Some((position, visual)) = self.pending.cursor.take() {
            self.cursor.position = position;
            self.cursor.visual = visual;
        }
        dims
    }
}

/// Shadow of the host widget.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostState {
    pub lines: Vec<String>,
    pub selection: Selection,
    /// Selection the core most recently wrote to the host; the matching
    /// echoed `HostSelectionChanged` must be suppressed exactly once.
    pub pending_selection: Option<Selection>,
}

impl HostState {
    pub fn new(lines: Vec<String>, selection: Selection) -> Self {
        Self {
            lines,
            selection,
            pending_selection: None,
        }
    }
}

/// A one-writer-at-a-time permit naming the transient source of truth.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditionToken {
    Free,
    Acquired(Side),
    Synchronizing,
}

impl EditionToken {
    /// Whether `side` may acquire (or keep) the token: the token is free, or
    /// already held by `side`.
    pub fn can_acquire(self, side: Side) -> bool {
        match self {
            EditionToken::Free => true,
            EditionToken::Acquired(owner) => owner == side,
            EditionToken::Synchronizing => false,
        }
    }

    pub fn owner(self) -> Option<Side> {
        match self {
            EditionToken::Acquired(owner) => Some(owner),
            _ => None,
        }
    }
}

/// Coordination flags that don't belong to either shadow.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Flags {
    pub keys_passthrough: bool,
    pub left_mouse_down: bool,
    pub is_selecting: bool,
}

/// One instance per live host text widget.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct State {
    pub engine: EngineState,
    pub host: HostState,
    pub token: EditionToken,
    pub flags: Flags,
}

impl State {
    pub fn new(engine_lines: Vec<String>, host_lines: Vec<String>) -> Self {
        let cursor = Cursor::new(Mode::Normal, EnginePos::new(1, 1), EnginePos::new(1, 1));
        Self {
            engine: EngineState::new(engine_lines, cursor),
            host: HostState::new(host_lines, Selection::collapsed(core_coords::HostPos::new(0, 0))),
            token: EditionToken::Free,
            flags: Flags::default(),
        }
    }

    /// Compare host and engine line sequences under the trailing-empty-line
    /// equality rule: if the host's last line is empty and the engine's last
    /// line is not, the engine side is treated as if it carried one more
    /// trailing empty line for the purpose of this comparison only.
    pub fn lines_shadow_equal(&self) -> bool {
        lines_equal_with_trailing_rule(&self.host.lines, &self.engine.lines)
    }
}

pub fn lines_equal_with_trailing_rule(host_lines: &[String], engine_lines: &[String]) -> bool {
    let host_trailing_empty = host_lines.last().is_some_and(|l| l.is_empty());
    let engine_trailing_empty = engine_lines.last().is_some_and(|l| l.is_empty());
    if host_trailing_empty && !engine_trailing_empty {
        if host_lines.len() != engine_lines.len() + 1 {
            return false;
        }
        return host_lines[..engine_lines.len()] == engine_lines[..];
    }
    host_lines == engine_lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn delta(first: i64, last: i64, data: &[&str]) -> LineDelta {
        LineDelta::new(first, last, data.iter().map(|s| s.to_string()).collect())
    }

    #[test]
    fn flush_adopts_pending_atomically() {
        let cursor = Cursor::new(Mode::Normal, EnginePos::new(1, 1), EnginePos::new(1, 1));
        let mut engine = EngineState::new(vec!["a".into(), "b".into()], cursor);
        engine.stage_lines_delta(&delta(1, 2, &["B"]));
        engine.stage_mode(Mode::Insert);
        engine.stage_cursor(EnginePos::new(2, 1), EnginePos::new(2, 1));
        assert!(engine.has_pending());

        let dims = engine.flush();
        assert!(dims.lines_changed);
        assert!(dims.cursor_changed);
        assert_eq!(engine.lines, vec!["a".to_string(), "B".to_string()]);
        assert_eq!(engine.cursor.mode, Mode::Insert);
        assert!(!engine.has_pending());
    }

    #[test]
    fn flush_with_nothing_pending_reports_no_dims() {
        let cursor = Cursor::new(Mode::Normal, EnginePos::new(1, 1), EnginePos::new(1, 1));
        let mut engine = EngineState::new(vec!["a".into()], cursor);
        let dims = engine.flush();
        assert_eq!(dims, FlushedDims::none());
    }

    #[test]
    fn trailing_empty_line_rule_treats_host_tail_as_expected() {
        let host = vec!["a".to_string(), "b".to_string(), String::new()];
        let engine = vec!["a".to_string(), "b".to_string()];
        assert!(lines_equal_with_trailing_rule(&host, &engine));
    }

    #[test]
    fn trailing_empty_line_rule_does_not_mask_real_differences() {
        let host = vec!["a".to_string(), String::new()];
        let engine = vec!["a".to_string(), "x".to_string()];
        assert!(!lines_equal_with_trailing_rule(&host, &engine));
    }

    #[test]
    fn token_can_acquire_rules() {
        assert!(EditionToken::Free.can_acquire(Side::Host));
        assert!(EditionToken::Acquired(Side::Host).can_acquire(Side::Host));
        assert!(!EditionToken::Acquired(Side::Engine).can_acquire(Side::Host));
        assert!(!EditionToken::Synchronizing.can_acquire(Side::Host));
    }
}
