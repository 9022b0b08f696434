//! The reducer: `on(state, event) -> Vec<Action>`.
//!
//! Pure and total over the `Event` alphabet — no I/O, no clock, no
//! allocation beyond the actions it returns. Every event family gets its own
//! private function; `on` itself is just the dispatch table, mirroring the
//! way a dispatcher splits work by `Action` variant rather than folding
//! everything into one match arm body.

#![forbid(unsafe_code)]

use std::time::Duration;

use core_coords::{EnginePos, Mode, Selection};
use core_sync_events::{Action, Event, KeyInput, LineDelta, MouseButton, MouseKind, Side, SyncError, TimerId};
use core_sync_state::{EditionToken, State};

/// Reference quiet-period for the edition token. Configuration may override
/// the duration a driver actually schedules; the reducer always requests
/// this value.
pub const DEFAULT_TOKEN_TIMEOUT: Duration = Duration::from_millis(200);

/// Reference floor for the idle timer. Unused by this reducer's semantics
/// beyond being a no-op on fire; kept so a cooperative-variant reducer can
/// schedule against the same `TimerId::Idle`.
pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(2);

pub fn on(state: &mut State, event: Event) -> Vec<Action> {
    match event {
        Event::TimerFired(id) => on_timer_fired(state, id),
        Event::RequestRefresh { source } => on_request_refresh(state, source),
        Event::EngineLinesChanged(delta) => on_engine_lines_changed(state, delta),
        Event::EngineModeChanged(mode) => on_engine_mode_changed(state, mode),
        Event::EngineCursorChanged { position, visual } => {
            on_engine_cursor_changed(state, position, visual)
        }
        Event::EngineFlushed => on_engine_flushed(state),
        Event::HostFocused { lines, selection } => on_host_focused(state, lines, selection),
        Event::HostLinesChanged { lines } => on_host_lines_changed(state, lines),
        Event::HostSelectionChanged(selection) => on_host_selection_changed(state, selection),
        Event::HostKey(combo) => on_host_key(state, combo),
        Event::HostMouse { kind, buffer_point } => on_host_mouse(state, kind, buffer_point),
        Event::TogglePassthrough(enabled) => on_toggle_passthrough(state, enabled),
        Event::Failed(err) => on_failed(state, err),
    }
}

// --- token / whole-buffer-sync helpers -------------------------------------

/// Try to acquire (or keep) the token for `side`. On success the token is set
/// to `Acquired(side)`; callers still own emitting the `StartTimer` action.
fn try_acquire(state: &mut State, side: Side) -> bool {
    if state.token.can_acquire(side) {
        state.token = EditionToken::Acquired(side);
        true
    } else {
        false
    }
}

fn start_token_timer() -> Action {
    Action::StartTimer {
        id: TimerId::Token,
        duration: DEFAULT_TOKEN_TIMEOUT,
    }
}

/// Write lines to the host, updating the host shadow immediately so the
/// eventual `HostLinesChanged` echo compares equal and is dropped.
fn write_host_lines(state: &mut State, lines: Vec<String>) -> Action {
    state.host.lines = lines.clone();
    Action::HostUpdateLines(lines)
}

/// Write a selection set to the host. Tracks the join of `selections` as
/// `pending_selection` so the matching echo is suppressed exactly once,
/// and updates the host shadow to match.
fn write_host_selections(state: &mut State, selections: Vec<Selection>) -> Option<Action> {
    let joined = core_geometry::join(&selections)?;
    state.host.selection = joined;
    state.host.pending_selection = Some(joined);
    Some(Action::HostUpdateSelections(selections))
}

/// Write lines to the engine, updating the engine shadow immediately (same
/// echo-suppression reasoning as `write_host_lines`).
fn write_engine_lines(state: &mut State, lines: Vec<String>) -> Action {
    state.engine.lines = lines.clone();
    Action::EngineUpdateLines(lines)
}

fn write_engine_cursor(state: &mut State, pos: EnginePos) -> Action {
    state.engine.cursor.position = pos;
    state.engine.cursor.visual = pos;
    Action::EngineMoveCursor(pos)
}

/// Whole-buffer sync in the direction `owner` dictates: the side that holds
/// the token pushes its full shadow to the other side.
fn whole_buffer_sync(state: &mut State, owner: Side) -> Vec<Action> {
    match owner {
        Side::Engine => {
            let mut actions = vec![write_host_lines(state, state.engine.lines.clone())];
            let sels = core_geometry::selections_from(state.engine.cursor);
            actions.extend(write_host_selections(state, sels));
            actions
        }
        Side::Host => {
            let mut actions = vec![write_engine_lines(state, state.host.lines.clone())];
            let start = state.host.selection.start.to_engine();
            actions.push(write_engine_cursor(state, start));
            actions
        }
    }
}

/// `true` when the shadows disagree in a way a whole-buffer sync would fix:
/// line content differs, or the host selection doesn't match what the
/// engine's cursor/mode projects.
fn shadows_disagree(state: &State) -> bool {
    if !state.lines_shadow_equal() {
        return true;
    }
    let expected = core_geometry::selections_from(state.engine.cursor);
    match core_geometry::join(&expected) {
        Some(sel) => sel != state.host.selection,
        None => false,
    }
}

// --- timers ------------------------------------------------------------

fn on_timer_fired(state: &mut State, id: TimerId) -> Vec<Action> {
    match id {
        TimerId::Idle => Vec::new(),
        TimerId::Token => match state.token {
            EditionToken::Free => Vec::new(),
            EditionToken::Synchronizing => {
                state.token = EditionToken::Free;
                Vec::new()
            }
            EditionToken::Acquired(owner) => {
                if shadows_disagree(state) {
                    state.token = EditionToken::Synchronizing;
                    let actions = whole_buffer_sync(state, owner);
                    state.token = EditionToken::Free;
                    actions
                } else {
                    state.token = EditionToken::Free;
                    Vec::new()
                }
            }
        },
    }
}

// --- refresh ------------------------------------------------------------

fn on_request_refresh(state: &mut State, source: Side) -> Vec<Action> {
    if state.token != EditionToken::Free {
        return vec![Action::Bell];
    }
    if !shadows_disagree(state) {
        return Vec::new();
    }
    state.token = EditionToken::Acquired(source);
    let mut actions = vec![start_token_timer()];
    actions.extend(whole_buffer_sync(state, source));
    actions
}

// --- engine batching / flush --------------------------------------------

fn on_engine_lines_changed(state: &mut State, delta: LineDelta) -> Vec<Action> {
    state.engine.stage_lines_delta(&delta);
    Vec::new()
}

fn on_engine_mode_changed(state: &mut State, mode: Mode) -> Vec<Action> {
    state.engine.stage_mode(mode);
    Vec::new()
}

fn on_engine_cursor_changed(state: &mut State, position: EnginePos, visual: EnginePos) -> Vec<Action> {
    state.engine.stage_cursor(position, visual);
    Vec::new()
}

fn on_engine_flushed(state: &mut State) -> Vec<Action> {
    let dims = state.engine.flush();
    if !dims.lines_changed && !dims.cursor_changed {
        return Vec::new();
    }
    if !try_acquire(state, Side::Engine) {
        // Host holds the token; the shadow is updated but nothing forwards
        // until the token timer finds the shadows disagreeing.
        return Vec::new();
    }
    let mut actions = vec![start_token_timer()];
    if dims.lines_changed {
        actions.push(write_host_lines(state, state.engine.lines.clone()));
    }
    if dims.cursor_changed {
        let cursor = state.engine.cursor;
        let sels = core_geometry::selections_from(cursor);
        if !sels.is_empty() {
            let spans_lines = cursor.position.line != cursor.visual.line;
            actions.extend(write_host_selections(state, sels));
            if spans_lines {
                actions.push(Action::HostScroll(Selection::collapsed(cursor.position.to_host())));
            }
        }
    }
    actions
}

// --- host events ---------------------------------------------------------

fn on_host_focused(state: &mut State, lines: Vec<String>, selection: Selection) -> Vec<Action> {
    let adjusted = core_geometry::adjust(selection, state.engine.cursor.mode, &lines);
    let lines_differ = lines != state.host.lines;
    state.host.lines = lines;
    state.host.selection = adjusted;
    if !lines_differ {
        return Vec::new();
    }
    if !try_acquire(state, Side::Host) {
        return Vec::new();
    }
    let mut actions = vec![start_token_timer()];
    actions.extend(whole_buffer_sync(state, Side::Host));
    actions
}

fn on_host_lines_changed(state: &mut State, lines: Vec<String>) -> Vec<Action> {
    if lines == state.host.lines {
        return Vec::new();
    }
    state.host.lines = lines.clone();
    if !try_acquire(state, Side::Host) {
        return Vec::new();
    }
    vec![start_token_timer(), write_engine_lines(state, lines)]
}

fn on_host_selection_changed(state: &mut State, selection: Selection) -> Vec<Action> {
    if state.host.pending_selection == Some(selection) {
        state.host.pending_selection = None;
        return Vec::new();
    }
    if selection == state.host.selection {
        return Vec::new();
    }
    state.host.selection = selection;
    if state.flags.left_mouse_down {
        state.flags.is_selecting = true;
        return Vec::new();
    }
    if !try_acquire(state, Side::Host) {
        return Vec::new();
    }
    let mut actions = vec![start_token_timer()];
    let adjusted = core_geometry::adjust(selection, state.engine.cursor.mode, &state.host.lines);
    if adjusted != selection {
        state.host.selection = adjusted;
        state.host.pending_selection = Some(adjusted);
        actions.push(Action::HostUpdateSelections(vec![adjusted]));
    }
    let start = adjusted.start.to_engine();
    if state.engine.cursor.position != start {
        actions.push(write_engine_cursor(state, start));
    }
    actions
}

// --- host keys -------------------------------------------------------------

fn on_host_key(state: &mut State, combo: core_sync_events::KeyCombo) -> Vec<Action> {
    if state.flags.keys_passthrough {
        return Vec::new();
    }
    if matches!(combo.key, KeyInput::Escape) {
        return vec![Action::EngineInput("<Esc>".to_string())];
    }
    if combo.command {
        let is_z = matches!(combo.key, KeyInput::Char('z') | KeyInput::Char('Z'));
        if is_z {
            return vec![if combo.shift { Action::EngineRedo } else { Action::EngineUndo }];
        }
        if matches!(combo.key, KeyInput::Char('v') | KeyInput::Char('V')) {
            return vec![Action::EnginePaste];
        }
        // Any other host-command combo is left to the host's own shortcuts.
        return Vec::new();
    }
    if combo.control {
        return combo
            .engine_notation()
            .map(|notation| vec![Action::EngineInput(notation)])
            .unwrap_or_default();
    }
    if let Some(c) = combo.printable_char() {
        return vec![Action::EngineInput(c.to_string())];
    }
    combo
        .engine_notation()
        .map(|notation| vec![Action::EngineInput(notation)])
        .unwrap_or_default()
}

// --- host mouse --------------------------------------------------------

fn on_host_mouse(
    state: &mut State,
    kind: MouseKind,
    buffer_point: Option<core_coords::HostPos>,
) -> Vec<Action> {
    match kind {
        MouseKind::Down(MouseButton::Left) => {
            // Outside the widget, the click isn't ours to react to.
            if buffer_point.is_none() {
                return Vec::new();
            }
            state.flags.left_mouse_down = true;
            state.flags.is_selecting = false;
            if !try_acquire(state, Side::Host) {
                return Vec::new();
            }
            // Mode stays whatever it was until a genuine EngineModeChanged
            // confirms the transition; EngineStopVisual is a no-op if the
            // engine wasn't in Visual/Select when the click landed.
            vec![start_token_timer(), Action::EngineStopVisual]
        }
        MouseKind::Up(MouseButton::Left) => {
            state.flags.left_mouse_down = false;
            if !state.flags.is_selecting {
                return Vec::new();
            }
            state.flags.is_selecting = false;
            if !try_acquire(state, Side::Host) {
                return Vec::new();
            }
            let selection = state.host.selection;
            let mut actions = vec![start_token_timer()];
            if selection.is_collapsed() {
                let adjusted = core_geometry::adjust(selection, state.engine.cursor.mode, &state.host.lines);
                state.host.selection = adjusted;
                actions.push(write_engine_cursor(state, adjusted.start.to_engine()));
            } else {
                let start = selection.start.to_engine();
                let end = selection.end.to_engine().plus_cols(-1);
                state.engine.cursor.mode = Mode::Visual;
                state.engine.cursor.position = end;
                state.engine.cursor.visual = start;
                actions.push(Action::EngineStartVisual { start, end });
            }
            actions
        }
        MouseKind::Down(_) | MouseKind::Up(_) | MouseKind::Drag(_) | MouseKind::Moved
        | MouseKind::ScrollUp | MouseKind::ScrollDown => Vec::new(),
    }
}

// --- passthrough / failure ------------------------------------------------

/// On enable: stop any in-flight Visual and collapse the host selection to
/// insert-mode shape. On disable: re-adjust the selection to the engine's
/// current mode, since the shape it should carry may have changed while
/// passthrough was masking host selection changes.
fn on_toggle_passthrough(state: &mut State, enabled: bool) -> Vec<Action> {
    state.flags.keys_passthrough = enabled;
    if enabled {
        let mut actions = vec![Action::EngineStopVisual];
        let collapsed = Selection::collapsed(state.host.selection.start);
        if collapsed != state.host.selection {
            state.host.selection = collapsed;
            state.host.pending_selection = Some(collapsed);
            actions.push(Action::HostUpdateSelections(vec![collapsed]));
        }
        actions
    } else {
        let adjusted = core_geometry::adjust(state.host.selection, state.engine.cursor.mode, &state.host.lines);
        if adjusted == state.host.selection {
            return Vec::new();
        }
        state.host.selection = adjusted;
        state.host.pending_selection = Some(adjusted);
        vec![Action::HostUpdateSelections(vec![adjusted])]
    }
}

fn on_failed(_state: &mut State, err: SyncError) -> Vec<Action> {
    vec![Action::Alert(err)]
}
