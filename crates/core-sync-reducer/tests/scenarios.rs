//! End-to-end scenarios, one per named case.

use core_coords::{Cursor, EnginePos, HostPos, Mode, Selection};
use core_sync_events::{Action, Event, MouseButton, MouseKind, Side, TimerId};
use core_sync_reducer::on;
use core_sync_state::{EditionToken, State};
use pretty_assertions::assert_eq;

fn initial() -> State {
    let mut state = State::new(
        vec!["abc".to_string(), "def".to_string()],
        vec!["abc".to_string(), "def".to_string()],
    );
    state.engine.cursor = Cursor::new(Mode::Normal, EnginePos::new(1, 1), EnginePos::new(1, 1));
    state.host.selection = Selection::ordered(HostPos::new(0, 0), HostPos::new(0, 1));
    state
}

fn token_timer() -> Action {
    Action::StartTimer {
        id: TimerId::Token,
        duration: core_sync_reducer::DEFAULT_TOKEN_TIMEOUT,
    }
}

#[test]
fn engine_moves_cursor() {
    let mut state = initial();
    let mut actions = on(
        &mut state,
        Event::EngineCursorChanged { position: EnginePos::new(2, 2), visual: EnginePos::new(2, 2) },
    );
    actions.extend(on(&mut state, Event::EngineFlushed));

    assert_eq!(
        actions,
        vec![
            token_timer(),
            Action::HostUpdateSelections(vec![Selection::ordered(HostPos::new(1, 1), HostPos::new(1, 2))]),
        ]
    );
    assert!(matches!(state.token, EditionToken::Acquired(Side::Engine)));
}

#[test]
fn host_types_a_character() {
    let mut state = initial();
    let actions = on(
        &mut state,
        Event::HostLinesChanged { lines: vec!["aXbc".to_string(), "def".to_string()] },
    );

    assert_eq!(
        actions,
        vec![token_timer(), Action::EngineUpdateLines(vec!["aXbc".to_string(), "def".to_string()])]
    );
    assert!(matches!(state.token, EditionToken::Acquired(Side::Host)));
}

#[test]
fn token_timeout_while_shadows_equal() {
    let mut state = initial();
    on(
        &mut state,
        Event::EngineCursorChanged { position: EnginePos::new(2, 2), visual: EnginePos::new(2, 2) },
    );
    on(&mut state, Event::EngineFlushed);
    // The driver already applied the emitted HostUpdateSelections by the time the timer fires.
    state.host.selection = Selection::ordered(HostPos::new(1, 1), HostPos::new(1, 2));

    let actions = on(&mut state, Event::TimerFired(TimerId::Token));
    assert!(actions.is_empty());
    assert_eq!(state.token, EditionToken::Free);
}

#[test]
fn refresh_rejected_while_busy() {
    let mut state = initial();
    on(&mut state, Event::HostLinesChanged { lines: vec!["aXbc".to_string(), "def".to_string()] });

    let actions = on(&mut state, Event::RequestRefresh { source: Side::Host });
    assert_eq!(actions, vec![Action::Bell]);
    assert!(matches!(state.token, EditionToken::Acquired(Side::Host)));
}

#[test]
fn mouse_drag_selection_creates_visual() {
    let mut state = initial();
    let mut actions = on(
        &mut state,
        Event::HostMouse { kind: MouseKind::Down(MouseButton::Left), buffer_point: Some(HostPos::new(0, 0)) },
    );
    actions.extend(on(
        &mut state,
        Event::HostSelectionChanged(Selection::ordered(HostPos::new(0, 0), HostPos::new(1, 2))),
    ));
    actions.extend(on(
        &mut state,
        Event::HostMouse { kind: MouseKind::Up(MouseButton::Left), buffer_point: Some(HostPos::new(0, 0)) },
    ));

    assert_eq!(
        actions,
        vec![
            token_timer(),
            Action::EngineStopVisual,
            token_timer(),
            Action::EngineStartVisual { start: EnginePos::new(1, 1), end: EnginePos::new(2, 2) },
        ]
    );
}

#[test]
fn passthrough_toggle() {
    let mut state = initial();
    state.host.selection = Selection::ordered(HostPos::new(0, 5), HostPos::new(0, 6));

    let actions = on(&mut state, Event::TogglePassthrough(true));
    assert_eq!(
        actions,
        vec![
            Action::EngineStopVisual,
            Action::HostUpdateSelections(vec![Selection::collapsed(HostPos::new(0, 5))]),
        ]
    );
}
