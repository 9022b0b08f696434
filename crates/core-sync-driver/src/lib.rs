//! Owns the one `State` for a live host widget, serializes every event onto a
//! single bounded queue, and dispatches the reducer's actions to adapters in
//! emit order. Nothing outside `Driver::run` ever touches the `State`.
//!
//! Timer durations are configuration; the driver only knows `StartTimer{id,
//! duration}` cancels whatever is pending for `id` and starts a fresh one.

use std::collections::HashMap;
use std::time::Duration;

use tokio::sync::mpsc::{self, Receiver, Sender};
use tokio::task::JoinHandle;
use tracing::{debug, trace, warn};

use core_coords::Selection;
use core_sync_adapters::{AlertSink, CharRange, EngineTransport, HostTextAdapter};
use core_sync_events::{Action, Event, LineDelta, Side, SyncError, TimerId};
use core_sync_reducer::on;
use core_sync_state::State;

/// This queue only ever carries one buffer's worth of events, not a whole
/// editor's, so it stays far smaller than a multi-document event channel.
pub const EVENT_CHANNEL_CAP: usize = 256;

/// Translate a full-buffer replacement into the smallest `[first_line,
/// last_line)` span that differs between `old` and `new`, via common-prefix /
/// common-suffix trimming. `last_line == -1` marks "to end of buffer".
fn minimal_delta(old: &[String], new: &[String]) -> LineDelta {
    let max_common = old.len().min(new.len());
    let mut prefix = 0;
    while prefix < max_common && old[prefix] == new[prefix] {
        prefix += 1;
    }
    let mut suffix = 0;
    while suffix < max_common - prefix
        && old[old.len() - 1 - suffix] == new[new.len() - 1 - suffix]
    {
        suffix += 1;
    }
    let last_line = if suffix == 0 { -1 } else { (old.len() - suffix) as i64 };
    let replacement = new[prefix..new.len() - suffix].to_vec();
    LineDelta::new(prefix as i64, last_line, replacement)
}

/// Everything the driver needs to talk to the outside world for one buffer.
pub struct Adapters {
    pub engine: Box<dyn EngineTransport>,
    pub host: Box<dyn HostTextAdapter>,
    pub alerts: Box<dyn AlertSink>,
}

pub struct Driver {
    state: State,
    adapters: Adapters,
    tx: Sender<Event>,
    rx: Receiver<Event>,
    timers: HashMap<TimerId, JoinHandle<()>>,
}

impl Driver {
    pub fn new(engine_lines: Vec<String>, host_lines: Vec<String>, adapters: Adapters) -> Self {
        let (tx, rx) = mpsc::channel(EVENT_CHANNEL_CAP);
        Self {
            state: State::new(engine_lines, host_lines),
            adapters,
            tx,
            rx,
            timers: HashMap::new(),
        }
    }

    /// A sender handle for notification tasks (`EngineNotifications::spawn`,
    /// `HostNotifications::spawn`) to post events onto this driver's queue.
    pub fn sender(&self) -> Sender<Event> {
        self.tx.clone()
    }

    /// The async main loop. Runs until every sender (including the driver's
    /// own, dropped with it) is gone and the queue drains.
    pub async fn run(mut self) {
        while let Some(event) = self.rx.recv().await {
            self.handle(event).await;
        }
        for (id, handle) in self.timers.drain() {
            handle.abort();
            trace!(target: "sync.driver", ?id, "timer_aborted_on_shutdown");
        }
    }

    async fn handle(&mut self, event: Event) {
        let prev_engine_lines = self.state.engine.lines.clone();
        trace!(target: "sync.driver", ?event, "event_received");
        let actions = on(&mut self.state, event);
        for action in actions {
            self.dispatch(action, &prev_engine_lines).await;
        }
    }

    async fn dispatch(&mut self, action: Action, prev_engine_lines: &[String]) {
        trace!(target: "sync.driver", ?action, "action_dispatched");
        match action {
            Action::EngineUpdateLines(lines) => {
                let delta = minimal_delta(prev_engine_lines, &lines);
                let result = self.adapters.engine.set_lines(delta.first_line, delta.last_line, &delta.line_data);
                self.report(result, "engine.set_lines").await;
            }
            Action::EngineMoveCursor(pos) => {
                let result = self.adapters.engine.move_cursor(pos);
                self.report(result, "engine.move_cursor").await;
            }
            Action::EngineStartVisual { start, end } => {
                let result = self.adapters.engine.start_visual(start, end);
                self.report(result, "engine.start_visual").await;
            }
            Action::EngineStopVisual => {
                let result = self.adapters.engine.run_command("stop_visual");
                self.report(result, "engine.run_command").await;
            }
            Action::EngineUndo => {
                let result = self.adapters.engine.undo();
                self.report(result, "engine.undo").await;
            }
            Action::EngineRedo => {
                let result = self.adapters.engine.redo();
                self.report(result, "engine.redo").await;
            }
            Action::EnginePaste => {
                let result = self.adapters.engine.paste();
                self.report(result, "engine.paste").await;
            }
            Action::EngineInput(keys) => {
                let result = self.adapters.engine.send_input(&keys);
                self.report(result, "engine.send_input").await;
            }
            Action::HostUpdateLines(lines) => {
                let result = self.adapters.host.write_full_value(&lines);
                self.report(result, "host.write_full_value").await;
            }
            Action::HostUpdateSelections(selections) => {
                if let Some(selection) = selections.first() {
                    match self.host_char_range(*selection) {
                        Ok(range) => {
                            let result = self.adapters.host.set_selected_range(range);
                            self.report(result, "host.set_selected_range").await;
                        }
                        Err(err) => warn!(target: "sync.driver", %err, "host_char_range_failed"),
                    }
                }
            }
            Action::HostScroll(selection) => match self.host_char_range(selection) {
                Ok(range) => {
                    let result = self.adapters.host.scroll_into_view(range);
                    self.report(result, "host.scroll_into_view").await;
                }
                Err(err) => warn!(target: "sync.driver", %err, "host_char_range_failed"),
            },
            Action::StartTimer { id, duration } => {
                self.restart_timer(id, duration);
            }
            Action::Bell => {
                let result = self.adapters.alerts.bell();
                self.report(result, "alerts.bell").await;
            }
            Action::Alert(err) => {
                let result = self.adapters.alerts.alert(&err);
                self.report(result, "alerts.alert").await;
            }
        }
    }

    /// Log a failed adapter call and feed it back onto the queue as a
    /// `Failed` event rather than surfacing it to the caller — Action
    /// execution errors always re-enter through the reducer so they get
    /// consistent ordering with every other event.
    async fn report(&self, result: anyhow::Result<()>, op: &'static str) {
        if let Err(err) = result {
            warn!(target: "sync.driver", op, %err, "adapter_call_failed");
            let _ = self.tx.send(Event::Failed(SyncError::Transport(err.to_string()))).await;
        }
    }

    /// Translate a host selection (line/column) into a character range by
    /// anchoring each endpoint's column against the start of its line.
    fn host_char_range(&self, selection: Selection) -> anyhow::Result<CharRange> {
        let start_line = self.adapters.host.range_for_line(selection.start.line)?;
        let end_line = self.adapters.host.range_for_line(selection.end.line)?;
        let start = start_line.start + selection.start.column as usize;
        let end = end_line.start + selection.end.column as usize;
        Ok(CharRange::new(start, end))
    }

    fn restart_timer(&mut self, id: TimerId, duration: Duration) {
        if let Some(handle) = self.timers.remove(&id) {
            handle.abort();
        }
        debug!(target: "sync.driver", ?id, ?duration, "timer_restarted");
        let tx = self.tx.clone();
        let handle = tokio::spawn(async move {
            tokio::time::sleep(duration).await;
            let _ = tx.send(Event::TimerFired(id)).await;
        });
        self.timers.insert(id, handle);
    }
}

/// `RequestRefresh` emits `Bell` when the token is held by the other side;
/// this is a small convenience so the binary doesn't need to know that detail
/// to wire a manual "resync" command.
pub fn request_refresh_event(source: Side) -> Event {
    Event::RequestRefresh { source }
}
