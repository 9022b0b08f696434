//! In-memory stand-ins for the engine process and the host text widget.
//! Good enough to drive the reducer end-to-end without a real editor or GUI
//! attached — used by `sync-bridge --demo` and by driver integration tests.
//!
//! Each side is a (commands, notifications) pair: the commands half mutates
//! local state and pushes a matching `Event` onto an internal channel; the
//! notifications half just relays that channel onto the driver's queue. Real
//! adapters split the same way because the engine transport and the
//! accessibility API are genuinely async and driven by their own callbacks.

use anyhow::Result;
use tokio::sync::mpsc::{self, Sender, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;

use core_coords::{EnginePos, Mode};
use core_sync_events::{Event, LineDelta, SyncError};

use crate::{
    AlertSink, CharRange, EngineNotifications, EngineTransport, HostNotifications, HostTextAdapter,
};

pub struct DemoEngine {
    lines: Vec<String>,
    cursor: EnginePos,
    mode: Mode,
    relay: UnboundedSender<Event>,
}

pub struct DemoEngineNotifications {
    relay: UnboundedReceiver<Event>,
}

/// Build a connected pair with `lines` as the engine's starting buffer.
pub fn demo_engine(lines: Vec<String>) -> (DemoEngine, DemoEngineNotifications) {
    let (tx, rx) = mpsc::unbounded_channel();
    (
        DemoEngine {
            lines,
            cursor: EnginePos::new(1, 1),
            mode: Mode::Normal,
            relay: tx,
        },
        DemoEngineNotifications { relay: rx },
    )
}

impl DemoEngine {
    fn flush(&self) {
        let _ = self.relay.send(Event::EngineFlushed);
    }
}

impl EngineTransport for DemoEngine {
    fn replace_lines(&mut self, lines: &[String]) -> Result<()> {
        self.lines = lines.to_vec();
        let delta = LineDelta::new(0, -1, self.lines.clone());
        let _ = self.relay.send(Event::EngineLinesChanged(delta));
        self.flush();
        Ok(())
    }

    fn set_lines(&mut self, first_line: i64, last_line: i64, lines: &[String]) -> Result<()> {
        let delta = LineDelta::new(first_line, last_line, lines.to_vec());
        delta.apply(&mut self.lines);
        let _ = self.relay.send(Event::EngineLinesChanged(delta));
        self.flush();
        Ok(())
    }

    fn move_cursor(&mut self, pos: EnginePos) -> Result<()> {
        self.cursor = pos;
        let _ = self.relay.send(Event::EngineCursorChanged { position: pos, visual: pos });
        self.flush();
        Ok(())
    }

    fn start_visual(&mut self, start: EnginePos, end: EnginePos) -> Result<()> {
        self.mode = Mode::Visual;
        self.cursor = end;
        let _ = self.relay.send(Event::EngineModeChanged(self.mode));
        let _ = self.relay.send(Event::EngineCursorChanged { position: end, visual: start });
        self.flush();
        Ok(())
    }

    fn run_command(&mut self, command: &str) -> Result<()> {
        if command == "stop_visual" {
            self.mode = Mode::Normal;
            let _ = self.relay.send(Event::EngineModeChanged(self.mode));
            self.flush();
        }
        Ok(())
    }

    fn send_input(&mut self, _keys: &str) -> Result<()> {
        // A real engine would interpret keys modally; the demo stand-in just
        // acknowledges receipt without mutating its buffer.
        Ok(())
    }

    fn undo(&mut self) -> Result<()> {
        Ok(())
    }

    fn redo(&mut self) -> Result<()> {
        Ok(())
    }

    fn paste(&mut self) -> Result<()> {
        Ok(())
    }
}

impl EngineNotifications for DemoEngineNotifications {
    fn name(&self) -> &'static str {
        "demo-engine"
    }

    fn spawn(mut self: Box<Self>, tx: Sender<Event>) -> JoinHandle<()> {
        tokio::spawn(async move {
            while let Some(event) = self.relay.recv().await {
                if tx.send(event).await.is_err() {
                    break;
                }
            }
        })
    }
}

pub struct DemoHost {
    lines: Vec<String>,
    selection: CharRange,
    relay: UnboundedSender<Event>,
}

pub struct DemoHostNotifications {
    relay: UnboundedReceiver<Event>,
}

pub fn demo_host(lines: Vec<String>) -> (DemoHost, DemoHostNotifications) {
    let (tx, rx) = mpsc::unbounded_channel();
    (
        DemoHost { lines, selection: CharRange::new(0, 0), relay: tx },
        DemoHostNotifications { relay: rx },
    )
}

impl DemoHost {
    fn offset_of(&self, line: u32, column: u32) -> usize {
        self.lines
            .iter()
            .take(line as usize)
            .map(|l| l.chars().count() + 1)
            .sum::<usize>()
            + column as usize
    }
}

impl HostTextAdapter for DemoHost {
    fn read_text(&self) -> Result<Vec<String>> {
        Ok(self.lines.clone())
    }

    fn read_selection(&self) -> Result<CharRange> {
        Ok(self.selection)
    }

    fn line_for_index(&self, index: usize) -> Result<u32> {
        let mut remaining = index;
        for (i, line) in self.lines.iter().enumerate() {
            let len = line.chars().count() + 1;
            if remaining < len {
                return Ok(i as u32);
            }
            remaining -= len;
        }
        Ok(self.lines.len().saturating_sub(1) as u32)
    }

    fn range_for_line(&self, line: u32) -> Result<CharRange> {
        let start = self.offset_of(line, 0);
        let len = self
            .lines
            .get(line as usize)
            .map(|l| l.chars().count())
            .unwrap_or(0);
        Ok(CharRange::new(start, start + len))
    }

    fn set_selected_range(&mut self, range: CharRange) -> Result<()> {
        self.selection = range;
        Ok(())
    }

    fn write_selected_range(&mut self, range: CharRange, text: &str) -> Result<()> {
        self.selection = range;
        self.write_selected_text(text)
    }

    fn write_selected_text(&mut self, text: &str) -> Result<()> {
        let joined = self.lines.join("\n");
        let mut chars: Vec<char> = joined.chars().collect();
        let end = self.selection.end.min(chars.len());
        let start = self.selection.start.min(end);
        chars.splice(start..end, text.chars());
        let new_text: String = chars.into_iter().collect();
        self.lines = new_text.split('\n').map(str::to_string).collect();
        let _ = self.relay.send(Event::HostLinesChanged { lines: self.lines.clone() });
        Ok(())
    }

    fn write_full_value(&mut self, lines: &[String]) -> Result<()> {
        self.lines = lines.to_vec();
        let _ = self.relay.send(Event::HostLinesChanged { lines: self.lines.clone() });
        Ok(())
    }

    fn scroll_into_view(&mut self, _range: CharRange) -> Result<()> {
        Ok(())
    }
}

impl HostNotifications for DemoHostNotifications {
    fn name(&self) -> &'static str {
        "demo-host"
    }

    fn spawn(mut self: Box<Self>, tx: Sender<Event>) -> JoinHandle<()> {
        tokio::spawn(async move {
            while let Some(event) = self.relay.recv().await {
                if tx.send(event).await.is_err() {
                    break;
                }
            }
        })
    }
}

/// Records bells and alerts instead of surfacing them anywhere; `sync-bridge
/// --demo` logs its contents on exit.
#[derive(Debug, Default)]
pub struct DemoAlertSink {
    pub bells: usize,
    pub alerts: Vec<SyncError>,
}

impl AlertSink for DemoAlertSink {
    fn bell(&mut self) -> Result<()> {
        self.bells += 1;
        Ok(())
    }

    fn alert(&mut self, err: &SyncError) -> Result<()> {
        self.alerts.push(err.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn demo_engine_move_cursor_emits_change_then_flush() {
        let (mut engine, notifications) = demo_engine(vec!["abc".to_string()]);
        let (tx, mut rx) = mpsc::channel(8);
        let handle = notifications.spawn(tx);

        engine.move_cursor(EnginePos::new(1, 2)).unwrap();
        drop(engine);

        assert!(matches!(rx.recv().await, Some(Event::EngineCursorChanged { .. })));
        assert!(matches!(rx.recv().await, Some(Event::EngineFlushed)));
        assert!(rx.recv().await.is_none());
        handle.await.unwrap();
    }

    #[test]
    fn demo_host_write_full_value_replaces_lines() {
        let (mut host, _notifications) = demo_host(vec!["abc".to_string()]);
        host.write_full_value(&["xyz".to_string(), "def".to_string()]).unwrap();
        assert_eq!(host.read_text().unwrap(), vec!["xyz".to_string(), "def".to_string()]);
    }

    #[test]
    fn demo_host_range_for_line_accounts_for_newlines() {
        let (host, _notifications) = demo_host(vec!["ab".to_string(), "cde".to_string()]);
        assert_eq!(host.range_for_line(0).unwrap(), CharRange::new(0, 2));
        assert_eq!(host.range_for_line(1).unwrap(), CharRange::new(3, 6));
    }
}
