//! In-memory event sink.

use std::sync::{Arc, Mutex};

use parallel_exec::events::{Event, EventKind, EventSink, FIELD_CMD};

/// Collects every event in emission order. Clones share the same buffer.
#[derive(Debug, Clone, Default)]
pub struct EventRecorder {
    events: Arc<Mutex<Vec<Event>>>,
}

impl EventRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<Event> {
        self.events.lock().unwrap().clone()
    }

    pub fn kinds(&self) -> Vec<EventKind> {
        self.events().iter().map(|e| e.kind).collect()
    }

    pub fn count(&self, kind: EventKind) -> usize {
        self.events().iter().filter(|e| e.kind == kind).count()
    }

    /// Events whose `cmd` field equals `cmd`.
    pub fn for_cmd(&self, cmd: &str) -> Vec<Event> {
        self.events()
            .into_iter()
            .filter(|e| e.field(FIELD_CMD) == Some(cmd))
            .collect()
    }

    /// Highest number of commands that were between `cmd_started` and
    /// `cmd_finished` at the same time.
    pub fn max_overlap(&self) -> usize {
        let mut active = 0usize;
        let mut max = 0usize;
        for event in self.events() {
            match event.kind {
                EventKind::CmdStarted => {
                    active += 1;
                    max = max.max(active);
                }
                EventKind::CmdFinished => active = active.saturating_sub(1),
                _ => {}
            }
        }
        max
    }
}

impl EventSink for EventRecorder {
    fn handle(&self, event: &Event) {
        self.events.lock().unwrap().push(event.clone());
    }
}
