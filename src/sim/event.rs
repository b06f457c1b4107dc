/// Events emitted during a tick.
/// The presentation layer consumes these for sound and status messages.

use super::stage::{StageId, TransitionNotifier};

#[derive(Clone, Debug, PartialEq)]
pub enum GameEvent {
    Jumped,
    Landed,
    Pushed { enemy: usize },
    Collected { total: u32 },
    Won { level: usize },
    Lost { level: usize },
    StageChanged { from: StageId, to: StageId },
    ButtonClicked,
    Saved,
    Message(String),
}

/// Collects stage changes as events until the game drains them.
#[derive(Debug, Default)]
pub struct EventQueue {
    events: Vec<GameEvent>,
}

impl EventQueue {
    pub fn push(&mut self, event: GameEvent) {
        self.events.push(event);
    }

    pub fn drain(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }
}

impl TransitionNotifier for EventQueue {
    fn notify(&mut self, from: StageId, to: StageId) {
        self.events.push(GameEvent::StageChanged { from, to });
    }
}
