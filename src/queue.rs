//! Buffering for playback commands issued before the embedded player is
//! ready. Queued commands are replayed exactly once, in arrival order, when
//! the ready callback fires.

use std::collections::VecDeque;

/// A playback command captured with its arguments.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum PendingCommand {
    Play,
    Pause,
    Seek { seconds: f64, allow_seek_ahead: bool },
    SetVolume(u8),
}

#[derive(Default)]
pub(crate) struct CommandQueue {
    commands: VecDeque<PendingCommand>,
}

impl CommandQueue {
    pub(crate) fn push(&mut self, command: PendingCommand) {
        self.commands.push_back(command);
    }

    /// Takes every queued command, oldest first. The queue is empty
    /// afterwards; commands issued once the player is ready are delegated
    /// directly and never land here again.
    pub(crate) fn drain(&mut self) -> Vec<PendingCommand> {
        self.commands.drain(..).collect()
    }

    pub(crate) fn clear(&mut self) {
        self.commands.clear();
    }
}
