use std::cell::RefCell;
use std::fmt;

use crate::PlayerError;

/// The named playback states of the embedded player.
///
/// The Iframe API reports these as raw integer codes; the facade maps them so
/// consumers never have to touch `YT.PlayerState.*` constants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    /// No video has started playing yet. Also returned whenever the facade
    /// is not ready or the reported code is unrecognized.
    Unstarted,
    /// Playback reached the end of the video.
    Ended,
    /// Playback is ongoing.
    Playing,
    /// Playback is paused.
    Paused,
    /// The player is buffering.
    Buffering,
    /// A video is cued and ready to play.
    Cued,
}

impl PlaybackState {
    /// Maps a raw state code from the embedded player. Returns `None` for
    /// codes outside the documented set.
    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            -1 => Some(Self::Unstarted),
            0 => Some(Self::Ended),
            1 => Some(Self::Playing),
            2 => Some(Self::Paused),
            3 => Some(Self::Buffering),
            5 => Some(Self::Cued),
            _ => None,
        }
    }

    /// The lowercase name of the state, matching the event names consumers
    /// see ("unstarted", "playing", ...).
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unstarted => "unstarted",
            Self::Ended => "ended",
            Self::Playing => "playing",
            Self::Paused => "paused",
            Self::Buffering => "buffering",
            Self::Cued => "cued",
        }
    }
}

impl fmt::Display for PlaybackState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Events emitted by the facade.
#[derive(Debug, Clone, PartialEq)]
pub enum PlayerEvent {
    /// Entered the unstarted state.
    Unstarted,
    /// Playback ended.
    Ended,
    /// Playback started or resumed. Followed immediately by one
    /// [`PlayerEvent::Timeupdate`].
    Playing,
    /// Playback paused.
    Paused,
    /// The player is buffering.
    Buffering,
    /// A video was cued.
    Cued,
    /// Playback quality changed; carries the raw quality label
    /// ("small", "medium", "large", "hd720", "hd1080", "highres").
    PlaybackQualityChange(String),
    /// Playback rate changed; carries the new rate.
    PlaybackRateChange(f64),
    /// Periodic position report while playing; carries the current playback
    /// position in seconds. Simulated by the facade, the Iframe API itself
    /// never fires this.
    Timeupdate(f64),
    /// The current video cannot be played (removed, private, embedding
    /// disabled, or a bad video id). Carries the video id that failed.
    /// Non-fatal: load another video to recover.
    Unplayable(Option<String>),
    /// A fatal error. The facade has destroyed itself by the time this is
    /// delivered.
    Error(PlayerError),
}

impl From<PlaybackState> for PlayerEvent {
    fn from(state: PlaybackState) -> Self {
        match state {
            PlaybackState::Unstarted => PlayerEvent::Unstarted,
            PlaybackState::Ended => PlayerEvent::Ended,
            PlaybackState::Playing => PlayerEvent::Playing,
            PlaybackState::Paused => PlayerEvent::Paused,
            PlaybackState::Buffering => PlayerEvent::Buffering,
            PlaybackState::Cued => PlayerEvent::Cued,
        }
    }
}

/// Subscriber list owned by the facade.
///
/// Composition instead of emitter inheritance: the facade holds one of these
/// and forwards every normalized event to each subscriber in registration
/// order. Dispatch swaps the list out of the cell first, so a subscriber may
/// re-enter the facade (including `on()`) without tripping the `RefCell`.
pub(crate) struct Listeners {
    callbacks: RefCell<Vec<Box<dyn FnMut(&PlayerEvent)>>>,
}

impl Listeners {
    pub(crate) fn new() -> Self {
        Self {
            callbacks: RefCell::new(Vec::new()),
        }
    }

    pub(crate) fn subscribe(&self, callback: Box<dyn FnMut(&PlayerEvent)>) {
        self.callbacks.borrow_mut().push(callback);
    }

    pub(crate) fn dispatch(&self, event: &PlayerEvent) {
        let mut callbacks = self.callbacks.take();
        for cb in callbacks.iter_mut() {
            cb(event);
        }
        // pick up subscriptions made during dispatch
        let added = self.callbacks.take();
        callbacks.extend(added);
        self.callbacks.replace(callbacks);
    }
}
