//! The seam between the facade and everything it cannot own: the shared API
//! handle, the embedded player widget, and the timer source. The browser
//! implementation lives in [`crate::web`]; tests plug in mocks.

use std::time::Duration;

use crate::options::PlayerOptions;
use crate::PlayerError;

/// Callbacks the embedded player invokes as playback progresses. Mirrors the
/// `events` map of the Iframe API player constructor.
pub struct PlayerCallbacks {
    /// The player finished loading and accepts API calls.
    pub on_ready: Box<dyn FnMut()>,
    /// The player's state changed; carries the raw numeric state code.
    pub on_state_change: Box<dyn FnMut(i32)>,
    /// Playback quality changed; carries the raw quality label.
    pub on_playback_quality_change: Box<dyn FnMut(String)>,
    /// Playback rate changed; carries the new rate.
    pub on_playback_rate_change: Box<dyn FnMut(f64)>,
    /// The player reported an error; carries the raw numeric error code.
    pub on_error: Box<dyn FnMut(i32)>,
}

/// The opaque embedded player. The facade only ever invokes it; buffering,
/// rendering and network behavior are entirely the widget's business.
pub trait EmbeddedPlayer {
    /// Load and play the given video id.
    fn load_video_by_id(&mut self, video_id: &str);
    /// Start or resume playback.
    fn play_video(&mut self);
    /// Pause playback.
    fn pause_video(&mut self);
    /// Seek to `seconds`. With `allow_seek_ahead` the player will fetch
    /// unbuffered data instead of clamping to the buffered range.
    fn seek_to(&mut self, seconds: f64, allow_seek_ahead: bool);
    /// Set the volume, 0–100.
    fn set_volume(&mut self, volume: u8);
    /// Duration of the current video in seconds.
    fn duration(&self) -> f64;
    /// Current playback position in seconds.
    fn current_time(&self) -> f64;
    /// Raw numeric state code.
    fn state_code(&self) -> i32;
    /// Stop loading/playing the current video.
    fn stop_video(&mut self);
    /// Tear the widget down. Called once, before the facade drops it.
    fn destroy(&mut self);
}

/// Cancels a recurring timer when dropped.
pub struct IntervalHandle {
    cancel: Option<Box<dyn FnOnce()>>,
}

impl IntervalHandle {
    /// Wraps a cancellation action.
    pub fn new(cancel: impl FnOnce() + 'static) -> Self {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }
}

impl Drop for IntervalHandle {
    fn drop(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

/// Platform services for one facade instance.
///
/// A `Host` knows which DOM node (or test fixture) the player mounts on,
/// how to reach the process-wide API loader, and how to schedule recurring
/// timers. One host per [`Player`](crate::Player); the API handle behind
/// [`Host::ensure_api`] is shared across all of them.
pub trait Host {
    /// The shared API handle delivered by the loader. Cloning must be cheap;
    /// every instance borrows the same underlying object.
    type Api: Clone + 'static;
    /// The concrete embedded player this host creates.
    type Player: EmbeddedPlayer + 'static;

    /// Registers `waiter` with the shared loader. Invoked exactly once with
    /// the handle or the load error; immediately when the API is already
    /// present.
    fn ensure_api(&self, waiter: Box<dyn FnOnce(Result<Self::Api, PlayerError>)>);

    /// Creates the embedded player on this host's target node, cued to
    /// `video_id`, with `options` translated to player flags and `callbacks`
    /// wired to the widget's events. Creation is asynchronous: the widget
    /// signals usability later through `callbacks.on_ready`.
    fn create_player(
        &self,
        api: &Self::Api,
        video_id: &str,
        options: &PlayerOptions,
        callbacks: PlayerCallbacks,
    ) -> Result<Self::Player, PlayerError>;

    /// Starts a recurring timer invoking `tick` every `period` until the
    /// returned handle is dropped.
    fn start_interval(&self, period: Duration, tick: Box<dyn FnMut()>) -> IntervalHandle;
}
