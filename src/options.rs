use std::time::Duration;

use serde::Serialize;

/// Closed-caption policy for the embedded player.
///
/// The Iframe API treats this as tri-state: when nothing is requested the
/// player falls back to the viewer's own preference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Captions {
    /// Leave the decision to the viewer's preference (no flag is sent).
    #[default]
    Default,
    /// Show captions even if the viewer has them turned off.
    On,
    /// Hide captions by default.
    Off,
}

/// Configurable aspects of a [`Player`](crate::Player).
///
/// Every recognized option is enumerated here with an explicit default;
/// each maps to one flag of the embedded player's `playerVars` object
/// (see [`PlayerVars`]).
#[derive(Debug, Clone)]
pub struct PlayerOptions {
    /// Width of the embedded player in pixels.
    pub width: u32,
    /// Height of the embedded player in pixels.
    pub height: u32,
    /// Start playing automatically once a video is loaded.
    pub autoplay: bool,
    /// Closed-caption policy.
    pub captions: Captions,
    /// Show the player controls.
    pub controls: bool,
    /// Respond to keyboard controls.
    pub keyboard: bool,
    /// Show the fullscreen button.
    pub fullscreen: bool,
    /// Show video annotations by default.
    pub annotations: bool,
    /// Hide the YouTube logo in the control bar.
    pub modest_branding: bool,
    /// Show related videos when playback ends.
    pub related: bool,
    /// Show video title and uploader before playback starts.
    pub info: bool,
    /// How often the simulated [`Timeupdate`](crate::PlayerEvent::Timeupdate)
    /// event fires while playing.
    pub timeupdate_frequency: Duration,
}

impl Default for PlayerOptions {
    fn default() -> Self {
        Self {
            width: 640,
            height: 360,
            autoplay: false,
            captions: Captions::Default,
            controls: true,
            keyboard: true,
            fullscreen: true,
            annotations: true,
            modest_branding: false,
            related: true,
            info: true,
            timeupdate_frequency: Duration::from_secs(1),
        }
    }
}

/// The `playerVars` object passed to the embedded player, translated from
/// [`PlayerOptions`].
///
/// Field names and values follow the Iframe API parameter reference; absent
/// optional fields are not serialized at all so the player keeps its own
/// default behavior for them.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlayerVars {
    /// 1 starts playback as soon as the player loads.
    pub autoplay: u8,
    /// 1 forces captions on, 0 forces them off. Omitted entirely for
    /// [`Captions::Default`].
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cc_load_policy: Option<u8>,
    /// 2 shows controls and defers loading the player module until the
    /// viewer starts playback; 0 hides controls.
    pub controls: u8,
    /// 1 makes the player ignore keyboard controls. Inverted from
    /// [`PlayerOptions::keyboard`].
    pub disablekb: u8,
    /// Always 1: the whole point of the facade is driving the player over
    /// the JS API.
    pub enablejsapi: u8,
    /// 0 removes the fullscreen button.
    pub fs: u8,
    /// 1 shows annotations by default, 3 hides them.
    pub iv_load_policy: u8,
    /// 1 hides the YouTube logo in the control bar.
    pub modestbranding: u8,
    /// Security measure for the Iframe API: the host page's origin. Only
    /// known in a browser context, omitted elsewhere.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub origin: Option<String>,
    /// 1 plays inline on iOS instead of going fullscreen.
    pub playsinline: u8,
    /// 0 suppresses related videos at the end of playback.
    pub rel: u8,
    /// 0 hides title/uploader info before playback starts.
    pub showinfo: u8,
    /// Undocumented: lets elements with a higher z-index render on top of
    /// the player.
    pub wmode: &'static str,
}

impl PlayerVars {
    /// Translates facade options into embedded-player flags. `origin` is the
    /// host page's location, when known.
    pub fn new(opts: &PlayerOptions, origin: Option<String>) -> Self {
        Self {
            autoplay: opts.autoplay as u8,
            cc_load_policy: match opts.captions {
                Captions::Default => None,
                Captions::On => Some(1),
                Captions::Off => Some(0),
            },
            controls: if opts.controls { 2 } else { 0 },
            disablekb: if opts.keyboard { 0 } else { 1 },
            enablejsapi: 1,
            fs: opts.fullscreen as u8,
            iv_load_policy: if opts.annotations { 1 } else { 3 },
            modestbranding: opts.modest_branding as u8,
            origin,
            playsinline: 1,
            rel: opts.related as u8,
            showinfo: opts.info as u8,
            wmode: "opaque",
        }
    }
}
