#![warn(missing_docs)]
#![allow(rustdoc::bare_urls)]
#![doc = include_str!("../README.md")]

mod error;
pub use error::PlayerError;
mod events;
pub use events::{PlaybackState, PlayerEvent};
mod host;
pub use host::{EmbeddedPlayer, Host, IntervalHandle, PlayerCallbacks};
mod loader;
pub use loader::{ApiLoader, ApiWaiter, EnsureOutcome};
mod options;
pub use options::{Captions, PlayerOptions, PlayerVars};
mod player;
pub use player::Player;
mod queue;

#[cfg(target_arch = "wasm32")]
mod web;
#[cfg(target_arch = "wasm32")]
pub use web::{attach, for_selector, WebHost, YouTubePlayer, YtApi, YtEmbedded};
