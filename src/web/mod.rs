//! Browser host: mounts the facade on a DOM element, drives the page-wide
//! script loader, and schedules timers on the browser event loop.

mod api;
mod loader;

pub use api::{YtApi, YtEmbedded};

use std::time::Duration;

use wasm_bindgen::prelude::*;

use crate::host::{Host, IntervalHandle, PlayerCallbacks};
use crate::options::PlayerOptions;
use crate::{Player, PlayerError};

/// A [`Player`] mounted on a DOM element.
pub type YouTubePlayer = Player<WebHost>;

/// [`Host`] implementation backed by the browser: `window.YT` for the API,
/// `setInterval` for timers, and one target element per instance.
pub struct WebHost {
    element: web_sys::Element,
}

impl Host for WebHost {
    type Api = YtApi;
    type Player = YtEmbedded;

    fn ensure_api(&self, waiter: Box<dyn FnOnce(Result<YtApi, PlayerError>)>) {
        loader::ensure_api(waiter);
    }

    fn create_player(
        &self,
        api: &YtApi,
        video_id: &str,
        options: &PlayerOptions,
        callbacks: PlayerCallbacks,
    ) -> Result<YtEmbedded, PlayerError> {
        api.create_player(&self.element, video_id, options, callbacks, page_origin())
    }

    fn start_interval(&self, period: Duration, mut tick: Box<dyn FnMut()>) -> IntervalHandle {
        let millis = period.as_millis().min(u32::MAX as u128) as u32;
        let interval = gloo_timers::callback::Interval::new(millis, move || tick());
        IntervalHandle::new(move || interval.cancel())
    }
}

/// Creates a player on `element`. The element is replaced by the player
/// iframe once a video is loaded.
pub fn attach(element: web_sys::Element, options: PlayerOptions) -> YouTubePlayer {
    Player::new(WebHost { element }, options)
}

/// Creates a player on the first element matching `selector`.
pub fn for_selector(selector: &str, options: PlayerOptions) -> Result<YouTubePlayer, PlayerError> {
    let element = web_sys::window()
        .and_then(|window| window.document())
        .and_then(|document| document.query_selector(selector).ok().flatten())
        .ok_or_else(|| PlayerError::NoSuchElement(selector.to_owned()))?;
    Ok(attach(element, options))
}

/// The page origin for the `origin` player flag. Only meaningful over http;
/// a `file:` page gets no origin, matching what the embed accepts.
fn page_origin() -> Option<String> {
    let origin = web_sys::window()?.location().origin().ok()?;
    origin.starts_with("http").then_some(origin)
}

#[wasm_bindgen(start)]
fn start() {
    console_error_panic_hook::set_once();
}
