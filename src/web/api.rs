//! Bindings to the `window.YT` object and the player instances it constructs.
//!
//! The Iframe API has no TypeScript-style surface to bind against, so both
//! sides go through `js_sys::Reflect`: the constructor is looked up on the
//! `YT` namespace and player methods are looked up per call. A method call
//! that fails is logged and otherwise swallowed; the widget is third-party
//! code and the facade has nothing useful to do with its exceptions.

use js_sys::{Array, Function, Object, Reflect};
use log::warn;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;

use crate::host::{EmbeddedPlayer, PlayerCallbacks};
use crate::options::{PlayerOptions, PlayerVars};
use crate::PlayerError;

/// Handle to the loaded `window.YT` namespace. Shared by every player on the
/// page; cloning clones the underlying JS reference.
#[derive(Clone)]
pub struct YtApi {
    yt: JsValue,
}

impl YtApi {
    /// Reads `window.YT`, present once the API script has executed.
    pub(crate) fn from_global() -> Option<Self> {
        let window = web_sys::window()?;
        let yt = Reflect::get(&window, &JsValue::from_str("YT")).ok()?;
        if yt.is_undefined() || yt.is_null() {
            return None;
        }
        Some(Self { yt })
    }

    /// Constructs a `YT.Player` on `element`, cued to `video_id`. The
    /// element is replaced by the player iframe.
    pub(crate) fn create_player(
        &self,
        element: &web_sys::Element,
        video_id: &str,
        options: &PlayerOptions,
        callbacks: PlayerCallbacks,
        origin: Option<String>,
    ) -> Result<YtEmbedded, PlayerError> {
        let constructor: Function = Reflect::get(&self.yt, &JsValue::from_str("Player"))
            .ok()
            .and_then(|value| value.dyn_into().ok())
            .ok_or_else(|| PlayerError::CreatePlayer("YT.Player is not a constructor".into()))?;

        let player_vars = serde_wasm_bindgen::to_value(&PlayerVars::new(options, origin))
            .map_err(|err| PlayerError::CreatePlayer(err.to_string()))?;

        let config = Object::new();
        set(&config, "width", &JsValue::from(options.width))?;
        set(&config, "height", &JsValue::from(options.height))?;
        set(&config, "videoId", &JsValue::from_str(video_id))?;
        set(&config, "playerVars", &player_vars)?;

        let PlayerCallbacks {
            mut on_ready,
            mut on_state_change,
            mut on_playback_quality_change,
            mut on_playback_rate_change,
            mut on_error,
        } = callbacks;

        let ready = Closure::<dyn FnMut(JsValue)>::new(move |_event: JsValue| on_ready());
        let state_change = Closure::<dyn FnMut(JsValue)>::new(move |event: JsValue| {
            if let Some(code) = event_data(&event).as_f64() {
                on_state_change(code as i32);
            }
        });
        let quality_change = Closure::<dyn FnMut(JsValue)>::new(move |event: JsValue| {
            if let Some(label) = event_data(&event).as_string() {
                on_playback_quality_change(label);
            }
        });
        let rate_change = Closure::<dyn FnMut(JsValue)>::new(move |event: JsValue| {
            if let Some(rate) = event_data(&event).as_f64() {
                on_playback_rate_change(rate);
            }
        });
        let error = Closure::<dyn FnMut(JsValue)>::new(move |event: JsValue| {
            if let Some(code) = event_data(&event).as_f64() {
                on_error(code as i32);
            }
        });

        let events = Object::new();
        set(&events, "onReady", ready.as_ref())?;
        set(&events, "onStateChange", state_change.as_ref())?;
        set(&events, "onPlaybackQualityChange", quality_change.as_ref())?;
        set(&events, "onPlaybackRateChange", rate_change.as_ref())?;
        set(&events, "onError", error.as_ref())?;
        set(&config, "events", &events)?;

        let args = Array::of2(element, &config);
        let player = Reflect::construct(&constructor, &args)
            .map_err(|err| PlayerError::CreatePlayer(format!("{err:?}")))?;

        Ok(YtEmbedded {
            player,
            // the widget holds raw pointers into these for its lifetime
            _callbacks: vec![ready, state_change, quality_change, rate_change, error],
        })
    }
}

fn set(target: &Object, key: &str, value: &JsValue) -> Result<(), PlayerError> {
    Reflect::set(target, &JsValue::from_str(key), value)
        .map(|_| ())
        .map_err(|err| PlayerError::CreatePlayer(format!("{err:?}")))
}

/// The payload of an Iframe API event object.
fn event_data(event: &JsValue) -> JsValue {
    Reflect::get(event, &JsValue::from_str("data")).unwrap_or(JsValue::UNDEFINED)
}

/// One `YT.Player` instance plus the event closures keeping its callbacks
/// callable from JS.
pub struct YtEmbedded {
    player: JsValue,
    _callbacks: Vec<Closure<dyn FnMut(JsValue)>>,
}

impl YtEmbedded {
    fn invoke(&self, method: &str, args: &[JsValue]) -> Option<JsValue> {
        let function: Function = Reflect::get(&self.player, &JsValue::from_str(method))
            .ok()
            .and_then(|value| value.dyn_into().ok())?;
        let result = match args {
            [] => function.call0(&self.player),
            [a] => function.call1(&self.player, a),
            [a, b] => function.call2(&self.player, a, b),
            _ => return None,
        };
        match result {
            Ok(value) => Some(value),
            Err(err) => {
                warn!("player method {method} threw: {err:?}");
                None
            }
        }
    }

    fn number(&self, method: &str) -> f64 {
        self.invoke(method, &[])
            .and_then(|value| value.as_f64())
            .unwrap_or(0.0)
    }
}

impl EmbeddedPlayer for YtEmbedded {
    fn load_video_by_id(&mut self, video_id: &str) {
        self.invoke("loadVideoById", &[JsValue::from_str(video_id)]);
    }

    fn play_video(&mut self) {
        self.invoke("playVideo", &[]);
    }

    fn pause_video(&mut self) {
        self.invoke("pauseVideo", &[]);
    }

    fn seek_to(&mut self, seconds: f64, allow_seek_ahead: bool) {
        self.invoke(
            "seekTo",
            &[JsValue::from(seconds), JsValue::from(allow_seek_ahead)],
        );
    }

    fn set_volume(&mut self, volume: u8) {
        self.invoke("setVolume", &[JsValue::from(volume)]);
    }

    fn duration(&self) -> f64 {
        self.number("getDuration")
    }

    fn current_time(&self) -> f64 {
        self.number("getCurrentTime")
    }

    fn state_code(&self) -> i32 {
        self.invoke("getPlayerState", &[])
            .and_then(|value| value.as_f64())
            .map(|code| code as i32)
            .unwrap_or(-1)
    }

    fn stop_video(&mut self) {
        self.invoke("stopVideo", &[]);
    }

    fn destroy(&mut self) {
        self.invoke("destroy", &[]);
    }
}
