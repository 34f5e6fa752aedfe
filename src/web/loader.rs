//! Script injection and the page-global ready callback.
//!
//! The Iframe API announces itself by calling `window.onYouTubeIframeAPIReady`
//! after its script executes, so this module owns that hook plus the script
//! element and drives the shared [`ApiLoader`] from them.

use std::cell::RefCell;

use log::{debug, warn};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;

use super::api::YtApi;
use crate::loader::{ApiLoader, ApiWaiter, EnsureOutcome};
use crate::PlayerError;

const IFRAME_API_SRC: &str = "https://www.youtube.com/iframe_api";

thread_local! {
    // page-wide: every player instance shares this loader
    static LOADER: RefCell<ApiLoader<YtApi>> = RefCell::new(ApiLoader::new());
}

/// Registers `waiter` with the page-wide loader, injecting the API script on
/// the first call. Waiters always run outside the loader borrow, so they may
/// register more waiters.
pub(crate) fn ensure_api(waiter: ApiWaiter<YtApi>) {
    let outcome = LOADER.with(|loader| loader.borrow_mut().ensure_ready(waiter));
    match outcome {
        EnsureOutcome::Ready(api, waiter) => waiter(Ok(api)),
        EnsureOutcome::Failed(waiter) => waiter(Err(PlayerError::ApiLoadFailed)),
        EnsureOutcome::Registered { inject } => {
            if inject {
                if let Err(err) = begin_load() {
                    warn!("could not inject the iframe API script: {err:?}");
                    fail();
                }
            }
        }
    }
}

fn begin_load() -> Result<(), JsValue> {
    // a page that hardcodes the script tag may have executed it long before
    // the first player was constructed; the ready callback already fired and
    // will not fire again, so take the handle directly
    if let Some(api) = YtApi::from_global() {
        debug!("window.YT already present, skipping script injection");
        resolve(api);
        return Ok(());
    }

    let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;
    let document = window.document().ok_or_else(|| JsValue::from_str("no document"))?;

    install_ready_hook(&window)?;

    // the page may already carry the tag (another library, a hand-written
    // embed); if so the hook above is all that is needed
    if script_present(&document) {
        debug!("iframe API script tag already present, waiting for it");
        return Ok(());
    }
    inject_script(&document)
}

/// Installs `window.onYouTubeIframeAPIReady`. The API script calls it exactly
/// once; the closure stays alive for the rest of the page. A hook the host
/// page installed itself is chained, not clobbered.
fn install_ready_hook(window: &web_sys::Window) -> Result<(), JsValue> {
    let key = JsValue::from_str("onYouTubeIframeAPIReady");
    let previous = js_sys::Reflect::get(window, &key)
        .ok()
        .and_then(|value| value.dyn_into::<js_sys::Function>().ok());

    let hook = Closure::<dyn FnMut()>::new(move || {
        match YtApi::from_global() {
            Some(api) => resolve(api),
            None => {
                warn!("onYouTubeIframeAPIReady fired but window.YT is missing");
                fail();
            }
        }
        if let Some(previous) = &previous {
            if let Err(err) = previous.call0(&JsValue::NULL) {
                warn!("chained onYouTubeIframeAPIReady threw: {err:?}");
            }
        }
    });
    js_sys::Reflect::set(window, &key, hook.as_ref())?;
    hook.forget();
    Ok(())
}

fn script_present(document: &web_sys::Document) -> bool {
    let scripts = document.get_elements_by_tag_name("script");
    for index in 0..scripts.length() {
        let script = scripts
            .item(index)
            .and_then(|el| el.dyn_into::<web_sys::HtmlScriptElement>().ok());
        if let Some(script) = script {
            if script.src().contains("youtube.com/iframe_api") {
                return true;
            }
        }
    }
    false
}

fn inject_script(document: &web_sys::Document) -> Result<(), JsValue> {
    let script: web_sys::HtmlScriptElement =
        document.create_element("script")?.dyn_into()?;
    script.set_src(IFRAME_API_SRC);
    script.set_async(true);

    let on_error = Closure::<dyn FnMut()>::new(|| {
        warn!("the iframe API script failed to load");
        fail();
    });
    script.set_onerror(Some(on_error.as_ref().unchecked_ref()));
    on_error.forget();

    // before the first existing script tag, like the documented embed snippet
    let scripts = document.get_elements_by_tag_name("script");
    if let Some(first) = scripts.item(0) {
        if let Some(parent) = first.parent_node() {
            parent.insert_before(&script, Some(&first))?;
            return Ok(());
        }
    }
    document
        .document_element()
        .ok_or_else(|| JsValue::from_str("document has no root element"))?
        .append_child(&script)?;
    Ok(())
}

fn resolve(api: YtApi) {
    let waiters = LOADER.with(|loader| loader.borrow_mut().resolve(api.clone()));
    for waiter in waiters {
        waiter(Ok(api.clone()));
    }
}

fn fail() {
    let waiters = LOADER.with(|loader| loader.borrow_mut().fail());
    for waiter in waiters {
        waiter(Err(PlayerError::ApiLoadFailed));
    }
}
