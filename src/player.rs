use std::cell::RefCell;
use std::rc::Rc;

use log::error;

use crate::error::{classify_error, ErrorDisposition};
use crate::events::{Listeners, PlaybackState, PlayerEvent};
use crate::host::{EmbeddedPlayer, Host, IntervalHandle, PlayerCallbacks};
use crate::options::PlayerOptions;
use crate::queue::{CommandQueue, PendingCommand};
use crate::PlayerError;

/// The facade over one embedded YouTube player.
///
/// Construction kicks off the shared API load; [`Player::load`] creates the
/// embedded widget once the API handle is available; the widget's own ready
/// callback completes the handshake and flushes every command buffered in
/// the meantime, strictly in arrival order.
///
/// Playback commands issued at any point in that sequence are safe: before
/// readiness they are queued, afterwards they delegate directly. All methods
/// become silent no-ops once the instance is destroyed.
///
/// The facade is single-threaded; callbacks from the host re-enter it on the
/// same event loop and are guarded by the destroyed flag.
pub struct Player<H: Host> {
    core: Rc<PlayerCore<H>>,
}

/// Everything behind the `Rc`: host services, mutable facade state, and the
/// subscriber list. State and listeners live in separate cells so an event
/// handler can call back into the facade while a dispatch is in flight.
struct PlayerCore<H: Host> {
    host: H,
    state: RefCell<Facade<H>>,
    listeners: Listeners,
}

struct Facade<H: Host> {
    options: PlayerOptions,
    /// Most recently requested video id. Last caller wins.
    video_id: Option<String>,
    destroyed: bool,
    /// Shared API handle, borrowed from the loader. `None` until the script
    /// announces itself.
    api: Option<H::Api>,
    /// The embedded widget. At most one per facade instance.
    player: Option<H::Player>,
    player_ready: bool,
    queue: CommandQueue,
    /// Timeupdate polling timer; dropping the handle cancels it.
    interval: Option<IntervalHandle>,
}

impl<H: Host + 'static> Player<H> {
    /// Creates a facade mounted on `host` and starts the shared API load.
    ///
    /// No embedded player exists until [`Player::load`] is called; commands
    /// issued before then are buffered.
    pub fn new(host: H, options: PlayerOptions) -> Self {
        let core = Rc::new(PlayerCore {
            host,
            state: RefCell::new(Facade {
                options,
                video_id: None,
                destroyed: false,
                api: None,
                player: None,
                player_ready: false,
                queue: CommandQueue::default(),
                interval: None,
            }),
            listeners: Listeners::new(),
        });

        let weak = Rc::downgrade(&core);
        core.host.ensure_api(Box::new(move |result| {
            if let Some(core) = weak.upgrade() {
                core.on_api(result);
            }
        }));

        Self { core }
    }

    /// Subscribes `callback` to every event the facade emits. Callbacks run
    /// in registration order and may call back into the player.
    pub fn on(&self, callback: impl FnMut(&PlayerEvent) + 'static) {
        self.core.listeners.subscribe(Box::new(callback));
    }

    /// Requests playback of `video_id`.
    ///
    /// Always records the id; under rapid repeated calls only the most
    /// recent one ever reaches the embedded player. Safe to call before the
    /// API script has loaded, the stored id is re-applied once it has.
    pub fn load(&self, video_id: &str) {
        self.core.load(video_id);
    }

    /// Starts or resumes playback. Buffered until the player is ready.
    pub fn play(&self) {
        self.core.command(PendingCommand::Play);
    }

    /// Pauses playback. Buffered until the player is ready.
    pub fn pause(&self) {
        self.core.command(PendingCommand::Pause);
    }

    /// Seeks to `seconds`. With `allow_seek_ahead` the player fetches
    /// unbuffered data instead of clamping to the buffered range. Buffered
    /// until the player is ready.
    pub fn seek(&self, seconds: f64, allow_seek_ahead: bool) {
        self.core.command(PendingCommand::Seek {
            seconds,
            allow_seek_ahead,
        });
    }

    /// Sets the volume (0-100). Buffered until the player is ready.
    pub fn set_volume(&self, volume: u8) {
        self.core.command(PendingCommand::SetVolume(volume.min(100)));
    }

    /// Duration of the current video in seconds; `0.0` when not ready or
    /// the widget reports nothing useful.
    pub fn duration(&self) -> f64 {
        self.core.duration()
    }

    /// Current playback position in seconds; `0.0` when not ready.
    pub fn current_time(&self) -> f64 {
        self.core.current_time()
    }

    /// The named playback state. [`PlaybackState::Unstarted`] whenever the
    /// instance is not ready, regardless of prior history.
    pub fn state(&self) -> PlaybackState {
        self.core.playback_state()
    }

    /// The most recently requested video id.
    pub fn video_id(&self) -> Option<String> {
        self.core.state.borrow().video_id.clone()
    }

    /// Whether the instance has been destroyed.
    pub fn is_destroyed(&self) -> bool {
        self.core.state.borrow().destroyed
    }

    /// Destroys the instance: discards buffered commands, stops the polling
    /// timer, and releases the embedded player. Idempotent; every later call
    /// on the facade is a no-op.
    pub fn destroy(&self) {
        self.core.destroy_with(None);
    }
}

impl<H: Host> Drop for Player<H> {
    fn drop(&mut self) {
        self.core.destroy_with(None);
    }
}

impl<H: Host> PlayerCore<H> {
    /// Outcome of the shared API load.
    fn on_api(self: &Rc<Self>, result: Result<H::Api, PlayerError>)
    where
        H: 'static,
    {
        let api = match result {
            Ok(api) => api,
            Err(err) => return self.destroy_with(Some(err)),
        };

        let pending_id = {
            let mut state = self.state.borrow_mut();
            if state.destroyed {
                return;
            }
            state.api = Some(api);
            state.video_id.clone()
        };

        // load() was called before the API resolved; apply the stored id now
        if let Some(id) = pending_id {
            self.load(&id);
        }
    }

    fn load(self: &Rc<Self>, video_id: &str)
    where
        H: 'static,
    {
        {
            let mut state = self.state.borrow_mut();
            if state.destroyed {
                return;
            }
            state.video_id = Some(video_id.to_owned());

            // No API yet: on_api re-invokes load with the stored id.
            if state.api.is_none() {
                return;
            }

            if state.player.is_some() {
                // Created but not ready: coalesce. on_player_ready reloads
                // with the stored id, so the last call wins.
                if !state.player_ready {
                    return;
                }
                if let Some(player) = state.player.as_mut() {
                    player.load_video_by_id(video_id);
                }
                return;
            }
        }

        self.create_player(video_id);
    }

    fn create_player(self: &Rc<Self>, video_id: &str)
    where
        H: 'static,
    {
        let (api, options) = {
            let state = self.state.borrow();
            if state.destroyed {
                return;
            }
            match &state.api {
                Some(api) => (api.clone(), state.options.clone()),
                None => return,
            }
        };

        let callbacks = self.player_callbacks(video_id.to_owned());
        match self.host.create_player(&api, video_id, &options, callbacks) {
            Ok(player) => {
                let mut state = self.state.borrow_mut();
                if state.destroyed {
                    let mut player = player;
                    player.stop_video();
                    player.destroy();
                    return;
                }
                state.player = Some(player);
            }
            Err(err) => self.destroy_with(Some(err)),
        }
    }

    /// Wires the embedded player's event surface back into the facade.
    /// `created_id` is the video id the widget was created with; readiness
    /// compares it against the stored id to catch loads issued during
    /// creation.
    fn player_callbacks(self: &Rc<Self>, created_id: String) -> PlayerCallbacks
    where
        H: 'static,
    {
        let ready = Rc::downgrade(self);
        let state_change = Rc::downgrade(self);
        let quality = Rc::downgrade(self);
        let rate = Rc::downgrade(self);
        let error = Rc::downgrade(self);

        PlayerCallbacks {
            on_ready: Box::new(move || {
                if let Some(core) = ready.upgrade() {
                    core.on_player_ready(&created_id);
                }
            }),
            on_state_change: Box::new(move |code| {
                if let Some(core) = state_change.upgrade() {
                    core.on_state_change(code);
                }
            }),
            on_playback_quality_change: Box::new(move |label| {
                if let Some(core) = quality.upgrade() {
                    core.on_quality_change(label);
                }
            }),
            on_playback_rate_change: Box::new(move |value| {
                if let Some(core) = rate.upgrade() {
                    core.on_rate_change(value);
                }
            }),
            on_error: Box::new(move |code| {
                if let Some(core) = error.upgrade() {
                    core.on_player_error(code);
                }
            }),
        }
    }

    fn on_player_ready(self: &Rc<Self>, created_id: &str)
    where
        H: 'static,
    {
        let reload = {
            let mut state = self.state.borrow_mut();
            if state.destroyed {
                return;
            }
            state.player_ready = true;
            match &state.video_id {
                // load() was called again while the widget was creating; the
                // stored id wins over the one used at creation time.
                Some(id) if id != created_id => Some(id.clone()),
                _ => None,
            }
        };
        if let Some(id) = reload {
            self.load(&id);
        }

        let commands = self.state.borrow_mut().queue.drain();
        for command in commands {
            self.command(command);
        }
    }

    /// Delegates when ready, buffers otherwise. Also the replay path for the
    /// queue flush, which is why it re-checks readiness.
    fn command(&self, command: PendingCommand) {
        let mut state = self.state.borrow_mut();
        if state.destroyed {
            return;
        }
        if !state.player_ready {
            state.queue.push(command);
            return;
        }
        if let Some(player) = state.player.as_mut() {
            match command {
                PendingCommand::Play => player.play_video(),
                PendingCommand::Pause => player.pause_video(),
                PendingCommand::Seek {
                    seconds,
                    allow_seek_ahead,
                } => player.seek_to(seconds, allow_seek_ahead),
                PendingCommand::SetVolume(volume) => player.set_volume(volume),
            }
        }
    }

    fn duration(&self) -> f64 {
        let state = self.state.borrow();
        if !state.player_ready {
            return 0.0;
        }
        state
            .player
            .as_ref()
            .map(|p| finite_or_zero(p.duration()))
            .unwrap_or(0.0)
    }

    fn current_time(&self) -> f64 {
        let state = self.state.borrow();
        if !state.player_ready {
            return 0.0;
        }
        state
            .player
            .as_ref()
            .map(|p| finite_or_zero(p.current_time()))
            .unwrap_or(0.0)
    }

    fn playback_state(&self) -> PlaybackState {
        let state = self.state.borrow();
        if !state.player_ready {
            return PlaybackState::Unstarted;
        }
        state
            .player
            .as_ref()
            .and_then(|p| PlaybackState::from_code(p.state_code()))
            .unwrap_or(PlaybackState::Unstarted)
    }

    fn on_state_change(self: &Rc<Self>, code: i32)
    where
        H: 'static,
    {
        if self.state.borrow().destroyed {
            return;
        }
        match PlaybackState::from_code(code) {
            Some(state) => self.emit(state.into()),
            None => error!("unrecognized player state code {code}"),
        }
    }

    fn on_quality_change(self: &Rc<Self>, label: String) {
        if self.state.borrow().destroyed {
            return;
        }
        self.listeners
            .dispatch(&PlayerEvent::PlaybackQualityChange(label));
    }

    fn on_rate_change(self: &Rc<Self>, value: f64) {
        if self.state.borrow().destroyed {
            return;
        }
        self.listeners
            .dispatch(&PlayerEvent::PlaybackRateChange(value));
    }

    fn on_player_error(self: &Rc<Self>, code: i32) {
        if self.state.borrow().destroyed {
            return;
        }
        match classify_error(code) {
            // the player switching from HTML5 to Flash to show an ad
            ErrorDisposition::Ignore => {}
            ErrorDisposition::Unplayable => {
                let video_id = self.state.borrow().video_id.clone();
                self.listeners.dispatch(&PlayerEvent::Unplayable(video_id));
            }
            ErrorDisposition::Fatal => {
                self.destroy_with(Some(PlayerError::UnknownErrorCode(code)))
            }
        }
    }

    /// Normalized state event out. The timeupdate timer piggybacks on these:
    /// entering Playing starts it (and reports once immediately), every
    /// non-playing state stops it.
    fn emit(self: &Rc<Self>, event: PlayerEvent)
    where
        H: 'static,
    {
        match event {
            PlayerEvent::Playing => {
                self.start_timeupdates();
                self.listeners.dispatch(&event);
                // first reading right away, not one full interval later
                if self.state.borrow().destroyed {
                    return;
                }
                let position = self.current_time();
                self.listeners.dispatch(&PlayerEvent::Timeupdate(position));
                return;
            }
            PlayerEvent::Paused
            | PlayerEvent::Buffering
            | PlayerEvent::Unstarted
            | PlayerEvent::Ended => self.stop_timeupdates(),
            _ => {}
        }
        self.listeners.dispatch(&event);
    }

    fn start_timeupdates(self: &Rc<Self>)
    where
        H: 'static,
    {
        let period = self.state.borrow().options.timeupdate_frequency;
        let weak = Rc::downgrade(self);
        let handle = self.host.start_interval(
            period,
            Box::new(move || {
                if let Some(core) = weak.upgrade() {
                    core.on_timeupdate();
                }
            }),
        );
        self.state.borrow_mut().interval = Some(handle);
    }

    fn stop_timeupdates(&self) {
        self.state.borrow_mut().interval = None;
    }

    fn on_timeupdate(self: &Rc<Self>) {
        if self.state.borrow().destroyed {
            return;
        }
        let position = self.current_time();
        self.listeners.dispatch(&PlayerEvent::Timeupdate(position));
    }

    /// Tears the instance down. With `err` set, a [`PlayerEvent::Error`]
    /// goes out after the resources are released; plain `destroy()` is
    /// silent. Idempotent.
    fn destroy_with(self: &Rc<Self>, err: Option<PlayerError>) {
        {
            let mut state = self.state.borrow_mut();
            if state.destroyed {
                return;
            }
            state.destroyed = true;

            if let Some(mut player) = state.player.take() {
                player.stop_video();
                player.destroy();
            }
            state.api = None;
            state.video_id = None;
            state.player_ready = false;
            state.queue.clear();
            state.interval = None;
        }
        if let Some(err) = err {
            self.listeners.dispatch(&PlayerEvent::Error(err));
        }
    }
}

fn finite_or_zero(value: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::{ApiLoader, EnsureOutcome};
    use std::cell::Cell;
    use std::time::Duration;

    #[derive(Clone)]
    struct MockApi;

    #[derive(Debug, Clone, PartialEq)]
    enum Call {
        Load(String),
        Play,
        Pause,
        Seek(f64, bool),
        SetVolume(u8),
        Stop,
        Destroy,
    }

    struct BackendState {
        duration: f64,
        current_time: f64,
        state_code: i32,
    }

    impl Default for BackendState {
        fn default() -> Self {
            Self {
                duration: 0.0,
                current_time: 0.0,
                state_code: -1,
            }
        }
    }

    struct MockEmbedded {
        calls: Rc<RefCell<Vec<Call>>>,
        backend: Rc<RefCell<BackendState>>,
    }

    impl EmbeddedPlayer for MockEmbedded {
        fn load_video_by_id(&mut self, video_id: &str) {
            self.calls.borrow_mut().push(Call::Load(video_id.into()));
        }
        fn play_video(&mut self) {
            self.calls.borrow_mut().push(Call::Play);
        }
        fn pause_video(&mut self) {
            self.calls.borrow_mut().push(Call::Pause);
        }
        fn seek_to(&mut self, seconds: f64, allow_seek_ahead: bool) {
            self.calls
                .borrow_mut()
                .push(Call::Seek(seconds, allow_seek_ahead));
        }
        fn set_volume(&mut self, volume: u8) {
            self.calls.borrow_mut().push(Call::SetVolume(volume));
        }
        fn duration(&self) -> f64 {
            self.backend.borrow().duration
        }
        fn current_time(&self) -> f64 {
            self.backend.borrow().current_time
        }
        fn state_code(&self) -> i32 {
            self.backend.borrow().state_code
        }
        fn stop_video(&mut self) {
            self.calls.borrow_mut().push(Call::Stop);
        }
        fn destroy(&mut self) {
            self.calls.borrow_mut().push(Call::Destroy);
        }
    }

    #[derive(Default)]
    struct HostState {
        created: Vec<String>,
        callbacks: Option<PlayerCallbacks>,
        tick: Option<(u64, Box<dyn FnMut()>)>,
        active_timer: Option<u64>,
        next_timer: u64,
        period: Option<Duration>,
    }

    struct MockHost {
        loader: Rc<RefCell<ApiLoader<MockApi>>>,
        injections: Rc<Cell<usize>>,
        host: Rc<RefCell<HostState>>,
        calls: Rc<RefCell<Vec<Call>>>,
        backend: Rc<RefCell<BackendState>>,
    }

    impl Host for MockHost {
        type Api = MockApi;
        type Player = MockEmbedded;

        fn ensure_api(&self, waiter: Box<dyn FnOnce(Result<MockApi, PlayerError>)>) {
            let outcome = self.loader.borrow_mut().ensure_ready(waiter);
            match outcome {
                EnsureOutcome::Ready(api, waiter) => waiter(Ok(api)),
                EnsureOutcome::Failed(waiter) => waiter(Err(PlayerError::ApiLoadFailed)),
                EnsureOutcome::Registered { inject } => {
                    if inject {
                        self.injections.set(self.injections.get() + 1);
                    }
                }
            }
        }

        fn create_player(
            &self,
            _api: &MockApi,
            video_id: &str,
            _options: &PlayerOptions,
            callbacks: PlayerCallbacks,
        ) -> Result<MockEmbedded, PlayerError> {
            let mut host = self.host.borrow_mut();
            host.created.push(video_id.to_owned());
            host.callbacks = Some(callbacks);
            Ok(MockEmbedded {
                calls: Rc::clone(&self.calls),
                backend: Rc::clone(&self.backend),
            })
        }

        fn start_interval(&self, period: Duration, tick: Box<dyn FnMut()>) -> IntervalHandle {
            let mut host = self.host.borrow_mut();
            let id = host.next_timer;
            host.next_timer += 1;
            host.period = Some(period);
            host.tick = Some((id, tick));
            host.active_timer = Some(id);
            let shared = Rc::clone(&self.host);
            IntervalHandle::new(move || {
                let mut host = shared.borrow_mut();
                if host.active_timer == Some(id) {
                    host.active_timer = None;
                }
            })
        }
    }

    struct Fixture {
        loader: Rc<RefCell<ApiLoader<MockApi>>>,
        injections: Rc<Cell<usize>>,
        host: Rc<RefCell<HostState>>,
        calls: Rc<RefCell<Vec<Call>>>,
        backend: Rc<RefCell<BackendState>>,
        events: Rc<RefCell<Vec<PlayerEvent>>>,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                loader: Rc::new(RefCell::new(ApiLoader::new())),
                injections: Rc::new(Cell::new(0)),
                host: Rc::default(),
                calls: Rc::default(),
                backend: Rc::default(),
                events: Rc::default(),
            }
        }

        /// A second fixture on the same page: same loader, own node and
        /// widget.
        fn sharing_loader(other: &Fixture) -> Self {
            Self {
                loader: Rc::clone(&other.loader),
                injections: Rc::clone(&other.injections),
                host: Rc::default(),
                calls: Rc::default(),
                backend: Rc::default(),
                events: Rc::default(),
            }
        }

        fn player(&self) -> Player<MockHost> {
            self.player_with(PlayerOptions::default())
        }

        fn player_with(&self, options: PlayerOptions) -> Player<MockHost> {
            let host = MockHost {
                loader: Rc::clone(&self.loader),
                injections: Rc::clone(&self.injections),
                host: Rc::clone(&self.host),
                calls: Rc::clone(&self.calls),
                backend: Rc::clone(&self.backend),
            };
            let player = Player::new(host, options);
            let events = Rc::clone(&self.events);
            player.on(move |event| events.borrow_mut().push(event.clone()));
            player
        }

        fn resolve_api(&self) {
            let waiters = self.loader.borrow_mut().resolve(MockApi);
            for waiter in waiters {
                waiter(Ok(MockApi));
            }
        }

        fn fail_api(&self) {
            let waiters = self.loader.borrow_mut().fail();
            for waiter in waiters {
                waiter(Err(PlayerError::ApiLoadFailed));
            }
        }

        fn with_callbacks(&self, f: impl FnOnce(&mut PlayerCallbacks)) {
            let mut callbacks = self
                .host
                .borrow_mut()
                .callbacks
                .take()
                .expect("no embedded player created");
            f(&mut callbacks);
            let mut host = self.host.borrow_mut();
            if host.callbacks.is_none() {
                host.callbacks = Some(callbacks);
            }
        }

        fn fire_ready(&self) {
            self.with_callbacks(|cbs| (cbs.on_ready)());
        }

        fn fire_state(&self, code: i32) {
            self.backend.borrow_mut().state_code = code;
            self.with_callbacks(|cbs| (cbs.on_state_change)(code));
        }

        fn fire_error(&self, code: i32) {
            self.with_callbacks(|cbs| (cbs.on_error)(code));
        }

        fn tick(&self) {
            let current = self.host.borrow_mut().tick.take();
            let Some((id, mut f)) = current else { return };
            if self.host.borrow().active_timer != Some(id) {
                return;
            }
            f();
            let mut host = self.host.borrow_mut();
            if host.tick.is_none() && host.active_timer == Some(id) {
                host.tick = Some((id, f));
            }
        }

        fn timer_running(&self) -> bool {
            self.host.borrow().active_timer.is_some()
        }

        fn created(&self) -> Vec<String> {
            self.host.borrow().created.clone()
        }

        fn calls(&self) -> Vec<Call> {
            self.calls.borrow().clone()
        }

        fn events(&self) -> Vec<PlayerEvent> {
            self.events.borrow().clone()
        }
    }

    /// Construct + load before the external script resolves: the id sticks
    /// immediately, nothing is created yet, the state is unstarted.
    #[test]
    fn load_before_api_resolves() {
        let fx = Fixture::new();
        let player = fx.player();

        player.load("dQw4w9WgXcQ");

        assert_eq!(player.video_id(), Some("dQw4w9WgXcQ".to_owned()));
        assert_eq!(player.state(), PlaybackState::Unstarted);
        assert!(fx.created().is_empty());
        assert_eq!(fx.injections.get(), 1);

        fx.resolve_api();
        assert_eq!(fx.created(), vec!["dQw4w9WgXcQ".to_owned()]);
    }

    #[test]
    fn commands_before_readiness_flush_in_order_exactly_once() {
        let fx = Fixture::new();
        let player = fx.player();

        player.load("a");
        player.play();
        player.pause();
        player.seek(12.5, true);
        player.set_volume(80);

        fx.resolve_api();
        assert!(fx.calls().is_empty(), "nothing may reach a non-ready widget");

        fx.fire_ready();
        assert_eq!(
            fx.calls(),
            vec![
                Call::Play,
                Call::Pause,
                Call::Seek(12.5, true),
                Call::SetVolume(80),
            ]
        );

        // the queue is gone; later commands delegate directly
        player.play();
        assert_eq!(fx.calls().last(), Some(&Call::Play));
        assert_eq!(fx.calls().len(), 5);
    }

    #[test]
    fn play_then_pause_before_readiness() {
        let fx = Fixture::new();
        let player = fx.player();

        player.load("a");
        player.play();
        player.pause();

        fx.resolve_api();
        fx.fire_ready();

        assert_eq!(fx.calls(), vec![Call::Play, Call::Pause]);
    }

    #[test]
    fn last_load_wins_before_api_resolves() {
        let fx = Fixture::new();
        let player = fx.player();

        player.load("first");
        player.load("second");
        fx.resolve_api();

        // only the most recent id is ever created
        assert_eq!(fx.created(), vec!["second".to_owned()]);
        assert_eq!(player.video_id(), Some("second".to_owned()));
    }

    #[test]
    fn load_during_creation_is_reapplied_on_ready() {
        let fx = Fixture::new();
        let player = fx.player();

        player.load("first");
        fx.resolve_api();
        assert_eq!(fx.created(), vec!["first".to_owned()]);

        // widget exists but has not signaled readiness; the call coalesces
        player.load("second");
        assert!(fx.calls().is_empty());
        assert_eq!(fx.created().len(), 1);

        fx.fire_ready();
        assert_eq!(fx.calls(), vec![Call::Load("second".to_owned())]);
    }

    #[test]
    fn state_is_unstarted_until_ready() {
        let fx = Fixture::new();
        let player = fx.player();

        assert_eq!(player.state(), PlaybackState::Unstarted);
        player.load("a");
        fx.resolve_api();
        assert_eq!(player.state(), PlaybackState::Unstarted);

        fx.fire_ready();
        fx.backend.borrow_mut().state_code = 1;
        assert_eq!(player.state(), PlaybackState::Playing);

        // unrecognized codes also read as unstarted
        fx.backend.borrow_mut().state_code = 4;
        assert_eq!(player.state(), PlaybackState::Unstarted);
    }

    #[test]
    fn state_changes_become_named_events() {
        let fx = Fixture::new();
        let player = fx.player();
        player.load("a");
        fx.resolve_api();
        fx.fire_ready();

        fx.fire_state(3);
        fx.fire_state(2);
        fx.fire_state(0);
        assert_eq!(
            fx.events(),
            vec![
                PlayerEvent::Buffering,
                PlayerEvent::Paused,
                PlayerEvent::Ended,
            ]
        );

        // unknown code: logged, not emitted
        fx.fire_state(4);
        assert_eq!(fx.events().len(), 3);
    }

    #[test]
    fn quality_and_rate_changes_are_forwarded() {
        let fx = Fixture::new();
        let player = fx.player();
        player.load("a");
        fx.resolve_api();
        fx.fire_ready();

        fx.with_callbacks(|cbs| (cbs.on_playback_quality_change)("hd720".to_owned()));
        fx.with_callbacks(|cbs| (cbs.on_playback_rate_change)(1.5));

        assert_eq!(
            fx.events(),
            vec![
                PlayerEvent::PlaybackQualityChange("hd720".to_owned()),
                PlayerEvent::PlaybackRateChange(1.5),
            ]
        );
    }

    #[test]
    fn html5_fallback_error_is_swallowed() {
        let fx = Fixture::new();
        let player = fx.player();
        player.load("a");
        fx.resolve_api();
        fx.fire_ready();

        fx.fire_error(5);

        assert!(fx.events().is_empty());
        assert!(!player.is_destroyed());
    }

    #[test]
    fn unplayable_codes_emit_one_event_each_with_video_id() {
        let fx = Fixture::new();
        let player = fx.player();
        player.load("gone-video-1");
        fx.resolve_api();
        fx.fire_ready();

        for code in [2, 100, 101, 150] {
            fx.fire_error(code);
        }

        let expected = PlayerEvent::Unplayable(Some("gone-video-1".to_owned()));
        assert_eq!(fx.events(), vec![expected.clone(); 4]);
        // non-fatal: the instance stays usable
        assert!(!player.is_destroyed());
        player.play();
        assert_eq!(fx.calls().last(), Some(&Call::Play));
    }

    #[test]
    fn unknown_error_code_is_fatal() {
        let _ = env_logger::builder().is_test(true).try_init();

        let fx = Fixture::new();
        let player = fx.player();
        player.load("a");
        fx.resolve_api();
        fx.fire_ready();

        fx.fire_error(9999);

        assert_eq!(
            fx.events(),
            vec![PlayerEvent::Error(PlayerError::UnknownErrorCode(9999))]
        );
        assert!(player.is_destroyed());
        assert_eq!(fx.calls(), vec![Call::Stop, Call::Destroy]);

        // everything after destruction is a silent no-op
        player.play();
        player.load("b");
        assert_eq!(fx.calls(), vec![Call::Stop, Call::Destroy]);
        assert_eq!(player.video_id(), None);
    }

    #[test]
    fn script_load_failure_destroys_with_error() {
        let fx = Fixture::new();
        let player = fx.player();
        player.load("a");

        fx.fail_api();

        assert_eq!(
            fx.events(),
            vec![PlayerEvent::Error(PlayerError::ApiLoadFailed)]
        );
        assert!(player.is_destroyed());
        assert!(fx.created().is_empty());
    }

    #[test]
    fn playing_emits_immediate_timeupdate_then_polls() {
        let fx = Fixture::new();
        let player = fx.player();
        player.load("a");
        fx.resolve_api();
        fx.fire_ready();

        fx.backend.borrow_mut().current_time = 1.5;
        fx.fire_state(1);
        assert_eq!(
            fx.events(),
            vec![PlayerEvent::Playing, PlayerEvent::Timeupdate(1.5)]
        );
        assert!(fx.timer_running());
        assert_eq!(
            fx.host.borrow().period,
            Some(Duration::from_secs(1)),
            "default polling frequency"
        );

        fx.backend.borrow_mut().current_time = 2.5;
        fx.tick();
        assert_eq!(fx.events().last(), Some(&PlayerEvent::Timeupdate(2.5)));

        fx.fire_state(2);
        assert_eq!(fx.events().last(), Some(&PlayerEvent::Paused));
        assert!(!fx.timer_running());

        // a stale tick after pausing produces nothing
        let before = fx.events().len();
        fx.tick();
        assert_eq!(fx.events().len(), before);
    }

    #[test]
    fn polling_frequency_is_configurable() {
        let fx = Fixture::new();
        let player = fx.player_with(PlayerOptions {
            timeupdate_frequency: Duration::from_millis(250),
            ..Default::default()
        });
        player.load("a");
        fx.resolve_api();
        fx.fire_ready();
        fx.fire_state(1);

        assert_eq!(fx.host.borrow().period, Some(Duration::from_millis(250)));
    }

    #[test]
    fn buffering_ended_and_unstarted_also_stop_polling() {
        let fx = Fixture::new();
        let player = fx.player();
        player.load("a");
        fx.resolve_api();
        fx.fire_ready();

        fx.fire_state(1);
        assert!(fx.timer_running());
        fx.fire_state(3);
        assert!(!fx.timer_running());

        fx.fire_state(1);
        assert!(fx.timer_running());
        fx.fire_state(0);
        assert!(!fx.timer_running());

        fx.fire_state(1);
        assert!(fx.timer_running());
        fx.fire_state(-1);
        assert!(!fx.timer_running());
    }

    #[test]
    fn two_instances_share_one_script_injection() {
        let fx_a = Fixture::new();
        let fx_b = Fixture::sharing_loader(&fx_a);

        let player_a = fx_a.player();
        let player_b = fx_b.player();
        player_a.load("video-a");
        player_b.load("video-b");

        assert_eq!(fx_a.injections.get(), 1, "script injected exactly once");

        fx_a.resolve_api();
        assert_eq!(fx_a.created(), vec!["video-a".to_owned()]);
        assert_eq!(fx_b.created(), vec!["video-b".to_owned()]);

        fx_a.fire_ready();
        fx_b.fire_ready();
        player_a.play();
        player_b.pause();
        assert_eq!(fx_a.calls(), vec![Call::Play]);
        assert_eq!(fx_b.calls(), vec![Call::Pause]);
    }

    #[test]
    fn destroy_is_idempotent_and_releases_resources() {
        let fx = Fixture::new();
        let player = fx.player();
        player.load("a");
        fx.resolve_api();
        fx.fire_ready();
        fx.fire_state(1);
        assert!(fx.timer_running());

        player.play();
        player.destroy();
        player.destroy();

        assert!(player.is_destroyed());
        assert!(!fx.timer_running());
        assert_eq!(
            fx.calls(),
            vec![Call::Play, Call::Stop, Call::Destroy],
            "widget stopped and destroyed exactly once"
        );

        // callbacks arriving after destruction are no-ops
        fx.fire_state(2);
        fx.fire_error(100);
        let events = fx.events();
        assert!(!events.contains(&PlayerEvent::Paused));
        assert!(!events
            .iter()
            .any(|e| matches!(e, PlayerEvent::Unplayable(_))));
    }

    #[test]
    fn destroy_discards_pending_queue() {
        let fx = Fixture::new();
        let player = fx.player();
        player.load("a");
        player.play();
        player.seek(5.0, false);

        player.destroy();
        fx.resolve_api();

        // no widget is ever created, nothing is replayed
        assert!(fx.created().is_empty());
        assert!(fx.calls().is_empty());
    }

    #[test]
    fn dropping_the_player_destroys_it() {
        let fx = Fixture::new();
        let player = fx.player();
        player.load("a");
        fx.resolve_api();
        fx.fire_ready();

        drop(player);
        assert_eq!(fx.calls(), vec![Call::Stop, Call::Destroy]);

        // late callbacks hold only weak references
        fx.fire_state(1);
        assert!(fx.events().is_empty());
    }

    #[test]
    fn getters_default_to_zero() {
        let fx = Fixture::new();
        let player = fx.player();

        assert_eq!(player.duration(), 0.0);
        assert_eq!(player.current_time(), 0.0);

        player.load("a");
        fx.resolve_api();
        fx.fire_ready();

        fx.backend.borrow_mut().duration = f64::NAN;
        assert_eq!(player.duration(), 0.0);

        fx.backend.borrow_mut().duration = 212.0;
        fx.backend.borrow_mut().current_time = 42.5;
        assert_eq!(player.duration(), 212.0);
        assert_eq!(player.current_time(), 42.5);
    }

    #[test]
    fn volume_is_clamped() {
        let fx = Fixture::new();
        let player = fx.player();
        player.load("a");
        fx.resolve_api();
        fx.fire_ready();

        player.set_volume(250);
        assert_eq!(fx.calls(), vec![Call::SetVolume(100)]);
    }

    #[test]
    fn ready_player_delegates_load_directly() {
        let fx = Fixture::new();
        let player = fx.player();
        player.load("a");
        fx.resolve_api();
        fx.fire_ready();

        player.load("b");
        assert_eq!(fx.calls(), vec![Call::Load("b".to_owned())]);
        assert_eq!(fx.created().len(), 1, "never a second widget");
    }
}
