//! Shared-API loader state machine.
//!
//! The Iframe API script is page-wide state: it is injected at most once and
//! every facade instance shares the handle it produces. This module holds the
//! platform-neutral part of that contract (the waiter list and the
//! single-initialization lifecycle) so it can be exercised without a
//! browser. The wasm glue in [`crate::web`] owns the actual script element
//! and the global ready callback and drives this machine from them.

use std::collections::VecDeque;

use log::debug;

use crate::PlayerError;

/// Callback receiving the shared API handle, or the load error.
pub type ApiWaiter<A> = Box<dyn FnOnce(Result<A, PlayerError>)>;

enum LoadState<A> {
    /// No one has asked for the API yet.
    Idle,
    /// The script tag is (or is assumed to be) in flight.
    Loading,
    /// The external script announced itself; the handle is shared from here
    /// on and never replaced.
    Ready(A),
    /// The script failed to load. Terminal: there is no retry.
    Failed,
}

/// What `ensure_ready` decided to do with a waiter. In the terminal states
/// the waiter is handed back so the caller can invoke it after releasing its
/// borrow of the loader.
#[must_use]
pub enum EnsureOutcome<A> {
    /// The API is already available; invoke the waiter with this handle.
    Ready(A, ApiWaiter<A>),
    /// A previous load attempt failed; invoke the waiter with
    /// [`PlayerError::ApiLoadFailed`].
    Failed(ApiWaiter<A>),
    /// The waiter was queued. When `inject` is true the caller must put the
    /// script tag in the page; this is returned exactly once per loader.
    Registered {
        /// True exactly once: the first registration on an idle loader.
        inject: bool,
    },
}

/// FIFO waiter list plus the set-at-most-once API handle.
pub struct ApiLoader<A> {
    state: LoadState<A>,
    waiters: VecDeque<ApiWaiter<A>>,
}

impl<A: Clone> ApiLoader<A> {
    /// A loader with no script in flight and no waiters.
    pub fn new() -> Self {
        Self {
            state: LoadState::Idle,
            waiters: VecDeque::new(),
        }
    }

    /// Registers `waiter` to be called exactly once with the API handle or
    /// the load error. The caller acts on the returned outcome *after*
    /// releasing any borrow of the loader, so waiters can re-enter it.
    pub fn ensure_ready(&mut self, waiter: ApiWaiter<A>) -> EnsureOutcome<A> {
        match &self.state {
            LoadState::Ready(api) => EnsureOutcome::Ready(api.clone(), waiter),
            LoadState::Failed => EnsureOutcome::Failed(waiter),
            LoadState::Idle => {
                self.state = LoadState::Loading;
                self.waiters.push_back(waiter);
                EnsureOutcome::Registered { inject: true }
            }
            LoadState::Loading => {
                self.waiters.push_back(waiter);
                EnsureOutcome::Registered { inject: false }
            }
        }
    }

    /// Called when the external script announces completion. Stores the
    /// handle and returns the whole waiter list in registration order; the
    /// caller invokes each with a clone of the handle.
    pub fn resolve(&mut self, api: A) -> Vec<ApiWaiter<A>> {
        debug!("iframe API ready, notifying {} waiter(s)", self.waiters.len());
        self.state = LoadState::Ready(api);
        self.waiters.drain(..).collect()
    }

    /// Called when the script element fails to load. Returns the waiter list
    /// in registration order; the caller invokes each with the error. The
    /// failure is terminal; later registrations get the error immediately.
    pub fn fail(&mut self) -> Vec<ApiWaiter<A>> {
        debug!(
            "iframe API failed to load, notifying {} waiter(s)",
            self.waiters.len()
        );
        self.state = LoadState::Failed;
        self.waiters.drain(..).collect()
    }

    /// The resolved handle, if the script has announced itself.
    pub fn api(&self) -> Option<A> {
        match &self.state {
            LoadState::Ready(api) => Some(api.clone()),
            _ => None,
        }
    }
}

impl<A: Clone> Default for ApiLoader<A> {
    fn default() -> Self {
        Self::new()
    }
}
