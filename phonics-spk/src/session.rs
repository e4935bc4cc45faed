//! The single active playback session
//!
//! At most one session exists at a time. Starting a session stops and
//! cancels the previous one, and every state transition goes through the
//! slot lock, so a superseded request can never overwrite the state or
//! handle of the request that replaced it.

use crate::outcome::PlaybackState;
use crate::output::PlaybackHandle;
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, info};

struct Session {
    id: u64,
    cancel: watch::Sender<bool>,
    handle: Option<Arc<dyn PlaybackHandle>>,
}

impl Session {
    /// Mark the session cancelled, then silence its clip. The owner must
    /// see the cancellation before its clip reports having ended.
    fn cancel(self) {
        let _ = self.cancel.send(true);
        if let Some(handle) = &self.handle {
            handle.stop();
        }
    }
}

struct SlotInner {
    current: Option<Session>,
    next_id: u64,
}

pub(crate) struct SessionSlot {
    inner: Mutex<SlotInner>,
    state: watch::Sender<PlaybackState>,
}

/// Held by the request that owns a session
pub(crate) struct SessionTicket {
    pub(crate) id: u64,
    cancel: watch::Receiver<bool>,
}

impl SessionTicket {
    /// Resolves once the session has been superseded or stopped.
    pub(crate) async fn cancelled(&mut self) {
        loop {
            if *self.cancel.borrow_and_update() {
                return;
            }
            if self.cancel.changed().await.is_err() {
                if *self.cancel.borrow() {
                    return;
                }
                // Slot released by the owner itself; nothing will cancel it now
                std::future::pending::<()>().await;
            }
        }
    }

    pub(crate) fn is_cancelled(&self) -> bool {
        *self.cancel.borrow()
    }
}

impl SessionSlot {
    pub(crate) fn new() -> Self {
        let (state, _) = watch::channel(PlaybackState::Idle);
        Self {
            inner: Mutex::new(SlotInner {
                current: None,
                next_id: 1,
            }),
            state,
        }
    }

    /// Replace any running session with a new one in `initial` state.
    pub(crate) fn begin(&self, initial: PlaybackState) -> SessionTicket {
        let (cancel_tx, cancel_rx) = watch::channel(false);
        let mut inner = self.inner.lock();
        let id = inner.next_id;
        inner.next_id += 1;

        let previous = inner.current.replace(Session {
            id,
            cancel: cancel_tx,
            handle: None,
        });
        if let Some(previous) = previous {
            info!("Session {} superseded by session {}", previous.id, id);
            previous.cancel();
        }
        self.transition_locked(id, initial);

        SessionTicket { id, cancel: cancel_rx }
    }

    /// Move session `id` to `state`. No-op once the session is gone.
    pub(crate) fn transition(&self, id: u64, state: PlaybackState) -> bool {
        let inner = self.inner.lock();
        if inner.current.as_ref().map(|s| s.id) != Some(id) {
            return false;
        }
        self.transition_locked(id, state);
        true
    }

    fn transition_locked(&self, id: u64, state: PlaybackState) {
        let previous = self.state.send_replace(state);
        if previous != state {
            debug!("Session {}: {:?} -> {:?}", id, previous, state);
        }
    }

    /// Record the playing clip's handle and mark the session playing.
    ///
    /// Returns false when the session has already been replaced; the caller
    /// must then stop the clip itself.
    pub(crate) fn attach(&self, id: u64, handle: Arc<dyn PlaybackHandle>, playing: PlaybackState) -> bool {
        let mut inner = self.inner.lock();
        match inner.current.as_mut() {
            Some(session) if session.id == id => {
                session.handle = Some(handle);
                self.transition_locked(id, playing);
                true
            }
            _ => false,
        }
    }

    /// Drop the handle of a clip that has ended.
    pub(crate) fn detach(&self, id: u64) {
        let mut inner = self.inner.lock();
        if let Some(session) = inner.current.as_mut() {
            if session.id == id {
                session.handle = None;
            }
        }
    }

    /// End session `id` normally. Returns false if it was already replaced.
    pub(crate) fn finish(&self, id: u64) -> bool {
        let mut inner = self.inner.lock();
        if inner.current.as_ref().map(|s| s.id) != Some(id) {
            return false;
        }
        if let Some(session) = inner.current.take() {
            if let Some(handle) = session.handle {
                handle.stop();
            }
        }
        self.transition_locked(id, PlaybackState::Idle);
        true
    }

    /// Stop and cancel the current session, if any.
    pub(crate) fn stop(&self) -> bool {
        let mut inner = self.inner.lock();
        match inner.current.take() {
            Some(session) => {
                let id = session.id;
                session.cancel();
                self.transition_locked(id, PlaybackState::Idle);
                true
            }
            None => false,
        }
    }

    pub(crate) fn is_active(&self) -> bool {
        self.inner.lock().current.is_some()
    }

    pub(crate) fn state(&self) -> PlaybackState {
        *self.state.borrow()
    }

    pub(crate) fn subscribe(&self) -> watch::Receiver<PlaybackState> {
        self.state.subscribe()
    }
}
