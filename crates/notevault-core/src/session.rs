//! Session lifecycle: who holds the key, and until when.
//!
//! The controller is a small state machine. `transition` is a pure function
//! from (state, input, now) to the next state plus emitted events; the
//! controller applies it under a mutex, keeps the `SessionKey` in step with
//! the state and publishes every change on a `watch` channel.
//!
//! Expiry is checked at the top of every keyed operation. A background
//! ticker (`spawn_expiry_ticker`) can additionally expire idle sessions
//! proactively.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, Weak};

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::crypto::SessionKey;
use crate::error::{AuthError, Result};

/// Default sliding session window.
pub const DEFAULT_SESSION_TIMEOUT_MINUTES: i64 = 30;

/// Longest accepted session window, one week.
pub const MAX_SESSION_TIMEOUT_MINUTES: i64 = 7 * 24 * 60;

const MAX_BUFFERED_EVENTS: usize = 256;

/// Source of the current time.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap_or_else(|p| p.into_inner());
        *now += by;
    }

    pub fn set(&self, to: DateTime<Utc>) {
        *self.now.lock().unwrap_or_else(|p| p.into_inner()) = to;
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new(Utc::now())
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap_or_else(|p| p.into_inner())
    }
}

/// Observable session state. Carries no key material.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum SessionState {
    Unauthenticated,
    Authenticated { expires_at: DateTime<Utc> },
}

impl SessionState {
    pub fn is_authenticated(&self) -> bool {
        matches!(self, SessionState::Authenticated { .. })
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        match self {
            SessionState::Authenticated { expires_at } => Some(*expires_at),
            SessionState::Unauthenticated => None,
        }
    }
}

/// Something that happened to the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum SessionEvent {
    LoggedIn { expires_at: DateTime<Utc> },
    Extended { expires_at: DateTime<Utc> },
    LoggedOut,
    Expired,
}

/// Inputs driving the state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionInput {
    /// A fresh key was derived by setup or login
    Install,
    /// User activity
    Extend,
    Logout,
    /// Expiry check, from an operation or the ticker
    Tick,
}

/// `now + timeout`, pinned to the latest representable instant on overflow.
fn deadline(now: DateTime<Utc>, timeout: Duration) -> DateTime<Utc> {
    now.checked_add_signed(timeout)
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

/// Pure transition function.
pub fn transition(
    state: SessionState,
    input: SessionInput,
    now: DateTime<Utc>,
    timeout: Duration,
) -> (SessionState, Vec<SessionEvent>) {
    use SessionInput::*;
    use SessionState::*;

    match (state, input) {
        (_, Install) => {
            let expires_at = deadline(now, timeout);
            (
                Authenticated { expires_at },
                vec![SessionEvent::LoggedIn { expires_at }],
            )
        }
        (Authenticated { expires_at }, Extend | Tick) if now >= expires_at => {
            (Unauthenticated, vec![SessionEvent::Expired])
        }
        (Authenticated { .. }, Extend) => {
            let expires_at = deadline(now, timeout);
            (
                Authenticated { expires_at },
                vec![SessionEvent::Extended { expires_at }],
            )
        }
        (Authenticated { .. }, Logout) => (Unauthenticated, vec![SessionEvent::LoggedOut]),
        (Authenticated { .. }, Tick) | (Unauthenticated, Extend | Logout | Tick) => {
            (state, Vec::new())
        }
    }
}

struct Inner {
    state: SessionState,
    key: Option<SessionKey>,
    events: VecDeque<SessionEvent>,
}

/// Holds the live session key, at most one per vault instance.
pub struct SessionController {
    inner: Mutex<Inner>,
    clock: Arc<dyn Clock>,
    timeout: Duration,
    state_tx: watch::Sender<SessionState>,
}

impl SessionController {
    pub fn new(clock: Arc<dyn Clock>, timeout: Duration) -> Self {
        let (state_tx, _) = watch::channel(SessionState::Unauthenticated);
        Self {
            inner: Mutex::new(Inner {
                state: SessionState::Unauthenticated,
                key: None,
                events: VecDeque::new(),
            }),
            clock,
            timeout,
            state_tx,
        }
    }

    /// Controller on the wall clock with the default 30 minute window.
    pub fn with_system_clock() -> Self {
        Self::new(
            Arc::new(SystemClock),
            Duration::minutes(DEFAULT_SESSION_TIMEOUT_MINUTES),
        )
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Current time according to the controller's clock.
    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Lock the inner state. A poisoned lock drops any key and resets to
    /// `Unauthenticated`.
    fn lock(&self) -> MutexGuard<'_, Inner> {
        match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => {
                tracing::warn!("session lock poisoned, discarding session");
                let mut guard = poisoned.into_inner();
                guard.key = None;
                guard.state = SessionState::Unauthenticated;
                self.inner.clear_poison();
                self.state_tx.send_replace(SessionState::Unauthenticated);
                guard
            }
        }
    }

    fn apply(
        &self,
        inner: &mut Inner,
        input: SessionInput,
        key: Option<SessionKey>,
    ) -> Vec<SessionEvent> {
        let (next, events) = transition(inner.state, input, self.clock.now(), self.timeout);

        if input == SessionInput::Install {
            // Replacing the key drops (and zeroizes) the previous one first.
            inner.key = None;
            inner.key = key;
        }
        if !next.is_authenticated() {
            inner.key = None;
        }
        if next != inner.state {
            tracing::debug!(from = ?inner.state, to = ?next, ?input, "session transition");
        }
        inner.state = next;

        for event in &events {
            match event {
                SessionEvent::LoggedIn { expires_at } => {
                    tracing::info!(%expires_at, "session started")
                }
                SessionEvent::LoggedOut => tracing::info!("session ended by logout"),
                SessionEvent::Expired => tracing::info!("session expired"),
                SessionEvent::Extended { .. } => {}
            }
            if inner.events.len() == MAX_BUFFERED_EVENTS {
                inner.events.pop_front();
            }
            inner.events.push_back(*event);
        }

        if !events.is_empty() {
            self.state_tx.send_replace(next);
        }
        events
    }

    /// Start a session with a freshly derived key.
    pub fn install(&self, key: SessionKey) {
        let mut inner = self.lock();
        self.apply(&mut inner, SessionInput::Install, Some(key));
    }

    /// Re-arm the deadline after user activity.
    ///
    /// No-op while unauthenticated.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::SessionExpired` if the deadline had already
    /// passed; the session is expired rather than revived.
    pub fn extend(&self) -> std::result::Result<(), AuthError> {
        let mut inner = self.lock();
        let events = self.apply(&mut inner, SessionInput::Extend, None);
        if events.contains(&SessionEvent::Expired) {
            return Err(AuthError::SessionExpired);
        }
        Ok(())
    }

    /// End the session now. Safe to call repeatedly.
    pub fn logout(&self) {
        let mut inner = self.lock();
        self.apply(&mut inner, SessionInput::Logout, None);
    }

    /// Expire the session if its deadline has passed.
    ///
    /// Returns `true` only on the call that actually expired it.
    pub fn expire_if_due(&self) -> bool {
        let mut inner = self.lock();
        let events = self.apply(&mut inner, SessionInput::Tick, None);
        events.contains(&SessionEvent::Expired)
    }

    /// Current state, after applying any due expiry.
    pub fn state(&self) -> SessionState {
        let mut inner = self.lock();
        self.apply(&mut inner, SessionInput::Tick, None);
        inner.state
    }

    pub fn is_authenticated(&self) -> bool {
        self.state().is_authenticated()
    }

    /// Run `f` with the live key.
    ///
    /// The session lock is held while `f` runs, so `f` must not call back
    /// into the controller.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::NotAuthenticated` if there is no live key,
    /// including when the deadline has just passed.
    pub fn with_key<T>(&self, f: impl FnOnce(&SessionKey) -> Result<T>) -> Result<T> {
        let mut inner = self.lock();
        self.apply(&mut inner, SessionInput::Tick, None);
        match inner.key.as_ref() {
            Some(key) => f(key),
            None => Err(AuthError::NotAuthenticated.into()),
        }
    }

    /// Fail with `NotAuthenticated` unless a key is live.
    pub fn ensure_authenticated(&self) -> Result<()> {
        self.with_key(|_| Ok(()))
    }

    /// Receive every published state change.
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state_tx.subscribe()
    }

    /// Take the buffered events, oldest first.
    pub fn drain_events(&self) -> Vec<SessionEvent> {
        self.lock().events.drain(..).collect()
    }
}

impl std::fmt::Debug for SessionController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionController")
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

/// Spawn a task that expires the session once its deadline passes.
///
/// The task holds a weak reference and stops once the controller is dropped.
pub fn spawn_expiry_ticker(
    controller: &Arc<SessionController>,
    period: std::time::Duration,
) -> JoinHandle<()> {
    let weak: Weak<SessionController> = Arc::downgrade(controller);
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            interval.tick().await;
            let Some(controller) = weak.upgrade() else {
                break;
            };
            if controller.expire_if_due() {
                tracing::debug!("expiry ticker closed the session");
            }
        }
    })
}
