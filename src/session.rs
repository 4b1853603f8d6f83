//! Session gate: the process-wide observable identity state.

use tokio::sync::watch;

/// Current identity state, indeterminate until the first update arrives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    /// No identity update received yet; no routing decision is made.
    Loading,
    /// An identity is present.
    Authenticated(String),
    /// Determinately signed out.
    Unauthenticated,
}

impl SessionState {
    /// Whether an identity is present.
    pub fn is_authenticated(&self) -> bool {
        matches!(self, SessionState::Authenticated(_))
    }

    /// Whether the first identity update has arrived.
    pub fn is_determinate(&self) -> bool {
        !matches!(self, SessionState::Loading)
    }
}

/// Gate deciding access to the catalog based on identity presence.
///
/// Starts in `Loading` and becomes determinate on the first update
/// (startup session restore, sign-in, or sign-out). Consumers observe
/// changes through [`subscribe`](SessionGate::subscribe) rather than a
/// shared mutable global.
#[derive(Debug, Clone)]
pub struct SessionGate {
    tx: watch::Sender<SessionState>,
}

impl SessionGate {
    /// Create a gate in the indeterminate `Loading` state.
    pub fn new() -> Self {
        let (tx, _) = watch::channel(SessionState::Loading);
        Self { tx }
    }

    /// Current state snapshot.
    pub fn current(&self) -> SessionState {
        self.tx.borrow().clone()
    }

    /// Subscribe to state changes.
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.tx.subscribe()
    }

    /// Record a sign-in (or a restored session) for the given user.
    ///
    /// The state is updated even when nobody is subscribed; `current` must
    /// reflect every identity change regardless of observers.
    pub fn signed_in(&self, user_id: impl Into<String>) {
        self.tx
            .send_replace(SessionState::Authenticated(user_id.into()));
    }

    /// Record a sign-out, or a startup restore that found no session.
    pub fn signed_out(&self) {
        self.tx.send_replace(SessionState::Unauthenticated);
    }

    /// Whether the catalog screen is currently reachable.
    pub fn allows_catalog(&self) -> bool {
        self.current().is_authenticated()
    }
}

impl Default for SessionGate {
    fn default() -> Self {
        Self::new()
    }
}
