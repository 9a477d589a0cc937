//! Identity provider backed by a tokio watch channel.

use tokio::sync::watch;

use charpick_domain::UserId;

use crate::infrastructure::ports::{AuthState, IdentityProvider};

/// Holds the current authentication state and broadcasts changes.
///
/// Starts in [`AuthState::Initializing`]; whoever owns the session calls
/// [`sign_in`](Self::sign_in) or [`sign_out`](Self::sign_out) once it knows.
pub struct WatchIdentityProvider {
    sender: watch::Sender<AuthState>,
}

impl WatchIdentityProvider {
    pub fn new() -> Self {
        Self::with_state(AuthState::Initializing)
    }

    pub fn with_state(state: AuthState) -> Self {
        let (sender, _) = watch::channel(state);
        Self { sender }
    }

    pub fn sign_in(&self, user_id: UserId) {
        self.set(AuthState::SignedIn(user_id));
    }

    pub fn sign_out(&self) {
        self.set(AuthState::SignedOut);
    }

    /// Publish `state`. Subscribers are only woken on an actual change.
    pub fn set(&self, state: AuthState) {
        let changed = self.sender.send_if_modified(|current| {
            if *current == state {
                return false;
            }
            *current = state;
            true
        });
        if changed {
            tracing::debug!(state = ?*self.sender.borrow(), "Auth state changed");
        }
    }
}

impl Default for WatchIdentityProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl IdentityProvider for WatchIdentityProvider {
    fn current_user(&self) -> Option<UserId> {
        match &*self.sender.borrow() {
            AuthState::SignedIn(user) => Some(user.clone()),
            AuthState::Initializing | AuthState::SignedOut => None,
        }
    }

    fn is_initializing(&self) -> bool {
        matches!(*self.sender.borrow(), AuthState::Initializing)
    }

    fn subscribe(&self) -> watch::Receiver<AuthState> {
        self.sender.subscribe()
    }
}
