//! Authenticated session state.

use std::sync::{Mutex, PoisonError};

use serde::{Deserialize, Serialize};

use lockerbay_core::Email;

use crate::events::{AppEvent, EventBus};

/// Path the navigation shell falls back to after logout.
const DEFAULT_VIEW: &str = "/";

/// The identity of an authenticated shopper.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub email: Email,
    pub full_name: String,
}

/// The authenticated session.
///
/// Created by a successful login or by the sign-up flow completing.
/// Logout broadcasts on the bus; the cart and the navigation shell react
/// independently, in no guaranteed order.
pub struct SessionStore {
    identity: Mutex<Option<Identity>>,
    bus: EventBus,
}

impl SessionStore {
    /// Create a signed-out session attached to the bus.
    #[must_use]
    pub fn new(bus: EventBus) -> Self {
        Self {
            identity: Mutex::new(None),
            bus,
        }
    }

    /// Establish a session for `identity`.
    pub fn login(&self, identity: Identity) {
        tracing::info!(email = %identity.email, "session established");
        *self.lock() = Some(identity);
    }

    /// Destroy the session and broadcast logout and the fallback
    /// navigation.
    pub fn logout(&self) {
        *self.lock() = None;
        tracing::info!("session destroyed");

        self.bus.publish(&AppEvent::LoggedOut);
        self.bus
            .publish(&AppEvent::Navigate(DEFAULT_VIEW.to_owned()));
    }

    /// Whether a shopper is signed in.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.lock().is_some()
    }

    /// The current identity, if signed in.
    #[must_use]
    pub fn identity(&self) -> Option<Identity> {
        self.lock().clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Option<Identity>> {
        self.identity.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
