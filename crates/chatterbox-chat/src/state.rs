//! Shared handler state.

use std::sync::Arc;

use chatterbox_config::{ChatConfig, InvitesConfig};
use chatterbox_core::WaitGate;

use crate::auth::{Authenticator, StoreAuthenticator};
use crate::store::ChatStore;

/// Bounds on the `limit` query parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MessageLimits {
    /// Used when the parameter is absent.
    pub default: usize,
    /// Largest accepted value.
    pub max: usize,
}

impl Default for MessageLimits {
    fn default() -> Self {
        Self {
            default: 50,
            max: 200,
        }
    }
}

/// Everything the API handlers share.
///
/// Held behind an `Arc` by every registered handler and dropped with the
/// endpoint table.
pub struct ChatState {
    store: Arc<dyn ChatStore>,
    authenticator: Arc<dyn Authenticator>,
    gate: WaitGate,
    limits: MessageLimits,
    invite_creation: bool,
}

impl ChatState {
    /// Creates state over `store`, authenticating against the same store.
    pub fn new(store: Arc<dyn ChatStore>, chat: &ChatConfig, invites: &InvitesConfig) -> Self {
        Self {
            authenticator: Arc::new(StoreAuthenticator::new(Arc::clone(&store))),
            store,
            gate: WaitGate::new(chat.long_poll_timeout()),
            limits: MessageLimits {
                default: chat.default_message_limit,
                max: chat.max_message_limit,
            },
            invite_creation: invites.creation_enabled,
        }
    }

    /// Replaces the authenticator.
    #[must_use]
    pub fn with_authenticator(mut self, authenticator: Arc<dyn Authenticator>) -> Self {
        self.authenticator = authenticator;
        self
    }

    /// Returns the store.
    pub fn store(&self) -> &dyn ChatStore {
        self.store.as_ref()
    }

    /// Returns the authenticator.
    pub fn authenticator(&self) -> &dyn Authenticator {
        self.authenticator.as_ref()
    }

    /// Returns the gate long-polling requests wait on.
    pub fn gate(&self) -> &WaitGate {
        &self.gate
    }

    /// Returns the message limit bounds.
    pub fn limits(&self) -> MessageLimits {
        self.limits
    }

    /// Returns true if clients may create invites.
    pub fn invite_creation(&self) -> bool {
        self.invite_creation
    }
}

impl std::fmt::Debug for ChatState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatState")
            .field("gate", &self.gate)
            .field("limits", &self.limits)
            .field("invite_creation", &self.invite_creation)
            .finish_non_exhaustive()
    }
}
