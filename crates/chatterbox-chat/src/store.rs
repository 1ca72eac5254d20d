//! Store abstraction.
//!
//! Handlers talk to storage through [`ChatStore`], a plain synchronous
//! interface. [`MemoryStore`](crate::MemoryStore) keeps everything in
//! memory; [`CachedStore`](crate::CachedStore) puts a TTL cache in front of
//! any other store.

use crate::error::StoreError;
use crate::model::{Invite, Message, User};

/// Result type alias using [`StoreError`].
pub type StoreResult<T> = Result<T, StoreError>;

/// Window of messages to return.
///
/// Bounds are exclusive; the newest `limit` messages inside the window are
/// returned in ascending timestamp order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MessageQuery {
    /// Only messages strictly older than this.
    pub before: f64,
    /// Only messages strictly newer than this.
    pub after: f64,
    /// Maximum number of messages.
    pub limit: usize,
}

impl MessageQuery {
    /// The newest `limit` messages.
    #[must_use]
    pub fn latest(limit: usize) -> Self {
        Self {
            before: f64::INFINITY,
            after: f64::NEG_INFINITY,
            limit,
        }
    }

    /// Restricts to messages older than `before`.
    #[must_use]
    pub fn before(mut self, before: f64) -> Self {
        self.before = before;
        self
    }

    /// Restricts to messages newer than `after`.
    #[must_use]
    pub fn after(mut self, after: f64) -> Self {
        self.after = after;
        self
    }

    /// Returns true if `timestamp` lies inside the window.
    #[must_use]
    pub fn contains(&self, timestamp: f64) -> bool {
        self.after < timestamp && timestamp < self.before
    }
}

/// Outcome of [`ChatStore::redeem_invite`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Redemption {
    /// The user was created and the invite marked as redeemed.
    Created(User),
    /// The invite does not exist or was already redeemed.
    InvalidInvite,
    /// A user with that name already exists.
    NameTaken,
}

/// Storage for messages, users and invites.
pub trait ChatStore: Send + Sync {
    /// Returns messages inside `query`, oldest first.
    fn messages(&self, query: &MessageQuery) -> StoreResult<Vec<Message>>;

    /// Stores a message and returns it as stored.
    ///
    /// If the timestamp is not newer than the latest stored message, the
    /// store moves it just past that message.
    fn insert_message(&self, message: Message) -> StoreResult<Message>;

    /// Looks up a user.
    fn user(&self, name: &str) -> StoreResult<Option<User>>;

    /// Stores a user, replacing any user with the same name.
    fn put_user(&self, user: User) -> StoreResult<()>;

    /// Looks up an invite.
    fn invite(&self, code: &str) -> StoreResult<Option<Invite>>;

    /// Returns the invites created by `inviter`, oldest first.
    fn invites_by(&self, inviter: &str) -> StoreResult<Vec<Invite>>;

    /// Stores an invite, replacing any invite with the same code.
    fn put_invite(&self, invite: Invite) -> StoreResult<()>;

    /// Creates `user` by redeeming the invite `code`, atomically.
    fn redeem_invite(&self, code: &str, user: User) -> StoreResult<Redemption>;

    /// Stores a message stamped with the current time.
    fn post_message(&self, author: &str, content: &str) -> StoreResult<Message> {
        self.insert_message(Message::now(author, content))
    }
}
