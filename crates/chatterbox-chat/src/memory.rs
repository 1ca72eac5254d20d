//! In-memory store.

use std::collections::HashMap;

use indexmap::IndexMap;
use parking_lot::RwLock;

use crate::model::{Invite, Message, User};
use crate::store::{ChatStore, MessageQuery, Redemption, StoreResult};

/// Smallest gap kept between consecutive message timestamps.
const TIMESTAMP_STEP: f64 = 1e-6;

/// A [`ChatStore`] that keeps all records in process memory.
///
/// Messages are kept sorted by timestamp, so window queries are two binary
/// searches.
///
/// # Example
///
/// ```rust
/// use chatterbox_chat::{ChatStore, MemoryStore, MessageQuery, User};
///
/// let store = MemoryStore::new();
/// store.put_user(User::new("john", "12345")).unwrap();
/// store.post_message("john", "Hi, I'm John!").unwrap();
///
/// let messages = store.messages(&MessageQuery::latest(50)).unwrap();
/// assert_eq!(messages.len(), 1);
/// ```
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    messages: Vec<Message>,
    users: HashMap<String, User>,
    invites: IndexMap<String, Invite>,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of stored messages.
    #[must_use]
    pub fn message_count(&self) -> usize {
        self.inner.read().messages.len()
    }
}

impl ChatStore for MemoryStore {
    fn messages(&self, query: &MessageQuery) -> StoreResult<Vec<Message>> {
        let inner = self.inner.read();
        let messages = &inner.messages;

        let start = messages.partition_point(|m| m.timestamp <= query.after);
        let end = messages.partition_point(|m| m.timestamp < query.before);
        if start >= end {
            return Ok(Vec::new());
        }

        let first = end.saturating_sub(query.limit).max(start);
        Ok(messages[first..end].to_vec())
    }

    fn insert_message(&self, mut message: Message) -> StoreResult<Message> {
        let mut inner = self.inner.write();
        if let Some(last) = inner.messages.last() {
            if message.timestamp <= last.timestamp {
                message.timestamp = last.timestamp + TIMESTAMP_STEP;
            }
        }
        inner.messages.push(message.clone());
        Ok(message)
    }

    fn user(&self, name: &str) -> StoreResult<Option<User>> {
        Ok(self.inner.read().users.get(name).cloned())
    }

    fn put_user(&self, user: User) -> StoreResult<()> {
        self.inner.write().users.insert(user.name.clone(), user);
        Ok(())
    }

    fn invite(&self, code: &str) -> StoreResult<Option<Invite>> {
        Ok(self.inner.read().invites.get(code).cloned())
    }

    fn invites_by(&self, inviter: &str) -> StoreResult<Vec<Invite>> {
        Ok(self
            .inner
            .read()
            .invites
            .values()
            .filter(|invite| invite.inviter == inviter)
            .cloned()
            .collect())
    }

    fn put_invite(&self, invite: Invite) -> StoreResult<()> {
        self.inner.write().invites.insert(invite.code.clone(), invite);
        Ok(())
    }

    fn redeem_invite(&self, code: &str, user: User) -> StoreResult<Redemption> {
        let mut inner = self.inner.write();

        match inner.invites.get(code) {
            Some(invite) if invite.is_open() => {}
            _ => return Ok(Redemption::InvalidInvite),
        }
        if inner.users.contains_key(&user.name) {
            return Ok(Redemption::NameTaken);
        }

        if let Some(invite) = inner.invites.get_mut(code) {
            invite.accepter = Some(user.name.clone());
        }
        inner.users.insert(user.name.clone(), user.clone());
        Ok(Redemption::Created(user))
    }
}
