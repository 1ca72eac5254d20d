//! TTL cache in front of a store.
//!
//! User and invite lookups are cached for a fixed lifetime. Writes go to
//! the backing store first and then refresh the cache, so a successful
//! write is never shadowed by a stale entry. Message queries always hit
//! the backing store.
//!
//! Expired entries are ignored on lookup and removed by [`CachedStore::sweep`],
//! which [`CachedStore::spawn_sweeper`] runs periodically.

use std::collections::hash_map::Entry as MapEntry;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

use parking_lot::RwLock;
use tokio::task::JoinHandle;
use tokio::time::Instant;

use crate::model::{Invite, Message, User};
use crate::store::{ChatStore, MessageQuery, Redemption, StoreResult};

/// Cached record with its insertion time.
#[derive(Debug, Clone)]
struct Entry<T> {
    value: T,
    stored_at: Instant,
}

impl<T> Entry<T> {
    fn new(value: T) -> Self {
        Self {
            value,
            stored_at: Instant::now(),
        }
    }

    fn is_expired(&self, ttl: Duration) -> bool {
        self.stored_at.elapsed() > ttl
    }
}

/// Cache statistics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Lookups answered from the cache.
    pub hits: u64,
    /// Lookups that went to the backing store.
    pub misses: u64,
    /// Entries currently held, expired or not.
    pub size: usize,
}

/// A [`ChatStore`] wrapper caching user and invite lookups.
#[derive(Debug)]
pub struct CachedStore<S> {
    inner: S,
    ttl: Duration,
    users: RwLock<HashMap<String, Entry<User>>>,
    invites: RwLock<HashMap<String, Entry<Invite>>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl<S: ChatStore> CachedStore<S> {
    /// Wraps `inner`, keeping entries for `ttl`.
    pub fn new(inner: S, ttl: Duration) -> Self {
        Self {
            inner,
            ttl,
            users: RwLock::new(HashMap::new()),
            invites: RwLock::new(HashMap::new()),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Returns the backing store.
    pub fn inner(&self) -> &S {
        &self.inner
    }

    /// Returns the entry lifetime.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Returns cache statistics.
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            size: self.users.read().len() + self.invites.read().len(),
        }
    }

    /// Removes expired entries, returning how many were removed.
    pub fn sweep(&self) -> usize {
        let ttl = self.ttl;
        let mut removed = 0;

        let mut users = self.users.write();
        let before = users.len();
        users.retain(|_, entry| !entry.is_expired(ttl));
        removed += before - users.len();
        drop(users);

        let mut invites = self.invites.write();
        let before = invites.len();
        invites.retain(|_, entry| !entry.is_expired(ttl));
        removed += before - invites.len();

        removed
    }

    /// Runs [`sweep`](Self::sweep) every `interval` until the store is dropped.
    pub fn spawn_sweeper(self: &Arc<Self>, interval: Duration) -> JoinHandle<()>
    where
        S: 'static,
    {
        let store: Weak<Self> = Arc::downgrade(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(Instant::now() + interval, interval);
            loop {
                ticker.tick().await;
                let Some(store) = store.upgrade() else {
                    break;
                };
                let removed = store.sweep();
                if removed > 0 {
                    tracing::debug!(removed, "swept expired cache entries");
                }
            }
            tracing::debug!("cache sweeper stopped");
        })
    }

    fn lookup<T: Clone>(
        &self,
        cache: &RwLock<HashMap<String, Entry<T>>>,
        key: &str,
        load: impl FnOnce() -> StoreResult<Option<T>>,
    ) -> StoreResult<Option<T>> {
        if let Some(entry) = cache.read().get(key) {
            if !entry.is_expired(self.ttl) {
                self.hits.fetch_add(1, Ordering::Relaxed);
                return Ok(Some(entry.value.clone()));
            }
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        let Some(value) = load()? else {
            return Ok(None);
        };

        // A write that landed while we were loading is newer than `value`.
        let mut cache = cache.write();
        match cache.entry(key.to_string()) {
            MapEntry::Occupied(mut slot) => {
                if slot.get().is_expired(self.ttl) {
                    slot.insert(Entry::new(value));
                }
                Ok(Some(slot.get().value.clone()))
            }
            MapEntry::Vacant(slot) => {
                slot.insert(Entry::new(value.clone()));
                Ok(Some(value))
            }
        }
    }
}

impl<S: ChatStore> ChatStore for CachedStore<S> {
    fn messages(&self, query: &MessageQuery) -> StoreResult<Vec<Message>> {
        self.inner.messages(query)
    }

    fn insert_message(&self, message: Message) -> StoreResult<Message> {
        self.inner.insert_message(message)
    }

    fn user(&self, name: &str) -> StoreResult<Option<User>> {
        self.lookup(&self.users, name, || self.inner.user(name))
    }

    fn put_user(&self, user: User) -> StoreResult<()> {
        self.inner.put_user(user.clone())?;
        self.users
            .write()
            .insert(user.name.clone(), Entry::new(user));
        Ok(())
    }

    fn invite(&self, code: &str) -> StoreResult<Option<Invite>> {
        self.lookup(&self.invites, code, || self.inner.invite(code))
    }

    fn invites_by(&self, inviter: &str) -> StoreResult<Vec<Invite>> {
        self.inner.invites_by(inviter)
    }

    fn put_invite(&self, invite: Invite) -> StoreResult<()> {
        self.inner.put_invite(invite.clone())?;
        self.invites
            .write()
            .insert(invite.code.clone(), Entry::new(invite));
        Ok(())
    }

    fn redeem_invite(&self, code: &str, user: User) -> StoreResult<Redemption> {
        let outcome = self.inner.redeem_invite(code, user)?;
        if let Redemption::Created(user) = &outcome {
            match self.inner.invite(code)? {
                Some(invite) => {
                    self.invites
                        .write()
                        .insert(code.to_string(), Entry::new(invite));
                }
                None => {
                    self.invites.write().remove(code);
                }
            }
            self.users
                .write()
                .insert(user.name.clone(), Entry::new(user.clone()));
        }
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicBool;
    use std::sync::Barrier;

    use super::*;
    use crate::memory::MemoryStore;

    const TTL: Duration = Duration::from_secs(500);

    fn cached() -> CachedStore<MemoryStore> {
        let inner = MemoryStore::new();
        inner.put_user(User::new("john", "12345")).unwrap();
        inner.put_invite(Invite::new("john", "pee")).unwrap();
        CachedStore::new(inner, TTL)
    }

    #[tokio::test(start_paused = true)]
    async fn test_lookup_hits_after_miss() {
        let store = cached();
        assert!(store.user("john").unwrap().is_some());
        assert!(store.user("john").unwrap().is_some());

        let stats = store.stats();
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.size, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_missing_records_are_not_cached() {
        let store = cached();
        assert!(store.user("nobody").unwrap().is_none());
        assert_eq!(store.stats().size, 0);

        store.inner().put_user(User::new("nobody", "pw")).unwrap();
        assert!(store.user("nobody").unwrap().is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_expired_entries_reload_and_sweep() {
        let store = cached();
        store.user("john").unwrap();
        store.invite("pee").unwrap();
        assert_eq!(store.sweep(), 0);

        tokio::time::advance(TTL + Duration::from_secs(1)).await;
        assert_eq!(store.sweep(), 2);
        assert_eq!(store.stats().size, 0);

        store.user("john").unwrap();
        assert_eq!(store.stats().misses, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_redeem_refreshes_cached_invite() {
        let store = cached();
        assert!(store.invite("pee").unwrap().unwrap().is_open());

        let outcome = store
            .redeem_invite("pee", User::new("alice", "pw"))
            .unwrap();
        assert!(matches!(outcome, Redemption::Created(_)));

        let invite = store.invite("pee").unwrap().unwrap();
        assert_eq!(invite.accepter.as_deref(), Some("alice"));
        assert!(store.user("alice").unwrap().is_some());
    }

    /// Holds the first invite lookup between loading and returning.
    struct GatedStore {
        inner: MemoryStore,
        gate: Barrier,
        armed: AtomicBool,
    }

    impl ChatStore for GatedStore {
        fn messages(&self, query: &MessageQuery) -> StoreResult<Vec<Message>> {
            self.inner.messages(query)
        }

        fn insert_message(&self, message: Message) -> StoreResult<Message> {
            self.inner.insert_message(message)
        }

        fn user(&self, name: &str) -> StoreResult<Option<User>> {
            self.inner.user(name)
        }

        fn put_user(&self, user: User) -> StoreResult<()> {
            self.inner.put_user(user)
        }

        fn invite(&self, code: &str) -> StoreResult<Option<Invite>> {
            let invite = self.inner.invite(code)?;
            if self.armed.swap(false, Ordering::SeqCst) {
                self.gate.wait();
                self.gate.wait();
            }
            Ok(invite)
        }

        fn invites_by(&self, inviter: &str) -> StoreResult<Vec<Invite>> {
            self.inner.invites_by(inviter)
        }

        fn put_invite(&self, invite: Invite) -> StoreResult<()> {
            self.inner.put_invite(invite)
        }

        fn redeem_invite(&self, code: &str, user: User) -> StoreResult<Redemption> {
            self.inner.redeem_invite(code, user)
        }
    }

    #[test]
    fn test_slow_lookup_does_not_reopen_redeemed_invite() {
        let inner = MemoryStore::new();
        inner.put_user(User::new("john", "12345")).unwrap();
        inner.put_invite(Invite::new("john", "pee")).unwrap();
        let store = CachedStore::new(
            GatedStore {
                inner,
                gate: Barrier::new(2),
                armed: AtomicBool::new(true),
            },
            TTL,
        );

        std::thread::scope(|scope| {
            let reader = scope.spawn(|| store.invite("pee").unwrap().unwrap());

            // The reader has loaded the open invite and is parked.
            store.inner().gate.wait();
            let outcome = store
                .redeem_invite("pee", User::new("alice", "pw"))
                .unwrap();
            assert!(matches!(outcome, Redemption::Created(_)));
            store.inner().gate.wait();

            let seen = reader.join().unwrap();
            assert_eq!(seen.accepter.as_deref(), Some("alice"));
        });

        let invite = store.invite("pee").unwrap().unwrap();
        assert!(!invite.is_open());
        assert_eq!(invite.accepter.as_deref(), Some("alice"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_put_user_overrides_cached_entry() {
        let store = cached();
        store.user("john").unwrap();
        store
            .put_user(User::new("john", "changed").with_about("new"))
            .unwrap();
        assert_eq!(store.user("john").unwrap().unwrap().password, "changed");
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweeper_runs_and_stops_with_store() {
        let store = Arc::new(cached());
        store.user("john").unwrap();
        let sweeper = store.spawn_sweeper(Duration::from_secs(30));

        tokio::time::sleep(TTL + Duration::from_secs(31)).await;
        assert_eq!(store.stats().size, 0);

        drop(store);
        tokio::time::sleep(Duration::from_secs(61)).await;
        assert!(sweeper.is_finished());
    }
}
