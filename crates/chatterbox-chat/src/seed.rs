//! Demo data for local runs.

use crate::model::{Invite, Message, User};
use crate::store::{ChatStore, StoreResult};

/// Stores two users, a short conversation and one open invite.
///
/// | Record | Value |
/// |---|---|
/// | users | `john` / `12345`, `bob` / `67890` |
/// | messages | four messages at timestamps `0` to `3` |
/// | invite | `pee`, created by `john` |
pub fn seed_demo_data(store: &dyn ChatStore) -> StoreResult<()> {
    store.put_user(User::new("john", "12345"))?;
    store.put_user(User::new("bob", "67890"))?;

    let conversation = [
        ("john", "Hi, I'm John!"),
        ("bob", "Hello World"),
        ("john", "Test test test"),
        ("john", "Can you see this?"),
    ];
    for (timestamp, (author, content)) in (0_u32..).zip(conversation) {
        store.insert_message(Message::new(f64::from(timestamp), author, content))?;
    }

    store.put_invite(Invite::new("john", "pee"))?;
    tracing::info!("seeded demo data");
    Ok(())
}
