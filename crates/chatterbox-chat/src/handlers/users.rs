//! `/api/v1/me` and `/api/v1/users/{name}`.

use std::sync::{Arc, OnceLock};

use chatterbox_core::Job;
use chatterbox_router::Captures;
use regex::Regex;
use serde::Deserialize;

use super::{read_json, reply, Reply, INVALID_BODY};
use crate::auth::authorize;
use crate::error::{ApiError, ApiResult};
use crate::model::User;
use crate::state::ChatState;
use crate::store::Redemption;

const INVALID_INVITE: &str = "Invalid invite.";
const INVALID_USERNAME: &str =
    "Username must be between 2 and 32 characters, and lowercase latin characters only.";
const USERNAME_TAKEN: &str = "Username is taken.";

#[derive(Debug, Deserialize)]
struct SignUp {
    invite: Option<String>,
    username: Option<String>,
    password: Option<String>,
}

/// `GET /api/v1/me`: the authenticated user.
pub(crate) async fn me(state: Arc<ChatState>, mut job: Job, _captures: Captures) {
    let result = authorize(job.headers(), state.authenticator()).and_then(|user| Reply::ok(&user));
    reply(&mut job, result);
}

/// `POST /api/v1/me`: signs up by redeeming an invite.
pub(crate) async fn sign_up(state: Arc<ChatState>, mut job: Job, _captures: Captures) {
    let result = register(&state, &mut job).await;
    reply(&mut job, result);
}

async fn register(state: &ChatState, job: &mut Job) -> ApiResult<Reply> {
    let body: SignUp = read_json(job).await?;

    let code = body
        .invite
        .ok_or_else(|| ApiError::validation(INVALID_INVITE))?;
    if !state
        .store()
        .invite(&code)?
        .is_some_and(|invite| invite.is_open())
    {
        return Err(ApiError::validation(INVALID_INVITE));
    }

    let username = body
        .username
        .ok_or_else(|| ApiError::validation(INVALID_BODY))?;
    if !is_valid_username(&username) {
        return Err(ApiError::validation(INVALID_USERNAME));
    }
    if state.store().user(&username)?.is_some() {
        return Err(ApiError::validation(USERNAME_TAKEN));
    }
    let password = body
        .password
        .ok_or_else(|| ApiError::validation(INVALID_BODY))?;

    // The checks above give precise messages; the store re-checks atomically.
    match state
        .store()
        .redeem_invite(&code, User::new(username, password))?
    {
        Redemption::Created(user) => {
            tracing::info!(user = %user.name, invite = %code, "user signed up");
            Reply::ok(&user)
        }
        Redemption::InvalidInvite => Err(ApiError::validation(INVALID_INVITE)),
        Redemption::NameTaken => Err(ApiError::validation(USERNAME_TAKEN)),
    }
}

fn is_valid_username(name: &str) -> bool {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"^[a-z]{2,32}$").expect("valid regex"))
        .is_match(name)
}

/// `GET /api/v1/users/{name}`: looks up a user.
pub(crate) async fn lookup(state: Arc<ChatState>, mut job: Job, captures: Captures) {
    let result = find(&state, &job, &captures);
    reply(&mut job, result);
}

fn find(state: &ChatState, job: &Job, captures: &Captures) -> ApiResult<Reply> {
    authorize(job.headers(), state.authenticator())?;

    let name = captures.get(0).unwrap_or_default();
    let user = state
        .store()
        .user(name)?
        .ok_or_else(|| ApiError::not_found("No one with that name exists."))?;
    Reply::ok(&user)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_username_rules() {
        assert!(is_valid_username("al"));
        assert!(is_valid_username(&"a".repeat(32)));
        assert!(!is_valid_username("a"));
        assert!(!is_valid_username(&"a".repeat(33)));
        assert!(!is_valid_username("Alice"));
        assert!(!is_valid_username("alice1"));
        assert!(!is_valid_username("al ice"));
    }
}
