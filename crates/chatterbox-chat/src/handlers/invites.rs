//! `/api/v1/invites` and `/api/v1/invites/{code}`.

use std::sync::Arc;

use chatterbox_core::Job;
use chatterbox_router::Captures;

use super::{reply, Reply};
use crate::auth::authorize;
use crate::error::{ApiError, ApiResult};
use crate::model::Invite;
use crate::state::ChatState;

/// `GET /api/v1/invites`: invites created by the caller.
pub(crate) async fn list(state: Arc<ChatState>, mut job: Job, _captures: Captures) {
    let result = authorize(job.headers(), state.authenticator()).and_then(|user| {
        let invites = state.store().invites_by(&user.name)?;
        Reply::ok(&invites)
    });
    reply(&mut job, result);
}

/// `POST /api/v1/invites`: creates an invite when enabled.
pub(crate) async fn create(state: Arc<ChatState>, mut job: Job, _captures: Captures) {
    let result = issue(&state, &job);
    reply(&mut job, result);
}

fn issue(state: &ChatState, job: &Job) -> ApiResult<Reply> {
    if !state.invite_creation() {
        return Err(ApiError::forbidden(
            "Invite creation is temporarily disabled.",
        ));
    }
    let user = authorize(job.headers(), state.authenticator())?;

    let invite = Invite::generate(&user.name);
    state.store().put_invite(invite.clone())?;
    tracing::info!(user = %user.name, invite = %invite.code, "invite created");
    Reply::ok(&invite)
}

/// `GET /api/v1/invites/{code}`: `204` if the invite can be redeemed.
pub(crate) async fn check(state: Arc<ChatState>, mut job: Job, captures: Captures) {
    let code = captures.get(0).unwrap_or_default();
    let result = match state.store().invite(code) {
        Ok(Some(invite)) if invite.is_open() => Ok(Reply::NoContent),
        Ok(_) => Err(ApiError::not_found("Invite not found.")),
        Err(e) => Err(e.into()),
    };
    reply(&mut job, result);
}
