//! `/api/v1/communities/{community}/channels/{channel}/messages`
//!
//! `GET` lists messages and can long-poll for the next one; `POST` stores a
//! message and wakes every poller.

use std::sync::Arc;

use chatterbox_core::Job;
use chatterbox_router::Captures;
use chatterbox_telemetry::metrics::{record_long_poll, record_message_stored};
use serde::{Deserialize, Serialize};

use super::{read_json, reply, Reply, INVALID_BODY};
use crate::auth::authorize;
use crate::error::{ApiError, ApiResult};
use crate::model::{Message, User};
use crate::state::{ChatState, MessageLimits};
use crate::store::{ChatStore, MessageQuery};

/// Parsed query string of a list request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct ListParams {
    pub(crate) query: MessageQuery,
    pub(crate) polling: bool,
}

impl ListParams {
    /// Parses `before`, `after`, `polling` and `limit`; other parameters are
    /// ignored and the first of duplicates wins.
    pub(crate) fn parse(pairs: &[(String, String)], limits: MessageLimits) -> ApiResult<Self> {
        let value = |name: &str| {
            pairs
                .iter()
                .find(|(key, _)| key == name)
                .map(|(_, value)| value.as_str())
        };

        let mut query = MessageQuery::latest(limits.default);
        if let Some(raw) = value("before") {
            query.before = parse_timestamp("before", raw)?;
        }
        if let Some(raw) = value("after") {
            query.after = parse_timestamp("after", raw)?;
        }
        if let Some(raw) = value("limit") {
            let limit: i64 = raw.parse().map_err(|_| invalid_parameter("limit"))?;
            query.limit = usize::try_from(limit)
                .ok()
                .filter(|limit| (1..=limits.max).contains(limit))
                .ok_or_else(|| {
                    ApiError::validation(format!(
                        "Query parameter limit must be between 1 and {}.",
                        limits.max
                    ))
                })?;
        }

        let polling = match value("polling") {
            None => false,
            Some(raw) if raw.eq_ignore_ascii_case("true") => true,
            Some(raw) if raw.eq_ignore_ascii_case("false") => false,
            Some(_) => return Err(invalid_parameter("polling")),
        };

        Ok(Self { query, polling })
    }
}

fn parse_timestamp(name: &str, raw: &str) -> ApiResult<f64> {
    raw.parse::<f64>()
        .ok()
        .filter(|value| !value.is_nan())
        .ok_or_else(|| invalid_parameter(name))
}

fn invalid_parameter(name: &str) -> ApiError {
    ApiError::validation(format!("Invalid query parameter for {name}"))
}

#[derive(Debug, Serialize)]
struct MessagePage {
    users: Vec<User>,
    messages: Vec<Message>,
}

#[derive(Debug, Deserialize)]
struct NewMessage {
    content: Option<String>,
}

/// `GET`: lists messages, waiting once for a new one when polling.
pub(crate) async fn list(state: Arc<ChatState>, mut job: Job, _captures: Captures) {
    let params = ListParams::parse(job.query(), state.limits());
    let result = match params {
        Ok(params) => fetch(&state, params).await,
        Err(e) => Err(e),
    };
    reply(&mut job, result);
}

async fn fetch(state: &ChatState, params: ListParams) -> ApiResult<Reply> {
    // Subscribe first so a message stored after the query still wakes us.
    let waiter = params.polling.then(|| state.gate().subscribe());

    let mut messages = state.store().messages(&params.query)?;
    if messages.is_empty() {
        if let Some(waiter) = waiter {
            let outcome = waiter.wait(state.gate().default_timeout()).await;
            tracing::debug!(outcome = outcome.as_str(), "long-poll finished");
            record_long_poll(outcome.as_str());
            messages = state.store().messages(&params.query)?;
        }
    }

    let users = authors(state.store(), &messages)?;
    Reply::ok(&MessagePage { users, messages })
}

/// Distinct authors of `messages` in order of first appearance.
fn authors(store: &dyn ChatStore, messages: &[Message]) -> ApiResult<Vec<User>> {
    let mut seen: Vec<&str> = Vec::new();
    let mut users = Vec::new();
    for message in messages {
        if seen.contains(&message.author.as_str()) {
            continue;
        }
        seen.push(&message.author);
        match store.user(&message.author)? {
            Some(user) => users.push(user),
            None => tracing::debug!(author = %message.author, "message author has no user record"),
        }
    }
    Ok(users)
}

/// `POST`: stores a message from the authenticated user.
pub(crate) async fn create(state: Arc<ChatState>, mut job: Job, _captures: Captures) {
    let result = post(&state, &mut job).await;
    reply(&mut job, result);
}

async fn post(state: &ChatState, job: &mut Job) -> ApiResult<Reply> {
    let user = authorize(job.headers(), state.authenticator())?;

    let body: NewMessage = read_json(job).await?;
    let content = body
        .content
        .ok_or_else(|| ApiError::validation(INVALID_BODY))?;
    if content.is_empty() {
        return Err(ApiError::validation("Cannot send empty message."));
    }

    let message = state.store().post_message(&user.name, &content)?;
    state.gate().notify();
    record_message_stored();
    tracing::debug!(user = %user.name, timestamp = message.timestamp, "message stored");

    Reply::ok(&message)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pairs(raw: &[(&str, &str)]) -> Vec<(String, String)> {
        raw.iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    fn parse(raw: &[(&str, &str)]) -> ApiResult<ListParams> {
        ListParams::parse(&pairs(raw), MessageLimits::default())
    }

    fn error(raw: &[(&str, &str)]) -> String {
        parse(raw).unwrap_err().client_message()
    }

    #[test]
    fn test_parse_defaults() {
        let params = parse(&[]).unwrap();
        assert_eq!(params.query, MessageQuery::latest(50));
        assert!(!params.polling);
    }

    #[test]
    fn test_parse_all_parameters() {
        let params = parse(&[
            ("after", "1.5"),
            ("before", "10"),
            ("limit", "200"),
            ("polling", "TRUE"),
            ("community", "ignored"),
        ])
        .unwrap();
        assert_eq!(params.query, MessageQuery::latest(200).after(1.5).before(10.0));
        assert!(params.polling);
    }

    #[test]
    fn test_parse_first_duplicate_wins() {
        let params = parse(&[("limit", "3"), ("limit", "500")]).unwrap();
        assert_eq!(params.query.limit, 3);
    }

    #[test]
    fn test_parse_invalid_values() {
        assert_eq!(error(&[("before", "abc")]), "Invalid query parameter for before");
        assert_eq!(error(&[("after", "NaN")]), "Invalid query parameter for after");
        assert_eq!(error(&[("polling", "yes")]), "Invalid query parameter for polling");
        assert_eq!(error(&[("limit", "ten")]), "Invalid query parameter for limit");
    }

    #[test]
    fn test_parse_limit_out_of_range() {
        let expected = "Query parameter limit must be between 1 and 200.";
        assert_eq!(error(&[("limit", "500")]), expected);
        assert_eq!(error(&[("limit", "0")]), expected);
        assert_eq!(error(&[("limit", "-1")]), expected);
    }

    #[test]
    fn test_authors_first_appearance_order() {
        let store = crate::memory::MemoryStore::new();
        store.put_user(User::new("john", "1")).unwrap();
        store.put_user(User::new("bob", "2")).unwrap();
        let messages = vec![
            Message::new(0.0, "john", "a"),
            Message::new(1.0, "bob", "b"),
            Message::new(2.0, "john", "c"),
            Message::new(3.0, "ghost", "d"),
        ];

        let names: Vec<_> = authors(&store, &messages)
            .unwrap()
            .into_iter()
            .map(|u| u.name)
            .collect();
        assert_eq!(names, vec!["john", "bob"]);
    }
}
