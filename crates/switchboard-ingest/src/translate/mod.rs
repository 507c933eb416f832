//! Wire payload → canonical [`Activity`](switchboard_core::Activity).
//!
//! Every function here is pure: no I/O, no clock, no randomness. Translating
//! the same payload twice yields equal activities.

mod command;
mod event;
mod interaction;

pub use command::translate_command;
pub use event::translate_event;
pub use interaction::translate_interaction;

use chrono::{DateTime, Utc};
use serde_json::Value;
use switchboard_core::{ChannelAccount, ConversationId};

use crate::error::TranslateError;

/// Pick the first non-empty channel, falling back to the team id.
fn resolve_conversation(
    kind: &str,
    channel: Option<&str>,
    thread_ts: Option<&str>,
    team_id: Option<&str>,
) -> Result<ConversationId, TranslateError> {
    let non_empty = |s: &&str| !s.is_empty();
    match (channel.filter(non_empty), team_id.filter(non_empty)) {
        (Some(channel), _) => Ok(ConversationId::new(channel, thread_ts)),
        (None, Some(team)) => Ok(ConversationId::new(team, None)),
        (None, None) => Err(TranslateError::NoConversation {
            kind: kind.to_string(),
        }),
    }
}

/// Platform message timestamps are `"<secs>.<micros>"`.
fn parse_message_ts(ts: &str) -> Option<DateTime<Utc>> {
    let (secs, frac) = ts.split_once('.').unwrap_or((ts, "0"));
    let secs: i64 = secs.parse().ok()?;
    let micros: u32 = format!("{frac:0<6}").get(..6)?.parse().ok()?;
    DateTime::from_timestamp(secs, micros * 1_000)
}

fn event_time(secs: Option<i64>) -> Option<DateTime<Utc>> {
    secs.and_then(|s| DateTime::from_timestamp(s, 0))
}

fn account(id: Option<&str>, name: Option<&str>) -> Option<ChannelAccount> {
    let id = id.filter(|id| !id.is_empty())?;
    let mut account = ChannelAccount::new(id);
    account.name = name.filter(|n| !n.is_empty()).map(String::from);
    Some(account)
}

fn str_field<'a>(value: &'a Value, key: &str) -> Option<&'a str> {
    value.get(key).and_then(Value::as_str)
}
