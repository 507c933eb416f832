use serde_json::{Map, Value};
use switchboard_core::{Activity, ActivityType, Attachment, ChannelAccount, ChannelData};
use switchboard_protocol::events::{EventBody, MessageEvent};
use switchboard_protocol::EventCallback;

use super::{account, event_time, parse_message_ts, resolve_conversation};
use crate::error::TranslateError;

/// Translate an `event_callback` into an activity.
///
/// `raw` is the full envelope JSON; it rides along as inbound channel data.
pub fn translate_event(callback: &EventCallback, raw: &Value) -> Result<Activity, TranslateError> {
    let team_id = callback.team_id.as_deref();
    let kind = callback.event.event_type();

    let mut activity = match &callback.event {
        EventBody::Message(message) => message_activity(message, None, team_id)?,
        EventBody::AppMention(message) => message_activity(message, Some(kind), team_id)?,
        EventBody::Reaction { event, .. } => {
            let conversation = resolve_conversation(kind, event.item.channel.as_deref(), None, team_id)?;
            let mut activity = Activity::new(ActivityType::Event, conversation);
            activity.id = event.item.ts.clone();
            activity.from = account(event.user.as_deref(), None);
            activity.value = serde_json::to_value(event).ok();
            activity
        }
        EventBody::ChannelLifecycle { event, .. } => {
            let conversation = resolve_conversation(kind, Some(event.channel.id()), None, team_id)?;
            let mut activity = Activity::new(ActivityType::Event, conversation);
            activity.from = account(event.user.as_deref(), None);
            activity.value = serde_json::to_value(&event.channel).ok();
            activity
        }
        EventBody::Membership { event, .. } => {
            let conversation = resolve_conversation(kind, Some(event.channel.as_str()), None, team_id)?;
            let mut activity = Activity::new(ActivityType::Event, conversation);
            activity.from = account(Some(event.user.as_str()), None);
            activity.value = serde_json::to_value(event).ok();
            activity
        }
        EventBody::AppLifecycle { fields, .. } => {
            let conversation = resolve_conversation(kind, None, None, team_id)?;
            let mut activity = Activity::new(ActivityType::InstallationUpdate, conversation);
            activity.value = Some(Value::Object(fields.clone()));
            activity
        }
        EventBody::Other { fields, .. } => {
            let channel = fields.get("channel").and_then(Value::as_str);
            let conversation = resolve_conversation(kind, channel, None, team_id)?;
            let mut activity = Activity::new(ActivityType::Event, conversation);
            activity.from = account(fields.get("user").and_then(Value::as_str), None);
            activity.value = Some(Value::Object(fields.clone()));
            activity
        }
    };

    if activity.activity_type != ActivityType::Message {
        activity.name = Some(kind.to_string());
    }
    if activity.timestamp.is_none() {
        activity.timestamp = event_time(callback.event_time);
    }
    if activity.team_id.is_none() {
        activity.team_id = callback.team_id.clone();
    }
    activity.recipient = callback.api_app_id.as_deref().map(ChannelAccount::new);
    activity.channel_data = Some(ChannelData::Inbound {
        payload: raw.clone(),
        response_url: None,
        trigger_id: None,
    });
    Ok(activity)
}

fn message_activity(
    message: &MessageEvent,
    name: Option<&str>,
    team_id: Option<&str>,
) -> Result<Activity, TranslateError> {
    let kind = name.unwrap_or("message");
    let conversation = resolve_conversation(
        kind,
        message.channel.as_deref(),
        message.thread_ts.as_deref(),
        team_id.or(message.team.as_deref()),
    )?;

    let mut activity = Activity::new(ActivityType::Message, conversation);
    activity.id = message.ts.clone();
    activity.name = name.map(String::from);
    activity.text = message.text.clone();
    activity.timestamp = message.ts.as_deref().and_then(parse_message_ts);
    activity.team_id = message.team.clone().or_else(|| team_id.map(String::from));
    activity.from = account(
        message.user.as_deref().or(message.bot_id.as_deref()),
        message.extra.get("username").and_then(Value::as_str),
    );
    activity.attachments = attachments_from_files(message.files());
    Ok(activity)
}

/// Walk each file object key by key; missing keys leave the field empty.
fn attachments_from_files(files: &[Value]) -> Vec<Attachment> {
    files
        .iter()
        .filter_map(Value::as_object)
        .map(attachment_from_file)
        .collect()
}

fn attachment_from_file(file: &Map<String, Value>) -> Attachment {
    let mut attachment = Attachment::default();
    for (key, value) in file {
        match key.as_str() {
            "id" => attachment.id = value.as_str().map(String::from),
            "name" => attachment.name = value.as_str().map(String::from),
            "mimetype" => attachment.content_type = value.as_str().map(String::from),
            "url_private" => attachment.content_url = value.as_str().map(String::from),
            "thumb_360" | "thumb_480" | "thumb_64" if attachment.thumbnail_url.is_none() => {
                attachment.thumbnail_url = value.as_str().map(String::from)
            }
            "size" => attachment.size_bytes = value.as_u64(),
            _ => {}
        }
    }
    if attachment.name.is_none() {
        attachment.name = file.get("title").and_then(Value::as_str).map(String::from);
    }
    attachment
}
