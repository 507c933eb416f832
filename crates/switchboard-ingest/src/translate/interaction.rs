use serde_json::Value;
use switchboard_core::{Activity, ActivityType, ChannelData};
use switchboard_protocol::interaction::{InteractionKind, InteractionPayload};

use super::{account, resolve_conversation, str_field};
use crate::error::TranslateError;

/// Translate an interactive-component payload.
///
/// A clicked button or picked menu option becomes a `message` whose text is
/// the selected value, so handlers can treat it like typed input.
pub fn translate_interaction(
    payload: &InteractionPayload,
    raw: &Value,
) -> Result<Activity, TranslateError> {
    let kind = payload.kind.as_str();
    let conversation = resolve_conversation(
        kind,
        payload.channel_id(),
        payload.thread_ts(),
        payload.team_id(),
    )?;

    let mut activity = match payload.kind {
        InteractionKind::ViewSubmission | InteractionKind::ViewClosed => {
            let mut activity = Activity::new(ActivityType::Event, conversation);
            activity.name = Some(kind.to_string());
            activity.value = payload.view.clone();
            activity
        }
        InteractionKind::BlockActions | InteractionKind::InteractiveMessage => {
            let selected = payload.actions.iter().find_map(|a| a.selected_value());
            match selected {
                Some(value) => {
                    let mut activity = Activity::message(conversation, value);
                    activity.value = serde_json::to_value(&payload.actions).ok();
                    activity
                }
                None => {
                    let mut activity = Activity::new(ActivityType::Event, conversation);
                    activity.name = Some(kind.to_string());
                    activity.value = serde_json::to_value(&payload.actions).ok();
                    activity
                }
            }
        }
        InteractionKind::Shortcut
        | InteractionKind::MessageAction
        | InteractionKind::BlockSuggestion => {
            let mut activity = Activity::new(ActivityType::Event, conversation);
            activity.name = Some(
                payload
                    .callback_id
                    .clone()
                    .unwrap_or_else(|| kind.to_string()),
            );
            activity.value = Some(raw.clone());
            activity
        }
        InteractionKind::Unknown => {
            return Err(TranslateError::Unsupported(format!(
                "interaction type {}",
                str_field(raw, "type").unwrap_or("<missing>")
            )))
        }
    };

    // Only the message-bearing kinds address an existing message. Ephemeral
    // messages are reachable only through the response handle.
    if (payload.kind.is_message_action() || payload.kind == InteractionKind::MessageAction)
        && !payload.is_ephemeral()
    {
        activity.id = payload.message_ts().map(String::from);
    }
    activity.team_id = payload.team_id().map(String::from);
    activity.from = payload.user.as_ref().and_then(|user| {
        account(
            Some(user.id.as_str()),
            user.username.as_deref().or(user.name.as_deref()),
        )
    });
    activity.channel_data = Some(ChannelData::Inbound {
        payload: raw.clone(),
        response_url: payload.response_url.clone(),
        trigger_id: payload.trigger_id.clone(),
    });
    Ok(activity)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn translate(raw: Value) -> Result<Activity, TranslateError> {
        let payload: InteractionPayload = serde_json::from_value(raw.clone()).expect("payload");
        translate_interaction(&payload, &raw)
    }

    #[test]
    fn button_click_becomes_message() {
        let activity = translate(json!({
            "type": "block_actions",
            "team": {"id": "T1"},
            "user": {"id": "U1", "username": "ann"},
            "channel": {"id": "C1"},
            "message": {"ts": "1.5", "thread_ts": "1.0"},
            "response_url": "https://hooks.example.com/r/1",
            "trigger_id": "tr-1",
            "actions": [{"action_id": "approve", "type": "button", "value": "approve"}]
        }))
        .expect("translate");

        assert_eq!(activity.activity_type, ActivityType::Message);
        assert_eq!(activity.text.as_deref(), Some("approve"));
        assert_eq!(activity.conversation.as_str(), "C1:1.0");
        assert_eq!(activity.id.as_deref(), Some("1.5"));
        assert_eq!(activity.from.as_ref().and_then(|a| a.name.as_deref()), Some("ann"));
        assert_eq!(activity.response_url(), Some("https://hooks.example.com/r/1"));
    }

    #[test]
    fn ephemeral_container_has_no_message_id() {
        let activity = translate(json!({
            "type": "block_actions",
            "team": {"id": "T1"},
            "user": {"id": "U1"},
            "container": {"type": "message", "channel_id": "C1", "message_ts": "1.5", "is_ephemeral": true},
            "response_url": "https://hooks.example.com/r/2",
            "actions": [{"action_id": "ok", "type": "button", "value": "ok"}]
        }))
        .expect("translate");
        assert_eq!(activity.id, None);
        assert_eq!(activity.response_url(), Some("https://hooks.example.com/r/2"));
    }

    #[test]
    fn action_without_value_is_event() {
        let activity = translate(json!({
            "type": "block_actions",
            "team": {"id": "T1"},
            "container": {"channel_id": "C2"},
            "actions": [{"action_id": "overflow", "type": "overflow"}]
        }))
        .expect("translate");
        assert_eq!(activity.activity_type, ActivityType::Event);
        assert_eq!(activity.name.as_deref(), Some("block_actions"));
        assert_eq!(activity.conversation.as_str(), "C2");
    }

    #[test]
    fn view_submission_carries_view_on_team() {
        let activity = translate(json!({
            "type": "view_submission",
            "team": {"id": "T1"},
            "user": {"id": "U1"},
            "view": {"id": "V1", "callback_id": "feedback", "state": {"values": {}}}
        }))
        .expect("translate");
        assert_eq!(activity.activity_type, ActivityType::Event);
        assert_eq!(activity.name.as_deref(), Some("view_submission"));
        assert_eq!(activity.conversation.as_str(), "T1");
        assert_eq!(activity.value.as_ref().expect("view")["id"], "V1");
    }

    #[test]
    fn shortcut_named_by_callback_id() {
        let activity = translate(json!({
            "type": "shortcut",
            "team": {"id": "T1"},
            "callback_id": "open_ticket",
            "trigger_id": "tr-2"
        }))
        .expect("translate");
        assert_eq!(activity.name.as_deref(), Some("open_ticket"));
        assert_eq!(activity.value.as_ref().expect("raw")["trigger_id"], "tr-2");
    }

    #[test]
    fn unknown_interaction_is_unsupported() {
        let err = translate(json!({"type": "workflow_step_edit", "team": {"id": "T1"}})).unwrap_err();
        assert!(matches!(err, TranslateError::Unsupported(_)));
    }
}
