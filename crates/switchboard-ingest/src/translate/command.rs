use serde_json::Value;
use switchboard_core::{Activity, ActivityType, ChannelData};
use switchboard_protocol::SlashCommand;

use super::{account, resolve_conversation};
use crate::error::TranslateError;

/// Translate a slash command. Always an `event` named after the command.
pub fn translate_command(command: &SlashCommand, raw: &Value) -> Result<Activity, TranslateError> {
    let conversation = resolve_conversation(
        &command.command,
        command.channel_id.as_deref(),
        None,
        command.team_id.as_deref(),
    )?;

    let invocation = if command.text.is_empty() {
        command.command.clone()
    } else {
        format!("{} {}", command.command, command.text)
    };

    let mut activity = Activity::new(ActivityType::Event, conversation);
    activity.name = Some(command.command.clone());
    activity.text = Some(command.text.clone());
    activity.value = Some(Value::String(invocation));
    activity.team_id = command.team_id.clone();
    activity.from = account(command.user_id.as_deref(), command.user_name.as_deref());
    activity.channel_data = Some(ChannelData::Inbound {
        payload: raw.clone(),
        response_url: command.response_url.clone(),
        trigger_id: command.trigger_id.clone(),
    });
    Ok(activity)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn command(raw: &Value) -> SlashCommand {
        serde_json::from_value(raw.clone()).expect("command")
    }

    #[test]
    fn command_is_event_with_invocation_value() {
        let raw = json!({
            "command": "/deploy", "text": "prod", "team_id": "T1", "channel_id": "C1",
            "user_id": "U1", "user_name": "ann", "response_url": "https://hooks.example.com/c/1"
        });
        let activity = translate_command(&command(&raw), &raw).expect("translate");
        assert_eq!(activity.activity_type, ActivityType::Event);
        assert_eq!(activity.name.as_deref(), Some("/deploy"));
        assert_eq!(activity.text.as_deref(), Some("prod"));
        assert_eq!(activity.value, Some(json!("/deploy prod")));
        assert_eq!(activity.conversation.as_str(), "C1");
        assert_eq!(activity.response_url(), Some("https://hooks.example.com/c/1"));
    }

    #[test]
    fn bare_command_value_has_no_trailing_space() {
        let raw = json!({"command": "/status", "team_id": "T1"});
        let activity = translate_command(&command(&raw), &raw).expect("translate");
        assert_eq!(activity.value, Some(json!("/status")));
        assert_eq!(activity.conversation.as_str(), "T1");
    }

    #[test]
    fn command_without_channel_or_team_fails() {
        let raw = json!({"command": "/status"});
        assert!(translate_command(&command(&raw), &raw).is_err());
    }
}
