use serde::{Deserialize, Serialize};

/// A slash command invocation (`/deploy staging`).
///
/// Arrives form-encoded; every key maps to one field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlashCommand {
    pub command: String,
    #[serde(default)]
    pub text: String,
    pub team_id: Option<String>,
    pub team_domain: Option<String>,
    pub channel_id: Option<String>,
    pub channel_name: Option<String>,
    pub user_id: Option<String>,
    pub user_name: Option<String>,
    pub response_url: Option<String>,
    pub trigger_id: Option<String>,
    pub api_app_id: Option<String>,
    pub enterprise_id: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn text_defaults_to_empty() {
        let cmd: SlashCommand =
            serde_json::from_value(json!({"command": "/ping", "channel_id": "C1"})).expect("decode");
        assert_eq!(cmd.text, "");
        assert_eq!(cmd.command, "/ping");
        assert_eq!(cmd.channel_id.as_deref(), Some("C1"));
    }
}
