// Verify inbound payloads decode the way the platform actually sends them.
// These tests pin the wire format so a field rename never slips through.

use switchboard_protocol::api::{ApiResponse, ResponseUrlMessage, UpdateMessage};
use switchboard_protocol::events::ReactionEvent;
use switchboard_protocol::{decode_envelope, decode_form, EventBody, EventEnvelope, InboundForm};

#[test]
fn url_verification_challenge() {
    let body = br#"{"token":"Jhj5dZrVaK7ZwHHjRyZWjbDl","challenge":"3eZbrw1aBm2rZgRNFdxV2595E9CY3gmdALWMmHkvFXO7tYXAYM8P","type":"url_verification"}"#;
    let decoded = decode_envelope(body).unwrap();
    match decoded.envelope {
        EventEnvelope::UrlVerification(v) => {
            assert_eq!(v.challenge, "3eZbrw1aBm2rZgRNFdxV2595E9CY3gmdALWMmHkvFXO7tYXAYM8P");
        }
        _ => panic!("expected url_verification"),
    }
}

#[test]
fn event_callback_message_in_thread() {
    let body = br#"{
        "token": "x",
        "team_id": "T061EG9R6",
        "api_app_id": "A0PNCHHK2",
        "event": {
            "type": "message",
            "channel": "C024BE91L",
            "user": "U2147483697",
            "text": "Live long and prospect.",
            "ts": "1355517523.000005",
            "thread_ts": "1355517500.000001",
            "event_ts": "1355517523.000005",
            "channel_type": "channel"
        },
        "type": "event_callback",
        "event_id": "Ev0PV52K21",
        "event_time": 1355517523
    }"#;
    let decoded = decode_envelope(body).unwrap();
    let EventEnvelope::EventCallback(callback) = decoded.envelope else {
        panic!("expected event_callback");
    };
    assert_eq!(callback.team_id.as_deref(), Some("T061EG9R6"));
    assert_eq!(callback.event_id.as_deref(), Some("Ev0PV52K21"));
    assert_eq!(callback.event_time, Some(1355517523));

    let message = callback.event.as_message().unwrap();
    assert_eq!(message.thread_ts.as_deref(), Some("1355517500.000001"));
    assert_eq!(message.text.as_deref(), Some("Live long and prospect."));
    assert_eq!(message.channel_type.as_deref(), Some("channel"));
    // typed fields must not leak into the catch-all map
    assert!(!message.extra.contains_key("channel_type"));
}

#[test]
fn event_callback_reaction_added() {
    let body = br#"{"type":"event_callback","team_id":"T1","event_id":"Ev2","event":{
        "type":"reaction_added","user":"U1","reaction":"thumbsup","item_user":"U2",
        "item":{"type":"message","channel":"C1","ts":"1.2"},"event_ts":"1.3"}}"#;
    let decoded = decode_envelope(body).unwrap();
    let EventEnvelope::EventCallback(callback) = decoded.envelope else {
        panic!("expected event_callback");
    };
    match callback.event {
        EventBody::Reaction { added, event: ReactionEvent { reaction, item, .. } } => {
            assert!(added);
            assert_eq!(reaction, "thumbsup");
            assert_eq!(item.channel.as_deref(), Some("C1"));
        }
        other => panic!("expected reaction, got {other:?}"),
    }
}

#[test]
fn interaction_form_block_actions() {
    let json = r#"{"type":"block_actions","team":{"id":"T1","domain":"acme"},"user":{"id":"U1","username":"ann"},"trigger_id":"tr1","response_url":"https://hooks.example.com/actions/T1/1/abc","channel":{"id":"C1","name":"general"},"message":{"ts":"1.5","text":"pick one"},"actions":[{"action_id":"go","type":"button","value":"yes"}]}"#;
    let body = format!(
        "payload={}",
        url::form_urlencoded::byte_serialize(json.as_bytes()).collect::<String>()
    );
    match decode_form(body.as_bytes()).unwrap() {
        InboundForm::Interaction { payload, raw } => {
            assert_eq!(payload.kind.as_str(), "block_actions");
            assert_eq!(payload.channel_id(), Some("C1"));
            assert_eq!(payload.message_ts(), Some("1.5"));
            assert_eq!(payload.actions[0].selected_value(), Some("yes"));
            assert_eq!(raw["trigger_id"], "tr1");
        }
        _ => panic!("expected interaction"),
    }
}

#[test]
fn slash_command_form() {
    let body = b"token=x&team_id=T1&team_domain=acme&channel_id=C9&channel_name=ops&user_id=U1&user_name=ann&command=%2Fweather&text=94070&response_url=https%3A%2F%2Fhooks.example.com%2Fcommands%2F1&trigger_id=13345224609.738474920.8088930838d88f008e0";
    match decode_form(body).unwrap() {
        InboundForm::Command { command, raw } => {
            assert_eq!(command.command, "/weather");
            assert_eq!(command.text, "94070");
            assert_eq!(
                command.response_url.as_deref(),
                Some("https://hooks.example.com/commands/1")
            );
            assert_eq!(raw["token"], "x");
        }
        _ => panic!("expected command"),
    }
}

#[test]
fn update_and_response_url_serialization() {
    let update = UpdateMessage {
        channel: "C1".into(),
        ts: "1.1".into(),
        text: Some("edited".into()),
        blocks: None,
    };
    let json = serde_json::to_string(&update).unwrap();
    assert!(json.contains(r#""ts":"1.1""#));
    // blocks must be absent when unset
    assert!(!json.contains("blocks"));

    let replace = ResponseUrlMessage {
        text: Some("done".into()),
        replace_original: true,
        ..Default::default()
    };
    let json = serde_json::to_string(&replace).unwrap();
    assert!(json.contains(r#""replace_original":true"#));
    assert!(!json.contains("delete_original"));
}

#[test]
fn api_error_response() {
    let resp: ApiResponse =
        serde_json::from_str(r#"{"ok":false,"error":"channel_not_found"}"#).unwrap();
    assert!(!resp.ok);
    assert_eq!(resp.error_code(), "channel_not_found");
}
