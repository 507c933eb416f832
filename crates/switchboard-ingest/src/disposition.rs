use std::collections::HashSet;
use std::fmt;

use switchboard_core::config::EventsConfig;
use switchboard_protocol::events::{EventBody, MessageEvent};
use switchboard_protocol::EventCallback;
use tracing::debug;

use crate::dedup::{DedupKey, Deduplicator};

/// Verdict on whether an inbound event proceeds to processing.
///
/// Every variant is acknowledged with a 200; only `Allowed` is translated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Disposition {
    Allowed,
    /// Echo of an event delivered separately (bot posts, edits, joins).
    IgnoredByDesign,
    /// Event type switched off in `events.disabled_types`.
    IgnoredByConfig,
    DuplicatePayload,
}

impl Disposition {
    /// Metrics label and `x-switchboard-disposition` header value.
    pub fn label(&self) -> &'static str {
        match self {
            Disposition::Allowed => "allowed",
            Disposition::IgnoredByDesign => "ignored_by_design",
            Disposition::IgnoredByConfig => "ignored_by_config",
            Disposition::DuplicatePayload => "duplicate_payload",
        }
    }

    pub fn is_allowed(&self) -> bool {
        matches!(self, Disposition::Allowed)
    }
}

impl fmt::Display for Disposition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Decides the [`Disposition`] of an event.
///
/// The rules run in a fixed order: echo filter, config filter, dedup. The
/// first two are pure, so an echo or disabled event never consumes a dedup
/// slot.
#[derive(Clone)]
pub struct Classifier {
    disabled_types: HashSet<String>,
    allowed_subtypes: HashSet<String>,
    allowed_bot_ids: HashSet<String>,
    dedup: Deduplicator,
}

impl Classifier {
    pub fn new(config: &EventsConfig, dedup: Deduplicator) -> Self {
        Self {
            disabled_types: config.disabled_types.iter().cloned().collect(),
            allowed_subtypes: config.allowed_message_subtypes.iter().cloned().collect(),
            allowed_bot_ids: config.allowed_bot_ids.iter().cloned().collect(),
            dedup,
        }
    }

    pub fn deduplicator(&self) -> &Deduplicator {
        &self.dedup
    }

    /// Classify an `event_callback`. `body` is the raw request body, used for
    /// the dedup key when the envelope has no event id.
    pub fn classify(&self, callback: &EventCallback, body: &[u8]) -> Disposition {
        self.classify_event(&callback.event, &Self::dedup_key(callback, body))
    }

    /// The key `classify` records for this delivery.
    pub fn dedup_key(callback: &EventCallback, body: &[u8]) -> DedupKey {
        DedupKey::new(
            callback.team_id.as_deref(),
            callback.event_id.as_deref(),
            body,
        )
    }

    pub fn classify_event(&self, event: &EventBody, key: &DedupKey) -> Disposition {
        let disposition = if event.as_message().is_some_and(|m| self.is_echo(m)) {
            Disposition::IgnoredByDesign
        } else if self.disabled_types.contains(event.event_type()) {
            Disposition::IgnoredByConfig
        } else if self.dedup.is_duplicate(key) {
            Disposition::DuplicatePayload
        } else {
            Disposition::Allowed
        };

        debug!(
            event_type = event.event_type(),
            key = %key,
            disposition = disposition.label(),
            "event classified"
        );
        disposition
    }

    /// A message that only mirrors something else: a bot's own post, an
    /// edit, a join notice.
    fn is_echo(&self, message: &MessageEvent) -> bool {
        if let Some(bot_id) = message.bot_id.as_deref() {
            if !self.allowed_bot_ids.contains(bot_id) {
                return true;
            }
        }
        match message.subtype.as_deref() {
            Some(subtype) => !self.allowed_subtypes.contains(subtype),
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::time::Duration;

    fn classifier(config: EventsConfig) -> Classifier {
        Classifier::new(&config, Deduplicator::in_memory(Duration::from_secs(300), 100))
    }

    fn callback(event: serde_json::Value, event_id: &str) -> EventCallback {
        serde_json::from_value(json!({
            "team_id": "T1",
            "event_id": event_id,
            "event": event
        }))
        .expect("callback")
    }

    #[test]
    fn bot_echo_is_ignored_by_design() {
        let c = classifier(EventsConfig::default());
        let cb = callback(
            json!({"type": "message", "channel": "C1", "bot_id": "B1", "subtype": null, "text": "hi"}),
            "Ev1",
        );
        assert_eq!(c.classify(&cb, b""), Disposition::IgnoredByDesign);
    }

    #[test]
    fn bot_echo_does_not_consume_dedup_slot() {
        let c = classifier(EventsConfig::default());
        let cb = callback(json!({"type": "message", "channel": "C1", "bot_id": "B1"}), "Ev1");
        assert_eq!(c.classify(&cb, b""), Disposition::IgnoredByDesign);
        assert_eq!(c.classify(&cb, b""), Disposition::IgnoredByDesign);
        assert_eq!(c.deduplicator().len(), 0);
    }

    #[test]
    fn allowed_bot_passes() {
        let c = classifier(EventsConfig {
            allowed_bot_ids: vec!["BWORKFLOW".into()],
            ..EventsConfig::default()
        });
        let cb = callback(json!({"type": "message", "channel": "C1", "bot_id": "BWORKFLOW"}), "Ev1");
        assert_eq!(c.classify(&cb, b""), Disposition::Allowed);
    }

    #[test]
    fn subtype_allow_list() {
        let c = classifier(EventsConfig::default());
        let share = callback(json!({"type": "message", "channel": "C1", "subtype": "file_share"}), "Ev1");
        let edit = callback(json!({"type": "message", "channel": "C1", "subtype": "message_changed"}), "Ev2");
        assert_eq!(c.classify(&share, b""), Disposition::Allowed);
        assert_eq!(c.classify(&edit, b""), Disposition::IgnoredByDesign);
    }

    #[test]
    fn disabled_type_is_ignored_by_config() {
        let c = classifier(EventsConfig {
            disabled_types: vec!["reaction_removed".into()],
            ..EventsConfig::default()
        });
        let cb = callback(
            json!({"type": "reaction_removed", "reaction": "x", "item": {"type": "message", "channel": "C1", "ts": "1.1"}}),
            "Ev1",
        );
        assert_eq!(c.classify(&cb, b""), Disposition::IgnoredByConfig);
        assert!(c.deduplicator().is_empty());
    }

    #[test]
    fn redelivery_is_duplicate() {
        let c = classifier(EventsConfig::default());
        let cb = callback(json!({"type": "app_mention", "channel": "C1", "user": "U1"}), "Ev123");
        assert_eq!(c.classify(&cb, b""), Disposition::Allowed);
        assert_eq!(c.classify(&cb, b""), Disposition::DuplicatePayload);
        assert_eq!(c.deduplicator().len(), 1);
    }

    #[test]
    fn released_key_admits_redelivery() {
        let c = classifier(EventsConfig::default());
        let cb = callback(json!({"type": "app_mention", "channel": "C1", "user": "U1"}), "Ev124");
        assert_eq!(c.classify(&cb, b""), Disposition::Allowed);
        c.deduplicator().forget(&Classifier::dedup_key(&cb, b""));
        assert_eq!(c.classify(&cb, b""), Disposition::Allowed);
        assert_eq!(c.classify(&cb, b""), Disposition::DuplicatePayload);
    }

    #[test]
    fn labels_are_snake_case() {
        assert_eq!(Disposition::DuplicatePayload.to_string(), "duplicate_payload");
        assert!(Disposition::Allowed.is_allowed());
        assert!(!Disposition::IgnoredByConfig.is_allowed());
    }
}
