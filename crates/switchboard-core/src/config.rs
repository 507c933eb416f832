use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

pub const DEFAULT_PORT: u16 = 3001;
pub const DEFAULT_BIND: &str = "127.0.0.1";
pub const DEFAULT_EVENTS_PATH: &str = "/slack/events";
pub const DEFAULT_SLACK_API_BASE: &str = "https://slack.com/api";
pub const DEFAULT_DEBUG_SUFFIX: &str = "--debug";
pub const DEFAULT_TIMING_SUFFIX: &str = "--timing";
pub const MAX_PAYLOAD_BYTES: usize = 1024 * 1024; // 1 MB cap per webhook body
pub const SIGNATURE_MAX_AGE_SECS: i64 = 300; // platform replay window

/// Top-level config (switchboard.toml + SWITCHBOARD_* env overrides).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SwitchboardConfig {
    #[serde(default)]
    pub gateway: GatewayConfig,
    #[serde(default)]
    pub slack: SlackConfig,
    #[serde(default)]
    pub dedup: DedupConfig,
    #[serde(default)]
    pub events: EventsConfig,
    #[serde(default)]
    pub middleware: MiddlewareConfig,
    #[serde(default)]
    pub worker: WorkerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_bind")]
    pub bind: String,
    /// Route the platform posts events, interactions and commands to.
    #[serde(default = "default_events_path")]
    pub events_path: String,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            bind: DEFAULT_BIND.to_string(),
            events_path: DEFAULT_EVENTS_PATH.to_string(),
        }
    }
}

/// Slack Web API credentials and outbound call policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlackConfig {
    #[serde(default)]
    pub bot_token: String,
    #[serde(default = "default_api_base")]
    pub api_base: String,
    /// When set, inbound requests must carry a valid `X-Slack-Signature`.
    pub signing_secret: Option<String>,
    /// Per-call HTTP timeout. Independent of `worker.turn_timeout_ms`.
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
    #[serde(default = "default_retry_max_attempts")]
    pub retry_max_attempts: u32,
    #[serde(default = "default_retry_base_delay_ms")]
    pub retry_base_delay_ms: u64,
}

impl Default for SlackConfig {
    fn default() -> Self {
        Self {
            bot_token: String::new(),
            api_base: default_api_base(),
            signing_secret: None,
            request_timeout_ms: default_request_timeout_ms(),
            retry_max_attempts: default_retry_max_attempts(),
            retry_base_delay_ms: default_retry_base_delay_ms(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DedupConfig {
    /// How long an event identity is remembered. Platform redelivery windows
    /// are minutes, so this stays small.
    #[serde(default = "default_dedup_ttl_secs")]
    pub ttl_secs: u64,
    /// Hard cap on remembered identities.
    #[serde(default = "default_dedup_capacity")]
    pub capacity: usize,
    #[serde(default = "default_prune_interval_secs")]
    pub prune_interval_secs: u64,
}

impl Default for DedupConfig {
    fn default() -> Self {
        Self {
            ttl_secs: default_dedup_ttl_secs(),
            capacity: default_dedup_capacity(),
            prune_interval_secs: default_prune_interval_secs(),
        }
    }
}

/// Per-event-type filtering rules used by the disposition classifier.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventsConfig {
    /// Event type names (e.g. `"reaction_removed"`) that are acknowledged but
    /// never processed.
    #[serde(default)]
    pub disabled_types: Vec<String>,
    /// Message subtypes that carry genuine user content. Any other subtype is
    /// an echo of a first-class event and is ignored.
    ///
    /// NOTE: membership is product-owned data; do not widen it by inference.
    #[serde(default = "default_allowed_message_subtypes")]
    pub allowed_message_subtypes: Vec<String>,
    /// Bot ids (e.g. workflow bots) whose messages are processed even though
    /// `bot_id` is set.
    #[serde(default)]
    pub allowed_bot_ids: Vec<String>,
}

impl Default for EventsConfig {
    fn default() -> Self {
        Self {
            disabled_types: Vec::new(),
            allowed_message_subtypes: default_allowed_message_subtypes(),
            allowed_bot_ids: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MiddlewareConfig {
    #[serde(default = "default_debug_suffix")]
    pub debug_suffix: String,
    #[serde(default = "default_timing_suffix")]
    pub timing_suffix: String,
}

impl Default for MiddlewareConfig {
    fn default() -> Self {
        Self {
            debug_suffix: default_debug_suffix(),
            timing_suffix: default_timing_suffix(),
        }
    }
}

/// Asynchronous turn processing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerConfig {
    /// Number of ordered queues. A conversation always maps to the same shard.
    #[serde(default = "default_shards")]
    pub shards: usize,
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
    /// Upper bound for one full middleware + business-logic turn.
    #[serde(default = "default_turn_timeout_ms")]
    pub turn_timeout_ms: u64,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            shards: default_shards(),
            queue_capacity: default_queue_capacity(),
            turn_timeout_ms: default_turn_timeout_ms(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Hex-encoded 32-byte key. When set, undecodable payloads are logged
    /// AES-256-GCM encrypted instead of as a digest only.
    pub redaction_key: Option<String>,
}

fn default_port() -> u16 {
    DEFAULT_PORT
}
fn default_bind() -> String {
    DEFAULT_BIND.to_string()
}
fn default_events_path() -> String {
    DEFAULT_EVENTS_PATH.to_string()
}
fn default_api_base() -> String {
    DEFAULT_SLACK_API_BASE.to_string()
}
fn default_request_timeout_ms() -> u64 {
    5_000
}
fn default_retry_max_attempts() -> u32 {
    3
}
fn default_retry_base_delay_ms() -> u64 {
    250
}
fn default_dedup_ttl_secs() -> u64 {
    300
}
fn default_dedup_capacity() -> usize {
    50_000
}
fn default_prune_interval_secs() -> u64 {
    30
}
fn default_allowed_message_subtypes() -> Vec<String> {
    ["file_share", "thread_broadcast", "me_message"]
        .into_iter()
        .map(String::from)
        .collect()
}
fn default_debug_suffix() -> String {
    DEFAULT_DEBUG_SUFFIX.to_string()
}
fn default_timing_suffix() -> String {
    DEFAULT_TIMING_SUFFIX.to_string()
}
fn default_shards() -> usize {
    8
}
fn default_queue_capacity() -> usize {
    1_024
}
fn default_turn_timeout_ms() -> u64 {
    60_000
}

impl SwitchboardConfig {
    /// Load config from a TOML file with SWITCHBOARD_* env var overrides.
    ///
    /// Nested keys use a double underscore:
    /// `SWITCHBOARD_SLACK__BOT_TOKEN` → `slack.bot_token`.
    pub fn load(config_path: Option<&str>) -> crate::error::Result<Self> {
        let path = config_path
            .map(String::from)
            .unwrap_or_else(default_config_path);

        let config: SwitchboardConfig = Figment::new()
            .merge(Toml::file(&path))
            .merge(Env::prefixed("SWITCHBOARD_").split("__"))
            .extract()
            .map_err(|e| crate::error::SwitchboardError::Config(e.to_string()))?;

        Ok(config)
    }
}

fn default_config_path() -> String {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    format!("{}/.switchboard/switchboard.toml", home)
}
