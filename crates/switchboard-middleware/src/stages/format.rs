//! mrkdwn ⇄ plain text.
//!
//! Inbound text arrives in the platform's markup: `<@U1|ann>` mentions,
//! `<https://x|label>` links and `&amp;`-escaped control characters.
//! Handlers see plain text. Outbound text is written in Markdown and is
//! converted back, with `& < >` escaped everywhere except inside link
//! syntax.

use async_trait::async_trait;
use switchboard_core::{Activity, ChannelData, ResourceResponse};

use crate::context::{Flow, TurnContext};
use crate::error::Result;
use crate::stage::{ActivitySink, Stage};

/// Always-on text normalisation in both directions.
#[derive(Default)]
pub struct FormatStage;

impl FormatStage {
    pub fn new() -> Self {
        Self
    }

    fn prepare_outbound(activity: &mut Activity) {
        if let Some(text) = activity.text.as_deref() {
            activity.text = Some(to_mrkdwn(text));
        }
        // Inbound wire payloads never go back out; outbound options do.
        if matches!(activity.channel_data, Some(ChannelData::Inbound { .. })) {
            activity.channel_data = None;
        }
    }
}

#[async_trait]
impl Stage for FormatStage {
    fn name(&self) -> &'static str {
        "format"
    }

    async fn on_turn(&self, turn: &mut TurnContext) -> Result<Flow> {
        if let Some(text) = turn.activity.text.as_deref() {
            turn.activity.text = Some(to_plain_text(text));
        }
        Ok(Flow::Continue)
    }

    async fn on_send<N: ActivitySink>(
        &self,
        turn: &TurnContext,
        mut activities: Vec<Activity>,
        next: &N,
    ) -> Result<Vec<ResourceResponse>> {
        for activity in &mut activities {
            Self::prepare_outbound(activity);
        }
        next.send_activities(turn, activities).await
    }

    async fn on_update<N: ActivitySink>(
        &self,
        turn: &TurnContext,
        mut activity: Activity,
        next: &N,
    ) -> Result<ResourceResponse> {
        Self::prepare_outbound(&mut activity);
        next.update_activity(turn, activity).await
    }
}

// ── Inbound ─────────────────────────────────────────────────────────────────

/// Platform markup → plain text.
pub fn to_plain_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(start) = rest.find('<') {
        out.push_str(&rest[..start]);
        let tail = &rest[start..];
        match tail.find('>') {
            Some(end) if is_token_body(&tail[1..end]) => {
                out.push_str(&render_token(&tail[1..end]));
                rest = &tail[end + 1..];
            }
            _ => {
                out.push('<');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);

    unescape(&out)
}

fn is_token_body(inner: &str) -> bool {
    !inner.is_empty() && !inner.contains(['<', '\n'])
}

fn render_token(inner: &str) -> String {
    let (target, label) = match inner.split_once('|') {
        Some((target, label)) => (target, Some(label).filter(|l| !l.is_empty())),
        None => (inner, None),
    };

    if let Some(user) = target.strip_prefix('@') {
        format!("@{}", label.unwrap_or(user))
    } else if let Some(channel) = target.strip_prefix('#') {
        format!("#{}", label.unwrap_or(channel))
    } else if let Some(special) = target.strip_prefix('!') {
        // <!here>, <!subteam^S1|@team>, <!date^…|fallback>
        match label {
            Some(label) => label.to_string(),
            None => format!("@{special}"),
        }
    } else {
        label.unwrap_or(target).to_string()
    }
}

fn unescape(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
}

// ── Outbound ────────────────────────────────────────────────────────────────

const LINK_SCHEMES: &[&str] = &["http://", "https://", "mailto:"];

/// Markdown → platform markup.
pub fn to_mrkdwn(text: &str) -> String {
    let text = text.replace("**", "*");
    let mut out = String::with_capacity(text.len());
    let mut i = 0;

    while let Some(ch) = text[i..].chars().next() {
        let rest = &text[i..];
        if ch == '[' {
            if let Some((token, used)) = take_markdown_link(rest) {
                out.push_str(&token);
                i += used;
                continue;
            }
        }
        if ch == '<' {
            if let Some(used) = take_mrkdwn_token(rest) {
                out.push_str(&rest[..used]);
                i += used;
                continue;
            }
        }
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            c => out.push(c),
        }
        i += ch.len_utf8();
    }
    out
}

/// `[label](url)` at the start of `rest` → (`<url|label>`, bytes consumed).
fn take_markdown_link(rest: &str) -> Option<(String, usize)> {
    let label_end = rest.find("](")?;
    let label = &rest[1..label_end];
    if label.is_empty() || label.contains(['[', ']', '\n']) {
        return None;
    }
    let after = &rest[label_end + 2..];
    let url_end = after.find(')')?;
    let url = &after[..url_end];
    if url.contains(char::is_whitespace) || !LINK_SCHEMES.iter().any(|s| url.starts_with(s)) {
        return None;
    }
    Some((format!("<{url}|{label}>"), label_end + 2 + url_end + 1))
}

/// Length of an existing mrkdwn token (`<@U1>`, `<https://x|y>`) at the start
/// of `rest`, if there is one.
fn take_mrkdwn_token(rest: &str) -> Option<usize> {
    let end = rest.find('>')?;
    let inner = &rest[1..end];
    let known = inner.starts_with(['@', '#', '!']) || LINK_SCHEMES.iter().any(|s| inner.starts_with(s));
    (known && is_token_body(inner)).then_some(end + 1)
}
