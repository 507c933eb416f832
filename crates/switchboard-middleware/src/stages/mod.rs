mod debug;
mod format;
mod timing;

pub use debug::DebugStage;
pub use format::{to_mrkdwn, to_plain_text, FormatStage};
pub use timing::TimingStage;

/// Remove the `suffix` token from the trailing run of `--` flags in `text`.
///
/// The suffix must stand on its own (start of text or after whitespace) and
/// may be followed only by other `--` flags, so `status --debug --timing`
/// yields `status --timing` for `--debug`. Returns `None` when it is absent,
/// so text without the suffix is never rewritten and stripping twice equals
/// stripping once.
pub(crate) fn strip_suffix(text: &str, suffix: &str) -> Option<String> {
    if suffix.is_empty() {
        return None;
    }
    let trimmed = text.trim_end();
    let mut head = trimmed;
    loop {
        let start = head
            .rfind(char::is_whitespace)
            .map_or(0, |i| i + head[i..].chars().next().map_or(1, char::len_utf8));
        let token = &head[start..];
        if token == suffix {
            let before = head[..start].trim_end();
            let after = trimmed[head.len()..].trim_start();
            return Some(match (before.is_empty(), after.is_empty()) {
                (_, true) => before.to_string(),
                (true, false) => after.to_string(),
                (false, false) => format!("{before} {after}"),
            });
        }
        if start == 0 || !token.starts_with("--") {
            return None;
        }
        head = head[..start].trim_end();
    }
}
