//! Log Redaction Layer
//!
//! Scrubs bot tokens and API keys from strings prior to logging, and clips
//! user-supplied text so a hostile message cannot bloat the log sink.

use regex::Regex;
use std::sync::LazyLock;

static BOT_TOKEN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b\d{6,12}:[A-Za-z0-9_-]{30,}").unwrap());
static API_KEY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(sk-[a-zA-Z0-9]{32,})|(Bearer\s+[a-zA-Z0-9\-\._~+/]+=*)|(apikey=[A-Za-z0-9]{16,})")
        .unwrap()
});

/// Longest user text carried in a log record.
pub const MAX_LOGGED_TEXT: usize = 200;

/// Redacts sensitive patterns in a string.
pub fn redact_sensitive_data(input: &str) -> String {
    let redacted = BOT_TOKEN_RE.replace_all(input, "[REDACTED_BOT_TOKEN]");
    API_KEY_RE.replace_all(&redacted, "[REDACTED_TOKEN]").into_owned()
}

/// Redact, then clip to [`MAX_LOGGED_TEXT`] characters.
pub fn clip_user_text(input: &str) -> String {
    let redacted = redact_sensitive_data(input);
    if redacted.chars().count() <= MAX_LOGGED_TEXT {
        return redacted;
    }
    let mut clipped: String = redacted.chars().take(MAX_LOGGED_TEXT).collect();
    clipped.push('…');
    clipped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redaction() {
        let raw = "token 1234567890:AAHdqTcvCH1vGWJxfSeofSAs0K5PALDsaw0 and Bearer eyJhbGciOiJIUzI1NiIs";
        let clean = redact_sensitive_data(raw);
        assert!(!clean.contains("AAHdqTcvCH1vGWJxfSeofSAs0K5PALDsaw0"));
        assert!(!clean.contains("eyJhbGciOiJIUzI1NiIs"));
        assert!(clean.contains("[REDACTED_BOT_TOKEN]"));
    }

    #[test]
    fn plain_text_untouched() {
        assert_eq!(redact_sensitive_data("New York, NY"), "New York, NY");
    }

    #[test]
    fn long_text_is_clipped() {
        let long = "a".repeat(500);
        let clipped = clip_user_text(&long);
        assert_eq!(clipped.chars().count(), MAX_LOGGED_TEXT + 1);
        assert!(clipped.ends_with('…'));
    }
}
