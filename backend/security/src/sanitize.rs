//! Free-text sanitization and location/coordinate validation.

use once_cell::sync::Lazy;
use regex::Regex;
use weatherbot_config::SecurityConfig;

/// Markup and script fragments that must never reach downstream renderers.
/// Case-insensitive; applied in order.
static MALICIOUS_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"(?i)<script.*?>.*?</script>",
        r"(?i)javascript:",
        r"(?i)vbscript:",
        r"(?i)onload\s*=",
        r"(?i)onerror\s*=",
        r"(?i)onclick\s*=",
        r"(?i)<iframe.*?>",
        r"(?i)<object.*?>",
        r"(?i)<embed.*?>",
    ]
    .iter()
    .map(|p| Regex::new(p).unwrap())
    .collect()
});

static WHITESPACE_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// Letters (any script, with combining marks), ASCII digits, whitespace,
/// hyphen, period, comma, parentheses.
static LOCATION_CHARS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[\p{L}\p{M}0-9\s\-.,()]+$").unwrap());

const TRUNCATION_MARKER: &str = "...";

#[derive(Debug, Clone)]
pub struct InputSanitizer {
    max_input_length: usize,
    max_location_length: usize,
}

impl Default for InputSanitizer {
    fn default() -> Self {
        Self::from_config(&SecurityConfig::default())
    }
}

impl InputSanitizer {
    pub fn from_config(config: &SecurityConfig) -> Self {
        Self {
            max_input_length: config.max_input_length,
            max_location_length: config.max_location_length,
        }
    }

    pub fn contains_malicious(&self, text: &str) -> bool {
        MALICIOUS_PATTERNS.iter().any(|p| p.is_match(text))
    }

    /// Strip malicious fragments, collapse whitespace, trim, and cap the length.
    pub fn sanitize(&self, text: &str) -> String {
        if text.is_empty() {
            return String::new();
        }

        let mut cleaned = text.to_string();
        for pattern in MALICIOUS_PATTERNS.iter() {
            cleaned = pattern.replace_all(&cleaned, "").into_owned();
        }
        let cleaned = WHITESPACE_RUN.replace_all(&cleaned, " ");
        let cleaned = cleaned.trim();

        match cleaned.char_indices().nth(self.max_input_length) {
            Some((cut, _)) => format!("{}{TRUNCATION_MARKER}", &cleaned[..cut]),
            None => cleaned.to_string(),
        }
    }

    pub fn validate_location(&self, location: &str) -> bool {
        if location.trim().is_empty() {
            return false;
        }
        if location.chars().count() > self.max_location_length {
            return false;
        }
        if self.contains_malicious(location) {
            return false;
        }
        LOCATION_CHARS.is_match(location)
    }
}

/// True iff both values are finite and inside the WGS84 ranges.
pub fn validate_coordinates(latitude: f64, longitude: f64) -> bool {
    (-90.0..=90.0).contains(&latitude) && (-180.0..=180.0).contains(&longitude)
}
