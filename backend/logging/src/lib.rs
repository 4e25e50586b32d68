//! Structured logging for the weather bot.
//!
//! Handles subscriber setup, log redaction, and security-event records.

pub mod logger;
pub mod redact;
pub mod security_event;

pub use logger::init_logger;
pub use redact::{clip_user_text, redact_sensitive_data};
pub use security_event::{log_security_event, SecurityEvent, SecurityEventKind};
