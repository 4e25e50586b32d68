//! Rate limiting and abuse protection for inbound bot traffic.

pub mod gate;
pub mod guard;
pub mod rate_limiter;
pub mod sanitize;
pub mod window;

pub use gate::{Admission, InboundRequest, Payload, RequestGate};
pub use guard::{AbuseGuard, SecurityStats};
pub use rate_limiter::RateLimiter;
pub use sanitize::{validate_coordinates, InputSanitizer};
pub use window::{Window, WindowTracker};
