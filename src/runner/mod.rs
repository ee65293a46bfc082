//! Panel execution and rate limiting

pub mod panel;
pub mod rate_limiter;

pub use panel::{CallStatus, JudgeCallResult, JudgePanel, PanelConfig};
pub use rate_limiter::RateLimiter;
