//! HTTP middleware stack.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (hub per request, transaction)
//! 2. `TraceLayer` (request span with status and latency)
//! 3. Request ID (add unique ID to each request)
//! 4. CORS (allowed web frontend origins)
//! 5. Rate limiting on token endpoints (governor)
//!
//! Authentication happens in the extractors in [`auth`], not as a layer.

pub mod auth;
pub mod rate_limit;
pub mod request_id;

pub use auth::{OptionalAuth, RequireAuth, RequireStaff};
pub use rate_limit::token_rate_limiter;
pub use request_id::{REQUEST_ID_HEADER, RequestId, request_id_middleware};
