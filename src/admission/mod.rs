//! Policy-driven admission control
//!
//! The boundary between transport code and the rate limiting engines:
//! [`RequestContext`] carries what key derivation needs,
//! [`AdmissionControl`] makes the admit/deny decision.

pub mod context;
pub mod guard;

pub use context::{derive_key, RequestContext, ANONYMOUS_PRINCIPAL, IP_HEADER_CHAIN};
pub use guard::{AdmissionControl, FailurePolicy};
