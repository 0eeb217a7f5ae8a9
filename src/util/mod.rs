//! Utility modules: retry with backoff, timeout.

pub mod retry;
pub mod timeout;
