//! Core domain types and logic.

pub mod market;
pub mod validate;
pub mod transform;
pub mod indicator;
pub mod alert;
pub mod alert_eval;
pub mod scoring;
pub mod signals;
pub mod advisor;
pub mod retry;
pub mod pipeline;
pub mod error;
