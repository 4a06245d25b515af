//! marketsentry — daily equity analytics pipeline.
//!
//! Ingests daily price observations, derives technical indicators, evaluates
//! alert rules, and produces scored buy/sell/hold recommendations, all driven
//! by a staged orchestrator that tolerates partial failure.
//!
//! Hexagonal architecture: domain logic in [`domain`], port traits in
//! [`ports`], concrete implementations in [`adapters`].

pub mod domain;
pub mod ports;
pub mod adapters;
pub mod cli;
