//! Library crate for simon, exposing the game core, score list and console front end
//! for the binary and integration tests.

/// Console command parsing.
pub mod commands;
/// Runtime configuration loading.
pub mod config;
/// Score persistence.
pub mod dao;
/// Service-level error type.
pub mod error;
/// Presentation contract and console rendering.
pub mod presentation;
/// Score flows and the console session.
pub mod services;
/// Game core: sequence, timers and round flow.
pub mod state;
