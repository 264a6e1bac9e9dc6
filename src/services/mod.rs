/// Game-over name prompt and discard confirmation.
pub mod score_prompt;
/// Ranked, persisted score list.
pub mod score_service;
/// Console session tying input, timers and the score flow together.
pub mod session;
