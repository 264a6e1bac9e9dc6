/// Database model definitions.
pub mod models;
/// Score list persistence backends.
pub mod score_store;
/// Storage abstraction layer for persistence operations.
pub mod storage;
