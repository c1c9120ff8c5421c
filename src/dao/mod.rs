/// Record shapes exchanged with the record store.
pub mod models;
/// Record store trait and its backends.
pub mod record_store;
/// Storage error shared by every backend.
pub mod storage;
