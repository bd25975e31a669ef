// Adapters layer: concrete implementations for external systems (StatusDB, git data location, local files).

pub mod data_repo;
pub mod sources;
pub mod statusdb;
pub mod storage;
