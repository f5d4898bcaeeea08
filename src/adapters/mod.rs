// Adapters layer: concrete implementations for external systems (http, warehouse, storage).

pub mod http;
pub mod snowflake;
pub mod storage;
