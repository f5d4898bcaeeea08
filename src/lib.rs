pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

pub use adapters::http::ApiClient;
pub use adapters::snowflake::SnowflakeConnector;
pub use adapters::storage::LocalStorage;
#[cfg(feature = "s3")]
pub use adapters::storage::S3Storage;
pub use config::{DirectLoadConfig, S3UploadConfig};
pub use crate::core::{etl::EtlEngine, object_sink::ObjectStorageSink, warehouse_sink::WarehouseSink};
pub use utils::error::{EtlError, FailureKind, Result};
