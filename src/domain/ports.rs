use crate::domain::model::{Payload, RunStamp};
use crate::utils::error::{Result, StorageError, WarehouseError};
use async_trait::async_trait;

/// Destination for a fetched payload. Returns where the payload landed.
#[async_trait]
pub trait Sink: Send + Sync {
    async fn load(&self, payload: &Payload, stamp: &RunStamp) -> Result<String>;
}

pub trait ObjectStore: Send + Sync {
    fn put_object(
        &self,
        key: &str,
        body: Vec<u8>,
        content_type: &str,
    ) -> impl std::future::Future<Output = std::result::Result<(), StorageError>> + Send;

    /// Display form of a key, e.g. `s3://bucket/key`.
    fn location(&self, key: &str) -> String;
}

#[async_trait]
pub trait WarehouseConnector: Send + Sync {
    type Connection: WarehouseConnection;

    async fn connect(&self) -> std::result::Result<Self::Connection, WarehouseError>;
}

#[async_trait]
pub trait WarehouseConnection: Send {
    type Cursor: WarehouseCursor;

    async fn cursor(&mut self) -> std::result::Result<Self::Cursor, WarehouseError>;
    async fn commit(&mut self) -> std::result::Result<(), WarehouseError>;
    async fn close(self) -> std::result::Result<(), WarehouseError>;
}

/// Positional `?` bindings are passed as text; the statement does any casting.
#[async_trait]
pub trait WarehouseCursor: Send {
    async fn execute(
        &mut self,
        sql: &str,
        params: &[&str],
    ) -> std::result::Result<(), WarehouseError>;
    async fn close(self) -> std::result::Result<(), WarehouseError>;
}
