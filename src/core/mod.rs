pub mod etl;
pub mod object_sink;
pub mod warehouse_sink;

pub use crate::domain::model::{Payload, RunStamp};
pub use crate::domain::ports::{ObjectStore, Sink, WarehouseConnector};
pub use crate::utils::error::Result;
