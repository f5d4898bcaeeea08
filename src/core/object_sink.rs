use crate::core::{Payload, RunStamp, Sink};
use crate::domain::ports::ObjectStore;
use crate::utils::error::Result;
use crate::utils::notice;
use async_trait::async_trait;

pub const JSON_CONTENT_TYPE: &str = "application/json";

/// `{prefix}api_data_{YYYY/MM/DD/HHMMSS}.json`
pub fn object_key(prefix: &str, stamp: &RunStamp) -> String {
    format!("{}api_data_{}.json", prefix, stamp.object_path())
}

/// Lands each payload as one timestamped JSON object. No existence check:
/// two runs in the same second overwrite each other.
pub struct ObjectStorageSink<S: ObjectStore> {
    store: S,
    prefix: String,
}

impl<S: ObjectStore> ObjectStorageSink<S> {
    pub fn new(store: S, prefix: impl Into<String>) -> Self {
        Self {
            store,
            prefix: prefix.into(),
        }
    }

    pub async fn upload(&self, payload: &Payload, stamp: &RunStamp) -> Result<String> {
        let key = object_key(&self.prefix, stamp);
        let body = serde_json::to_vec(payload)?;

        notice::progress(&format!("Uploading JSON to {}...", self.store.location(&key)));
        tracing::debug!("Putting {} bytes at {}", body.len(), key);

        self.store.put_object(&key, body, JSON_CONTENT_TYPE).await?;

        notice::success("JSON successfully uploaded.");
        Ok(key)
    }
}

#[async_trait]
impl<S: ObjectStore> Sink for ObjectStorageSink<S> {
    async fn load(&self, payload: &Payload, stamp: &RunStamp) -> Result<String> {
        self.upload(payload, stamp).await
    }
}
