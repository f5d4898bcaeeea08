use crate::adapters::http::ApiClient;
use crate::core::{RunStamp, Sink};
use crate::utils::error::Result;
use crate::utils::notice;
use chrono::{DateTime, Utc};

/// fetch → sink, strictly in that order. A failed fetch never reaches the sink.
pub struct EtlEngine<K: Sink> {
    fetcher: ApiClient,
    sink: K,
    clock: fn() -> DateTime<Utc>,
}

impl<K: Sink> EtlEngine<K> {
    pub fn new(fetcher: ApiClient, sink: K) -> Self {
        Self {
            fetcher,
            sink,
            clock: Utc::now,
        }
    }

    pub fn with_clock(mut self, clock: fn() -> DateTime<Utc>) -> Self {
        self.clock = clock;
        self
    }

    pub async fn run(&self) -> Result<String> {
        tracing::info!("Starting ETL run against {}", self.fetcher.url());

        match self.run_stages().await {
            Ok(location) => {
                tracing::info!("ETL run completed: {}", location);
                Ok(location)
            }
            Err(e) => {
                notice::failure(&format!("ETL failed: {e}"));
                tracing::error!(kind = ?e.kind(), "ETL run failed: {}", e);
                Err(e)
            }
        }
    }

    async fn run_stages(&self) -> Result<String> {
        let stamp = RunStamp::at((self.clock)());

        let payload = self.fetcher.fetch().await?;
        tracing::debug!("Fetched payload ({} top-level items)", top_level_len(&payload));

        self.sink.load(&payload, &stamp).await
    }
}

fn top_level_len(payload: &serde_json::Value) -> usize {
    match payload {
        serde_json::Value::Array(items) => items.len(),
        serde_json::Value::Object(fields) => fields.len(),
        _ => 1,
    }
}
