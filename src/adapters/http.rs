use crate::domain::model::Payload;
use crate::utils::error::FetchError;
use crate::utils::notice;
use reqwest::Client;
use std::time::Duration;

pub const FETCH_TIMEOUT: Duration = Duration::from_secs(60);

/// Single-shot JSON fetcher. One GET per call, no retries.
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    url: String,
}

impl ApiClient {
    pub fn new(url: impl Into<String>) -> Result<Self, FetchError> {
        Self::with_timeout(url, FETCH_TIMEOUT)
    }

    pub fn with_timeout(url: impl Into<String>, timeout: Duration) -> Result<Self, FetchError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub async fn fetch(&self) -> Result<Payload, FetchError> {
        notice::progress(&format!("Fetching data from API: {}...", self.url));
        tracing::debug!("Making API request to: {}", self.url);

        let response = self.client.get(&self.url).send().await?;
        let status = response.status();
        tracing::debug!("API response status: {}", status);

        let body = response.text().await?;
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                body,
            });
        }

        serde_json::from_str(&body).map_err(FetchError::Decode)
    }
}
