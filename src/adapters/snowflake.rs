//! Snowflake session client.
//!
//! Speaks the same REST session protocol the official connectors use:
//! password login returns a session token, statements go to the
//! query-request endpoint with positional bindings, and closing the
//! connection deletes the session server-side.

use crate::config::SnowflakeArgs;
use crate::domain::ports::{WarehouseConnection, WarehouseConnector, WarehouseCursor};
use crate::utils::error::WarehouseError;
use async_trait::async_trait;
use reqwest::header::{ACCEPT, AUTHORIZATION};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use url::Url;
use uuid::Uuid;

const CLIENT_APP_ID: &str = "raw-landing";
const SNOWFLAKE_ACCEPT: &str = "application/snowflake";
const QUERY_IN_PROGRESS: &str = "333334";
const RESULT_POLL_INTERVAL: Duration = Duration::from_millis(500);

#[derive(Serialize)]
struct LoginRequest<'a> {
    data: LoginData<'a>,
}

#[derive(Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
struct LoginData<'a> {
    client_app_id: &'a str,
    client_app_version: &'a str,
    account_name: &'a str,
    login_name: &'a str,
    password: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct QueryRequest<'a> {
    sql_text: &'a str,
    async_exec: bool,
    sequence_id: u64,
    query_submission_time: i64,
    is_internal: bool,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    bindings: BTreeMap<String, Binding<'a>>,
}

#[derive(Serialize)]
struct Binding<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    value: &'a str,
}

#[derive(Debug, Deserialize)]
struct SnowflakeResponse {
    #[serde(default)]
    data: Option<serde_json::Value>,
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    message: Option<String>,
    success: bool,
}

impl SnowflakeResponse {
    /// (code, message) when the server reported a failure.
    fn failure(&self) -> Option<(String, String)> {
        if self.success {
            return None;
        }
        Some((
            self.code.clone().unwrap_or_else(|| "unknown".to_string()),
            self.message
                .clone()
                .unwrap_or_else(|| "no message from server".to_string()),
        ))
    }
}

fn required<'a>(value: &'a Option<String>, name: &'static str) -> Result<&'a str, WarehouseError> {
    value
        .as_deref()
        .ok_or(WarehouseError::MissingCredential { name })
}

#[derive(Debug, Clone)]
pub struct SnowflakeConnector {
    client: Client,
    settings: SnowflakeArgs,
}

impl SnowflakeConnector {
    pub fn new(settings: SnowflakeArgs) -> Self {
        Self {
            client: Client::new(),
            settings,
        }
    }

    fn base_url(&self, account: &str) -> Result<Url, WarehouseError> {
        let mut raw = match &self.settings.host {
            Some(host) => host.clone(),
            None => format!("https://{account}.snowflakecomputing.com"),
        };
        // 沒有結尾斜線時 join 會吃掉最後一段路徑
        if !raw.ends_with('/') {
            raw.push('/');
        }
        Url::parse(&raw).map_err(|e| WarehouseError::Connect {
            message: format!("invalid Snowflake URL {raw}: {e}"),
        })
    }
}

#[async_trait]
impl WarehouseConnector for SnowflakeConnector {
    type Connection = SnowflakeConnection;

    async fn connect(&self) -> Result<SnowflakeConnection, WarehouseError> {
        let account = required(&self.settings.account, "SNOW_ACCOUNT")?;
        let user = required(&self.settings.user, "SNOW_USER")?;
        let password = required(&self.settings.password, "SNOW_PWD")?;

        let base = self.base_url(account)?;
        let login_url = base
            .join("session/v1/login-request")
            .map_err(|e| WarehouseError::Connect {
                message: e.to_string(),
            })?;

        // 帳號可能帶 region 後綴 (xy12345.us-east-1)，登入只要前段
        let account_name = account.split('.').next().unwrap_or(account);
        let request_id = Uuid::new_v4().to_string();

        tracing::debug!(
            "Logging in to Snowflake as {} (role={}, warehouse={}, database={}, schema={})",
            user,
            self.settings.role,
            self.settings.warehouse,
            self.settings.database,
            self.settings.schema
        );

        let response: SnowflakeResponse = self
            .client
            .post(login_url)
            .query(&[
                ("request_id", request_id.as_str()),
                ("roleName", self.settings.role.as_str()),
                ("warehouse", self.settings.warehouse.as_str()),
                ("databaseName", self.settings.database.as_str()),
                ("schemaName", self.settings.schema.as_str()),
            ])
            .header(ACCEPT, "application/json")
            .json(&LoginRequest {
                data: LoginData {
                    client_app_id: CLIENT_APP_ID,
                    client_app_version: env!("CARGO_PKG_VERSION"),
                    account_name,
                    login_name: user,
                    password,
                },
            })
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        if let Some((code, message)) = response.failure() {
            return Err(WarehouseError::Connect {
                message: format!("{message} ({code})"),
            });
        }

        let token = response
            .data
            .as_ref()
            .and_then(|data| data.get("token"))
            .and_then(|token| token.as_str())
            .ok_or_else(|| WarehouseError::Connect {
                message: "login response did not contain a session token".to_string(),
            })?;

        Ok(SnowflakeConnection {
            session: Arc::new(Session {
                client: self.client.clone(),
                base,
                token: token.to_string(),
                sequence: AtomicU64::new(0),
            }),
        })
    }
}

struct Session {
    client: Client,
    base: Url,
    token: String,
    sequence: AtomicU64,
}

impl Session {
    fn authorization(&self) -> String {
        format!("Snowflake Token=\"{}\"", self.token)
    }

    fn endpoint(&self, path: &str) -> Result<Url, WarehouseError> {
        self.base.join(path).map_err(|e| WarehouseError::Connect {
            message: e.to_string(),
        })
    }

    async fn query(&self, sql: &str, params: &[&str]) -> Result<SnowflakeResponse, WarehouseError> {
        let bindings = params
            .iter()
            .enumerate()
            .map(|(i, value)| {
                (
                    (i + 1).to_string(),
                    Binding {
                        kind: "TEXT",
                        value,
                    },
                )
            })
            .collect();

        let request = QueryRequest {
            sql_text: sql,
            async_exec: false,
            sequence_id: self.sequence.fetch_add(1, Ordering::SeqCst) + 1,
            query_submission_time: chrono::Utc::now().timestamp_millis(),
            is_internal: false,
            bindings,
        };

        let request_id = Uuid::new_v4().to_string();
        let response = self
            .client
            .post(self.endpoint("queries/v1/query-request")?)
            .query(&[("requestId", request_id.as_str())])
            .header(ACCEPT, SNOWFLAKE_ACCEPT)
            .header(AUTHORIZATION, self.authorization())
            .json(&request)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        self.await_completion(response).await
    }

    /// A statement that outlives the request comes back as `success: true`
    /// with code 333334 and a result URL; poll it until the statement ends.
    async fn await_completion(
        &self,
        mut response: SnowflakeResponse,
    ) -> Result<SnowflakeResponse, WarehouseError> {
        while response.code.as_deref() == Some(QUERY_IN_PROGRESS) {
            let result_url = response
                .data
                .as_ref()
                .and_then(|data| data.get("getResultUrl"))
                .and_then(|url| url.as_str())
                .map(str::to_owned)
                .ok_or_else(|| WarehouseError::Statement {
                    code: QUERY_IN_PROGRESS.to_string(),
                    message: "statement still running but no result URL was returned"
                        .to_string(),
                })?;

            tracing::debug!("Statement still running, polling {}", result_url);
            tokio::time::sleep(RESULT_POLL_INTERVAL).await;

            response = self
                .client
                .get(self.endpoint(result_url.trim_start_matches('/'))?)
                .header(ACCEPT, SNOWFLAKE_ACCEPT)
                .header(AUTHORIZATION, self.authorization())
                .send()
                .await?
                .error_for_status()?
                .json()
                .await?;
        }

        Ok(response)
    }
}

pub struct SnowflakeConnection {
    session: Arc<Session>,
}

#[async_trait]
impl WarehouseConnection for SnowflakeConnection {
    type Cursor = SnowflakeCursor;

    async fn cursor(&mut self) -> Result<SnowflakeCursor, WarehouseError> {
        Ok(SnowflakeCursor {
            session: Arc::clone(&self.session),
        })
    }

    async fn commit(&mut self) -> Result<(), WarehouseError> {
        let response = self.session.query("COMMIT", &[]).await?;
        match response.failure() {
            Some((code, message)) => Err(WarehouseError::Commit { code, message }),
            None => Ok(()),
        }
    }

    async fn close(self) -> Result<(), WarehouseError> {
        let response = self
            .session
            .client
            .post(self.session.endpoint("session")?)
            .query(&[("delete", "true")])
            .header(ACCEPT, "application/json")
            .header(AUTHORIZATION, self.session.authorization())
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(WarehouseError::Close {
                message: format!("session delete returned HTTP {}", response.status()),
            });
        }

        tracing::debug!("Snowflake session closed");
        Ok(())
    }
}

/// Results come back inline with each query-request, so a cursor holds no
/// server-side state of its own.
pub struct SnowflakeCursor {
    session: Arc<Session>,
}

#[async_trait]
impl WarehouseCursor for SnowflakeCursor {
    async fn execute(&mut self, sql: &str, params: &[&str]) -> Result<(), WarehouseError> {
        let response = self.session.query(sql, params).await?;
        if let Some((code, message)) = response.failure() {
            return Err(WarehouseError::Statement { code, message });
        }

        let query_id = response
            .data
            .as_ref()
            .and_then(|data| data.get("queryId"))
            .and_then(|id| id.as_str())
            .unwrap_or("-");
        tracing::debug!("Statement executed (query id {})", query_id);
        Ok(())
    }

    async fn close(self) -> Result<(), WarehouseError> {
        drop(self.session);
        Ok(())
    }
}
