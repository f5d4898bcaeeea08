use crate::core::{Payload, RunStamp, Sink};
use crate::domain::ports::{WarehouseConnection, WarehouseConnector, WarehouseCursor};
use crate::utils::error::{Result, WarehouseError};
use crate::utils::notice;
use async_trait::async_trait;

pub const SOURCE_NAME: &str = "api_service";

/// `PARSE_JSON` is not accepted inside a `VALUES` list, so the row is built with `SELECT`.
pub const INSERT_SQL: &str = "INSERT INTO raw.api_events (source_name, file_name, payload) \
                              SELECT ?, ?, PARSE_JSON(?)";

/// Inserts each payload as one row of the RAW layer.
pub struct WarehouseSink<C: WarehouseConnector> {
    connector: C,
}

impl<C: WarehouseConnector> WarehouseSink<C> {
    pub fn new(connector: C) -> Self {
        Self { connector }
    }

    /// Inserts one row and commits. The connection is closed on every path
    /// once acquired, and the cursor is closed before it.
    pub async fn insert(&self, payload: &Payload, file_name: &str) -> Result<()> {
        let payload_text = serde_json::to_string(payload)?;

        notice::progress("Connecting to Snowflake...");
        let mut conn = self.connector.connect().await?;

        let outcome = match conn.cursor().await {
            Ok(mut cursor) => {
                let written = write_row(&mut conn, &mut cursor, file_name, &payload_text).await;
                finish(written, cursor.close().await, "cursor")
            }
            Err(e) => Err(e),
        };

        finish(outcome, conn.close().await, "connection")?;
        Ok(())
    }
}

async fn write_row<W: WarehouseConnection>(
    conn: &mut W,
    cursor: &mut W::Cursor,
    file_name: &str,
    payload_text: &str,
) -> std::result::Result<(), WarehouseError> {
    cursor
        .execute(INSERT_SQL, &[SOURCE_NAME, file_name, payload_text])
        .await?;
    conn.commit().await
}

/// 第一個錯誤優先；主要操作已失敗時，釋放資源的錯誤只記錄不回傳
fn finish(
    outcome: std::result::Result<(), WarehouseError>,
    released: std::result::Result<(), WarehouseError>,
    what: &str,
) -> std::result::Result<(), WarehouseError> {
    match (outcome, released) {
        (Ok(()), released) => released,
        (Err(e), Ok(())) => Err(e),
        (Err(e), Err(release_err)) => {
            tracing::warn!("Failed to close {} after error: {}", what, release_err);
            Err(e)
        }
    }
}

#[async_trait]
impl<C: WarehouseConnector> Sink for WarehouseSink<C> {
    async fn load(&self, payload: &Payload, stamp: &RunStamp) -> Result<String> {
        let file_name = stamp.file_name();
        self.insert(payload, &file_name).await?;

        notice::success("Data successfully inserted into Snowflake RAW layer.");
        tracing::info!("Inserted {} into raw.api_events", file_name);
        Ok(file_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use std::sync::{Arc, Mutex};

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum FailAt {
        Nowhere,
        Connect,
        Cursor,
        Execute,
        Commit,
        CursorClose,
    }

    #[derive(Debug, Default)]
    struct Journal {
        statements: Vec<(String, Vec<String>)>,
        commits: usize,
        cursor_closed: bool,
        connection_closed: bool,
    }

    #[derive(Clone)]
    struct FakeConnector {
        fail_at: FailAt,
        journal: Arc<Mutex<Journal>>,
    }

    impl FakeConnector {
        fn new(fail_at: FailAt) -> Self {
            Self {
                fail_at,
                journal: Arc::new(Mutex::new(Journal::default())),
            }
        }
    }

    struct FakeConnection {
        fail_at: FailAt,
        journal: Arc<Mutex<Journal>>,
    }

    struct FakeCursor {
        fail_at: FailAt,
        journal: Arc<Mutex<Journal>>,
    }

    fn injected(step: &str) -> WarehouseError {
        WarehouseError::Statement {
            code: "test".to_string(),
            message: format!("{step} failed"),
        }
    }

    #[async_trait]
    impl WarehouseConnector for FakeConnector {
        type Connection = FakeConnection;

        async fn connect(&self) -> std::result::Result<FakeConnection, WarehouseError> {
            if self.fail_at == FailAt::Connect {
                return Err(WarehouseError::Connect {
                    message: "bad credentials".to_string(),
                });
            }
            Ok(FakeConnection {
                fail_at: self.fail_at,
                journal: Arc::clone(&self.journal),
            })
        }
    }

    #[async_trait]
    impl WarehouseConnection for FakeConnection {
        type Cursor = FakeCursor;

        async fn cursor(&mut self) -> std::result::Result<FakeCursor, WarehouseError> {
            if self.fail_at == FailAt::Cursor {
                return Err(injected("cursor"));
            }
            Ok(FakeCursor {
                fail_at: self.fail_at,
                journal: Arc::clone(&self.journal),
            })
        }

        async fn commit(&mut self) -> std::result::Result<(), WarehouseError> {
            if self.fail_at == FailAt::Commit {
                return Err(WarehouseError::Commit {
                    code: "test".to_string(),
                    message: "commit failed".to_string(),
                });
            }
            self.journal.lock().unwrap().commits += 1;
            Ok(())
        }

        async fn close(self) -> std::result::Result<(), WarehouseError> {
            self.journal.lock().unwrap().connection_closed = true;
            Ok(())
        }
    }

    #[async_trait]
    impl WarehouseCursor for FakeCursor {
        async fn execute(
            &mut self,
            sql: &str,
            params: &[&str],
        ) -> std::result::Result<(), WarehouseError> {
            if self.fail_at == FailAt::Execute {
                return Err(injected("execute"));
            }
            self.journal.lock().unwrap().statements.push((
                sql.to_string(),
                params.iter().map(|p| p.to_string()).collect(),
            ));
            Ok(())
        }

        async fn close(self) -> std::result::Result<(), WarehouseError> {
            self.journal.lock().unwrap().cursor_closed = true;
            if self.fail_at == FailAt::CursorClose {
                return Err(injected("cursor close"));
            }
            Ok(())
        }
    }

    fn stamp() -> RunStamp {
        RunStamp::at(Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap())
    }

    #[tokio::test]
    async fn test_inserts_tag_name_and_payload_then_commits() {
        let connector = FakeConnector::new(FailAt::Nowhere);
        let journal = Arc::clone(&connector.journal);
        let sink = WarehouseSink::new(connector);

        let payload = serde_json::json!({"id": 1, "value": "x"});
        let location = sink.load(&payload, &stamp()).await.unwrap();

        assert_eq!(location, "api_20240101120000.json");
        let journal = journal.lock().unwrap();
        assert_eq!(journal.statements.len(), 1);
        let (sql, params) = &journal.statements[0];
        assert!(sql.contains("INSERT INTO raw.api_events (source_name, file_name, payload)"));
        assert!(sql.contains("PARSE_JSON(?)"));
        assert_eq!(params[0], "api_service");
        assert_eq!(params[1], "api_20240101120000.json");
        assert_eq!(params[2], r#"{"id":1,"value":"x"}"#);
        assert_eq!(journal.commits, 1);
        assert!(journal.cursor_closed);
        assert!(journal.connection_closed);
    }

    #[tokio::test]
    async fn test_payload_parameter_parses_back_to_payload() {
        let payloads = [
            serde_json::json!([1, 2, 3]),
            serde_json::json!({"nested": {"list": [true, null, 1.5]}, "text": "quote \" and ünicode"}),
            serde_json::json!([]),
        ];

        for payload in payloads {
            let connector = FakeConnector::new(FailAt::Nowhere);
            let journal = Arc::clone(&connector.journal);
            WarehouseSink::new(connector)
                .insert(&payload, "api_x.json")
                .await
                .unwrap();

            let journal = journal.lock().unwrap();
            let parsed: serde_json::Value =
                serde_json::from_str(&journal.statements[0].1[2]).unwrap();
            assert_eq!(parsed, payload);
        }
    }

    #[tokio::test]
    async fn test_failed_execute_still_releases_cursor_and_connection() {
        let connector = FakeConnector::new(FailAt::Execute);
        let journal = Arc::clone(&connector.journal);
        let sink = WarehouseSink::new(connector);

        let err = sink
            .insert(&serde_json::json!({"a": 1}), "api_x.json")
            .await
            .unwrap_err();

        assert!(err.to_string().contains("execute failed"));
        let journal = journal.lock().unwrap();
        assert_eq!(journal.commits, 0);
        assert!(journal.cursor_closed);
        assert!(journal.connection_closed);
    }

    #[tokio::test]
    async fn test_failed_commit_still_releases_cursor_and_connection() {
        let connector = FakeConnector::new(FailAt::Commit);
        let journal = Arc::clone(&connector.journal);
        let sink = WarehouseSink::new(connector);

        let err = sink
            .insert(&serde_json::json!({"a": 1}), "api_x.json")
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            crate::utils::error::EtlError::Warehouse(WarehouseError::Commit { .. })
        ));
        let journal = journal.lock().unwrap();
        assert!(journal.cursor_closed);
        assert!(journal.connection_closed);
    }

    #[tokio::test]
    async fn test_failed_cursor_still_releases_connection() {
        let connector = FakeConnector::new(FailAt::Cursor);
        let journal = Arc::clone(&connector.journal);
        let sink = WarehouseSink::new(connector);

        let result = sink.insert(&serde_json::json!(1), "api_x.json").await;

        assert!(result.is_err());
        let journal = journal.lock().unwrap();
        assert!(journal.statements.is_empty());
        assert!(journal.connection_closed);
    }

    #[tokio::test]
    async fn test_cursor_close_failure_surfaces_after_successful_commit() {
        let connector = FakeConnector::new(FailAt::CursorClose);
        let journal = Arc::clone(&connector.journal);
        let sink = WarehouseSink::new(connector);

        let err = sink
            .insert(&serde_json::json!({"a": 1}), "api_x.json")
            .await
            .unwrap_err();

        assert!(err.to_string().contains("cursor close failed"));
        let journal = journal.lock().unwrap();
        assert_eq!(journal.commits, 1);
        assert!(journal.connection_closed);
    }

    #[tokio::test]
    async fn test_connect_failure_propagates_as_warehouse_error() {
        let sink = WarehouseSink::new(FakeConnector::new(FailAt::Connect));

        let err = sink.load(&serde_json::json!({}), &stamp()).await.unwrap_err();

        assert_eq!(err.kind(), crate::utils::error::FailureKind::Warehouse);
    }
}
