use thiserror::Error;

/// 抓取 API 階段的錯誤
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("API returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("API request failed: {0}")]
    Connectivity(#[source] reqwest::Error),

    #[error("API response is not valid JSON: {0}")]
    Decode(#[source] serde_json::Error),
}

impl FetchError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, FetchError::Connectivity(e) if e.is_timeout())
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(e: reqwest::Error) -> Self {
        FetchError::Connectivity(e)
    }
}

/// Snowflake 連線與寫入的錯誤
#[derive(Error, Debug)]
pub enum WarehouseError {
    #[error("Missing warehouse credential: {name} is not set")]
    MissingCredential { name: &'static str },

    #[error("Warehouse login failed: {message}")]
    Connect { message: String },

    #[error("Warehouse request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Statement failed ({code}): {message}")]
    Statement { code: String, message: String },

    #[error("Commit failed ({code}): {message}")]
    Commit { code: String, message: String },

    #[error("Failed to release warehouse session: {message}")]
    Close { message: String },
}

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Failed to put object {key}: {message}")]
    Put { key: String, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Error, Debug)]
pub enum EtlError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Warehouse(#[from] WarehouseError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// 失敗類別，排程器依此分支而非解析日誌
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    Fetch,
    Warehouse,
    Storage,
    Serialization,
}

impl EtlError {
    pub fn kind(&self) -> FailureKind {
        match self {
            EtlError::Fetch(_) => FailureKind::Fetch,
            EtlError::Warehouse(_) => FailureKind::Warehouse,
            EtlError::Storage(_) => FailureKind::Storage,
            EtlError::Serialization(_) => FailureKind::Serialization,
        }
    }

    pub fn exit_code(&self) -> u8 {
        match self.kind() {
            FailureKind::Fetch => 2,
            FailureKind::Warehouse => 3,
            FailureKind::Storage => 4,
            FailureKind::Serialization => 5,
        }
    }
}

pub type Result<T> = std::result::Result<T, EtlError>;
