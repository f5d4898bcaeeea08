use clap::{Args, Parser};

pub const DEFAULT_API_URL: &str = "https://api.example.com/events";

/// Exit status for bad command-line or environment input (sysexits `EX_USAGE`).
/// Kept apart from the failure-kind codes.
pub const USAGE_EXIT_CODE: u8 = 64;

/// Prints clap's message and returns the exit status: 0 for `--help` and
/// `--version`, `USAGE_EXIT_CODE` for everything else.
pub fn report_parse_error(err: &clap::Error) -> u8 {
    let _ = err.print();
    if err.use_stderr() {
        USAGE_EXIT_CODE
    } else {
        0
    }
}

#[derive(Debug, Clone, Args)]
pub struct ApiSourceArgs {
    /// Endpoint returning the JSON payload
    #[arg(long, env = "API_URL", default_value = DEFAULT_API_URL)]
    pub api_url: String,
}

#[derive(Debug, Clone, Default, Args)]
pub struct LogArgs {
    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Emit logs as JSON lines")]
    pub log_json: bool,
}

/// Snowflake 連線資訊。帳號密碼在解析時可缺，連線時才會報錯。
#[derive(Debug, Clone, Args)]
pub struct SnowflakeArgs {
    #[arg(long, env = "SNOW_ACCOUNT")]
    pub account: Option<String>,

    #[arg(long, env = "SNOW_USER")]
    pub user: Option<String>,

    #[arg(long, env = "SNOW_PWD", hide_env_values = true)]
    pub password: Option<String>,

    #[arg(long, env = "SNOW_ROLE", default_value = "SYSADMIN")]
    pub role: String,

    #[arg(long, env = "SNOW_WAREHOUSE", default_value = "COMPUTE_WH")]
    pub warehouse: String,

    #[arg(long, env = "SNOW_DATABASE", default_value = "PROJ_E2E_DB")]
    pub database: String,

    #[arg(long, env = "SNOW_SCHEMA", default_value = "RAW")]
    pub schema: String,

    /// Base URL override, defaults to https://{account}.snowflakecomputing.com
    #[arg(long, env = "SNOW_HOST")]
    pub host: Option<String>,
}

#[derive(Debug, Clone, Parser)]
#[command(name = "api-to-snowflake")]
#[command(about = "Fetch JSON from an API and insert it into the Snowflake RAW layer")]
pub struct DirectLoadConfig {
    #[command(flatten)]
    pub source: ApiSourceArgs,

    #[command(flatten)]
    pub snowflake: SnowflakeArgs,

    #[command(flatten)]
    pub logging: LogArgs,
}

#[derive(Debug, Clone, Args)]
pub struct S3Args {
    #[arg(long, env = "AWS_REGION", default_value = "us-east-1")]
    pub region: String,

    #[arg(long, env = "S3_BUCKET", default_value = "my-snowflake-raw-bucket")]
    pub bucket: String,

    #[arg(long, env = "S3_PREFIX", default_value = "api_events/")]
    pub prefix: String,

    /// S3-compatible endpoint (MinIO, LocalStack); switches to path-style addressing
    #[arg(long, env = "S3_ENDPOINT_URL")]
    pub endpoint_url: Option<String>,

    /// Land the object under this directory instead of uploading it
    #[arg(long, env = "LOCAL_OUTPUT_DIR")]
    pub output_dir: Option<String>,
}

#[derive(Debug, Clone, Parser)]
#[command(name = "api-to-s3")]
#[command(about = "Fetch JSON from an API and upload it to S3 for Snowflake ingestion")]
pub struct S3UploadConfig {
    #[command(flatten)]
    pub source: ApiSourceArgs,

    #[command(flatten)]
    pub s3: S3Args,

    #[command(flatten)]
    pub logging: LogArgs,
}
