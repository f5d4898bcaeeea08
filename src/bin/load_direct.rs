use clap::Parser;
use raw_landing::config;
use raw_landing::utils::{logger, notice};
use raw_landing::{ApiClient, DirectLoadConfig, EtlEngine, SnowflakeConnector, WarehouseSink};
use std::process::ExitCode;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let config = match DirectLoadConfig::try_parse() {
        Ok(config) => config,
        Err(e) => return ExitCode::from(config::report_parse_error(&e)),
    };
    logger::init_cli_logger(&config.logging);

    tracing::info!("Starting api-to-snowflake");
    tracing::debug!(
        "Target {}.{} as role {} on warehouse {}",
        config.snowflake.database,
        config.snowflake.schema,
        config.snowflake.role,
        config.snowflake.warehouse
    );

    let fetcher = match ApiClient::new(&config.source.api_url) {
        Ok(fetcher) => fetcher,
        Err(e) => {
            let e = raw_landing::EtlError::from(e);
            notice::failure(&format!("ETL failed: {e}"));
            return ExitCode::from(e.exit_code());
        }
    };

    let sink = WarehouseSink::new(SnowflakeConnector::new(config.snowflake.clone()));
    let engine = EtlEngine::new(fetcher, sink);

    match engine.run().await {
        Ok(file_name) => {
            notice::complete("Load complete:", &file_name);
            ExitCode::SUCCESS
        }
        Err(e) => ExitCode::from(e.exit_code()),
    }
}
