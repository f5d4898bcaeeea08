use clap::Parser;
use raw_landing::config;
use raw_landing::utils::{logger, notice};
use raw_landing::{
    ApiClient, EtlEngine, EtlError, LocalStorage, ObjectStorageSink, S3Storage, S3UploadConfig,
};
use std::process::ExitCode;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let config = match S3UploadConfig::try_parse() {
        Ok(config) => config,
        Err(e) => return ExitCode::from(config::report_parse_error(&e)),
    };
    logger::init_cli_logger(&config.logging);

    tracing::info!("Starting api-to-s3");

    let fetcher = match ApiClient::new(&config.source.api_url) {
        Ok(fetcher) => fetcher,
        Err(e) => {
            let e = EtlError::from(e);
            notice::failure(&format!("ETL failed: {e}"));
            return ExitCode::from(e.exit_code());
        }
    };

    let result = match &config.s3.output_dir {
        Some(dir) => {
            tracing::info!("Landing objects locally under {}", dir);
            let sink = ObjectStorageSink::new(LocalStorage::new(dir), config.s3.prefix.clone());
            EtlEngine::new(fetcher, sink).run().await
        }
        None => {
            let store = S3Storage::connect(
                &config.s3.region,
                config.s3.endpoint_url.as_deref(),
                config.s3.bucket.clone(),
            )
            .await;
            let sink = ObjectStorageSink::new(store, config.s3.prefix.clone());
            EtlEngine::new(fetcher, sink).run().await
        }
    };

    match result {
        Ok(key) => {
            notice::complete("Upload complete:", &key);
            ExitCode::SUCCESS
        }
        Err(e) => ExitCode::from(e.exit_code()),
    }
}
