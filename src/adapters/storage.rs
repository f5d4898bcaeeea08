use crate::domain::ports::ObjectStore;
use crate::utils::error::StorageError;
use std::path::PathBuf;

/// Writes objects under a local directory, keeping the key as a relative path.
#[derive(Debug, Clone)]
pub struct LocalStorage {
    base_path: PathBuf,
}

impl LocalStorage {
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }
}

impl ObjectStore for LocalStorage {
    async fn put_object(
        &self,
        key: &str,
        body: Vec<u8>,
        _content_type: &str,
    ) -> Result<(), StorageError> {
        let full_path = self.base_path.join(key);

        if let Some(parent) = full_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        tokio::fs::write(full_path, body).await?;
        Ok(())
    }

    fn location(&self, key: &str) -> String {
        self.base_path.join(key).display().to_string()
    }
}

#[cfg(feature = "s3")]
pub use self::s3::S3Storage;

#[cfg(feature = "s3")]
mod s3 {
    use crate::domain::ports::ObjectStore;
    use crate::utils::error::StorageError;
    use aws_config::BehaviorVersion;
    use aws_sdk_s3::config::Region;
    use aws_sdk_s3::error::{DisplayErrorContext, ProvideErrorMetadata};
    use aws_sdk_s3::primitives::ByteStream;
    use aws_sdk_s3::Client as S3Client;

    #[derive(Debug, Clone)]
    pub struct S3Storage {
        client: S3Client,
        bucket: String,
    }

    impl S3Storage {
        pub fn new(client: S3Client, bucket: String) -> Self {
            Self { client, bucket }
        }

        /// 以預設憑證鏈建立綁定區域的 client；憑證錯誤要到 PUT 才會出現
        pub async fn connect(region: &str, endpoint_url: Option<&str>, bucket: String) -> Self {
            let shared = aws_config::defaults(BehaviorVersion::latest())
                .region(Region::new(region.to_string()))
                .load()
                .await;

            let mut builder = aws_sdk_s3::config::Builder::from(&shared);
            if let Some(endpoint) = endpoint_url {
                builder = builder.endpoint_url(endpoint).force_path_style(true);
            }

            Self::new(S3Client::from_conf(builder.build()), bucket)
        }
    }

    impl ObjectStore for S3Storage {
        async fn put_object(
            &self,
            key: &str,
            body: Vec<u8>,
            content_type: &str,
        ) -> Result<(), StorageError> {
            self.client
                .put_object()
                .bucket(&self.bucket)
                .key(key)
                .body(ByteStream::from(body))
                .content_type(content_type)
                .send()
                .await
                .map_err(|err| {
                    let context = DisplayErrorContext(&err).to_string();
                    let service = err.into_service_error();
                    let message = match (service.code(), service.message()) {
                        (Some(code), Some(message)) => format!("{code}: {message}"),
                        (Some(code), None) => code.to_string(),
                        _ => context,
                    };
                    StorageError::Put {
                        key: key.to_string(),
                        message,
                    }
                })?;

            Ok(())
        }

        fn location(&self, key: &str) -> String {
            format!("s3://{}/{}", self.bucket, key)
        }
    }
}
