use std::path::Path;
use std::time::Duration;

use aws_config::{
    meta::region::RegionProviderChain, timeout::TimeoutConfig, BehaviorVersion, SdkConfig,
};
use aws_credential_types::{provider::ProvideCredentials, Credentials};
use aws_sdk_s3::config::{http::HttpResponse, Region};
use aws_sdk_s3::error::{DisplayErrorContext, SdkError};
use aws_sdk_s3::Client;

use crate::credentials::AccessKeys;
use crate::error::FetchError;
use crate::filesink::{progress_bar, save_stream};
use crate::report::describe_size;

const FALLBACK_REGION: &str = "us-east-1";
const BUCKET_REGION_HEADER: &str = "x-amz-bucket-region";

/// Overrides for talking to S3-compatible stores.
#[derive(Clone, Debug, Default)]
pub struct S3Options {
    pub endpoint_url: Option<String>,
    pub region: Option<String>,
}

#[derive(Clone, Debug)]
pub struct S3Agent {
    bucket: String,
    client: Client,
}

#[derive(Debug, PartialEq, Eq)]
pub struct ObjectInfo {
    pub size: Option<u64>,
    pub content_type: Option<String>,
}

// see:
// https://docs.aws.amazon.com/sdk-for-rust/latest/dg/rust_s3_code_examples.html

impl S3Agent {
    /// Build a client for `bucket`. Explicit keys win over the default
    /// credential chain; either way credentials must resolve before any
    /// request is sent.
    pub async fn new(
        bucket: &str,
        keys: Option<&AccessKeys>,
        options: &S3Options,
        timeout: Duration,
    ) -> Result<Self, FetchError> {
        let region = match &options.region {
            Some(region) => RegionProviderChain::first_try(Region::new(region.clone())),
            None => RegionProviderChain::default_provider().or_else(FALLBACK_REGION),
        };
        let mut loader = aws_config::defaults(BehaviorVersion::latest())
            .region(region)
            .timeout_config(
                TimeoutConfig::builder()
                    .connect_timeout(timeout)
                    .read_timeout(timeout)
                    .build(),
            );
        if let Some(keys) = keys {
            info!("Using provided AWS access credentials for downloading from S3");
            loader = loader.credentials_provider(Credentials::new(
                &keys.access_key,
                &keys.secret_key,
                None,
                None,
                "downloader-prompt",
            ));
        }
        if let Some(endpoint) = &options.endpoint_url {
            loader = loader.endpoint_url(endpoint);
        }
        let config = loader.load().await;
        ensure_credentials(&config).await?;

        let s3_config = aws_sdk_s3::config::Builder::from(&config)
            .force_path_style(options.endpoint_url.is_some())
            .build();

        Ok(Self {
            bucket: bucket.to_owned(),
            client: Client::from_conf(s3_config),
        })
    }

    pub async fn head(&self, key: &str) -> Result<ObjectInfo, FetchError> {
        let head = self
            .client
            .head_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(classify)?;

        Ok(ObjectInfo {
            size: head.content_length().and_then(|n| u64::try_from(n).ok()),
            content_type: head.content_type().map(str::to_owned),
        })
    }

    /// Fetch `key` into `path`, returning the number of bytes written.
    pub async fn download(
        &self,
        key: &str,
        path: &Path,
        show_progress: bool,
    ) -> Result<u64, FetchError> {
        let info = self.head(key).await?;
        info!("Content type: {}", info.content_type.as_deref().unwrap_or("unknown"));
        info!("File size:    {}", describe_size(info.size));
        info!("Downloading...");

        let object = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(classify)?;

        let body = futures::stream::unfold(object.body, |mut body| async move {
            body.try_next()
                .await
                .transpose()
                .map(|chunk| (chunk.map_err(|e| FetchError::S3(e.to_string())), body))
        });
        let progress = progress_bar(info.size, show_progress);
        save_stream(path, body, &progress).await
    }
}

async fn ensure_credentials(config: &SdkConfig) -> Result<(), FetchError> {
    let provider = config
        .credentials_provider()
        .ok_or_else(|| FetchError::Credentials("no credentials provider configured".to_string()))?;
    provider
        .provide_credentials()
        .await
        .map(|_| ())
        .map_err(|e| FetchError::Credentials(DisplayErrorContext(&e).to_string()))
}

fn classify<E>(err: SdkError<E, HttpResponse>) -> FetchError
where
    E: std::error::Error + Send + Sync + 'static,
{
    if let SdkError::ServiceError(service) = &err {
        let raw = service.raw();
        match raw.status().as_u16() {
            404 => return FetchError::NotFound,
            403 => return FetchError::Forbidden,
            301 => {
                if let Some(region) = raw.headers().get(BUCKET_REGION_HEADER) {
                    return FetchError::WrongRegion(region.to_owned());
                }
            }
            _ => {}
        }
    }
    FetchError::S3(DisplayErrorContext(&err).to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use aws_credential_types::provider::SharedCredentialsProvider;
    use mockito::Matcher;

    async fn agent_for(server: &mockito::ServerGuard) -> S3Agent {
        let keys = AccessKeys::new("AKIDEXAMPLE", "secret");
        let options = S3Options {
            endpoint_url: Some(server.url()),
            region: Some("us-east-1".to_string()),
        };
        S3Agent::new("bucket", Some(&keys), &options, Duration::from_secs(5))
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn missing_credentials_are_reported_before_any_request() {
        let config = SdkConfig::builder().build();
        let err = ensure_credentials(&config).await.unwrap_err();
        assert!(matches!(err, FetchError::Credentials(_)));
    }

    #[tokio::test]
    async fn static_credentials_resolve() {
        let config = SdkConfig::builder()
            .credentials_provider(SharedCredentialsProvider::new(Credentials::new(
                "AKIDEXAMPLE",
                "secret",
                None,
                None,
                "test",
            )))
            .build();
        assert!(ensure_credentials(&config).await.is_ok());
    }

    #[tokio::test]
    async fn head_404_is_not_found() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("HEAD", Matcher::Regex(r"^/bucket/missing\.bin".into()))
            .with_status(404)
            .create_async()
            .await;

        let err = agent_for(&server).await.head("missing.bin").await.unwrap_err();
        assert!(matches!(err, FetchError::NotFound), "{err}");
    }

    #[tokio::test]
    async fn head_403_is_forbidden() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("HEAD", Matcher::Regex(r"^/bucket/secret\.bin".into()))
            .with_status(403)
            .create_async()
            .await;

        let err = agent_for(&server).await.head("secret.bin").await.unwrap_err();
        assert!(matches!(err, FetchError::Forbidden), "{err}");
    }

    #[tokio::test]
    async fn moved_bucket_reports_its_region() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("HEAD", Matcher::Regex(r"^/bucket/far\.bin".into()))
            .with_status(301)
            .with_header("x-amz-bucket-region", "eu-west-1")
            .create_async()
            .await;

        let err = agent_for(&server).await.head("far.bin").await.unwrap_err();
        match err {
            FetchError::WrongRegion(region) => assert_eq!(region, "eu-west-1"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[tokio::test]
    async fn downloads_object_after_head() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("HEAD", Matcher::Regex(r"^/bucket/hello\.txt".into()))
            .with_status(200)
            .with_header("content-type", "text/plain")
            .create_async()
            .await;
        let _mock = server
            .mock("GET", Matcher::Regex(r"^/bucket/hello\.txt".into()))
            .with_status(200)
            .with_header("content-type", "text/plain")
            .with_body("hello from s3")
            .create_async()
            .await;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hello.txt");
        let agent = agent_for(&server).await;

        let info = agent.head("hello.txt").await.unwrap();
        assert_eq!(info.content_type.as_deref(), Some("text/plain"));
        let written = agent.download("hello.txt", &path, false).await.unwrap();

        assert_eq!(written, 13);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "hello from s3");
    }
}
