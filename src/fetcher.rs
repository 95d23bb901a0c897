use std::path::{self, Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::fs;
use url::Url;

use crate::credentials::AccessKeys;
use crate::error::FetchError;
use crate::httpagent::HttpAgent;
use crate::naming::{last_segment, resolve_file_name};
use crate::report::format_elapsed;
use crate::s3agent::{S3Agent, S3Options};

/// Progress bars are only drawn when one download runs at a time.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FetchMode {
    Single,
    Parallel,
}

impl FetchMode {
    pub fn for_concurrency(concurrency: usize) -> Self {
        if concurrency > 1 {
            FetchMode::Parallel
        } else {
            FetchMode::Single
        }
    }
}

/// One URL plus the run-wide settings it is downloaded with.
#[derive(Clone, Debug)]
pub struct DownloadRequest {
    pub url: String,
    pub save_dir: PathBuf,
    pub timeout: Duration,
    pub concurrency: usize,
    pub credentials: Option<Arc<AccessKeys>>,
}

impl DownloadRequest {
    pub fn mode(&self) -> FetchMode {
        FetchMode::for_concurrency(self.concurrency)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    Success(Duration),
    Failed,
}

/// `identifier` is the absolute file path on success and the URL on failure.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DownloadResult {
    pub identifier: String,
    pub outcome: Outcome,
}

impl DownloadResult {
    pub fn failed(url: &str) -> Self {
        Self {
            identifier: url.to_owned(),
            outcome: Outcome::Failed,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self.outcome, Outcome::Success(_))
    }
}

#[derive(Clone, Debug, Default)]
pub struct Fetcher {
    s3: S3Options,
}

impl Fetcher {
    pub fn new(s3: S3Options) -> Self {
        Self { s3 }
    }

    /// Download one URL. Errors are logged here and never escape.
    pub async fn fetch(&self, request: &DownloadRequest) -> DownloadResult {
        match self.try_fetch(request).await {
            Ok((path, elapsed)) => DownloadResult {
                identifier: path.display().to_string(),
                outcome: Outcome::Success(elapsed),
            },
            Err(e) => {
                report_failure(&request.url, &e);
                DownloadResult::failed(&request.url)
            }
        }
    }

    pub async fn try_fetch(
        &self,
        request: &DownloadRequest,
    ) -> Result<(PathBuf, Duration), FetchError> {
        let url = parse_url(&request.url)?;
        let scheme = url.scheme();
        if !matches!(scheme, "http" | "https" | "s3") {
            return Err(FetchError::UnsupportedScheme {
                scheme: scheme.to_owned(),
                url: request.url.clone(),
            });
        }
        let file_name = resolve_file_name(&url)
            .ok_or_else(|| FetchError::NoFileName(request.url.clone()))?;

        fs::create_dir_all(&request.save_dir).await?;
        let file_path = request.save_dir.join(&file_name);
        let absolute_path = path::absolute(&file_path).unwrap_or_else(|_| file_path.clone());
        let show_progress = request.mode() == FetchMode::Single;

        info!("Starting download of {} from {}", file_name, request.url);
        info!("File path:    {}", file_path.display());

        let started = Instant::now();
        let written = if scheme == "s3" {
            let bucket = url
                .host_str()
                .filter(|host| !host.is_empty())
                .ok_or_else(|| FetchError::NoBucket(request.url.clone()))?;
            // checked by resolve_file_name above
            let key = last_segment(&url).unwrap_or_default();
            self.fetch_s3(request, bucket, key, &file_path, show_progress)
                .await?
        } else {
            let agent = HttpAgent::new(request.timeout)?;
            agent.download(&request.url, &file_path, show_progress).await?
        };
        let elapsed = Duration::from_secs(started.elapsed().as_secs());

        info!("Finished downloading {} from {} ({} bytes)", file_name, request.url, written);
        info!("File path:     {}", absolute_path.display());
        info!("Download time: {}", format_elapsed(elapsed));

        Ok((absolute_path, elapsed))
    }

    /// A bucket outside the resolved region answers with a redirect naming
    /// its region; follow it once.
    async fn fetch_s3(
        &self,
        request: &DownloadRequest,
        bucket: &str,
        key: &str,
        file_path: &Path,
        show_progress: bool,
    ) -> Result<u64, FetchError> {
        let keys = request.credentials.as_deref();
        let agent = S3Agent::new(bucket, keys, &self.s3, request.timeout).await?;
        match agent.download(key, file_path, show_progress).await {
            Err(FetchError::WrongRegion(region)) => {
                info!("Bucket {} is in region {}, retrying there", bucket, region);
                let options = S3Options {
                    region: Some(region),
                    ..self.s3.clone()
                };
                let agent = S3Agent::new(bucket, keys, &options, request.timeout).await?;
                agent.download(key, file_path, show_progress).await
            }
            other => other,
        }
    }
}

fn parse_url(raw: &str) -> Result<Url, FetchError> {
    Url::parse(raw).map_err(|source| match source {
        url::ParseError::RelativeUrlWithoutBase => FetchError::MissingScheme(raw.to_owned()),
        source => FetchError::InvalidUrl {
            url: raw.to_owned(),
            source,
        },
    })
}

fn report_failure(url: &str, err: &FetchError) {
    match err {
        FetchError::MissingScheme(_) | FetchError::UnsupportedScheme { .. } => {
            error!("Error: {}", err)
        }
        _ => error!("FAILED to download {}: {}", url, err),
    }
    for line in err.hint() {
        info!("{}", line);
    }
    debug!("{:?}", err);
}
