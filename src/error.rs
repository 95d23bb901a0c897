use std::io;

use thiserror::Error;

pub const SUPPORTED_SCHEMES: [&str; 3] = ["http://", "https://", "s3://"];

/// Why a single URL could not be downloaded. Never fatal to the run.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("protocol not detected in \"{0}\", please verify the URL")]
    MissingScheme(String),

    #[error("unsupported protocol {scheme} in {url}")]
    UnsupportedScheme { scheme: String, url: String },

    #[error("invalid URL {url}: {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("no file name in {0}")]
    NoFileName(String),

    #[error("no bucket name in {0}")]
    NoBucket(String),

    #[error("bad response code: {0}")]
    BadStatus(reqwest::StatusCode),

    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("write error: {0}")]
    Write(#[from] io::Error),

    #[error("invalid or missing credentials for S3: {0}")]
    Credentials(String),

    #[error("object not found: 404")]
    NotFound,

    #[error("access forbidden: 403")]
    Forbidden,

    #[error("bucket lives in region {0}")]
    WrongRegion(String),

    #[error("S3 client error: {0}")]
    S3(String),
}

impl FetchError {
    /// Follow-up lines printed under the error itself.
    pub fn hint(&self) -> Vec<String> {
        match self {
            FetchError::MissingScheme(url) => {
                let mut lines = vec!["Did you mean one of these?".to_string()];
                lines.extend(SUPPORTED_SCHEMES.iter().map(|p| format!("- {p}{url}")));
                lines
            }
            FetchError::UnsupportedScheme { .. } => vec![format!(
                "- Supported protocols: {}",
                SUPPORTED_SCHEMES
                    .iter()
                    .map(|p| format!("\"{p}\""))
                    .collect::<Vec<_>>()
                    .join(" ")
            )],
            FetchError::Credentials(_) => vec![
                "Try running with '--s3-credentials' and provide your AWS credentials".to_string(),
            ],
            _ => Vec::new(),
        }
    }
}

/// Invalid combination of arguments, detected before any download starts.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("must pass URL/s for file/s to download '-d or --download file1 file2 file3 ...'")]
    NoUrls,

    #[error(
        "concurrent downloads ({concurrency}) should not exceed number of files to download \
         ({files})"
    )]
    TooManyWorkers { concurrency: usize, files: usize },
}
