use clap::Parser;

/// downloader - download files from http://, https:// and s3:// URLs, one at
/// a time or in parallel
#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// One or more space/comma separated URLs to download
    /// (ex. -d http://domain.com/file1 https://domain.com/file2 s3://bucket/file1)
    #[arg(short, long, num_args = 1..)]
    pub download: Vec<String>,
    /// Directory to save downloaded files to
    #[arg(short, long, default_value = ".")]
    pub path: String,
    /// Number of downloads to run in parallel (0 or 1 runs them one at a time)
    #[arg(short, long, default_value_t = 0)]
    pub concurrent: usize,
    /// Connect and read timeout for each download, in seconds
    #[arg(short, long, default_value_t = 30)]
    pub timeout: u64,
    /// Log full error details
    #[arg(short = 'b', long)]
    pub debug: bool,
    /// Prompt once for S3 credentials before downloading
    #[arg(short, long)]
    pub s3_credentials: bool,
    /// Show S3 credentials while typing them (with --s3-credentials)
    #[arg(short, long)]
    pub reveal_credentials: bool,
    /// Endpoint of an S3-compatible object store
    #[arg(long)]
    pub s3_endpoint: Option<String>,
    /// Region used for S3 requests (defaults to the AWS configuration, then us-east-1)
    #[arg(long)]
    pub s3_region: Option<String>,
}
