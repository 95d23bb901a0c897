use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;

use crate::credentials::AccessKeys;
use crate::error::ConfigError;
use crate::fetcher::{DownloadRequest, DownloadResult, FetchMode, Fetcher};
use crate::s3agent::S3Options;

/// Settings shared by every download in a run.
#[derive(Clone, Debug)]
pub struct RunSettings {
    pub save_dir: PathBuf,
    pub concurrency: usize,
    pub timeout: Duration,
    pub credentials: Option<Arc<AccessKeys>>,
    pub s3: S3Options,
}

/// Split the raw `--download` values on commas and whitespace, keeping the
/// first occurrence of every URL.
pub fn collect_urls<S: AsRef<str>>(raw: &[S]) -> Vec<String> {
    let mut seen = HashSet::new();
    raw.iter()
        .flat_map(|value| value.as_ref().split(|c: char| c == ',' || c.is_whitespace()))
        .filter(|url| !url.is_empty())
        .filter(|url| seen.insert(url.to_string()))
        .map(str::to_owned)
        .collect()
}

pub fn check_plan(urls: &[String], concurrency: usize) -> Result<(), ConfigError> {
    if urls.is_empty() {
        return Err(ConfigError::NoUrls);
    }
    if concurrency > urls.len() {
        return Err(ConfigError::TooManyWorkers {
            concurrency,
            files: urls.len(),
        });
    }
    Ok(())
}

/// Download every distinct URL and return one result per URL, in the order
/// the URLs were given.
pub async fn run(
    urls: &[String],
    settings: &RunSettings,
) -> Result<Vec<DownloadResult>, ConfigError> {
    let urls = collect_urls(urls);
    check_plan(&urls, settings.concurrency)?;
    debug!("{:?}", settings);

    let fetcher = Fetcher::new(settings.s3.clone());
    let requests: Vec<DownloadRequest> = urls
        .iter()
        .map(|url| DownloadRequest {
            url: url.clone(),
            save_dir: settings.save_dir.clone(),
            timeout: settings.timeout,
            concurrency: settings.concurrency,
            credentials: settings.credentials.clone(),
        })
        .collect();

    let results = match FetchMode::for_concurrency(settings.concurrency) {
        FetchMode::Single => run_serial(&fetcher, requests).await,
        FetchMode::Parallel => run_parallel(&fetcher, requests, settings.concurrency).await,
    };
    Ok(results)
}

async fn run_serial(fetcher: &Fetcher, requests: Vec<DownloadRequest>) -> Vec<DownloadResult> {
    let mut results = Vec::with_capacity(requests.len());
    for (i, request) in requests.iter().enumerate() {
        info!("# {}", i + 1);
        results.push(fetcher.fetch(request).await);
    }
    results
}

async fn run_parallel(
    fetcher: &Fetcher,
    requests: Vec<DownloadRequest>,
    num_workers: usize,
) -> Vec<DownloadResult> {
    info!("Running {} downloads in parallel", num_workers);

    let mut results: Vec<Option<DownloadResult>> = vec![None; requests.len()];
    let urls: Vec<String> = requests.iter().map(|r| r.url.clone()).collect();

    // Bounded so that only num_workers requests are queued ahead of the workers
    let (tx, rx) = async_channel::bounded::<(usize, DownloadRequest)>(num_workers);
    let feeder = tokio::spawn(async move {
        for job in requests.into_iter().enumerate() {
            if tx.send(job).await.is_err() {
                error!("error sending download request to workers");
                break;
            }
        }
        tx.close();
    });

    let (result_tx, mut result_rx) = mpsc::channel::<(usize, DownloadResult)>(num_workers);

    let mut handles = Vec::with_capacity(num_workers + 1);
    handles.push(feeder);
    for _ in 0..num_workers {
        let rx = rx.clone();
        let result_tx = result_tx.clone();
        let fetcher = fetcher.clone();
        handles.push(tokio::spawn(async move {
            while let Ok((index, request)) = rx.recv().await {
                let result = fetcher.fetch(&request).await;
                if result_tx.send((index, result)).await.is_err() {
                    error!("error sending result for {} back to channel", request.url);
                }
            }
        }));
    }
    // Only the workers hold senders now, so the loop below ends once they finish
    drop(result_tx);

    while let Some((index, result)) = result_rx.recv().await {
        results[index] = Some(result);
    }

    for outcome in futures::future::join_all(handles).await {
        if let Err(e) = outcome {
            error!("download worker stopped unexpectedly: {}", e);
        }
    }

    results
        .into_iter()
        .zip(urls)
        .map(|(result, url)| result.unwrap_or_else(|| DownloadResult::failed(&url)))
        .collect()
}
