use std::path::Path;
use std::time::Duration;

use reqwest::{header::CONTENT_TYPE, Client, StatusCode};

use crate::error::FetchError;
use crate::filesink::{progress_bar, save_bytes, save_stream};
use crate::report::describe_size;

// Some servers turn away clients that do not look like a browser.
const USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_10_1) AppleWebKit/537.36 \
                          (KHTML, like Gecko) Chrome/39.0.2171.95 Safari/537.36";

#[derive(Clone, Debug)]
pub struct HttpAgent {
    client: Client,
}

impl HttpAgent {
    pub fn new(timeout: Duration) -> Result<Self, FetchError> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .connect_timeout(timeout)
            .read_timeout(timeout)
            .build()?;
        Ok(Self { client })
    }

    /// GET `url` into `path`, returning the number of bytes written.
    ///
    /// Only a `200 OK` counts as success. Bodies with a known length are
    /// streamed; bodies without one are buffered and written at once.
    pub async fn download(
        &self,
        url: &str,
        path: &Path,
        show_progress: bool,
    ) -> Result<u64, FetchError> {
        let response = self.client.get(url).send().await?;
        if response.status() != StatusCode::OK {
            return Err(FetchError::BadStatus(response.status()));
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("unknown");
        info!("Content type: {}", content_type);

        let total = response.content_length();
        info!("File size:    {}", describe_size(total));
        info!("Downloading...");

        match total {
            Some(_) => {
                let progress = progress_bar(total, show_progress);
                save_stream(path, response.bytes_stream(), &progress).await
            }
            None => {
                let body = response.bytes().await?;
                save_bytes(path, &body).await
            }
        }
    }
}
