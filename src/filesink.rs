use std::path::Path;

use bytes::Bytes;
use futures_util::{pin_mut, Stream, StreamExt};
use indicatif::{ProgressBar, ProgressStyle};
use tokio::{fs, io::AsyncWriteExt};

use crate::error::FetchError;

pub const CHUNK_SIZE: usize = 4096;

/// Bar drawn while a single download runs; hidden when several run at once.
pub fn progress_bar(total: Option<u64>, visible: bool) -> ProgressBar {
    match total {
        Some(total) if visible => {
            let style = ProgressStyle::with_template("[{bar:50}] {percent}%")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("= ");
            ProgressBar::new(total).with_style(style)
        }
        _ => ProgressBar::hidden(),
    }
}

/// Write `stream` to `path` in `CHUNK_SIZE` pieces. On any error the partial
/// file is removed before the error is returned.
pub async fn save_stream<S, E>(
    path: &Path,
    stream: S,
    progress: &ProgressBar,
) -> Result<u64, FetchError>
where
    S: Stream<Item = Result<Bytes, E>>,
    E: Into<FetchError>,
{
    let mut file = fs::File::create(path).await?;
    pin_mut!(stream);

    let written = async {
        let mut written = 0u64;
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| -> FetchError { e.into() })?;
            for piece in chunk.chunks(CHUNK_SIZE) {
                file.write_all(piece).await?;
                written += piece.len() as u64;
                progress.set_position(written);
            }
        }
        file.flush().await?;
        Ok::<_, FetchError>(written)
    }
    .await;

    drop(file);
    match written {
        Ok(written) => {
            progress.finish();
            Ok(written)
        }
        Err(e) => {
            progress.abandon();
            discard(path).await;
            Err(e)
        }
    }
}

/// Write a fully buffered body in one go, with the same cleanup rule.
pub async fn save_bytes(path: &Path, body: &[u8]) -> Result<u64, FetchError> {
    let mut file = fs::File::create(path).await?;
    let result = async {
        file.write_all(body).await?;
        file.flush().await
    }
    .await;

    drop(file);
    if let Err(e) = result {
        discard(path).await;
        return Err(e.into());
    }
    Ok(body.len() as u64)
}

async fn discard(path: &Path) {
    warn!("Deleting incomplete file {}", path.display());
    if let Err(e) = fs::remove_file(path).await {
        error!("could not delete incomplete file {}: {}", path.display(), e);
    }
}
