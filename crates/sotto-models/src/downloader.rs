//! Streaming HTTP downloads with progress reporting

use std::path::Path;
use std::time::Duration;

use bytes::Bytes;
use futures::stream::BoxStream;
use futures::StreamExt;
use serde::Serialize;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

use crate::error::ModelError;

/// Connection establishment timeout
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Maximum silence between two reads
pub const READ_TIMEOUT: Duration = Duration::from_secs(30);

/// Upper bound for a whole archive download
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30 * 60);

/// Download progress information
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DownloadProgress {
    /// Bytes downloaded so far
    pub bytes_downloaded: u64,
    /// Total bytes to download, if the server announced it
    pub total_bytes: Option<u64>,
    /// Whole percent complete, if the total is known
    pub percentage: Option<u8>,
}

/// An opened download: announced length plus the body as a chunk stream
pub struct TransportResponse {
    pub content_length: Option<u64>,
    pub body: BoxStream<'static, Result<Bytes, ModelError>>,
}

/// Byte source for archive downloads
#[trait_variant::make(Transport: Send)]
pub trait LocalTransport {
    /// Start fetching `url`
    async fn open(&self, url: &str) -> Result<TransportResponse, ModelError>;
}

/// [`Transport`] over HTTPS using reqwest
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new() -> Result<Self, ModelError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("sotto/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(CONNECT_TIMEOUT)
            .read_timeout(READ_TIMEOUT)
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self { client })
    }
}

impl Transport for HttpTransport {
    async fn open(&self, url: &str) -> Result<TransportResponse, ModelError> {
        let response = self.client.get(url).send().await?;

        if !response.status().is_success() {
            return Err(ModelError::DownloadFailed(format!(
                "HTTP error: {}",
                response.status()
            )));
        }

        Ok(TransportResponse {
            content_length: response.content_length(),
            body: response
                .bytes_stream()
                .map(|chunk| chunk.map_err(ModelError::from))
                .boxed(),
        })
    }
}

/// Downloads a URL to a file, reporting progress at whole-percent steps
pub struct ModelDownloader<T = HttpTransport> {
    transport: T,
}

impl<T: Transport + Sync> ModelDownloader<T> {
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    /// Download `url` to `dest`.
    ///
    /// Does nothing if `dest` already exists. Data is streamed into
    /// `{dest}.part` and renamed once complete.
    pub async fn download<F>(&self, url: &str, dest: &Path, mut on_progress: F) -> Result<(), ModelError>
    where
        F: FnMut(DownloadProgress) + Send,
    {
        if fs::try_exists(dest).await.unwrap_or(false) {
            info!("{} already present, skipping download", dest.display());
            return Ok(());
        }

        info!("Downloading {} to {}", url, dest.display());
        let response = self.transport.open(url).await?;
        let total = response.content_length.filter(|t| *t > 0);
        let mut body = response.body;

        let partial = dest.with_extension("part");
        let mut file = fs::File::create(&partial)
            .await
            .map_err(|e| ModelError::io(&partial, e))?;

        let mut downloaded: u64 = 0;
        let mut last_percentage: Option<u8> = None;

        while let Some(chunk) = body.next().await {
            let chunk = chunk?;
            file.write_all(&chunk)
                .await
                .map_err(|e| ModelError::io(&partial, e))?;
            downloaded += chunk.len() as u64;

            match total {
                Some(total) => {
                    let percentage = (downloaded.saturating_mul(100) / total).min(100) as u8;
                    if last_percentage.map_or(true, |last| percentage > last) {
                        last_percentage = Some(percentage);
                        on_progress(DownloadProgress {
                            bytes_downloaded: downloaded,
                            total_bytes: Some(total),
                            percentage: Some(percentage),
                        });
                    }
                }
                None => on_progress(DownloadProgress {
                    bytes_downloaded: downloaded,
                    total_bytes: None,
                    percentage: None,
                }),
            }
        }

        file.flush().await.map_err(|e| ModelError::io(&partial, e))?;
        drop(file);

        fs::rename(&partial, dest)
            .await
            .map_err(|e| ModelError::io(dest, e))?;

        debug!("Downloaded {} bytes from {}", downloaded, url);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::stream;

    struct ChunkedTransport {
        chunks: Vec<Vec<u8>>,
        announce_length: bool,
    }

    impl Transport for ChunkedTransport {
        async fn open(&self, _url: &str) -> Result<TransportResponse, ModelError> {
            let total: usize = self.chunks.iter().map(Vec::len).sum();
            let chunks: Vec<Result<Bytes, ModelError>> = self
                .chunks
                .iter()
                .cloned()
                .map(|c| Ok(Bytes::from(c)))
                .collect();
            Ok(TransportResponse {
                content_length: self.announce_length.then_some(total as u64),
                body: stream::iter(chunks).boxed(),
            })
        }
    }

    struct FailingTransport;

    impl Transport for FailingTransport {
        async fn open(&self, _url: &str) -> Result<TransportResponse, ModelError> {
            Ok(TransportResponse {
                content_length: Some(10),
                body: stream::iter(vec![
                    Ok(Bytes::from_static(b"12345")),
                    Err(ModelError::Timeout("read timed out".into())),
                ])
                .boxed(),
            })
        }
    }

    #[tokio::test]
    async fn test_progress_whole_percent() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("file.bin");
        // 400 chunks of 1 byte: 0.25% each
        let downloader = ModelDownloader::new(ChunkedTransport {
            chunks: vec![vec![1u8]; 400],
            announce_length: true,
        });

        let mut seen = Vec::new();
        downloader
            .download("mem://file", &dest, |p| seen.push(p))
            .await
            .unwrap();

        assert_eq!(std::fs::metadata(&dest).unwrap().len(), 400);
        assert_eq!(seen.len(), 101);
        assert_eq!(seen.last().unwrap().percentage, Some(100));
        assert!(seen.windows(2).all(|w| w[0].percentage < w[1].percentage));
    }

    #[tokio::test]
    async fn test_progress_unknown_total() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("file.bin");
        let downloader = ModelDownloader::new(ChunkedTransport {
            chunks: vec![vec![0u8; 10]; 5],
            announce_length: false,
        });

        let mut seen = Vec::new();
        downloader
            .download("mem://file", &dest, |p| seen.push(p))
            .await
            .unwrap();

        assert_eq!(seen.len(), 5);
        assert!(seen.iter().all(|p| p.percentage.is_none()));
        assert_eq!(seen[4].bytes_downloaded, 50);
    }

    #[tokio::test]
    async fn test_skips_existing_destination() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("file.bin");
        std::fs::write(&dest, b"existing").unwrap();

        let downloader = ModelDownloader::new(ChunkedTransport {
            chunks: vec![b"replacement".to_vec()],
            announce_length: true,
        });
        downloader.download("mem://file", &dest, |_| {}).await.unwrap();

        assert_eq!(std::fs::read(&dest).unwrap(), b"existing");
    }

    #[tokio::test]
    async fn test_stream_error_leaves_no_destination() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("file.bin");

        let err = ModelDownloader::new(FailingTransport)
            .download("mem://file", &dest, |_| {})
            .await
            .unwrap_err();

        assert!(matches!(err, ModelError::Timeout(_)));
        assert!(!dest.exists());
    }
}
