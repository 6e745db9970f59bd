//! Sequential download of result chunks

use std::path::{Path, PathBuf};
use tracing::{info, warn};

use super::ExportClient;
use crate::error::DownloadError;
use crate::types::ResultChunk;

/// One fetched result file
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DownloadedChunk {
    /// 1-based position in the result listing
    pub index: usize,
    /// Raw file contents
    pub data: Vec<u8>,
    /// Where the file was saved, if a save directory was configured
    pub path: Option<PathBuf>,
    /// Row count declared by the listing, if any
    pub declared_rows: Option<u64>,
}

/// Fetches result chunks one at a time
///
/// Chunks are never fetched concurrently: the signed URLs are rate limited.
/// A failed chunk is reported to the caller and the next one is attempted.
#[derive(Debug)]
pub struct ResultDownloader<'a> {
    client: &'a ExportClient,
    save_dir: Option<&'a Path>,
}

impl<'a> ResultDownloader<'a> {
    /// Downloader that keeps chunks in memory only
    pub fn new(client: &'a ExportClient) -> Self {
        Self {
            client,
            save_dir: None,
        }
    }

    /// Also save each chunk as `csv_<index>.csv` under `dir`
    pub fn saving_to(mut self, dir: &'a Path) -> Self {
        self.save_dir = Some(dir);
        self
    }

    /// File name used for chunk `index`
    pub fn file_name(index: usize) -> String {
        format!("csv_{index}.csv")
    }

    /// Fetch chunk `index` (1-based)
    pub async fn fetch(
        &self,
        index: usize,
        chunk: &ResultChunk,
    ) -> Result<DownloadedChunk, DownloadError> {
        let url = chunk
            .url
            .as_deref()
            .filter(|u| !u.is_empty())
            .ok_or(DownloadError::MissingUrl { index })?;

        let transport = |e: reqwest::Error| DownloadError::Transport {
            index,
            reason: e.to_string(),
        };
        let response = self
            .client
            .download_request(url)
            .send()
            .await
            .map_err(transport)?;

        let status = response.status();
        if !status.is_success() {
            return Err(DownloadError::HttpStatus {
                index,
                status: status.as_u16(),
            });
        }
        let data = response.bytes().await.map_err(transport)?.to_vec();

        let path = match self.save_dir {
            Some(dir) => {
                let path = dir.join(Self::file_name(index));
                tokio::fs::write(&path, &data)
                    .await
                    .map_err(|e| DownloadError::WriteFailed {
                        index,
                        path: path.clone(),
                        reason: e.to_string(),
                    })?;
                Some(path)
            }
            None => None,
        };

        info!(
            chunk = index,
            rows = chunk.row_count,
            declared_bytes = chunk.file_size,
            bytes = data.len(),
            "Downloaded result chunk"
        );

        Ok(DownloadedChunk {
            index,
            data,
            path,
            declared_rows: chunk.row_count,
        })
    }

    /// Fetch every chunk in order, handing each outcome to `on_chunk`
    ///
    /// Returns how many chunks were fetched successfully.
    pub async fn fetch_each<F>(&self, chunks: &[ResultChunk], mut on_chunk: F) -> usize
    where
        F: FnMut(Result<DownloadedChunk, DownloadError>),
    {
        info!(count = chunks.len(), "Downloading result chunks");
        let mut fetched = 0;
        for (position, chunk) in chunks.iter().enumerate() {
            let outcome = self.fetch(position + 1, chunk).await;
            match &outcome {
                Ok(_) => fetched += 1,
                Err(e) => warn!(chunk = e.index(), error = %e, "Skipping result chunk"),
            }
            on_chunk(outcome);
        }
        fetched
    }
}
