//! Archive fetch trait and the HTTP implementation.

use async_trait::async_trait;
use log::debug;

use super::archive::ArchivePeriod;
use super::bulk_errors::BulkError;

/// Fetches one monthly regulator archive.
#[async_trait]
pub trait BulkArchiveSource: Send + Sync {
    async fn fetch_archive(&self, period: &ArchivePeriod) -> Result<Vec<u8>, BulkError>;
}

/// Downloads archives from the regulator's public HTTP endpoint.
pub struct HttpArchiveSource {
    client: reqwest::Client,
    base_url: String,
}

impl HttpArchiveSource {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }

    fn archive_url(&self, period: &ArchivePeriod) -> String {
        format!(
            "{}/holdings_{}.zip",
            self.base_url.trim_end_matches('/'),
            period.file_token()
        )
    }
}

#[async_trait]
impl BulkArchiveSource for HttpArchiveSource {
    async fn fetch_archive(&self, period: &ArchivePeriod) -> Result<Vec<u8>, BulkError> {
        let url = self.archive_url(period);
        debug!("Fetching bulk archive {}", url);
        let response = self
            .client
            .get(&url)
            .send()
            .await?
            .error_for_status()
            .map_err(|e| BulkError::Unavailable(format!("{}: {}", url, e)))?;
        let bytes = response.bytes().await?;
        Ok(bytes.to_vec())
    }
}
