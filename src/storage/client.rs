//! S3-style object store client: existence checks and byte fetches.

use crate::error::AppError;
use reqwest::{Client, StatusCode};

#[derive(Clone)]
pub struct ObjectStoreClient {
    base_url: String,
    bucket: String,
    prefix: String,
    client: Client,
}

impl ObjectStoreClient {
    pub fn new(base_url: String, bucket: String, prefix: String) -> Self {
        Self {
            base_url,
            bucket,
            prefix,
            client: Client::new(),
        }
    }

    fn object_url(&self, filename: &str) -> String {
        format!(
            "{base_url}/{bucket}/{prefix}{filename}",
            base_url = self.base_url,
            bucket = self.bucket,
            prefix = self.prefix,
        )
    }

    /// Check whether an object exists, via a HEAD request.
    ///
    /// Any non-success status reads as "missing" so the HTTP layer can
    /// report a clean client error before attempting a fetch.
    pub async fn exists(&self, filename: &str) -> Result<bool, AppError> {
        let response = self
            .client
            .head(self.object_url(filename))
            .send()
            .await
            .map_err(|e| AppError::Storage(format!("HEAD request failed: {e}")))?;

        Ok(response.status().is_success())
    }

    /// Fetch an object's bytes.
    pub async fn fetch(&self, filename: &str) -> Result<Vec<u8>, AppError> {
        let response = self
            .client
            .get(self.object_url(filename))
            .send()
            .await
            .map_err(|e| AppError::Storage(format!("GET request failed: {e}")))?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(AppError::NotFound(format!(
                "object {filename} does not exist"
            )));
        }
        if !response.status().is_success() {
            return Err(AppError::Storage(format!(
                "fetch of {filename} failed with status {}",
                response.status()
            )));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| AppError::Storage(format!("failed to read object body: {e}")))?;

        Ok(bytes.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn object_urls_include_bucket_and_prefix() {
        let client = ObjectStoreClient::new(
            "http://localhost:9000".to_string(),
            "images".to_string(),
            "data/".to_string(),
        );

        assert_eq!(
            client.object_url("frame-001.fits.bz2"),
            "http://localhost:9000/images/data/frame-001.fits.bz2"
        );
    }
}
