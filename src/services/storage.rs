use async_trait::async_trait;
use s3::creds::Credentials;
use s3::{Bucket, Region};
use url::Url;

use crate::services::traits::ObjectStorage;

/// Client for S3-compatible object storage with public-read uploads.
pub struct S3Client {
    bucket: Box<Bucket>,
    public_base: String,
}

impl S3Client {
    pub fn new(
        bucket_name: &str,
        endpoint: &str,
        region: &str,
        access_key: &str,
        secret_key: &str,
        public_url: Option<&str>,
    ) -> Result<Self, StorageError> {
        let (base_endpoint, host) = normalize_endpoint(endpoint, bucket_name)?;

        let region = Region::Custom {
            region: region.to_string(),
            endpoint: base_endpoint,
        };

        let credentials = Credentials::new(Some(access_key), Some(secret_key), None, None, None)
            .map_err(|e| StorageError::Config(e.to_string()))?;

        let mut bucket = Bucket::new(bucket_name, region, credentials)
            .map_err(|e| StorageError::Config(e.to_string()))?;
        bucket.add_header("x-amz-acl", "public-read");

        let public_base = match public_url {
            Some(url) if !url.trim().is_empty() => url.trim().trim_end_matches('/').to_string(),
            _ => format!("https://{bucket_name}.{host}"),
        };

        Ok(Self {
            bucket,
            public_base,
        })
    }

    pub fn public_url(&self, key: &str) -> String {
        format!("{}/{}", self.public_base, key.trim_start_matches('/'))
    }

    pub async fn delete(&self, key: &str) -> Result<(), StorageError> {
        self.bucket.delete_object(key).await.map_err(StorageError::S3)?;
        Ok(())
    }
}

#[async_trait]
impl ObjectStorage for S3Client {
    async fn upload(
        &self,
        key: &str,
        data: &[u8],
        content_type: &str,
    ) -> Result<String, StorageError> {
        let response = self
            .bucket
            .put_object_with_content_type(key, data, content_type)
            .await
            .map_err(StorageError::S3)?;
        check_status(response.status_code())?;
        Ok(self.public_url(key))
    }
}

fn check_status(code: u16) -> Result<(), StorageError> {
    if (200..300).contains(&code) {
        Ok(())
    } else {
        Err(StorageError::Status(code))
    }
}

/// Split a configured endpoint into the API base URL and the bare host used
/// for public URLs. A bucket-prefixed host (`bucket.region.example.com`) is
/// stripped back to the region host.
fn normalize_endpoint(endpoint: &str, bucket: &str) -> Result<(String, String), StorageError> {
    let trimmed = endpoint.trim();
    if trimmed.is_empty() {
        return Err(StorageError::Config("s3 endpoint is empty".to_string()));
    }

    let with_scheme = if trimmed.contains("://") {
        trimmed.to_string()
    } else {
        format!("https://{trimmed}")
    };

    let parsed = Url::parse(&with_scheme)
        .map_err(|e| StorageError::Config(format!("invalid s3 endpoint: {e}")))?;
    let mut host = parsed
        .host_str()
        .ok_or_else(|| StorageError::Config(format!("invalid s3 endpoint host: {endpoint}")))?
        .to_string();

    if !bucket.is_empty() {
        if let Some(stripped) = host.strip_prefix(&format!("{bucket}.")) {
            host = stripped.to_string();
        }
    }

    Ok((format!("{}://{}", parsed.scheme(), host), host))
}

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("S3 operation failed: {0}")]
    S3(#[from] s3::error::S3Error),

    #[error("S3 returned HTTP {0}")]
    Status(u16),

    #[error("Storage configuration error: {0}")]
    Config(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_endpoint_adds_scheme() {
        let (base, host) = normalize_endpoint("nyc3.digitaloceanspaces.com", "media").unwrap();
        assert_eq!(base, "https://nyc3.digitaloceanspaces.com");
        assert_eq!(host, "nyc3.digitaloceanspaces.com");
    }

    #[test]
    fn test_normalize_endpoint_strips_bucket() {
        let (base, host) =
            normalize_endpoint("https://media.nyc3.digitaloceanspaces.com/", "media").unwrap();
        assert_eq!(base, "https://nyc3.digitaloceanspaces.com");
        assert_eq!(host, "nyc3.digitaloceanspaces.com");
    }

    #[test]
    fn test_normalize_endpoint_rejects_empty() {
        assert!(matches!(
            normalize_endpoint("  ", "media"),
            Err(StorageError::Config(_))
        ));
    }

    #[test]
    fn test_public_url_layout() {
        let client = S3Client::new(
            "media",
            "nyc3.digitaloceanspaces.com",
            "nyc3",
            "key",
            "secret",
            None,
        )
        .unwrap();
        assert_eq!(
            client.public_url("screenshots/1.jpg"),
            "https://media.nyc3.digitaloceanspaces.com/screenshots/1.jpg"
        );

        let client = S3Client::new(
            "media",
            "https://r2.example.com",
            "auto",
            "key",
            "secret",
            Some("https://cdn.example.com/"),
        )
        .unwrap();
        assert_eq!(
            client.public_url("screenshots/1.jpg"),
            "https://cdn.example.com/screenshots/1.jpg"
        );
    }
}
