//! Minimal S3 client: signed single-part `PUT` with path-style addressing.
//!
//! Files are read twice: once to hash the payload for the signature and
//! once while streaming the body, so memory use does not grow with file size.

use std::path::Path;
use std::time::Duration;

use chrono::Utc;
use reqwest::header::CONTENT_LENGTH;
use reqwest::{Body, Client};
use sha2::{Digest, Sha256};
use tokio::fs::File;
use tokio::io::AsyncReadExt;
use tokio_util::io::ReaderStream;
use tracing::debug;
use url::Url;

use crate::error::{Error, Result};
use crate::ports::{Credentials, ObjectUploader};

use super::sigv4::{self, SigningRequest};

const SERVICE: &str = "s3";
const READ_CHUNK: usize = 64 * 1024;

fn read_error(path: &Path, e: std::io::Error) -> Error {
    Error::Transfer(format!("cannot read {}: {}", path.display(), e))
}

/// Hex SHA-256 and length of the file at `path`, read in chunks.
async fn hash_file(path: &Path) -> Result<(String, u64)> {
    let mut file = File::open(path).await.map_err(|e| read_error(path, e))?;
    let mut hasher = Sha256::new();
    let mut buffer = vec![0u8; READ_CHUNK];
    let mut size = 0u64;
    loop {
        let read = file.read(&mut buffer).await.map_err(|e| read_error(path, e))?;
        if read == 0 {
            break;
        }
        hasher.update(&buffer[..read]);
        size += read as u64;
    }
    Ok((hex::encode(hasher.finalize()), size))
}

#[derive(Debug, Clone)]
pub struct S3Client {
    http: Client,
    endpoint: Url,
    region: String,
    credentials: Credentials,
}

impl S3Client {
    /// Build a client for `region`. Without an explicit endpoint the regional
    /// AWS endpoint is used.
    pub fn new(
        endpoint: Option<&str>,
        region: impl Into<String>,
        credentials: Credentials,
        request_timeout: Duration,
    ) -> Result<Self> {
        let region = region.into();
        let endpoint = match endpoint.map(str::trim).filter(|e| !e.is_empty()) {
            Some(endpoint) => endpoint.trim_end_matches('/').to_string(),
            None => format!("https://s3.{}.amazonaws.com", region),
        };
        let endpoint = Url::parse(&endpoint)
            .map_err(|e| Error::Config(format!("invalid object store endpoint {:?}: {}", endpoint, e)))?;
        if endpoint.host_str().is_none() {
            return Err(Error::Config(format!("object store endpoint {} has no host", endpoint)));
        }

        let http = Client::builder().timeout(request_timeout).build()?;

        Ok(Self {
            http,
            endpoint,
            region,
            credentials,
        })
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    fn object_url(&self, bucket: &str, key: &str) -> Result<Url> {
        let base = self.endpoint.as_str().trim_end_matches('/');
        let raw = format!(
            "{}/{}/{}",
            base,
            sigv4::uri_encode(bucket, false),
            sigv4::uri_encode(key, true)
        );
        Url::parse(&raw).map_err(|e| Error::Transfer(format!("invalid object url {}: {}", raw, e)))
    }

    fn host_header(url: &Url) -> String {
        let host = url.host_str().unwrap_or_default();
        match url.port() {
            Some(port) => format!("{}:{}", host, port),
            None => host.to_string(),
        }
    }
}

impl ObjectUploader for S3Client {
    async fn put_file(&self, bucket: &str, key: &str, path: &Path) -> Result<u64> {
        let url = self.object_url(bucket, key)?;
        let host = Self::host_header(&url);
        let (payload_sha256, size) = hash_file(path).await?;
        let signed = sigv4::sign(
            &SigningRequest {
                method: "PUT",
                host: &host,
                canonical_uri: url.path(),
                payload_sha256: &payload_sha256,
            },
            &self.credentials,
            &self.region,
            SERVICE,
            Utc::now(),
        );

        // A file that changed after hashing fails the store's content check.
        let file = File::open(path).await.map_err(|e| read_error(path, e))?;
        let body = Body::wrap_stream(ReaderStream::with_capacity(file.take(size), READ_CHUNK));
        let mut request = self.http.put(url).header(CONTENT_LENGTH, size).body(body);
        for (name, value) in signed.pairs() {
            request = request.header(name, value);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(Error::Transfer(format!(
                "PUT s3://{}/{} failed with {}: {}",
                bucket,
                key,
                status,
                detail.trim()
            )));
        }

        debug!(bucket, key, bytes = size, "Uploaded object");
        Ok(size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;
    use wiremock::matchers::{body_bytes, header, header_exists, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(endpoint: &str) -> S3Client {
        S3Client::new(
            Some(endpoint),
            "us-east-1",
            Credentials::new("AKIDEXAMPLE", "secret"),
            Duration::from_secs(5),
        )
        .unwrap()
    }

    #[test]
    fn test_default_endpoint_uses_region() {
        let client = S3Client::new(
            None,
            "eu-west-1",
            Credentials::new("AKID", "secret"),
            Duration::from_secs(5),
        )
        .unwrap();
        assert_eq!(client.endpoint().as_str(), "https://s3.eu-west-1.amazonaws.com/");
        assert_eq!(client.region(), "eu-west-1");
    }

    #[test]
    fn test_invalid_endpoint_rejected() {
        let err = S3Client::new(
            Some("not a url"),
            "us-east-1",
            Credentials::new("AKID", "secret"),
            Duration::from_secs(5),
        )
        .unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_object_url_is_path_style() {
        let client = client("http://localhost:9000/");
        let url = client.object_url("archive", "logs/J1/std out").unwrap();
        assert_eq!(url.as_str(), "http://localhost:9000/archive/logs/J1/std%20out");
        assert_eq!(S3Client::host_header(&url), "localhost:9000");
    }

    #[tokio::test]
    async fn test_hash_file_reads_in_chunks() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("big");
        let data = vec![7u8; READ_CHUNK * 3 + 5];
        std::fs::write(&file, &data).unwrap();

        let (hash, size) = hash_file(&file).await.unwrap();
        assert_eq!(hash, sigv4::sha256_hex(&data));
        assert_eq!(size, data.len() as u64);
    }

    #[tokio::test]
    async fn test_put_file_sends_signed_request() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/archive/logs/J1/stdout"))
            .and(header_exists("authorization"))
            .and(header_exists("x-amz-date"))
            .and(header("x-amz-content-sha256", sigv4::sha256_hex(b"hello").as_str()))
            .and(header("content-length", "5"))
            .and(body_bytes(b"hello".to_vec()))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let dir = tempdir().unwrap();
        let file = dir.path().join("stdout");
        std::fs::write(&file, b"hello").unwrap();

        let sent = client(&server.uri())
            .put_file("archive", "logs/J1/stdout", &file)
            .await
            .unwrap();
        assert_eq!(sent, 5);
    }

    #[tokio::test]
    async fn test_put_file_error_status_is_transfer_error() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .respond_with(ResponseTemplate::new(403).set_body_string("AccessDenied"))
            .mount(&server)
            .await;

        let dir = tempdir().unwrap();
        let file = dir.path().join("empty");
        std::fs::write(&file, b"").unwrap();

        let err = client(&server.uri())
            .put_file("archive", "k", &file)
            .await
            .unwrap_err();
        match err {
            Error::Transfer(message) => assert!(message.contains("AccessDenied")),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_put_file_missing_file_is_transfer_error() {
        let dir = tempdir().unwrap();
        let err = client("http://localhost:9000")
            .put_file("archive", "k", &dir.path().join("absent"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Transfer(_)));
    }
}
