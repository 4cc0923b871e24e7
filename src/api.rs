// API client module: small blocking HTTP clients for the two remote
// services the uploader talks to.
// - `CatApiClient` downloads a captioned cat picture (cataas.com).
// - `DiskClient` creates folders and uploads files on a Yandex.Disk-style
//   REST API, authenticated with an OAuth token.
// Both sit behind a trait so the workflow can be exercised without a network.

use anyhow::{Context, Result};
use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{StatusCode, Url};
use serde::Deserialize;
use std::fmt;
use std::time::Duration;
use tracing::debug;

use crate::error::UploadError;

/// Build the blocking HTTP client shared by every call. The timeout bounds
/// each request as a whole (connect, send and read).
pub fn http_client(timeout: Duration) -> Result<Client> {
    Client::builder()
        .timeout(timeout)
        .build()
        .context("Failed to build HTTP client")
}

/// OAuth token for the storage API. Kept opaque so it never ends up in
/// `Debug` output or log lines by accident.
#[derive(Clone)]
pub struct AuthToken(String);

impl AuthToken {
    pub fn new(token: impl Into<String>) -> Self {
        AuthToken(token.into())
    }

    /// Raw token value, only meant for building the Authorization header.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AuthToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AuthToken(***)")
    }
}

/// Image bytes as returned by the image service.
#[derive(Debug, Clone)]
pub struct FetchedImage {
    pub bytes: Vec<u8>,
}

impl FetchedImage {
    pub fn size_bytes(&self) -> usize {
        self.bytes.len()
    }
}

/// Something that can produce a picture for a caption.
pub trait ImageSource {
    fn fetch(&self, caption: &str) -> Result<FetchedImage, UploadError>;
}

/// Remote disk operations needed by the upload workflow.
pub trait CloudStorage {
    /// Create `path`. A folder that already exists counts as success.
    fn ensure_folder(&self, token: &AuthToken, path: &str) -> Result<(), UploadError>;

    /// Upload `bytes` to `remote_path`, overwriting any existing file.
    fn upload_file(
        &self,
        token: &AuthToken,
        bytes: &[u8],
        remote_path: &str,
        content_type: &str,
    ) -> Result<(), UploadError>;
}

impl<T: ImageSource + ?Sized> ImageSource for &T {
    fn fetch(&self, caption: &str) -> Result<FetchedImage, UploadError> {
        (**self).fetch(caption)
    }
}

impl<T: CloudStorage + ?Sized> CloudStorage for &T {
    fn ensure_folder(&self, token: &AuthToken, path: &str) -> Result<(), UploadError> {
        (**self).ensure_folder(token, path)
    }

    fn upload_file(
        &self,
        token: &AuthToken,
        bytes: &[u8],
        remote_path: &str,
        content_type: &str,
    ) -> Result<(), UploadError> {
        (**self).upload_file(token, bytes, remote_path, content_type)
    }
}

/// Append `segments` to the path of `base`. Each segment is percent-encoded
/// on its own, so a caption containing `/` or `?` stays a single segment.
///
/// `.` and `..` are rejected: url parsing drops them (and their `%2E`
/// spellings) as dot segments, so they cannot reach the server as text.
fn endpoint(base: &Url, segments: &[&str]) -> Result<Url, UploadError> {
    if let Some(dot) = segments.iter().find(|s| matches!(**s, "." | "..")) {
        return Err(UploadError::DotSegment {
            segment: dot.to_string(),
        });
    }
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|_| UploadError::InvalidBaseUrl {
            url: base.to_string(),
        })?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

/// Client for the cat picture service.
#[derive(Clone)]
pub struct CatApiClient {
    client: Client,
    base_url: Url,
}

impl CatApiClient {
    pub fn new(client: Client, base_url: Url) -> Self {
        CatApiClient { client, base_url }
    }
}

impl ImageSource for CatApiClient {
    /// GET `/cat/says/<caption>`. Only a 200 answer is accepted.
    fn fetch(&self, caption: &str) -> Result<FetchedImage, UploadError> {
        const ACTION: &str = "fetch image";

        let url = endpoint(&self.base_url, &["cat", "says", caption])?;
        debug!(%url, "Requesting cat image");

        let res = self
            .client
            .get(url)
            .send()
            .map_err(|source| UploadError::Network { action: ACTION, source })?;
        if res.status() != StatusCode::OK {
            return Err(UploadError::Status {
                action: ACTION,
                status: res.status(),
            });
        }

        let bytes = res
            .bytes()
            .map_err(|source| UploadError::Network { action: ACTION, source })?;
        Ok(FetchedImage {
            bytes: bytes.to_vec(),
        })
    }
}

/// Answer of the upload-link endpoint. Other fields (`method`,
/// `templated`, `operation_id`) are ignored.
#[derive(Deserialize, Debug)]
struct UploadLink {
    href: String,
}

/// Client for the disk REST API (`/v1/disk/...`).
#[derive(Clone)]
pub struct DiskClient {
    client: Client,
    base_url: Url,
}

impl DiskClient {
    pub fn new(client: Client, base_url: Url) -> Self {
        DiskClient { client, base_url }
    }

    /// Build the `Authorization: OAuth <token>` header. The value is marked
    /// sensitive so reqwest keeps it out of its own debug output.
    fn auth_headers(token: &AuthToken) -> Result<HeaderMap, UploadError> {
        let mut value = HeaderValue::from_str(&format!("OAuth {}", token.expose()))
            .map_err(|_| UploadError::InvalidToken)?;
        value.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, value);
        Ok(headers)
    }

    /// First phase of an upload: ask for a one-time URL for `remote_path`.
    fn upload_link(&self, token: &AuthToken, remote_path: &str) -> Result<UploadLink, UploadError> {
        const ACTION: &str = "get upload link";

        let url = endpoint(&self.base_url, &["v1", "disk", "resources", "upload"])?;
        let res = self
            .client
            .get(url)
            .headers(Self::auth_headers(token)?)
            .query(&[("path", remote_path), ("overwrite", "true")])
            .send()
            .map_err(|source| UploadError::Network { action: ACTION, source })?;
        if res.status() != StatusCode::OK {
            return Err(UploadError::Status {
                action: ACTION,
                status: res.status(),
            });
        }

        res.json()
            .map_err(|source| UploadError::InvalidResponse { action: ACTION, source })
    }
}

impl CloudStorage for DiskClient {
    fn ensure_folder(&self, token: &AuthToken, path: &str) -> Result<(), UploadError> {
        const ACTION: &str = "create folder";

        let url = endpoint(&self.base_url, &["v1", "disk", "resources"])?;
        debug!(%url, folder = path, "Creating folder");

        let res = self
            .client
            .put(url)
            .headers(Self::auth_headers(token)?)
            .query(&[("path", path)])
            .send()
            .map_err(|source| UploadError::Network { action: ACTION, source })?;
        match res.status() {
            // 409: the folder is already there
            StatusCode::CREATED | StatusCode::CONFLICT => Ok(()),
            status => Err(UploadError::Status { action: ACTION, status }),
        }
    }

    fn upload_file(
        &self,
        token: &AuthToken,
        bytes: &[u8],
        remote_path: &str,
        content_type: &str,
    ) -> Result<(), UploadError> {
        const ACTION: &str = "upload file";

        let link = self.upload_link(token, remote_path)?;
        debug!(href = %link.href, path = remote_path, size = bytes.len(), "Uploading file");

        // The upload URL is pre-authorized, no token goes along with the body.
        let res = self
            .client
            .put(&link.href)
            .header(CONTENT_TYPE, content_type)
            .body(bytes.to_vec())
            .send()
            .map_err(|source| UploadError::Network { action: ACTION, source })?;
        if res.status() != StatusCode::CREATED {
            return Err(UploadError::Status {
                action: ACTION,
                status: res.status(),
            });
        }
        Ok(())
    }
}
