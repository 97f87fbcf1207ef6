use partsbin_core::PartImage;
use reqwest::multipart::{Form, Part};
use reqwest::Url;

use super::{check_status, InventoryClient, BROWSER_UA};
use crate::error::ClientError;
use crate::retry::retry_with_backoff;

const OCTET_STREAM: &str = "application/octet-stream";

/// Raw image bytes plus the content type reported by whoever served them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedImage {
    pub bytes: Vec<u8>,
    pub content_type: String,
}

impl FetchedImage {
    /// File name sent in the multipart upload, e.g. `image.png`.
    #[must_use]
    pub fn file_name(&self) -> String {
        let ext = match self.content_type.as_str() {
            "image/png" => "png",
            "image/jpeg" | "image/jpg" => "jpg",
            "image/gif" => "gif",
            "image/webp" => "webp",
            "image/svg+xml" => "svg",
            "image/bmp" => "bmp",
            _ => "bin",
        };
        format!("image.{ext}")
    }
}

impl InventoryClient {
    /// Downloads the bytes behind `fetch_url`, which is either a proxy URL
    /// produced by [`crate::ProxyResolver::resolve`] or a direct origin URL.
    ///
    /// Direct fetches carry browser-like headers and a `Referer` of the
    /// image's own origin. Transient failures are retried.
    ///
    /// # Errors
    ///
    /// - [`ClientError::InvalidUrl`] if `fetch_url` does not parse.
    /// - [`ClientError::Api`] if the proxy or origin answers non-2xx.
    /// - [`ClientError::EmptyBody`] if the response has no bytes.
    /// - [`ClientError::Http`] on network failure after retries.
    pub async fn fetch_image(&self, fetch_url: &str) -> Result<FetchedImage, ClientError> {
        let url = Url::parse(fetch_url).map_err(|e| ClientError::InvalidUrl {
            url: fetch_url.to_owned(),
            reason: e.to_string(),
        })?;
        let direct = url.origin() != self.base_url.origin();
        let referer = format!("{}/", url.origin().ascii_serialization());

        retry_with_backoff(self.max_retries, self.backoff_base_ms, || {
            let url = url.clone();
            let referer = referer.clone();
            async move {
                let mut request = self
                    .client
                    .get(url.clone())
                    .header(reqwest::header::ACCEPT, "image/*, */*;q=0.8");
                if direct {
                    request = request
                        .header(reqwest::header::USER_AGENT, BROWSER_UA)
                        .header(reqwest::header::ACCEPT_LANGUAGE, "en-US,en;q=0.5")
                        .header(reqwest::header::REFERER, referer);
                }

                let response = check_status(request.send().await?).await?;
                let content_type = normalize_content_type(
                    response
                        .headers()
                        .get(reqwest::header::CONTENT_TYPE)
                        .and_then(|v| v.to_str().ok()),
                );
                let bytes = response.bytes().await?;
                if bytes.is_empty() {
                    return Err(ClientError::EmptyBody {
                        url: url.to_string(),
                    });
                }
                Ok(FetchedImage {
                    bytes: bytes.to_vec(),
                    content_type,
                })
            }
        })
        .await
    }

    /// Uploads image bytes as a new image attached to `part_id`.
    ///
    /// Sent as multipart form data with a single `file` field. Not retried.
    ///
    /// # Errors
    ///
    /// - [`ClientError::Api`] if the server rejects the image (unknown part,
    ///   unreadable image, per-part image limit reached).
    /// - [`ClientError::Http`] on network failure.
    /// - [`ClientError::Deserialize`] if the response shape is unexpected.
    pub async fn upload_image(
        &self,
        part_id: i64,
        image: FetchedImage,
    ) -> Result<PartImage, ClientError> {
        let url = self.build_url(&format!("parts/{part_id}/images"), &[])?;
        let file_name = image.file_name();
        let file = Part::bytes(image.bytes)
            .file_name(file_name)
            .mime_str(&image.content_type)?;
        let form = Form::new().part("file", file);

        let response = self.client.post(url).multipart(form).send().await?;
        let response = check_status(response).await?;
        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| ClientError::Deserialize {
            context: format!("parts/{part_id}/images"),
            source: e,
        })
    }
}

/// Lower-cased `type/subtype` with parameters stripped; anything that does
/// not look like a media type becomes `application/octet-stream`.
pub(super) fn normalize_content_type(raw: Option<&str>) -> String {
    let Some(raw) = raw else {
        return OCTET_STREAM.to_string();
    };
    let essence = raw.split(';').next().unwrap_or("").trim().to_ascii_lowercase();
    let valid = essence.split_once('/').is_some_and(|(t, s)| {
        let token = |p: &str| {
            !p.is_empty()
                && p.chars()
                    .all(|c| c.is_ascii_alphanumeric() || "!#$&-^_.+".contains(c))
        };
        token(t) && token(s)
    });
    if valid {
        essence
    } else {
        OCTET_STREAM.to_string()
    }
}
