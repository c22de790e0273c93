//! Client of the remote commentary generation service.

use std::time::Duration;

use futures_util::StreamExt;
use newscast_bridge::{GenerationRequest, config::ServiceConfig};
use reqwest::Url;

use crate::media::AudioAsset;

/// Errors that can occur while requesting a commentary.
#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    /// The configured endpoint is not a valid URL.
    #[error("invalid commentary endpoint: {0}")]
    InvalidEndpoint(#[from] url::ParseError),
    /// The service answered with a non-success status. The message is the
    /// one the service provided.
    #[error("{message}")]
    Rejected { status: u16, message: String },
    /// The request could not be sent or the response body not be read.
    #[error("{0}")]
    Transport(#[from] reqwest::Error),
    #[error("the commentary service returned no audio")]
    EmptyAudio,
}

/// Produces commentary audio for an article.
#[async_trait::async_trait]
pub trait CommentaryService: Send + Sync {
    async fn generate(&self, request: &GenerationRequest) -> Result<AudioAsset, GenerationError>;
}

/// [`CommentaryService`] backed by the HTTP generation endpoint.
#[derive(Debug, Clone)]
pub struct HttpCommentaryService {
    client: reqwest::Client,
    endpoint: Url,
}

impl HttpCommentaryService {
    pub fn new(config: &ServiceConfig) -> Result<Self, GenerationError> {
        let endpoint = Url::parse(&config.endpoint)?;
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;
        Ok(Self { client, endpoint })
    }
}

#[async_trait::async_trait]
impl CommentaryService for HttpCommentaryService {
    async fn generate(&self, request: &GenerationRequest) -> Result<AudioAsset, GenerationError> {
        log::info!(
            "Requesting {} commentary for {} from {}",
            request.style,
            request.url,
            self.endpoint
        );

        let response = self
            .client
            .post(self.endpoint.clone())
            .json(request)
            .send()
            .await
            .map_err(reqwest::Error::without_url)?;

        let status = response.status();
        if !status.is_success() {
            let body = match response.text().await {
                Ok(body) => body,
                Err(error) => {
                    log::debug!("Failed to read the {status} error body: {error}");
                    String::new()
                }
            };
            let message = error_message(status, &body);
            log::warn!("Commentary service rejected the request with {status}: {message}");
            return Err(GenerationError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        let expected = response.content_length().unwrap_or(0) as usize;
        let mut audio = Vec::with_capacity(expected);
        let mut body = response.bytes_stream();
        while let Some(chunk) = body.next().await {
            let chunk = chunk.map_err(reqwest::Error::without_url)?;
            audio.extend_from_slice(&chunk);
        }

        if audio.is_empty() {
            return Err(GenerationError::EmptyAudio);
        }

        log::info!("Received {} bytes of commentary audio", audio.len());
        Ok(AudioAsset::new(audio))
    }
}

/// Extract a human readable message from an error response body.
///
/// The service reports errors as JSON `{"detail": ...}` where `detail` is
/// either a string or a list of validation entries with a `msg` field.
/// Anything else is shown as plain text; an empty body falls back to the
/// status line.
fn error_message(status: reqwest::StatusCode, body: &str) -> String {
    let body = body.trim();
    if let Ok(serde_json::Value::Object(object)) = serde_json::from_str(body) {
        match object.get("detail") {
            Some(serde_json::Value::String(detail)) => return detail.clone(),
            Some(serde_json::Value::Array(entries)) => {
                let messages: Vec<&str> = entries
                    .iter()
                    .filter_map(|entry| entry.get("msg").and_then(serde_json::Value::as_str))
                    .collect();
                if !messages.is_empty() {
                    return messages.join("; ");
                }
            }
            _ => {}
        }
    }

    if body.is_empty() {
        return match status.canonical_reason() {
            Some(reason) => format!("HTTP {} {reason}", status.as_u16()),
            None => format!("HTTP {}", status.as_u16()),
        };
    }

    body.to_string()
}

#[cfg(test)]
mod tests {
    use reqwest::StatusCode;

    use super::*;

    #[test]
    fn plain_text_bodies_are_kept() {
        assert_eq!(
            error_message(StatusCode::INTERNAL_SERVER_ERROR, "server error\n"),
            "server error"
        );
    }

    #[test]
    fn service_detail_is_preferred() {
        assert_eq!(
            error_message(
                StatusCode::BAD_REQUEST,
                r#"{"detail":"Only HTTP and HTTPS URLs are supported"}"#
            ),
            "Only HTTP and HTTPS URLs are supported"
        );
    }

    #[test]
    fn validation_entries_are_joined() {
        let body = r#"{"detail":[{"loc":["body","url"],"msg":"invalid or missing URL scheme"},{"msg":"field required"}]}"#;
        assert_eq!(
            error_message(StatusCode::UNPROCESSABLE_ENTITY, body),
            "invalid or missing URL scheme; field required"
        );
    }

    #[test]
    fn empty_body_falls_back_to_status() {
        assert_eq!(
            error_message(StatusCode::BAD_GATEWAY, "  "),
            "HTTP 502 Bad Gateway"
        );
    }

    #[test]
    fn invalid_endpoint_is_rejected() {
        let config = ServiceConfig {
            endpoint: "not a url".into(),
            ..ServiceConfig::default()
        };
        assert!(matches!(
            HttpCommentaryService::new(&config),
            Err(GenerationError::InvalidEndpoint(_))
        ));
    }
}
