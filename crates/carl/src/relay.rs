//! Download relay
//!
//! Streams an upstream body back to the caller unchanged. Any URL is accepted;
//! there is no allow-list of target hosts.

use axum::body::Body;
use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use carl_core::CarlError;
use futures_util::TryStreamExt;
use std::time::Duration;
use tracing::{info, instrument, warn};
use url::Url;

/// Build the client used for relayed downloads
///
/// Only connecting is bounded by `connect_timeout`. The body is streamed for
/// as long as the upstream keeps sending it.
pub fn relay_client(connect_timeout: Duration) -> reqwest::Result<reqwest::Client> {
    reqwest::Client::builder()
        .connect_timeout(connect_timeout)
        .build()
}

/// An upstream response ready to be streamed to the client
pub struct Relayed {
    pub content_type: Option<HeaderValue>,
    pub body: Body,
}

impl Relayed {
    pub fn with_content_type(mut self, content_type: &'static str) -> Self {
        self.content_type = Some(HeaderValue::from_static(content_type));
        self
    }
}

impl IntoResponse for Relayed {
    fn into_response(self) -> Response {
        let mut response = Response::new(self.body);
        if let Some(content_type) = self.content_type {
            response.headers_mut().insert(CONTENT_TYPE, content_type);
        }
        response
    }
}

/// Fetch `url` and hand back its body as a stream
#[instrument(skip(client))]
pub async fn relay(client: &reqwest::Client, url: &str) -> Result<Relayed, CarlError> {
    let target = Url::parse(url).map_err(|e| CarlError::InvalidUrl(format!("{}: {}", url, e)))?;

    let response = client
        .get(target)
        .send()
        .await
        .map_err(|e| CarlError::fetch(url, e))?;

    let status = response.status();
    if !status.is_success() {
        warn!("Upstream returned {}", status);
        return Err(CarlError::Fetch {
            url: url.to_string(),
            status: Some(status.as_u16()),
            reason: format!("upstream returned {}", status),
        });
    }
    if matches!(status, StatusCode::NO_CONTENT | StatusCode::RESET_CONTENT) {
        return Err(CarlError::fetch(url, "upstream response has no body"));
    }

    info!("Relaying {} ({:?} bytes)", url, response.content_length());

    let content_type = response.headers().get(CONTENT_TYPE).cloned();
    let stream = response
        .bytes_stream()
        .inspect_err(|e| warn!("Relay stream interrupted: {}", e));

    Ok(Relayed {
        content_type,
        body: Body::from_stream(stream),
    })
}
