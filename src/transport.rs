//! HTTP transport to a single push endpoint.
//!
//! A push is a GET to `<server_url>/<push_key>?<params>`. The server accepts
//! it with HTTP 200; any other status is a failure whose detail is the
//! response body. There are no retries and no timeout beyond the client's
//! default. Callers wanting resilience wrap their own [`Transport`].

use async_trait::async_trait;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use reqwest::Client;
use url::Url;

use crate::constants::HTTP_STATUS_ACCEPTED;
use crate::error::{DispatchError, UNKNOWN_ERROR};
use crate::payload::QueryParams;
use crate::target::mask_key;

/// Everything except RFC 3986 unreserved characters is escaped in query
/// names and values, so spaces become `%20`.
const QUERY_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// Sends one push request to one endpoint.
///
/// Implemented by [`BarkClient`] for real HTTP and by fakes in tests.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Delivers `params` to `<server_url>/<push_key>`.
    async fn send(
        &self,
        server_url: &str,
        push_key: &str,
        params: &QueryParams,
    ) -> Result<(), DispatchError>;
}

/// Encodes parameters as `name=value&…`, percent-encoding both sides.
pub fn encode_query(params: &QueryParams) -> String {
    params
        .iter()
        .map(|(name, value)| {
            format!(
                "{}={}",
                utf8_percent_encode(name, QUERY_COMPONENT),
                utf8_percent_encode(value, QUERY_COMPONENT)
            )
        })
        .collect::<Vec<_>>()
        .join("&")
}

/// Builds the request URL `<server_url>/<push_key>?<query>`.
///
/// Fails with [`DispatchError::InvalidUrl`] when the base URL does not parse,
/// is not http(s), has no host, or the push key is empty.
pub fn build_request_url(
    server_url: &str,
    push_key: &str,
    params: &QueryParams,
) -> Result<Url, DispatchError> {
    let base = server_url.trim();
    let mut url =
        Url::parse(base).map_err(|e| DispatchError::InvalidUrl(format!("'{base}': {e}")))?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(DispatchError::InvalidUrl(format!(
            "'{base}': unsupported scheme '{}'",
            url.scheme()
        )));
    }
    if url.host_str().is_none() {
        return Err(DispatchError::InvalidUrl(format!("'{base}': missing host")));
    }
    if push_key.is_empty() {
        return Err(DispatchError::InvalidUrl("push key is empty".to_string()));
    }

    url.path_segments_mut()
        .map_err(|()| DispatchError::InvalidUrl(format!("'{base}': cannot be a base URL")))?
        .pop_if_empty()
        .push(push_key);

    if params.is_empty() {
        url.set_query(None);
    } else {
        url.set_query(Some(&encode_query(params)));
    }

    Ok(url)
}

/// reqwest-backed [`Transport`].
///
/// Cheap to clone; clones share the connection pool.
#[derive(Debug, Clone)]
pub struct BarkClient {
    client: Client,
}

impl BarkClient {
    /// Creates a client with default settings.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn new() -> anyhow::Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("barkcast/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self::with_client(client))
    }

    /// Wraps a pre-configured HTTP client.
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Transport for BarkClient {
    async fn send(
        &self,
        server_url: &str,
        push_key: &str,
        params: &QueryParams,
    ) -> Result<(), DispatchError> {
        let url = build_request_url(server_url, push_key, params)?;

        log::debug!(
            "[Transport] GET {}/{} ({} params)",
            server_url.trim_end_matches('/'),
            mask_key(push_key),
            params.len()
        );

        // Strip the URL from client errors: it embeds the push key.
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| DispatchError::from(e.without_url()))?;

        let status = response.status().as_u16();
        if status == HTTP_STATUS_ACCEPTED {
            return Ok(());
        }

        let detail = match response.bytes().await {
            Ok(body) => match String::from_utf8(body.to_vec()) {
                Ok(text) if !text.trim().is_empty() => text,
                Ok(_) => format!("HTTP {status}"),
                Err(_) => UNKNOWN_ERROR.to_string(),
            },
            Err(e) => {
                log::debug!("[Transport] Failed to read error body: {}", e.without_url());
                UNKNOWN_ERROR.to_string()
            }
        };

        log::warn!("[Transport] Push rejected (HTTP {}): {}", status, detail);
        Err(DispatchError::RequestFailed(detail))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(pairs: &[(&'static str, &str)]) -> QueryParams {
        pairs.iter().map(|(n, v)| (*n, (*v).to_string())).collect()
    }

    #[test]
    fn test_encode_query_uses_percent_twenty_for_spaces() {
        let query = encode_query(&params(&[
            ("title", "Alert"),
            ("body", "Disk full"),
            ("isArchive", "0"),
        ]));
        assert_eq!(query, "title=Alert&body=Disk%20full&isArchive=0");
    }

    #[test]
    fn test_encode_query_escapes_reserved_characters() {
        let query = encode_query(&params(&[
            ("data", "a+b/c=:d"),
            ("url", "https://x.y/?q=1&r"),
        ]));
        assert_eq!(
            query,
            "data=a%2Bb%2Fc%3D%3Ad&url=https%3A%2F%2Fx.y%2F%3Fq%3D1%26r"
        );
    }

    #[test]
    fn test_build_request_url_matches_wire_example() {
        let url = build_request_url(
            "https://api.day.app",
            "abc",
            &params(&[("title", "Alert"), ("body", "Disk full"), ("isArchive", "0")]),
        )
        .unwrap();
        assert_eq!(
            url.as_str(),
            "https://api.day.app/abc?title=Alert&body=Disk%20full&isArchive=0"
        );
    }

    #[test]
    fn test_build_request_url_handles_trailing_slash_and_base_path() {
        let url = build_request_url("https://push.example.com/bark/", "key", &QueryParams::new())
            .unwrap();
        assert_eq!(url.as_str(), "https://push.example.com/bark/key");
    }

    #[test]
    fn test_build_request_url_escapes_push_key() {
        let url =
            build_request_url("https://api.day.app", "a/b c", &QueryParams::new()).unwrap();
        assert_eq!(url.path(), "/a%2Fb%20c");
    }

    #[test]
    fn test_build_request_url_rejects_malformed_base() {
        for bad in ["", "not a url", "ftp://example.com", "mailto:someone@example.com"] {
            let err =
                build_request_url(bad, "abc", &QueryParams::new()).unwrap_err();
            assert!(
                matches!(err, DispatchError::InvalidUrl(_)),
                "expected InvalidUrl for {bad:?}, got {err:?}"
            );
        }
    }

    #[test]
    fn test_build_request_url_rejects_empty_key() {
        let err =
            build_request_url("https://api.day.app", "", &QueryParams::new()).unwrap_err();
        assert!(matches!(err, DispatchError::InvalidUrl(_)));
    }

    #[test]
    fn test_bark_client_creation() {
        assert!(BarkClient::new().is_ok());
    }
}
