//! HTTP client wrapper for OAI-PMH endpoints.
//!
//! `fetch` only classifies what came back. Feed sessions apply their own
//! retry rules to it; `download_bytes` retries one-off requests.

use std::thread;
use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::StatusCode;
use url::Url;

use crate::config::{RetryPolicy, HTTP_TIMEOUT_SECS};
use crate::error::{HarvesterError, Result};

/// User agent string identifying this harvester.
const USER_AGENT: &str = concat!("heartland-harvester/", env!("CARGO_PKG_VERSION"));

/// Create a configured HTTP client.
///
/// # Returns
/// A `reqwest::blocking::Client` configured with appropriate timeout and user agent.
pub fn create_client() -> Result<Client> {
    let client = Client::builder()
        .timeout(Duration::from_secs(HTTP_TIMEOUT_SECS))
        .user_agent(USER_AGENT)
        .build()?;
    Ok(client)
}

/// Build a GET URL from an endpoint and query parameters.
///
/// # Examples
/// ```
/// use heartland_harvester::http::build_url;
///
/// let url = build_url("https://example.org/oai", &[("verb", "Identify")]).unwrap();
/// assert_eq!(url.as_str(), "https://example.org/oai?verb=Identify");
/// ```
pub fn build_url(endpoint: &str, params: &[(&str, &str)]) -> Result<Url> {
    Url::parse_with_params(endpoint, params).map_err(|source| HarvesterError::InvalidUrl {
        url: endpoint.to_string(),
        source,
    })
}

/// Classified result of one GET request.
#[derive(Debug)]
pub enum FetchOutcome {
    /// 2xx/3xx response body.
    Body(Vec<u8>),
    /// 5xx response.
    ServerError(StatusCode),
    /// 4xx response.
    ClientError(StatusCode),
    /// The request never produced a complete response.
    ConnectionFailure(reqwest::Error),
}

/// Issue one GET request and classify the outcome.
///
/// Only request-construction errors are returned as `Err`; everything the
/// network does is an [`FetchOutcome`].
pub fn fetch(client: &Client, url: &Url) -> Result<FetchOutcome> {
    let response = match client.get(url.clone()).send() {
        Ok(response) => response,
        Err(e) if e.is_builder() => return Err(HarvesterError::Http(e)),
        Err(e) => return Ok(FetchOutcome::ConnectionFailure(e)),
    };

    let status = response.status();
    if status.is_server_error() {
        return Ok(FetchOutcome::ServerError(status));
    }
    if status.is_client_error() {
        return Ok(FetchOutcome::ClientError(status));
    }

    match response.bytes() {
        Ok(bytes) => Ok(FetchOutcome::Body(bytes.to_vec())),
        Err(e) => Ok(FetchOutcome::ConnectionFailure(e)),
    }
}

/// Download a URL, retrying server errors and connection failures until
/// `policy.max_attempts` attempts have been made. A 4xx status fails at once.
pub fn download_bytes(client: &Client, url: &Url, policy: RetryPolicy) -> Result<Vec<u8>> {
    let max_attempts = policy.max_attempts.max(1);
    let mut attempts = 0;
    loop {
        attempts += 1;
        let reason = match fetch(client, url)? {
            FetchOutcome::Body(bytes) => return Ok(bytes),
            FetchOutcome::ClientError(status) => {
                return Err(HarvesterError::Unavailable {
                    url: url.to_string(),
                    attempts,
                    reason: format!("HTTP {status}"),
                })
            }
            FetchOutcome::ServerError(status) => format!("HTTP {status}"),
            FetchOutcome::ConnectionFailure(e) => e.to_string(),
        };

        if attempts >= max_attempts {
            return Err(HarvesterError::Unavailable {
                url: url.to_string(),
                attempts,
                reason,
            });
        }
        tracing::warn!(
            url = %url,
            attempt = attempts,
            max = max_attempts,
            reason = %reason,
            "Request failed, retrying"
        );
        thread::sleep(policy.delay);
    }
}

/// Decode a response body as UTF-8, replacing invalid sequences.
pub fn bytes_to_string(bytes: &[u8], context: &str) -> String {
    match String::from_utf8(bytes.to_vec()) {
        Ok(text) => text,
        Err(_) => {
            tracing::warn!(context, "Response is not valid UTF-8, decoding lossily");
            String::from_utf8_lossy(bytes).into_owned()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_client() {
        let client = create_client();
        assert!(client.is_ok());
    }

    #[test]
    fn test_build_url_encodes_params() {
        let url = build_url(
            "https://example.org/oai",
            &[("verb", "ListRecords"), ("resumptionToken", "a b/c")],
        )
        .unwrap();
        assert_eq!(
            url.as_str(),
            "https://example.org/oai?verb=ListRecords&resumptionToken=a+b%2Fc"
        );
    }

    #[test]
    fn test_build_url_rejects_garbage() {
        assert!(matches!(
            build_url("not a url", &[]),
            Err(HarvesterError::InvalidUrl { .. })
        ));
    }

    #[test]
    fn test_download_gives_up_after_budget() {
        let client = create_client().unwrap();
        // Port 1 refuses connections
        let url = build_url("http://127.0.0.1:1/oai", &[("verb", "Identify")]).unwrap();
        let policy = RetryPolicy {
            delay: Duration::ZERO,
            max_attempts: 3,
        };

        match download_bytes(&client, &url, policy) {
            Err(HarvesterError::Unavailable { attempts, .. }) => assert_eq!(attempts, 3),
            other => panic!("expected Unavailable, got {other:?}"),
        }
    }

    #[test]
    fn test_bytes_to_string_lossy() {
        assert_eq!(bytes_to_string(b"ok", "test"), "ok");
        assert_eq!(bytes_to_string(&[b'a', 0xff, b'b'], "test"), "a\u{fffd}b");
    }
}
