//! HTTP implementation of [`RemoteService`] over `reqwest`.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode, Url};

use super::{NetworkError, RemoteError, RemoteService};
use crate::config::{
    self, DEFAULT_CONNECT_TIMEOUT, DEFAULT_REQUEST_TIMEOUT, FIELD_DEVICE_ID, FIELD_PAYLOAD,
    FIELD_SIGNATURE, PATH_LATEST_TRANSACTION, PATH_SUBMIT_DECISION,
};
use crate::transaction::codec::decode_status_body;
use crate::transaction::{Status, WireTuple};

/// Configuration for the HTTP remote.
#[derive(Debug, Clone)]
pub struct HttpRemoteConfig {
    /// Base URL of the API (e.g., `http://localhost:8000`). A trailing
    /// slash is ignored; a path prefix is kept.
    pub base_url: String,
    /// Timeout for establishing a connection.
    pub connect_timeout: Duration,
    /// Timeout for a whole request, body included.
    pub request_timeout: Duration,
}

impl HttpRemoteConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

/// Talks to the server over HTTP(S). Every call is bounded by the
/// configured timeouts.
#[derive(Debug, Clone)]
pub struct HttpRemote {
    client: Client,
    base_url: String,
}

impl HttpRemote {
    /// Validate the base URL and build the client. A malformed endpoint is
    /// reported here rather than on the first request.
    pub fn new(config: HttpRemoteConfig) -> Result<Self, NetworkError> {
        let base_url = config.base_url.trim_end_matches('/').to_string();
        let parsed = Url::parse(&base_url).map_err(|e| NetworkError::InvalidEndpoint {
            url: config.base_url.clone(),
            reason: e.to_string(),
        })?;
        if !matches!(parsed.scheme(), "http" | "https") || parsed.host_str().is_none() {
            return Err(NetworkError::InvalidEndpoint {
                url: config.base_url,
                reason: "expected an absolute http(s) URL".to_string(),
            });
        }

        let client = Client::builder()
            .connect_timeout(config.connect_timeout)
            .timeout(config.request_timeout)
            .user_agent(concat!("vouch-protocol/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| NetworkError::Transport {
                endpoint: base_url.clone(),
                message: e.to_string(),
            })?;

        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> Result<Url, NetworkError> {
        let raw = format!("{}{}", self.base_url, path);
        Url::parse(&raw).map_err(|e| NetworkError::InvalidEndpoint {
            url: raw,
            reason: e.to_string(),
        })
    }

    /// Read the body of a successful response; anything else is an
    /// [`NetworkError::HttpStatus`].
    async fn body_text(url: &Url, response: Response) -> Result<String, NetworkError> {
        let status = response.status();
        if !status.is_success() {
            return Err(NetworkError::HttpStatus {
                endpoint: url.to_string(),
                status: status.as_u16(),
            });
        }
        response.text().await.map_err(|e| classify(url, e))
    }
}

/// Sort a `reqwest` failure into the variants the retry policy cares about.
fn classify(url: &Url, err: reqwest::Error) -> NetworkError {
    let endpoint = url.to_string();
    if err.is_timeout() {
        NetworkError::Timeout { endpoint }
    } else if err.is_connect() {
        NetworkError::Connect {
            endpoint,
            message: err.to_string(),
        }
    } else if err.is_builder() {
        NetworkError::InvalidEndpoint {
            url: endpoint,
            reason: err.to_string(),
        }
    } else {
        NetworkError::Transport {
            endpoint,
            message: err.to_string(),
        }
    }
}

#[async_trait]
impl RemoteService for HttpRemote {
    async fn fetch_latest(&self, device_id: u32) -> Result<WireTuple, RemoteError> {
        let url = self.endpoint(PATH_LATEST_TRANSACTION)?;
        tracing::debug!(endpoint = %url, device_id, "fetching latest transaction");

        let response = self
            .client
            .get(url.clone())
            .query(&[(FIELD_DEVICE_ID, device_id)])
            .send()
            .await
            .map_err(|e| classify(&url, e))?;
        let body = Self::body_text(&url, response).await?;

        // Only the first line counts, even when it is blank.
        let line = body
            .lines()
            .next()
            .ok_or_else(|| NetworkError::EmptyBody {
                endpoint: url.to_string(),
            })?;
        Ok(WireTuple::parse(line)?)
    }

    async fn submit(
        &self,
        transaction_id: u64,
        device_id: u32,
        ciphertext: &[u8],
        signature: &[u8],
    ) -> Result<(), RemoteError> {
        let url = self.endpoint(PATH_SUBMIT_DECISION)?;
        tracing::debug!(endpoint = %url, transaction_id, device_id, "submitting decision");

        let device_id = device_id.to_string();
        let form = [
            (FIELD_PAYLOAD, hex::encode(ciphertext)),
            (FIELD_SIGNATURE, hex::encode(signature)),
            (FIELD_DEVICE_ID, device_id),
        ];
        let response = self
            .client
            .post(url.clone())
            .form(&form)
            .send()
            .await
            .map_err(|e| classify(&url, e))?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(RemoteError::Rejected {
                status: status.as_u16(),
            });
        }
        Ok(())
    }

    async fn query_status(&self, transaction_id: u64) -> Result<Status, RemoteError> {
        let url = self.endpoint(&config::status_path(transaction_id))?;
        tracing::debug!(endpoint = %url, transaction_id, "querying transaction status");

        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| classify(&url, e))?;
        let body = Self::body_text(&url, response).await?;
        Ok(decode_status_body(&body)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_malformed_base_urls() {
        for bad in ["", "localhost:8000", "ftp://example.com", "not a url", "http://"] {
            assert!(
                matches!(
                    HttpRemote::new(HttpRemoteConfig::new(bad)),
                    Err(NetworkError::InvalidEndpoint { .. })
                ),
                "{:?} accepted",
                bad
            );
        }
    }

    #[test]
    fn trailing_slash_is_ignored_and_prefix_kept() {
        let remote = HttpRemote::new(HttpRemoteConfig::new("https://bank.example/authz/")).unwrap();
        assert_eq!(remote.base_url(), "https://bank.example/authz");
        assert_eq!(
            remote.endpoint(PATH_LATEST_TRANSACTION).unwrap().as_str(),
            "https://bank.example/authz/api/user/+last-txn"
        );
        assert_eq!(
            remote.endpoint(&config::status_path(9)).unwrap().as_str(),
            "https://bank.example/authz/api/txn/9/+stat"
        );
    }
}
