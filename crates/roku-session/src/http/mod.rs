// Copyright 2025 Tim Roberts
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! HTTP client for the device-info endpoint.
//!
//! Every request names its target explicitly, so one client can talk to any
//! number of devices without a shared "current host".

use std::time::Duration;

use async_trait::async_trait;
use log::debug;
use reqwest::Url;
use thiserror::Error;

use crate::protocol::{DeviceInfo, ParseError, DEVICE_INFO_PATH};

/// Default bound on a single device-info round trip.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Errors returned by a device-info request.
#[derive(Debug, Error)]
pub enum RequestError {
    #[error("invalid device location '{location}': {reason}")]
    InvalidLocation { location: String, reason: String },

    #[error("device unreachable: {0}")]
    Unreachable(String),

    #[error("device did not answer within {0:?}")]
    Timeout(Duration),

    #[error("device answered with HTTP status {0}")]
    Status(u16),

    #[error(transparent)]
    Decode(#[from] ParseError),

    #[error("failed to build HTTP client: {0}")]
    Client(String),
}

impl RequestError {
    /// Whether the device could not be reached at all.
    ///
    /// A bad location, a refused or failed connection, and a timeout all
    /// count. An HTTP error status or an undecodable body do not: something
    /// answered at that address.
    #[must_use]
    pub fn is_unreachable(&self) -> bool {
        matches!(
            self,
            Self::InvalidLocation { .. } | Self::Unreachable(_) | Self::Timeout(_)
        )
    }
}

/// Source of device-info documents.
#[async_trait]
pub trait DeviceInfoClient: Send + Sync {
    /// Ask the device at `location` to describe itself.
    async fn device_info(&self, location: &str) -> Result<DeviceInfo, RequestError>;
}

/// Configuration for [`HttpDeviceClient`].
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Overall per-request timeout.
    pub timeout: Duration,
    /// User-Agent header sent with every request.
    pub user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            user_agent: concat!("simple-remote/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

/// [`DeviceInfoClient`] backed by `reqwest`.
#[derive(Debug, Clone)]
pub struct HttpDeviceClient {
    client: reqwest::Client,
    timeout: Duration,
}

impl HttpDeviceClient {
    pub fn new(config: ClientConfig) -> Result<Self, RequestError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent)
            .build()
            .map_err(|e| RequestError::Client(e.to_string()))?;

        Ok(Self {
            client,
            timeout: config.timeout,
        })
    }

    fn classify(&self, err: &reqwest::Error) -> RequestError {
        if err.is_timeout() {
            RequestError::Timeout(self.timeout)
        } else {
            RequestError::Unreachable(err.to_string())
        }
    }
}

#[async_trait]
impl DeviceInfoClient for HttpDeviceClient {
    async fn device_info(&self, location: &str) -> Result<DeviceInfo, RequestError> {
        let url = device_info_url(location)?;
        debug!("GET {url}");

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| self.classify(&e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(RequestError::Status(status.as_u16()));
        }

        let body = response.text().await.map_err(|e| self.classify(&e))?;
        Ok(DeviceInfo::parse(&body)?)
    }
}

/// Build the device-info URL for a device location.
///
/// Locations without a scheme are taken as plain `http`. The location's path
/// is treated as a directory, so `http://host:8060` and `http://host:8060/`
/// both resolve to `http://host:8060/query/device-info`.
pub fn device_info_url(location: &str) -> Result<Url, RequestError> {
    let invalid = |reason: String| RequestError::InvalidLocation {
        location: location.to_string(),
        reason,
    };

    let trimmed = location.trim();
    if trimmed.is_empty() {
        return Err(invalid("location is empty".to_string()));
    }

    let mut url = if trimmed.contains("://") {
        Url::parse(trimmed)
    } else {
        Url::parse(&format!("http://{trimmed}"))
    }
    .map_err(|e| invalid(e.to_string()))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(invalid(format!("unsupported scheme '{}'", url.scheme())));
    }
    if url.host_str().is_none() {
        return Err(invalid("location has no host".to_string()));
    }

    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url.set_query(None);
    url.set_fragment(None);

    url.join(DEVICE_INFO_PATH).map_err(|e| invalid(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    const DEN_XML: &str = "<device-info><device-id>DEN42</device-id>\
                           <friendly-device-name>Den</friendly-device-name></device-info>";

    /// Serve exactly one HTTP response on an ephemeral port and return the
    /// location to reach it.
    async fn serve_once(status_line: &'static str, body: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 1024];
            let n = socket.read(&mut buf).await.unwrap();
            let request = String::from_utf8_lossy(&buf[..n]).to_string();
            assert!(request.starts_with("GET /query/device-info "), "{request}");

            let response = format!(
                "HTTP/1.1 {status_line}\r\nContent-Type: text/xml\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.unwrap();
        });

        format!("http://{addr}/")
    }

    fn client_with_timeout(timeout: Duration) -> HttpDeviceClient {
        HttpDeviceClient::new(ClientConfig {
            timeout,
            ..Default::default()
        })
        .unwrap()
    }

    #[test]
    fn test_device_info_url_variants() {
        assert_eq!(
            device_info_url("http://192.0.2.10").unwrap().as_str(),
            "http://192.0.2.10/query/device-info"
        );
        assert_eq!(
            device_info_url("http://192.0.2.10:8060/").unwrap().as_str(),
            "http://192.0.2.10:8060/query/device-info"
        );
        assert_eq!(
            device_info_url("192.0.2.10:8060").unwrap().as_str(),
            "http://192.0.2.10:8060/query/device-info"
        );
        assert_eq!(
            device_info_url("http://192.0.2.10:8060/roku?x=1").unwrap().as_str(),
            "http://192.0.2.10:8060/roku/query/device-info"
        );
    }

    #[test]
    fn test_device_info_url_rejects_bad_locations() {
        assert!(device_info_url("").unwrap_err().is_unreachable());
        assert!(matches!(
            device_info_url("ftp://192.0.2.10/"),
            Err(RequestError::InvalidLocation { .. })
        ));
        assert!(matches!(
            device_info_url("http://"),
            Err(RequestError::InvalidLocation { .. })
        ));
    }

    #[test]
    fn test_error_classification() {
        assert!(RequestError::Unreachable("refused".to_string()).is_unreachable());
        assert!(RequestError::Timeout(DEFAULT_TIMEOUT).is_unreachable());
        assert!(!RequestError::Status(500).is_unreachable());
        assert!(!RequestError::Decode(ParseError::MissingField("device-id")).is_unreachable());
    }

    #[tokio::test]
    async fn test_fetches_device_info() {
        let location = serve_once("200 OK", DEN_XML).await;
        let client = client_with_timeout(Duration::from_secs(5));

        let info = client.device_info(&location).await.unwrap();
        assert_eq!(info.friendly_device_name, "Den");
        assert_eq!(info.device_id, "DEN42");
    }

    #[tokio::test]
    async fn test_error_status_is_reported() {
        let location = serve_once("403 Forbidden", "").await;
        let client = client_with_timeout(Duration::from_secs(5));

        let err = client.device_info(&location).await.unwrap_err();
        assert!(matches!(err, RequestError::Status(403)));
    }

    #[tokio::test]
    async fn test_undecodable_body_is_reported() {
        let location = serve_once("200 OK", "<html><body>hello</body></html>").await;
        let client = client_with_timeout(Duration::from_secs(5));

        let err = client.device_info(&location).await.unwrap_err();
        assert!(matches!(err, RequestError::Decode(_)));
    }

    #[tokio::test]
    async fn test_refused_connection_is_unreachable() {
        // Grab a free port, then close it so nothing is listening.
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client = client_with_timeout(Duration::from_secs(5));
        let err = client.device_info(&format!("http://{addr}/")).await.unwrap_err();
        assert!(err.is_unreachable(), "{err}");
    }

    #[tokio::test]
    async fn test_silent_device_times_out() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (_socket, _) = listener.accept().await.unwrap();
            tokio::time::sleep(Duration::from_secs(30)).await;
        });

        let timeout = Duration::from_millis(200);
        let client = client_with_timeout(timeout);
        let err = client.device_info(&format!("http://{addr}/")).await.unwrap_err();
        assert!(matches!(err, RequestError::Timeout(t) if t == timeout), "{err}");
    }
}
