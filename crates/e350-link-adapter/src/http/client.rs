/*
[INPUT]:  HTTP configuration (device base URL, timeouts)
[OUTPUT]: Configured reqwest client and the uniform command contract
[POS]:    HTTP layer - core client implementation
[UPDATE]: When adding connection options or changing the success/failure contract
*/

use std::time::Duration;

use reqwest::{Client, Method, RequestBuilder, Url};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::http::{LinkError, Result};

/// Default address of the controller web service
pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8000";

/// HTTP client configuration
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub connect_timeout: Duration,
    /// Whole-request timeout. Off by default: commands are fire-once and a
    /// slow device only delays the caller.
    pub request_timeout: Option<Duration>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            request_timeout: None,
        }
    }
}

/// HTTP client for the controller's command API
#[derive(Debug, Clone)]
pub struct DeviceClient {
    http_client: Client,
    base_url: Url,
    connect_timeout: Duration,
}

impl DeviceClient {
    /// Create a new client for the default local address
    pub fn new() -> Result<Self> {
        Self::with_config(ClientConfig::default(), DEFAULT_BASE_URL)
    }

    /// Create a new client with custom configuration and base URL
    pub fn with_config(config: ClientConfig, base_url: &str) -> Result<Self> {
        let mut builder = Client::builder().connect_timeout(config.connect_timeout);
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }
        let http_client = builder.build()?;

        Ok(Self {
            http_client,
            base_url: parse_base_url(base_url)?,
            connect_timeout: config.connect_timeout,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn connect_timeout(&self) -> Duration {
        self.connect_timeout
    }

    /// Build full URL for an endpoint
    pub(crate) fn url(&self, endpoint: &str) -> Result<Url> {
        Ok(self.base_url.join(endpoint.trim_start_matches('/'))?)
    }

    /// Build request builder for an endpoint
    pub(crate) fn request(&self, method: Method, endpoint: &str) -> Result<RequestBuilder> {
        let url = self.url(endpoint)?;
        Ok(self.http_client.request(method, url))
    }

    /// POST a JSON body and decode the JSON answer.
    pub(crate) async fn post_json<B, T>(&self, endpoint: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let builder = self.request(Method::POST, endpoint)?.json(body);
        self.send_json(builder).await
    }

    pub(crate) async fn get_json<T>(&self, endpoint: &str) -> Result<T>
    where
        T: DeserializeOwned,
    {
        let builder = self.request(Method::GET, endpoint)?;
        self.send_json(builder).await
    }

    /// Send a request under the command contract.
    ///
    /// Non-success status: the body text becomes the error detail, verbatim.
    /// Success: the body parses as JSON. No retries.
    pub(crate) async fn send_json<T>(&self, builder: RequestBuilder) -> Result<T>
    where
        T: DeserializeOwned,
    {
        let response = builder.send().await?;
        let status = response.status();
        let url = response.url().path().to_string();

        if !status.is_success() {
            let detail = response.text().await?;
            debug!(endpoint = %url, status = status.as_u16(), "command rejected");
            return Err(LinkError::command(status, detail));
        }

        let bytes = response.bytes().await?;
        serde_json::from_slice(&bytes).map_err(LinkError::from)
    }
}

/// Base URLs are joined with relative endpoints, so they must end in `/`.
fn parse_base_url(base_url: &str) -> Result<Url> {
    let mut url = Url::parse(base_url)?;
    if url.cannot_be_a_base() {
        return Err(LinkError::Config(format!(
            "device URL cannot be used as a base: {base_url}"
        )));
    }
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}
