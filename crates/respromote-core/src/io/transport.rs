//! Authenticated request/response against one Rule Execution Server.
//!
//! Every request carries basic credentials up front (no challenge round
//! trip) when its URL falls inside the endpoint's credential scope. Only
//! 200, 201 and 204 count as success.

use std::fmt;
use std::path::Path;
use std::time::Duration;

use futures::StreamExt;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode, Url};
use serde_json::Value;

use crate::io::staging::Staging;
use crate::{Endpoint, PromoteError};

/// Content type used for binary archive uploads.
pub const OCTET_STREAM: &str = "application/octet-stream";

/// Host and port (or any port) that credentials are valid for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CredentialScope {
    host: String,
    port: Option<u16>,
}

impl CredentialScope {
    /// Scope covering `endpoint`; no port means any port.
    pub fn for_endpoint(endpoint: &Endpoint) -> Self {
        Self {
            host: endpoint.host().to_string(),
            port: endpoint.port(),
        }
    }

    /// Whether `url` targets this scope.
    pub fn matches(&self, url: &str) -> bool {
        Url::parse(url).is_ok_and(|url| {
            url.host_str()
                .is_some_and(|host| host.eq_ignore_ascii_case(&self.host))
                && self
                    .port
                    .is_none_or(|port| url.port_or_known_default() == Some(port))
        })
    }
}

/// Statuses treated as success by every operation.
pub fn is_success(status: StatusCode) -> bool {
    matches!(
        status,
        StatusCode::OK | StatusCode::CREATED | StatusCode::NO_CONTENT
    )
}

/// Client for one server's management API.
#[derive(Clone)]
pub struct Transport {
    client: Client,
    base_url: String,
    scope: CredentialScope,
    user: String,
    password: String,
}

impl Transport {
    /// Build a transport for `endpoint` with a per-request `timeout`.
    ///
    /// # Errors
    ///
    /// Returns [`PromoteError::Client`] if the HTTP client cannot be built.
    pub fn new(endpoint: &Endpoint, timeout: Duration) -> Result<Self, PromoteError> {
        let client = Client::builder()
            .user_agent(crate::USER_AGENT)
            .tcp_nodelay(true)
            .timeout(timeout)
            .build()
            .map_err(PromoteError::Client)?;
        Ok(Self::with_client(endpoint, client))
    }

    /// Build a transport around an existing client.
    pub fn with_client(endpoint: &Endpoint, client: Client) -> Self {
        let scope = CredentialScope::for_endpoint(endpoint);
        tracing::info!("Set credentials for {}", endpoint.host());
        Self {
            client,
            base_url: endpoint.base_url(),
            scope,
            user: endpoint.user().to_string(),
            password: endpoint.password().to_string(),
        }
    }

    /// Management base URL this transport talks to.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Full URL of `resource`.
    pub fn url(&self, resource: &str) -> String {
        format!("{}{resource}", self.base_url)
    }

    /// `GET {base}{resource}?accept=json`.
    ///
    /// Returns `None` for a 204, an empty body or a JSON `null`.
    ///
    /// # Errors
    ///
    /// [`PromoteError::Status`] / [`PromoteError::Request`] on transport
    /// failure, [`PromoteError::Protocol`] if the body is not JSON.
    pub async fn get_json(&self, resource: &str) -> Result<Option<Value>, PromoteError> {
        let url = format!("{}?accept=json", self.url(resource));
        let response = self.send(Method::GET, &url, |req| req).await?;

        if response.status() == StatusCode::NO_CONTENT {
            return Ok(None);
        }

        let body = response
            .bytes()
            .await
            .map_err(|source| PromoteError::Request {
                method: Method::GET,
                url: url.clone(),
                source,
            })?;
        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(None);
        }

        let value: Value =
            serde_json::from_slice(&body).map_err(|e| PromoteError::protocol(&url, e))?;
        Ok((!value.is_null()).then_some(value))
    }

    /// `GET {base}{resource}` and stream the body verbatim into the staged
    /// file `path`.
    ///
    /// Returns the number of bytes written.
    ///
    /// # Errors
    ///
    /// Transport errors as for [`Transport::get_json`];
    /// [`PromoteError::Storage`] if the file cannot be written.
    pub async fn get_to_file(
        &self,
        resource: &str,
        staging: &Staging,
        path: &Path,
    ) -> Result<u64, PromoteError> {
        let url = self.url(resource);
        let response = self.send(Method::GET, &url, |req| req).await?;

        let body = response.bytes_stream().map(|chunk| {
            chunk.map_err(|source| PromoteError::Request {
                method: Method::GET,
                url: url.clone(),
                source,
            })
        });
        let written = staging.write(body, path).await?;
        tracing::debug!(%url, path = %path.display(), bytes = written, "Saved response body");
        Ok(written)
    }

    /// `POST {base}{resource}` with a UTF-8 text body of `content_type`.
    ///
    /// # Errors
    ///
    /// [`PromoteError::Status`] / [`PromoteError::Request`] on failure.
    pub async fn post_text(
        &self,
        resource: &str,
        body: &str,
        content_type: &str,
    ) -> Result<(), PromoteError> {
        let url = self.url(resource);
        tracing::debug!(%url, body, "POST text");
        let content_type = format!("{content_type}; charset=UTF-8");
        self.send(Method::POST, &url, |req| {
            req.header(CONTENT_TYPE, content_type)
                .body(body.to_string())
        })
        .await?;
        Ok(())
    }

    /// `POST {base}{resource}` with a binary `application/octet-stream` body.
    ///
    /// # Errors
    ///
    /// [`PromoteError::Status`] / [`PromoteError::Request`] on failure.
    pub async fn post_bytes(&self, resource: &str, bytes: Vec<u8>) -> Result<(), PromoteError> {
        let url = self.url(resource);
        tracing::debug!(%url, bytes = bytes.len(), "POST archive");
        self.send(Method::POST, &url, |req| {
            req.header(CONTENT_TYPE, OCTET_STREAM).body(bytes)
        })
        .await?;
        Ok(())
    }

    /// Issue one request and classify its status.
    ///
    /// The returned response owns the pooled connection; dropping it (on any
    /// path, including the error returns here) hands the connection back.
    async fn send(
        &self,
        method: Method,
        url: &str,
        build: impl FnOnce(RequestBuilder) -> RequestBuilder,
    ) -> Result<Response, PromoteError> {
        let mut request = self.client.request(method.clone(), url);
        if self.scope.matches(url) {
            request = request.basic_auth(&self.user, Some(&self.password));
        }

        let response = build(request)
            .send()
            .await
            .map_err(|source| PromoteError::Request {
                method: method.clone(),
                url: url.to_string(),
                source,
            })?;

        let status = response.status();
        tracing::debug!(%method, url, %status, "RES request");

        if !is_success(status) {
            return Err(PromoteError::Status {
                method,
                url: url.to_string(),
                status: status.to_string(),
            });
        }
        Ok(response)
    }
}

impl fmt::Debug for Transport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transport")
            .field("base_url", &self.base_url)
            .field("scope", &self.scope)
            .field("user", &self.user)
            .finish_non_exhaustive()
    }
}
