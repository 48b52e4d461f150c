//! HTTP client for the mail.tm API.

use std::time::Duration;

use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::json;
use tracing::debug;
use url::Url;

use crate::error::{Error, Result};
use crate::types::{
    Collection, Domain, ErrorBody, MessageDetail, MessageSummary, RawMessageSummary, Token,
    TokenResponse,
};

/// Public mail.tm endpoint.
pub const DEFAULT_BASE_URL: &str = "https://api.mail.tm";

/// Timeout applied to requests that do not pass their own.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(8);

const ACCEPT: &str = "application/ld+json, application/json";

/// mail.tm API client.
///
/// Cheap to clone; clones share the underlying connection pool.
#[derive(Debug, Clone)]
pub struct ApiClient {
    base_url: Url,
    timeout: Duration,
    http_client: Client,
}

impl ApiClient {
    /// Creates a client for the given base URL.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid.
    pub fn new(base_url: impl AsRef<str>) -> Result<Self> {
        let mut base_url = Url::parse(base_url.as_ref())?;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        Ok(Self {
            base_url,
            timeout: DEFAULT_TIMEOUT,
            http_client: Client::new(),
        })
    }

    /// Creates a client for the public mail.tm endpoint.
    ///
    /// # Errors
    ///
    /// Returns an error if the built-in URL fails to parse.
    pub fn mail_tm() -> Result<Self> {
        Self::new(DEFAULT_BASE_URL)
    }

    /// Sets the default request timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Returns the base URL.
    #[must_use]
    pub const fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Returns the default request timeout.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        self.timeout
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        Ok(self.base_url.join(path.trim_start_matches('/'))?)
    }

    async fn send(&self, request: RequestBuilder, timeout: Duration) -> Result<Response> {
        request
            .header(reqwest::header::ACCEPT, ACCEPT)
            .timeout(timeout)
            .send()
            .await
            .map_err(Error::from_transport)
    }

    /// Lists the domains new accounts can be created on.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or no domain is returned.
    pub async fn domains(&self) -> Result<Vec<Domain>> {
        let url = self.endpoint("domains")?;
        let response = self.send(self.http_client.get(url), self.timeout).await?;
        let response = expect_status(response, StatusCode::OK).await?;
        let domains = decode::<Collection<Domain>>(response).await?.into_vec();

        if domains.is_empty() {
            return Err(Error::InvalidResponse("no domains returned".to_string()));
        }
        debug!("Fetched {} domains", domains.len());
        Ok(domains)
    }

    /// Registers a new mailbox.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Status`] with the server's detail message unless the
    /// server answers `201 Created`.
    pub async fn create_account(&self, address: &str, password: &str) -> Result<()> {
        let url = self.endpoint("accounts")?;
        let request = self
            .http_client
            .post(url)
            .json(&json!({ "address": address, "password": password }));
        let response = self.send(request, self.timeout).await?;
        expect_status(response, StatusCode::CREATED).await?;
        debug!("Created account {address}");
        Ok(())
    }

    /// Exchanges credentials for a bearer token using the default timeout.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidCredentials`] on HTTP 401.
    pub async fn token(&self, address: &str, password: &str) -> Result<Token> {
        self.token_with_timeout(address, password, self.timeout)
            .await
    }

    /// Exchanges credentials for a bearer token.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidCredentials`] on HTTP 401, [`Error::Status`] on
    /// any other non-200 status and [`Error::InvalidResponse`] when the body
    /// has no token.
    pub async fn token_with_timeout(
        &self,
        address: &str,
        password: &str,
        timeout: Duration,
    ) -> Result<Token> {
        let url = self.endpoint("token")?;
        let request = self
            .http_client
            .post(url)
            .json(&json!({ "address": address, "password": password }));
        let response = self.send(request, timeout).await?;

        if response.status() == StatusCode::UNAUTHORIZED {
            return Err(Error::InvalidCredentials);
        }
        let response = expect_status(response, StatusCode::OK).await?;
        let body: TokenResponse = decode(response).await?;

        match body.token {
            Some(token) if !token.is_empty() => Ok(Token { id: body.id, token }),
            _ => Err(Error::InvalidResponse("token field missing".to_string())),
        }
    }

    /// Lists the first page of the inbox using the default timeout.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the body is malformed.
    pub async fn messages(&self, token: &str) -> Result<Vec<MessageSummary>> {
        self.messages_with_timeout(token, self.timeout).await
    }

    /// Lists the first page of the inbox.
    ///
    /// Entries without an id are skipped.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the body is malformed.
    pub async fn messages_with_timeout(
        &self,
        token: &str,
        timeout: Duration,
    ) -> Result<Vec<MessageSummary>> {
        let mut url = self.endpoint("messages")?;
        url.query_pairs_mut().append_pair("page", "1");
        let request = self.http_client.get(url).bearer_auth(token);
        let response = self.send(request, timeout).await?;
        let response = expect_status(response, StatusCode::OK).await?;

        let messages = decode::<Collection<serde_json::Value>>(response)
            .await?
            .into_vec()
            .into_iter()
            .filter_map(RawMessageSummary::from_entry)
            .collect();
        Ok(messages)
    }

    /// Fetches one message with its body.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the body is malformed.
    pub async fn message(&self, token: &str, id: &str) -> Result<MessageDetail> {
        let url = self.endpoint(&format!("messages/{id}"))?;
        let request = self.http_client.get(url).bearer_auth(token);
        let response = self.send(request, self.timeout).await?;
        let response = expect_status(response, StatusCode::OK).await?;
        decode(response).await
    }
}

/// Passes the response through when it has the expected status.
async fn expect_status(response: Response, expected: StatusCode) -> Result<Response> {
    let status = response.status();
    if status == expected {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(Error::Status {
        status,
        detail: ErrorBody::detail_from(&body),
    })
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T> {
    let bytes = response.bytes().await.map_err(Error::from_transport)?;
    Ok(serde_json::from_slice(&bytes)?)
}
