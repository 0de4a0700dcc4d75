//! Reqwest-backed user directory adapter.
//!
//! This adapter owns transport details only: URL construction from the
//! injected base, timeout and HTTP error mapping, and JSON decoding into
//! domain records.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::domain::ports::{ResourceSourceError, UserDirectorySource};
use crate::domain::{ResourceId, Role, UserProfile};

const DEFAULT_USER_AGENT: &str = concat!("roster-client/", env!("CARGO_PKG_VERSION"));

/// Directory source that issues `GET` requests below one base URL.
///
/// Profiles are read from `{base}/users/{id}` and roles from `{base}/roles`.
#[derive(Debug, Clone)]
pub struct HttpUserDirectory {
    client: Client,
    base_url: Url,
}

impl HttpUserDirectory {
    /// Build an adapter for `base_url`, optionally bounding every request.
    ///
    /// ```rust,ignore
    /// let source = HttpUserDirectory::new(base_url, Some(Duration::from_secs(10)));
    /// assert!(source.is_ok() || source.is_err());
    /// ```
    ///
    /// # Errors
    ///
    /// Returns an error when the reqwest client cannot be constructed.
    pub fn new(base_url: Url, timeout: Option<Duration>) -> Result<Self, reqwest::Error> {
        let mut builder = Client::builder().user_agent(DEFAULT_USER_AGENT);
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            client: builder.build()?,
            base_url,
        })
    }

    /// Base URL every request is resolved against.
    pub const fn base_url(&self) -> &Url {
        &self.base_url
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        resource: &'static str,
        url: Url,
    ) -> Result<T, ResourceSourceError> {
        debug!(resource, %url, "directory request");
        let response = self
            .client
            .get(url)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|error| map_transport_error(resource, &error))?;

        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|error| map_transport_error(resource, &error))?;
        if !status.is_success() {
            return Err(map_status_error(resource, status, body.as_ref()));
        }
        decode(resource, body.as_ref())
    }
}

#[async_trait]
impl UserDirectorySource for HttpUserDirectory {
    async fn fetch_user_profile(
        &self,
        id: &ResourceId,
    ) -> Result<UserProfile, ResourceSourceError> {
        let url = resource_url(&self.base_url, &["users", id.as_str()])?;
        self.get_json("user profile", url).await
    }

    async fn list_roles(&self) -> Result<Vec<Role>, ResourceSourceError> {
        let url = resource_url(&self.base_url, &["roles"])?;
        self.get_json("role list", url).await
    }
}

/// Append path segments to `base`, percent-encoding each one.
fn resource_url(base: &Url, segments: &[&str]) -> Result<Url, ResourceSourceError> {
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|()| {
            ResourceSourceError::invalid_request(format!("base URL {base} cannot carry a path"))
        })?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

fn decode<T: DeserializeOwned>(resource: &str, body: &[u8]) -> Result<T, ResourceSourceError> {
    serde_json::from_slice(body)
        .map_err(|error| ResourceSourceError::decode(format!("{resource} payload: {error}")))
}

fn map_transport_error(resource: &str, error: &reqwest::Error) -> ResourceSourceError {
    let detail = format!("{resource} request: {error}");
    if error.is_timeout() {
        ResourceSourceError::timeout(detail)
    } else {
        ResourceSourceError::transport(detail)
    }
}

/// Classify a non-success answer, naming the resource and quoting the body.
fn map_status_error(resource: &str, status: StatusCode, body: &[u8]) -> ResourceSourceError {
    let code = status.as_u16();
    let message = match summarise_body(body) {
        Some(summary) => format!("{resource} answered {code}: {summary}"),
        None => format!("{resource} answered {code}"),
    };

    match status {
        StatusCode::NOT_FOUND => ResourceSourceError::not_found(message),
        StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => {
            ResourceSourceError::timeout(message)
        }
        _ => ResourceSourceError::status(code, message),
    }
}

/// Body text with whitespace collapsed, cut after `SUMMARY_CHARS` characters.
fn summarise_body(body: &[u8]) -> Option<String> {
    const SUMMARY_CHARS: usize = 160;

    let text = String::from_utf8_lossy(body);
    let mut words = text.split_whitespace();
    let mut summary = words.next()?.to_owned();
    for word in words {
        summary.push(' ');
        summary.push_str(word);
    }
    if let Some((cut, _)) = summary.char_indices().nth(SUMMARY_CHARS) {
        summary.truncate(cut);
        summary.push_str("...");
    }
    Some(summary)
}
