// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! HTTP adapter for the v2 keys API
//!
//! Values travel as the form field `value`, options as query parameters.
//! A `307 Temporary Redirect` (issued by followers pointing at the leader) is
//! re-sent once to its `Location` with the same method, query and body.

use super::StoreAdapter;
use async_trait::async_trait;
use latch_core::{ApiError, StoreConfig, StoreError, StoreOptions, StoreResponse};
use reqwest::{Client, Method, Response, StatusCode, Url};
use std::time::Duration;

/// Header carrying the store-wide index on every response
const ETCD_INDEX_HEADER: &str = "x-etcd-index";

/// Store adapter speaking HTTP to a live store
#[derive(Clone, Debug)]
pub struct HttpStoreAdapter {
    client: Client,
    base_url: String,
    request_timeout: Duration,
    watch_timeout: Option<Duration>,
}

impl HttpStoreAdapter {
    pub fn new(config: &StoreConfig) -> Result<Self, StoreError> {
        let client = Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(|e| StoreError::Transport(e.to_string()))?;

        Ok(Self {
            client,
            base_url: config.base_url(),
            request_timeout: config.request_timeout,
            watch_timeout: config.watch_timeout,
        })
    }

    /// URL of a key; leading slashes on the key are ignored
    pub fn key_url(&self, key: &str) -> String {
        format!("{}/v2/keys/{}", self.base_url, key.trim_start_matches('/'))
    }

    async fn execute(
        &self,
        method: Method,
        key: &str,
        value: Option<&str>,
        opts: &StoreOptions,
    ) -> Result<StoreResponse, StoreError> {
        let url = self.key_url(key);
        let timeout = if opts.wait {
            self.watch_timeout
        } else {
            Some(self.request_timeout)
        };

        let response = self
            .send(method.clone(), &url, Some(opts), value, timeout)
            .await?;

        let response = if response.status() == StatusCode::TEMPORARY_REDIRECT {
            let location = redirect_target(&url, &response)?;
            tracing::debug!(from = %url, to = %location, "following store redirect");

            // A redirect that already carries the query keeps it as-is
            let query = if location.query().is_some() {
                None
            } else {
                Some(opts)
            };
            let redirected = self
                .send(method, location.as_str(), query, value, timeout)
                .await?;
            if redirected.status().is_redirection() {
                return Err(StoreError::TooManyRedirects {
                    location: location.to_string(),
                });
            }
            redirected
        } else {
            response
        };

        decode(response, opts.wait).await
    }

    async fn send(
        &self,
        method: Method,
        url: &str,
        query: Option<&StoreOptions>,
        value: Option<&str>,
        timeout: Option<Duration>,
    ) -> Result<Response, StoreError> {
        let mut request = self.client.request(method, url);
        if let Some(opts) = query {
            request = request.query(opts);
        }
        if let Some(value) = value {
            request = request.form(&[("value", value)]);
        }
        if let Some(timeout) = timeout {
            request = request.timeout(timeout);
        }

        request.send().await.map_err(transport_error)
    }
}

#[async_trait]
impl StoreAdapter for HttpStoreAdapter {
    async fn get(&self, key: &str, opts: &StoreOptions) -> Result<StoreResponse, StoreError> {
        self.execute(Method::GET, key, None, opts).await
    }

    async fn set(
        &self,
        key: &str,
        value: &str,
        opts: &StoreOptions,
    ) -> Result<StoreResponse, StoreError> {
        self.execute(Method::PUT, key, Some(value), opts).await
    }

    async fn delete(&self, key: &str, opts: &StoreOptions) -> Result<StoreResponse, StoreError> {
        self.execute(Method::DELETE, key, None, opts).await
    }

    async fn create(
        &self,
        dir: &str,
        value: &str,
        opts: &StoreOptions,
    ) -> Result<StoreResponse, StoreError> {
        self.execute(Method::POST, dir, Some(value), opts).await
    }
}

fn transport_error(err: reqwest::Error) -> StoreError {
    if err.is_timeout() {
        StoreError::Timeout
    } else {
        StoreError::Transport(err.to_string())
    }
}

/// Resolve the `Location` of a redirect against the request URL
fn redirect_target(request_url: &str, response: &Response) -> Result<Url, StoreError> {
    let location = response
        .headers()
        .get(reqwest::header::LOCATION)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| StoreError::Transport("redirect without a Location header".to_string()))?;

    Url::parse(request_url)
        .and_then(|base| base.join(location))
        .map_err(|e| StoreError::Transport(format!("invalid redirect location {location}: {e}")))
}

/// Turn a response into a result, normalizing store error payloads
async fn decode(response: Response, wait: bool) -> Result<StoreResponse, StoreError> {
    let status = response.status();
    let etcd_index = response
        .headers()
        .get(ETCD_INDEX_HEADER)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.parse::<u64>().ok());
    let body = response.bytes().await.map_err(transport_error)?;

    if let Ok(api) = serde_json::from_slice::<ApiError>(&body) {
        return Err(StoreError::Api(api));
    }

    // The store closes an expired watch with an empty 200
    if wait && body.is_empty() {
        return Err(StoreError::Timeout);
    }

    if !status.is_success() {
        return Err(StoreError::Transport(format!(
            "unexpected status {}: {}",
            status,
            String::from_utf8_lossy(&body)
        )));
    }

    let mut parsed: StoreResponse =
        serde_json::from_slice(&body).map_err(|e| StoreError::Decode(e.to_string()))?;
    parsed.etcd_index = etcd_index;
    Ok(parsed)
}

#[cfg(test)]
#[path = "http_tests.rs"]
mod tests;
