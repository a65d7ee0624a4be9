// settingsync/src/remote/http_client.rs
use anyhow::{Context, Result, anyhow};
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use reqwest::{Method, RequestBuilder};
use serde::Serialize;
use std::time::Duration;
use url::Url;

use super::{RecordStore, StoreResponse};
use crate::errors::AppError;
use crate::records::{Record, RecordCollection};

#[derive(Serialize)]
struct RecordEnvelope<'a> {
    data: &'a Record,
}

/// Talks to the `.../collections/<name>/records` endpoint of a remote
/// settings server.
pub struct HttpRecordStore {
    client: reqwest::Client,
    records_url: Url,
}

impl HttpRecordStore {
    /// `auth_header` is sent verbatim as the `Authorization` header on every
    /// request. It is marked sensitive so it never shows up in debug output.
    pub fn new(records_url: Url, auth_header: &str, timeout: Option<Duration>) -> Result<Self> {
        let mut auth_value = HeaderValue::from_str(auth_header.trim())
            .context("Authentication header contains characters that are not valid in an HTTP header")?;
        auth_value.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, auth_value);

        let mut builder = reqwest::Client::builder().default_headers(headers);
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().context("Failed to build HTTP client")?;

        Ok(HttpRecordStore {
            client,
            records_url,
        })
    }

    /// `<records_url>/<remote_id>`, with the id percent-encoded as a single segment.
    fn record_url(&self, remote_id: &str) -> Result<Url> {
        record_url(&self.records_url, remote_id)
    }

    async fn send(&self, method: Method, url: &Url, request: RequestBuilder) -> Result<StoreResponse> {
        let response = request
            .send()
            .await
            .with_context(|| format!("{} {} failed", method, url))?;
        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .with_context(|| format!("Failed to read response body of {} {}", method, url))?;
        tracing::debug!(%method, %url, status, "remote settings request completed");
        Ok(StoreResponse { status, body })
    }
}

pub(crate) fn record_url(records_url: &Url, remote_id: &str) -> Result<Url> {
    let mut url = records_url.clone();
    url.path_segments_mut()
        .map_err(|_| anyhow!("Records URL {} cannot carry a path", records_url))?
        .pop_if_empty()
        .push(remote_id);
    Ok(url)
}

impl RecordStore for HttpRecordStore {
    async fn list(&self) -> Result<RecordCollection> {
        let url = &self.records_url;
        let response = self
            .send(Method::GET, url, self.client.get(url.clone()))
            .await?;
        if !response.is_success() {
            return Err(AppError::RemoteStatus {
                status: response.status,
                body: response.body,
            })
            .with_context(|| format!("Failed to fetch remote records from {}", url));
        }
        RecordCollection::from_json_str(&response.body)
            .with_context(|| format!("Unexpected response body from {}", url))
    }

    async fn create(&self, record: &Record) -> Result<StoreResponse> {
        let url = &self.records_url;
        let request = self
            .client
            .post(url.clone())
            .json(&RecordEnvelope { data: record });
        self.send(Method::POST, url, request).await
    }

    async fn update(&self, remote_id: &str, record: &Record) -> Result<StoreResponse> {
        let url = self.record_url(remote_id)?;
        let request = self
            .client
            .put(url.clone())
            .json(&RecordEnvelope { data: record });
        self.send(Method::PUT, &url, request).await
    }

    async fn delete(&self, remote_id: &str) -> Result<StoreResponse> {
        let url = self.record_url(remote_id)?;
        let request = self.client.delete(url.clone());
        self.send(Method::DELETE, &url, request).await
    }
}
