// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::NetError;

const DEFAULT_TIMEOUT_MS: u64 = 30_000;

#[derive(Debug, Default, Deserialize)]
pub struct FetchOptions {
    #[serde(default)]
    pub method: Option<String>,
    #[serde(default)]
    pub headers: Vec<(String, String)>,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub timeout_ms: Option<u64>,
}

#[derive(Debug, Serialize)]
pub struct FetchResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

#[derive(Debug, Serialize)]
pub struct FetchBytesResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

async fn build_request(
    client: &Client,
    url: &str,
    opts: &FetchOptions,
) -> reqwest::RequestBuilder {
    let method = opts
        .method
        .as_deref()
        .and_then(|m| reqwest::Method::from_bytes(m.as_bytes()).ok())
        .unwrap_or(reqwest::Method::GET);
    let mut builder = client.request(method, url);
    for (name, value) in &opts.headers {
        builder = builder.header(name, value);
    }
    if let Some(body) = &opts.body {
        builder = builder.body(body.clone());
    }
    builder
}

pub async fn fetch(client: &Client, url: &str, opts: FetchOptions) -> Result<FetchResponse, NetError> {
    let timeout = Duration::from_millis(opts.timeout_ms.unwrap_or(DEFAULT_TIMEOUT_MS));
    let request = build_request(client, url, &opts).await;
    let response = tokio::time::timeout(timeout, request.send())
        .await
        .map_err(|_| NetError::Timeout)?
        .map_err(|e| NetError::RequestFailed(e.to_string()))?;
    let status = response.status().as_u16();
    let headers = header_pairs(&response);
    let body = response
        .text()
        .await
        .map_err(|e| NetError::RequestFailed(e.to_string()))?;
    Ok(FetchResponse { status, headers, body })
}

pub async fn fetch_bytes(
    client: &Client,
    url: &str,
    opts: FetchOptions,
) -> Result<FetchBytesResponse, NetError> {
    let timeout = Duration::from_millis(opts.timeout_ms.unwrap_or(DEFAULT_TIMEOUT_MS));
    let request = build_request(client, url, &opts).await;
    let response = tokio::time::timeout(timeout, request.send())
        .await
        .map_err(|_| NetError::Timeout)?
        .map_err(|e| NetError::RequestFailed(e.to_string()))?;
    let status = response.status().as_u16();
    let headers = header_pairs(&response);
    let bytes = response
        .bytes()
        .await
        .map_err(|e| NetError::RequestFailed(e.to_string()))?;
    let body = base64::Engine::encode(&base64::engine::general_purpose::STANDARD, bytes);
    Ok(FetchBytesResponse { status, headers, body })
}

pub async fn fetch_json(client: &Client, url: &str, opts: FetchOptions) -> Result<Value, NetError> {
    let response = fetch(client, url, opts).await?;
    serde_json::from_str(&response.body).map_err(|e| NetError::RequestFailed(e.to_string()))
}

pub async fn post_json(client: &Client, url: &str, payload: Value) -> Result<Value, NetError> {
    let timeout = Duration::from_millis(DEFAULT_TIMEOUT_MS);
    let response = tokio::time::timeout(timeout, client.post(url).json(&payload).send())
        .await
        .map_err(|_| NetError::Timeout)?
        .map_err(|e| NetError::RequestFailed(e.to_string()))?;
    let body = response
        .text()
        .await
        .map_err(|e| NetError::RequestFailed(e.to_string()))?;
    serde_json::from_str(&body).map_err(|e| NetError::RequestFailed(e.to_string()))
}

fn header_pairs(response: &reqwest::Response) -> Vec<(String, String)> {
    response
        .headers()
        .iter()
        .map(|(name, value)| {
            (
                name.to_string(),
                value.to_str().unwrap_or_default().to_string(),
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fetch_options_default_to_get_with_no_timeout_override() {
        let opts = FetchOptions::default();
        assert!(opts.method.is_none());
        assert!(opts.timeout_ms.is_none());
    }
}
