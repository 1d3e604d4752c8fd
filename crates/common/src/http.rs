//! Thin JSON-over-HTTP helpers shared by the remote data sources.

use std::time::Duration;

use reqwest::Client;
use serde::de::DeserializeOwned;

use crate::FetchError;

/// Build a client, optionally bounded by a whole-request timeout.
/// Without a timeout the reqwest defaults apply.
pub fn build_client(timeout: Option<Duration>) -> Result<Client, FetchError> {
    let mut builder = Client::builder();
    if let Some(t) = timeout {
        builder = builder.timeout(t);
    }
    builder.build().map_err(|e| FetchError::Network(e.to_string()))
}

/// Join a base URL and an absolute endpoint path without doubling slashes.
pub fn join_url(base_url: &str, path: &str) -> String {
    format!("{}/{}", base_url.trim_end_matches('/'), path.trim_start_matches('/'))
}

/// Issue one GET and decode the JSON body. Non-2xx responses are errors.
pub async fn get_json<T: DeserializeOwned>(client: &Client, url: &str) -> Result<T, FetchError> {
    let resp = client
        .get(url)
        .send()
        .await
        .map_err(|e| FetchError::Network(e.to_string()))?;
    let status = resp.status();
    if !status.is_success() {
        return Err(FetchError::Status { status: status.as_u16(), url: url.to_string() });
    }
    resp.json::<T>()
        .await
        .map_err(|e| FetchError::Parse(e.to_string()))
}
