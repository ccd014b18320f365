//! Thin reqwest wrapper with per-request timeouts.
//!
//! Every request carries its own timeout in milliseconds so a slow host can
//! only stall the source that asked for it. `get` and `head` return non-2xx
//! statuses as responses; `get_json` treats them as errors.

use anyhow::{Context, Result};
use futures::stream::{self, StreamExt};
use reqwest::header::HeaderMap;
use reqwest::redirect::Policy;
use std::time::Duration;

/// Browser-like user agent sent with every request.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0 Safari/537.36";

/// A fetched document.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    /// The requested URL.
    pub url: String,
    /// URL after following redirects.
    pub final_url: String,
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

/// Metadata from a HEAD request.
#[derive(Debug, Clone)]
pub struct HeadResponse {
    pub url: String,
    pub status: u16,
    pub content_type: Option<String>,
}

/// Shared HTTP client. Cheap to clone.
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: reqwest::Client,
}

impl HttpClient {
    /// Create a client that follows up to ten redirects.
    pub fn new(user_agent: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .redirect(Policy::limited(10))
            .build()
            .context("building HTTP client")?;
        Ok(Self { client })
    }

    /// GET a URL and read the body as text.
    pub async fn get(&self, url: &str, timeout_ms: u64) -> Result<HttpResponse> {
        let resp = self
            .client
            .get(url)
            .timeout(Duration::from_millis(timeout_ms))
            .send()
            .await
            .with_context(|| format!("GET {url}"))?;

        let status = resp.status().as_u16();
        let final_url = resp.url().to_string();
        let headers = header_pairs(resp.headers());
        let body = resp
            .text()
            .await
            .with_context(|| format!("reading body of {url}"))?;

        Ok(HttpResponse {
            url: url.to_string(),
            final_url,
            status,
            headers,
            body,
        })
    }

    /// GET a URL and decode the body as JSON.
    ///
    /// `query` pairs are URL-encoded onto the request; `headers` carry
    /// credentials such as an `authorization` bearer token.
    pub async fn get_json(
        &self,
        url: &str,
        query: &[(&str, &str)],
        headers: &[(&str, &str)],
        timeout_ms: u64,
    ) -> Result<serde_json::Value> {
        let mut request = self
            .client
            .get(url)
            .query(query)
            .header("accept", "application/dns-json, application/json")
            .timeout(Duration::from_millis(timeout_ms));
        for (name, value) in headers {
            request = request.header(*name, *value);
        }
        let resp = request
            .send()
            .await
            .with_context(|| format!("GET {url}"))?
            .error_for_status()
            .with_context(|| format!("GET {url}"))?;
        resp.json()
            .await
            .with_context(|| format!("decoding JSON from {url}"))
    }

    /// HEAD a URL, following redirects.
    pub async fn head(&self, url: &str, timeout_ms: u64) -> Result<HeadResponse> {
        let resp = self
            .client
            .head(url)
            .timeout(Duration::from_millis(timeout_ms))
            .send()
            .await
            .with_context(|| format!("HEAD {url}"))?;

        Ok(HeadResponse {
            url: url.to_string(),
            status: resp.status().as_u16(),
            content_type: resp
                .headers()
                .get("content-type")
                .and_then(|v| v.to_str().ok())
                .map(String::from),
        })
    }

    /// HEAD many URLs with bounded concurrency; results keep input order.
    pub async fn head_many(
        &self,
        urls: &[String],
        concurrency: usize,
        timeout_ms: u64,
    ) -> Vec<Result<HeadResponse>> {
        stream::iter(urls.to_vec())
            .map(|url| async move { self.head(&url, timeout_ms).await })
            .buffered(concurrency.max(1))
            .collect()
            .await
    }
}

fn header_pairs(headers: &HeaderMap) -> Vec<(String, String)> {
    headers
        .iter()
        .filter_map(|(k, v)| v.to_str().ok().map(|v| (k.to_string(), v.to_string())))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_get_returns_non_success_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/missing"))
            .respond_with(ResponseTemplate::new(404).set_body_string("gone"))
            .mount(&server)
            .await;

        let client = HttpClient::new(DEFAULT_USER_AGENT).unwrap();
        let resp = client
            .get(&format!("{}/missing", server.uri()), 5_000)
            .await
            .unwrap();
        assert_eq!(resp.status, 404);
        assert_eq!(resp.body, "gone");
    }

    #[tokio::test]
    async fn test_head_many_keeps_order() {
        let server = MockServer::start().await;
        Mock::given(method("HEAD"))
            .and(path("/a"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;
        Mock::given(method("HEAD"))
            .and(path("/b"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let client = HttpClient::new(DEFAULT_USER_AGENT).unwrap();
        let urls = vec![format!("{}/a", server.uri()), format!("{}/b", server.uri())];
        let results = client.head_many(&urls, 4, 5_000).await;
        let statuses: Vec<u16> = results.into_iter().map(|r| r.unwrap().status).collect();
        assert_eq!(statuses, vec![200, 404]);
    }

    #[tokio::test]
    async fn test_get_json_encodes_query_and_headers() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/lookup"))
            .and(query_param("name", "a b&c"))
            .and(header("authorization", "Bearer t0k"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"ok": true})))
            .mount(&server)
            .await;

        let client = HttpClient::new(DEFAULT_USER_AGENT).unwrap();
        let body = client
            .get_json(
                &format!("{}/lookup", server.uri()),
                &[("name", "a b&c")],
                &[("authorization", "Bearer t0k")],
                5_000,
            )
            .await
            .unwrap();
        assert_eq!(body["ok"], true);
    }

    #[tokio::test]
    async fn test_get_json_rejects_error_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(429).set_body_json(serde_json::json!({})))
            .mount(&server)
            .await;

        let client = HttpClient::new(DEFAULT_USER_AGENT).unwrap();
        assert!(client.get_json(&server.uri(), &[], &[], 5_000).await.is_err());
    }

    #[tokio::test]
    async fn test_get_fails_on_refused_connection() {
        let client = HttpClient::new(DEFAULT_USER_AGENT).unwrap();
        assert!(client.get("http://127.0.0.1:1/", 2_000).await.is_err());
    }
}
