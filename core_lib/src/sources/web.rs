//! Shared HTTP client and JSON fetch helper for external height sources.

use crate::error::SourceError;
use reqwest::{header, Client};
use serde_json::Value;
use std::time::Duration;

const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/87.0.4280.60 Safari/537.36";

/// Builds the client shared by every source and every request. `timeout`
/// bounds each individual HTTP exchange.
pub fn build_client(timeout: Duration) -> Result<Client, reqwest::Error> {
    let mut headers = header::HeaderMap::new();
    headers.insert(header::USER_AGENT, header::HeaderValue::from_static(BROWSER_USER_AGENT));

    Client::builder()
        .timeout(timeout)
        .connect_timeout(timeout)
        .default_headers(headers)
        .build()
}

/// Fetches `url` and decodes the body as a JSON object.
pub async fn fetch_json(client: &Client, url: &str) -> Result<Value, SourceError> {
    let response = client.get(url).send().await?;
    let status = response.status();
    let body = response.text().await?;

    if !status.is_success() {
        return Err(SourceError::Status {
            status: status.as_u16(),
            body,
        });
    }

    let json: Value = serde_json::from_str(&body)?;
    if !json.is_object() {
        return Err(SourceError::NotAnObject);
    }
    Ok(json)
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header_exists, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_client() -> Client {
        build_client(Duration::from_secs(2)).unwrap()
    }

    #[tokio::test]
    async fn test_fetch_json_success() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/eth/main"))
            .and(header_exists("user-agent"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"height": 42})))
            .mount(&server)
            .await;

        let json = fetch_json(&test_client(), &format!("{}/v1/eth/main", server.uri()))
            .await
            .unwrap();
        assert_eq!(json["height"], 42);
    }

    #[tokio::test]
    async fn test_fetch_json_non_2xx() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(429).set_body_string("slow down"))
            .mount(&server)
            .await;

        let err = fetch_json(&test_client(), &server.uri()).await.unwrap_err();
        match err {
            SourceError::Status { status, body } => {
                assert_eq!(status, 429);
                assert_eq!(body, "slow down");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_fetch_json_malformed_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
            .mount(&server)
            .await;

        let err = fetch_json(&test_client(), &server.uri()).await.unwrap_err();
        assert!(matches!(err, SourceError::Json(_)));
    }

    #[tokio::test]
    async fn test_fetch_json_client_timeout() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"height": 1}))
                    .set_delay(Duration::from_secs(2)),
            )
            .mount(&server)
            .await;

        let client = build_client(Duration::from_millis(100)).unwrap();
        let err = fetch_json(&client, &server.uri()).await.unwrap_err();
        assert!(matches!(err, SourceError::Http(e) if e.is_timeout()));
    }
}
