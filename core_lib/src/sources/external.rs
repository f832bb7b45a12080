use super::{encoding::extract_height, web::fetch_json, HeightEncoding, HeightSource};
use crate::{config::SourceConfig, error::SourceError};
use reqwest::Client;

/// A third-party service reporting the chain height over HTTP+JSON.
#[derive(Debug, Clone)]
pub struct ExternalSource {
    name: String,
    url: String,
    field: String,
    encoding: HeightEncoding,
    client: Client,
}

impl ExternalSource {
    pub fn new(
        name: impl Into<String>,
        url: impl Into<String>,
        field: impl Into<String>,
        encoding: HeightEncoding,
        client: Client,
    ) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            field: field.into(),
            encoding,
            client,
        }
    }

    pub fn from_config(config: &SourceConfig, client: Client) -> Self {
        Self::new(
            config.name.clone(),
            config.url.clone(),
            config.field.clone(),
            config.encoding,
            client,
        )
    }
}

#[async_trait::async_trait]
impl HeightSource for ExternalSource {
    fn name(&self) -> &str {
        &self.name
    }

    async fn fetch_height(&self) -> Result<i64, SourceError> {
        let json = fetch_json(&self.client, &self.url).await?;
        extract_height(&json, &self.field, self.encoding).map_err(|e| {
            tracing::debug!(source = %self.name, response = %json, "Unexpected response shape");
            e
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::web::build_client;
    use std::time::Duration;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_etherscan_style_source() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api"))
            .and(query_param("action", "eth_blockNumber"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "jsonrpc": "2.0",
                "id": 83,
                "result": "0x64"
            })))
            .mount(&server)
            .await;

        let source = ExternalSource::new(
            "etherscan",
            format!("{}/api?module=proxy&action=eth_blockNumber", server.uri()),
            "result",
            HeightEncoding::HexString,
            build_client(Duration::from_secs(2)).unwrap(),
        );

        assert_eq!(source.name(), "etherscan");
        assert_eq!(source.fetch_height().await.unwrap(), 100);
    }

    #[tokio::test]
    async fn test_from_config_number_source() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/eth/network/lastblocknumber/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "status": true,
                "data": 105
            })))
            .mount(&server)
            .await;

        let config = SourceConfig {
            name: "nanopool".to_string(),
            url: format!("{}/v1/eth/network/lastblocknumber/", server.uri()),
            field: "data".to_string(),
            encoding: HeightEncoding::Number,
        };
        let source = ExternalSource::from_config(&config, build_client(Duration::from_secs(2)).unwrap());

        assert_eq!(source.fetch_height().await.unwrap(), 105);
    }

    #[tokio::test]
    async fn test_missing_field_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "error": "Limits reached."
            })))
            .mount(&server)
            .await;

        let source = ExternalSource::new(
            "blockcypher",
            server.uri(),
            "height",
            HeightEncoding::Number,
            build_client(Duration::from_secs(2)).unwrap(),
        );

        assert!(matches!(
            source.fetch_height().await,
            Err(SourceError::MissingField(field)) if field == "height"
        ));
    }
}
