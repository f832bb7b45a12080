//! JSON-RPC client for the local Ethereum node.

use super::{encoding::parse_prefixed_int, HeightSource};
use crate::error::SourceError;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Serialize)]
struct RpcRequest<'a> {
    jsonrpc: &'static str,
    method: &'a str,
    params: [Value; 0],
    id: u64,
}

#[derive(Debug, Deserialize)]
struct RpcResponse {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<RpcErrorObject>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorObject {
    code: i64,
    message: String,
}

#[derive(Debug, Clone)]
pub struct NodeClient {
    url: String,
    client: Client,
}

impl NodeClient {
    pub fn new(url: impl Into<String>, client: Client) -> Self {
        Self {
            url: url.into(),
            client,
        }
    }

    async fn call(&self, method: &str) -> Result<Value, SourceError> {
        let request = RpcRequest {
            jsonrpc: "2.0",
            method,
            params: [],
            id: 1,
        };

        let response = self.client.post(&self.url).json(&request).send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(SourceError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let reply: RpcResponse = serde_json::from_str(&body)?;
        if let Some(error) = reply.error {
            return Err(SourceError::Rpc {
                code: error.code,
                message: error.message,
            });
        }

        match reply.result {
            Some(Value::Null) | None => Err(SourceError::EmptyResult),
            Some(result) => Ok(result),
        }
    }

    /// Returns the node's head via `eth_blockNumber`.
    pub async fn block_number(&self) -> Result<i64, SourceError> {
        let result = self.call("eth_blockNumber").await?;
        let hex = result.as_str().ok_or_else(|| SourceError::WrongType {
            field: "result".to_string(),
            expected: "string",
        })?;
        parse_prefixed_int(hex)
    }
}

#[async_trait::async_trait]
impl HeightSource for NodeClient {
    fn name(&self) -> &str {
        "node"
    }

    async fn fetch_height(&self) -> Result<i64, SourceError> {
        self.block_number().await
    }
}
