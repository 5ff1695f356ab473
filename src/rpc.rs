//! Minimal Sui JSON-RPC client
//!
//! Only the read methods the market client needs are wrapped here. Responses
//! are kept as `serde_json::Value` below the envelope level because Move
//! object content is schemaless JSON.

use crate::{constants::USER_AGENT, error::ClientError};
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

#[derive(Debug, Serialize)]
struct RpcRequest<'a> {
    jsonrpc: &'static str,
    id: u64,
    method: &'a str,
    params: Value,
}

#[derive(Debug, Deserialize)]
struct RpcResponse<T> {
    result: Option<T>,
    error: Option<RpcErrorObject>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorObject {
    code: i64,
    message: String,
}

/// One page of `suix_getDynamicFields`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DynamicFieldPage {
    pub data: Vec<DynamicFieldInfo>,
    pub next_cursor: Option<Value>,
    pub has_next_page: bool,
}

/// Summary of one dynamic field
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DynamicFieldInfo {
    pub object_id: String,
    #[serde(default)]
    pub name: Value,
}

/// Response of the object read methods
#[derive(Debug, Clone, Deserialize)]
pub struct SuiObjectResponse {
    pub data: Option<SuiObjectData>,
    pub error: Option<Value>,
}

/// Object payload, content included when requested
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuiObjectData {
    pub object_id: String,
    pub content: Option<Value>,
}

impl SuiObjectResponse {
    /// The object's Move content, or an error naming `what`
    pub fn into_content(self, what: &str) -> Result<Value, ClientError> {
        match self.data {
            Some(SuiObjectData {
                content: Some(content),
                ..
            }) => Ok(content),
            Some(_) => Err(ClientError::invalid_response(format!(
                "object {} has no content",
                what
            ))),
            None => Err(ClientError::ObjectNotFound(format!(
                "{} ({})",
                what,
                self.error.unwrap_or(Value::Null)
            ))),
        }
    }
}

/// Sui fullnode JSON-RPC client
pub struct SuiRpcClient {
    client: Client,
    url: String,
    next_id: AtomicU64,
}

impl SuiRpcClient {
    /// Creates a client for `url` with the given request timeout
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, ClientError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(ClientError::NetworkError)?;

        Ok(Self::with_client(url, client))
    }

    /// Creates a client sharing an existing HTTP client
    pub fn with_client(url: impl Into<String>, client: Client) -> Self {
        Self {
            client,
            url: url.into(),
            next_id: AtomicU64::new(1),
        }
    }

    /// Sends one JSON-RPC call and decodes its result
    pub async fn call<T: DeserializeOwned>(
        &self,
        method: &str,
        params: Value,
    ) -> Result<T, ClientError> {
        let request = RpcRequest {
            jsonrpc: "2.0",
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
            method,
            params,
        };
        tracing::debug!(method, id = request.id, url = %self.url, "Sending RPC request");

        let response = self
            .client
            .post(&self.url)
            .json(&request)
            .send()
            .await
            .map_err(ClientError::NetworkError)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(status_error(status, body));
        }

        let body = response.text().await.map_err(ClientError::NetworkError)?;
        decode_response(method, &body)
    }

    /// `sui_getObject` with content
    pub async fn get_object(&self, object_id: &str) -> Result<SuiObjectResponse, ClientError> {
        self.call("sui_getObject", json!([object_id, { "showContent": true }]))
            .await
    }

    /// `sui_multiGetObjects` with content
    pub async fn multi_get_objects(
        &self,
        object_ids: &[String],
    ) -> Result<Vec<SuiObjectResponse>, ClientError> {
        self.call(
            "sui_multiGetObjects",
            json!([object_ids, { "showContent": true }]),
        )
        .await
    }

    /// `suix_getDynamicFields`, one page
    pub async fn get_dynamic_fields(
        &self,
        parent_id: &str,
        cursor: Option<&Value>,
        limit: usize,
    ) -> Result<DynamicFieldPage, ClientError> {
        self.call("suix_getDynamicFields", json!([parent_id, cursor, limit]))
            .await
    }

    /// `suix_getDynamicFieldObject`
    pub async fn get_dynamic_field_object(
        &self,
        parent_id: &str,
        name: Value,
    ) -> Result<SuiObjectResponse, ClientError> {
        self.call("suix_getDynamicFieldObject", json!([parent_id, name]))
            .await
    }
}

fn status_error(status: StatusCode, body: String) -> ClientError {
    ClientError::RpcHttp {
        status: status.as_u16(),
        body,
    }
}

fn decode_response<T: DeserializeOwned>(method: &str, body: &str) -> Result<T, ClientError> {
    let envelope: RpcResponse<T> = serde_json::from_str(body).map_err(|e| {
        ClientError::invalid_response(format!(
            "Failed to parse {} response: {}. Response: {}",
            method, e, body
        ))
    })?;

    if let Some(err) = envelope.error {
        return Err(ClientError::RpcError {
            code: err.code,
            message: err.message,
        });
    }

    envelope
        .result
        .ok_or_else(|| ClientError::invalid_response(format!("{} returned no result", method)))
}
