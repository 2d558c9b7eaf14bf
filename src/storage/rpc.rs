//! Minimal JSON-RPC 2.0 client over HTTP.
//!
//! # Responsibilities
//! - Envelope requests with monotonically increasing ids
//! - Enforce a per-request transport timeout
//! - Map transport, HTTP status and server errors to `RpcError`

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Errors from a JSON-RPC exchange.
#[derive(Debug, Error)]
pub enum RpcError {
    #[error("invalid endpoint URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("transport error calling {method}: {source}")]
    Transport {
        method: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{method} returned HTTP status {status}")]
    Status { method: String, status: u16 },

    #[error("{method} failed with code {code}: {message}")]
    Server {
        method: String,
        code: i64,
        message: String,
    },

    #[error("could not decode {method} response: {source}")]
    Decode {
        method: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Positional parameters for methods that take none; serializes as `[]`.
pub const NO_PARAMS: [u8; 0] = [];

#[derive(Serialize)]
struct RpcRequest<'a, P> {
    jsonrpc: &'static str,
    id: u64,
    method: &'a str,
    params: P,
}

#[derive(Deserialize)]
struct RpcResponse {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<RpcErrorObject>,
}

#[derive(Deserialize)]
struct RpcErrorObject {
    code: i64,
    message: String,
}

/// JSON-RPC client bound to one endpoint.
#[derive(Debug)]
pub struct RpcClient {
    http: reqwest::Client,
    url: url::Url,
    next_id: AtomicU64,
}

impl RpcClient {
    /// Create a client for `url`; only http and https endpoints are accepted.
    pub fn new(url: &str, timeout: Duration) -> Result<Self, RpcError> {
        let parsed = parse_endpoint(url)?;
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| RpcError::InvalidUrl {
                url: url.to_string(),
                reason: e.to_string(),
            })?;

        Ok(Self {
            http,
            url: parsed,
            next_id: AtomicU64::new(1),
        })
    }

    pub fn url(&self) -> &url::Url {
        &self.url
    }

    /// Invoke `method` with positional `params` and decode the result.
    ///
    /// A missing or `null` result decodes as JSON `null`, so `Option<T>` and `()`
    /// are valid result types.
    pub async fn call<P, R>(&self, method: &str, params: P) -> Result<R, RpcError>
    where
        P: Serialize,
        R: DeserializeOwned,
    {
        let request = RpcRequest {
            jsonrpc: "2.0",
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
            method,
            params,
        };

        tracing::debug!(url = %self.url, method, id = request.id, "JSON-RPC request");

        let response = self
            .http
            .post(self.url.clone())
            .json(&request)
            .send()
            .await
            .map_err(|source| RpcError::Transport {
                method: method.to_string(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(RpcError::Status {
                method: method.to_string(),
                status: status.as_u16(),
            });
        }

        let body: RpcResponse = response.json().await.map_err(|source| RpcError::Transport {
            method: method.to_string(),
            source,
        })?;

        decode_response(method, body)
    }
}

fn decode_response<R: DeserializeOwned>(method: &str, body: RpcResponse) -> Result<R, RpcError> {
    if let Some(err) = body.error {
        return Err(RpcError::Server {
            method: method.to_string(),
            code: err.code,
            message: err.message,
        });
    }

    serde_json::from_value(body.result.unwrap_or(Value::Null)).map_err(|source| RpcError::Decode {
        method: method.to_string(),
        source,
    })
}

/// Parse and check an endpoint URL.
pub fn parse_endpoint(url: &str) -> Result<url::Url, RpcError> {
    let parsed: url::Url = url.parse().map_err(|e: url::ParseError| RpcError::InvalidUrl {
        url: url.to_string(),
        reason: e.to_string(),
    })?;
    match parsed.scheme() {
        "http" | "https" => Ok(parsed),
        other => Err(RpcError::InvalidUrl {
            url: url.to_string(),
            reason: format!("unsupported scheme '{}'", other),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(json: &str) -> RpcResponse {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_null_result_decodes_as_none() {
        let body = response(r#"{"jsonrpc":"2.0","id":1,"result":null}"#);
        let decoded: Option<u64> = decode_response("zgs_getFileInfo", body).unwrap();
        assert!(decoded.is_none());
    }

    #[test]
    fn test_unit_result() {
        let body = response(r#"{"jsonrpc":"2.0","id":1,"result":null}"#);
        let _: () = decode_response("zgs_uploadSegments", body).unwrap();
    }

    #[test]
    fn test_server_error_is_surfaced() {
        let body = response(r#"{"jsonrpc":"2.0","id":1,"error":{"code":-32000,"message":"boom"}}"#);
        let err = decode_response::<u64>("zgs_getStatus", body).unwrap_err();
        assert!(matches!(err, RpcError::Server { code: -32000, .. }));
        assert!(err.to_string().contains("boom"));
    }

    #[test]
    fn test_type_mismatch_is_decode_error() {
        let body = response(r#"{"jsonrpc":"2.0","id":1,"result":"nope"}"#);
        let err = decode_response::<u64>("zgs_getStatus", body).unwrap_err();
        assert!(matches!(err, RpcError::Decode { .. }));
    }

    #[test]
    fn test_endpoint_validation() {
        assert!(parse_endpoint("https://rpc-storage-testnet.0g.ai").is_ok());
        assert!(parse_endpoint("ftp://example.com").is_err());
        assert!(parse_endpoint("not a url").is_err());
    }

    /// Serve one JSON-RPC method that answers with the request's id and params.
    async fn echo_server() -> String {
        use axum::routing::post;
        use axum::{Json, Router};

        let router = Router::new().route(
            "/",
            post(|Json(request): Json<Value>| async move {
                Json(serde_json::json!({
                    "jsonrpc": "2.0",
                    "id": request["id"],
                    "result": { "id": request["id"], "params": request["params"] },
                }))
            }),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{}", addr)
    }

    #[derive(Deserialize)]
    struct Echo {
        id: u64,
        params: Value,
    }

    #[tokio::test]
    async fn test_calls_carry_increasing_ids() {
        let client = RpcClient::new(&echo_server().await, Duration::from_secs(5)).unwrap();

        let first: Echo = client.call("echo", NO_PARAMS).await.unwrap();
        let second: Echo = client.call("echo", ("0xab",)).await.unwrap();

        assert!(second.id > first.id);
        assert_eq!(first.params, serde_json::json!([]));
        assert_eq!(second.params, serde_json::json!(["0xab"]));
    }
}
