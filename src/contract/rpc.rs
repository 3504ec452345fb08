//! Minimal JSON-RPC client for a Substrate node.
//!
//! Hand-rolled HTTP/1.1 over a per-call `TcpStream`; the crate talks to
//! a single endpoint with tiny request bodies, so a full HTTP stack
//! would only add weight. Every failure maps to
//! [`ContractError::Transport`], which the caller absorbs by falling
//! back to the simulated ledger.

use serde_json::{json, Value};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tracing::debug;

use crate::types::AccountId;

use super::{ContractError, ContractResult};

/// A parsed, probed JSON-RPC endpoint.
#[derive(Debug)]
pub struct ChainRpc {
    host: String,
    port: u16,
    path: String,
}

impl ChainRpc {
    /// Parse the endpoint URL and probe it with one TCP connect.
    ///
    /// Plain `http://` and `ws://` endpoints are supported. TLS schemes
    /// are transport errors; callers then degrade to simulation.
    ///
    /// # Errors
    /// `Transport` if the URL is malformed or the endpoint unreachable
    pub async fn connect(url: &str) -> ContractResult<Self> {
        let rpc = Self::parse(url)?;
        TcpStream::connect((rpc.host.as_str(), rpc.port))
            .await
            .map_err(|e| ContractError::Transport(format!("cannot reach {url}: {e}")))?;
        Ok(rpc)
    }

    fn parse(url: &str) -> ContractResult<Self> {
        let (scheme, rest) = url
            .split_once("://")
            .ok_or_else(|| ContractError::Transport(format!("invalid RPC URL: {url}")))?;

        let default_port = match scheme {
            "http" => 80,
            "ws" => 9944,
            "https" | "wss" => {
                return Err(ContractError::Transport(format!(
                    "TLS endpoint {url} is not supported by the built-in RPC client"
                )))
            }
            other => {
                return Err(ContractError::Transport(format!(
                    "unsupported RPC scheme: {other}"
                )))
            }
        };

        let (authority, path) = match rest.split_once('/') {
            Some((authority, path)) => (authority, format!("/{path}")),
            None => (rest, "/".to_string()),
        };

        let (host, port) = match authority.rsplit_once(':') {
            Some((host, port)) => (
                host.to_string(),
                port.parse::<u16>().map_err(|_| {
                    ContractError::Transport(format!("invalid port in RPC URL: {url}"))
                })?,
            ),
            None => (authority.to_string(), default_port),
        };

        if host.is_empty() {
            return Err(ContractError::Transport(format!("invalid RPC URL: {url}")));
        }

        Ok(Self { host, port, path })
    }

    /// One JSON-RPC 2.0 exchange over a fresh connection.
    async fn call(&self, method: &str, params: Value) -> ContractResult<Value> {
        let body = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": method,
            "params": params,
        })
        .to_string();

        let request = format!(
            "POST {} HTTP/1.1\r\nHost: {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            self.path,
            self.host,
            body.len(),
            body
        );

        debug!(method, host = %self.host, "rpc request");

        let mut stream = TcpStream::connect((self.host.as_str(), self.port))
            .await
            .map_err(|e| ContractError::Transport(format!("connect failed: {e}")))?;
        stream
            .write_all(request.as_bytes())
            .await
            .map_err(|e| ContractError::Transport(format!("request write failed: {e}")))?;

        // "Connection: close" makes read-to-end a valid framing; the
        // replies here are small JSON documents.
        let mut raw = Vec::new();
        stream
            .read_to_end(&mut raw)
            .await
            .map_err(|e| ContractError::Transport(format!("response read failed: {e}")))?;

        let text = String::from_utf8_lossy(&raw);
        let (head, payload) = text
            .split_once("\r\n\r\n")
            .ok_or_else(|| ContractError::Transport("malformed HTTP response".to_string()))?;

        let status_line = head.lines().next().unwrap_or_default();
        if !status_line.contains(" 200 ") {
            return Err(ContractError::Transport(format!(
                "HTTP error from node: {status_line}"
            )));
        }
        if head.to_ascii_lowercase().contains("transfer-encoding: chunked") {
            return Err(ContractError::Transport(
                "chunked responses are not supported".to_string(),
            ));
        }

        let reply: Value = serde_json::from_str(payload.trim()).map_err(|e| {
            ContractError::Transport(format!("invalid JSON-RPC response: {e}"))
        })?;
        if let Some(err) = reply.get("error") {
            return Err(ContractError::Transport(format!(
                "node returned error: {err}"
            )));
        }
        reply
            .get("result")
            .cloned()
            .ok_or_else(|| ContractError::Transport("JSON-RPC response has no result".to_string()))
    }

    async fn call_string(&self, method: &str, params: Value) -> ContractResult<String> {
        self.call(method, params).await?.as_str().map_or_else(
            || {
                Err(ContractError::Transport(format!(
                    "{method} returned a non-string result"
                )))
            },
            |s| Ok(s.to_string()),
        )
    }

    /// Node implementation name
    ///
    /// # Errors
    /// `Transport` on any RPC failure
    pub async fn system_name(&self) -> ContractResult<String> {
        self.call_string("system_name", json!([])).await
    }

    /// Chain name (e.g. "Westend")
    ///
    /// # Errors
    /// `Transport` on any RPC failure
    pub async fn system_chain(&self) -> ContractResult<String> {
        self.call_string("system_chain", json!([])).await
    }

    /// Read-only contract query through the contracts runtime API.
    ///
    /// The origin/value/gas envelope around `data` belongs to the SCALE
    /// encoding this crate leaves incomplete; a node will reject this
    /// call and the invoker falls back to simulation.
    ///
    /// # Errors
    /// `Transport` on any RPC failure or an undecodable result
    pub async fn contract_query(
        &self,
        contract: &AccountId,
        data: &[u8],
    ) -> ContractResult<Vec<u8>> {
        let mut call_data = Vec::with_capacity(32 + data.len());
        call_data.extend_from_slice(contract.as_bytes());
        call_data.extend_from_slice(data);

        let result = self
            .call(
                "state_call",
                json!([
                    "ContractsApi_call",
                    format!("0x{}", hex::encode(call_data)),
                    Value::Null,
                ]),
            )
            .await?;

        let encoded = result.as_str().ok_or_else(|| {
            ContractError::Transport("state_call returned a non-string result".to_string())
        })?;
        hex::decode(encoded.trim_start_matches("0x"))
            .map_err(|e| ContractError::Transport(format!("undecodable query result: {e}")))
    }

    /// Submit a signed extrinsic; returns the reported transaction hash.
    ///
    /// # Errors
    /// `Transport` on any RPC failure
    pub async fn submit_extrinsic(&self, ext: &[u8]) -> ContractResult<String> {
        self.call_string(
            "author_submitExtrinsic",
            json!([format!("0x{}", hex::encode(ext))]),
        )
        .await
    }

    /// Genesis block hash, needed for extrinsic signing
    ///
    /// # Errors
    /// `Transport` on any RPC failure
    pub async fn genesis_hash(&self) -> ContractResult<String> {
        self.call_string("chain_getBlockHash", json!([0])).await
    }

    /// Current best block number, used by the bounded inclusion wait
    ///
    /// # Errors
    /// `Transport` on any RPC failure or a malformed header
    pub async fn head_number(&self) -> ContractResult<u64> {
        let header = self.call("chain_getHeader", json!([])).await?;
        let number = header
            .get("number")
            .and_then(Value::as_str)
            .ok_or_else(|| ContractError::Transport("header has no number".to_string()))?;
        u64::from_str_radix(number.trim_start_matches("0x"), 16)
            .map_err(|e| ContractError::Transport(format!("bad block number {number}: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_ws_url_with_default_port() {
        let rpc = ChainRpc::parse("ws://rpc.example.org").unwrap();
        assert_eq!(rpc.host, "rpc.example.org");
        assert_eq!(rpc.port, 9944);
        assert_eq!(rpc.path, "/");
    }

    #[test]
    fn test_parse_http_url_with_port_and_path() {
        let rpc = ChainRpc::parse("http://127.0.0.1:8545/rpc").unwrap();
        assert_eq!(rpc.host, "127.0.0.1");
        assert_eq!(rpc.port, 8545);
        assert_eq!(rpc.path, "/rpc");
    }

    #[test]
    fn test_parse_rejects_tls_and_garbage() {
        assert!(ChainRpc::parse("wss://westend-rpc.polkadot.io").is_err());
        assert!(ChainRpc::parse("https://example.org").is_err());
        assert!(ChainRpc::parse("not a url").is_err());
        assert!(ChainRpc::parse("ftp://example.org").is_err());
        assert!(ChainRpc::parse("ws://:9944").is_err());
    }

    #[tokio::test]
    async fn test_connect_to_dead_endpoint_is_transport_error() {
        // Port 1 on localhost is assumed closed.
        let err = ChainRpc::connect("ws://127.0.0.1:1").await.unwrap_err();
        assert!(matches!(err, ContractError::Transport(_)));
    }
}
