//! Subtensor JSON-RPC client
//!
//! Reads `SubtensorModule::TaoDividendsPerSubnet` through `state_getStorage`.
//! `ws://`/`wss://` endpoints use a WebSocket connection, `http://`/`https://`
//! endpoints post JSON-RPC bodies. The connection is opened on first use,
//! reused by later queries and dropped on any transport failure.

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::net::TcpStream;
use tokio_tungstenite::{connect_async, tungstenite::Message, MaybeTlsStream, WebSocketStream};
use tracing::{debug, info, warn};

use crate::services::ledger_client::{
    rao_to_tao, BoxError, LedgerConnector, LedgerQueryFailed, RemoteLedgerClient,
};
use crate::services::storage_keys::{decode_ss58, tao_dividends_per_subnet_key};

/// Hands out one [`SubtensorClient`] per request.
#[derive(Debug, Clone)]
pub struct SubtensorConnector {
    endpoint: String,
}

impl SubtensorConnector {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl LedgerConnector for SubtensorConnector {
    fn client(&self) -> Box<dyn RemoteLedgerClient> {
        Box::new(SubtensorClient::new(self.endpoint.clone()))
    }
}

enum RpcConnection {
    Ws(WebSocketStream<MaybeTlsStream<TcpStream>>),
    Http { client: Client, url: String },
}

pub struct SubtensorClient {
    endpoint: String,
    connection: Option<RpcConnection>,
    next_id: u64,
}

#[derive(Debug, Serialize)]
struct RpcRequest<'a> {
    jsonrpc: &'static str,
    id: u64,
    method: &'a str,
    params: Value,
}

#[derive(Debug, Deserialize)]
struct RpcResponse {
    id: Option<u64>,
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

impl RpcResponse {
    fn into_result(self) -> Result<Value, BoxError> {
        match self.error {
            Some(err) => Err(format!("JSON-RPC error {}: {}", err.code, err.message).into()),
            None => Ok(self.result.unwrap_or(Value::Null)),
        }
    }
}

impl SubtensorClient {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            connection: None,
            next_id: 1,
        }
    }

    pub fn is_connected(&self) -> bool {
        self.connection.is_some()
    }

    async fn connect(&self) -> Result<RpcConnection, BoxError> {
        let endpoint = self.endpoint.as_str();

        if endpoint.starts_with("ws://") || endpoint.starts_with("wss://") {
            info!(endpoint = %endpoint, "Connecting to Subtensor over WebSocket");
            let (ws_stream, _) = connect_async(endpoint).await?;
            Ok(RpcConnection::Ws(ws_stream))
        } else if endpoint.starts_with("http://") || endpoint.starts_with("https://") {
            debug!(endpoint = %endpoint, "Using Subtensor HTTP JSON-RPC");
            Ok(RpcConnection::Http {
                client: Client::builder().build()?,
                url: endpoint.to_string(),
            })
        } else {
            Err(format!("Unsupported Subtensor endpoint scheme: {}", endpoint).into())
        }
    }

    async fn request(&mut self, method: &str, params: Value) -> Result<Value, BoxError> {
        let id = self.next_id;
        self.next_id += 1;

        let connection = match self.connection.take() {
            Some(connection) => connection,
            None => self.connect().await?,
        };
        let connection = self.connection.insert(connection);

        let request = RpcRequest {
            jsonrpc: "2.0",
            id,
            method,
            params,
        };

        let result = match connection {
            RpcConnection::Ws(ws) => ws_call(ws, id, &request).await,
            RpcConnection::Http { client, url } => http_call(client, url, &request).await,
        };

        if let Err(e) = &result {
            if is_transport_failure(e) {
                warn!(error = %e, "Dropping Subtensor connection after transport failure");
                self.connection = None;
            }
        }

        result
    }
}

async fn ws_call(
    ws: &mut WebSocketStream<MaybeTlsStream<TcpStream>>,
    id: u64,
    request: &RpcRequest<'_>,
) -> Result<Value, BoxError> {
    let text = serde_json::to_string(request)?;
    ws.send(Message::Text(text))
        .await
        .map_err(TransportError::from)?;

    loop {
        match ws.next().await {
            Some(Ok(Message::Text(text))) => {
                let response: RpcResponse = serde_json::from_str(&text)?;
                if response.id == Some(id) {
                    return response.into_result();
                }
                debug!("Ignoring JSON-RPC message for id {:?}", response.id);
            }
            Some(Ok(Message::Close(_))) | None => {
                return Err(TransportError::Closed.into());
            }
            Some(Err(e)) => return Err(TransportError::from(e).into()),
            // Ping/pong are answered by tungstenite itself
            Some(Ok(_)) => {}
        }
    }
}

async fn http_call(client: &Client, url: &str, request: &RpcRequest<'_>) -> Result<Value, BoxError> {
    let response = client
        .post(url)
        .json(request)
        .send()
        .await
        .map_err(TransportError::from)?;

    if !response.status().is_success() {
        let status = response.status();
        let error_text = response.text().await.unwrap_or_default();
        return Err(format!("Subtensor RPC error {}: {}", status, error_text).into());
    }

    let response: RpcResponse = response.json().await?;
    response.into_result()
}

#[derive(Debug, thiserror::Error)]
enum TransportError {
    #[error("websocket error: {0}")]
    Ws(#[from] tokio_tungstenite::tungstenite::Error),

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("connection closed by ledger")]
    Closed,
}

fn is_transport_failure(err: &BoxError) -> bool {
    err.downcast_ref::<TransportError>().is_some()
}

/// Decodes a `state_getStorage` result holding a SCALE `u64`.
///
/// `TaoDividendsPerSubnet` is a `ValueQuery` defaulting to zero, so a `null`
/// (never written) key reads as 0.
pub(crate) fn decode_storage_u64(value: &Value) -> Result<u64, BoxError> {
    let raw = match value {
        Value::Null => return Ok(0),
        Value::String(raw) => raw,
        other => return Err(format!("unexpected storage value shape: {}", other).into()),
    };

    let bytes = hex::decode(raw.trim_start_matches("0x"))?;
    let bytes: [u8; 8] = bytes
        .as_slice()
        .try_into()
        .map_err(|_| format!("expected 8 bytes of u64 storage, got {}", bytes.len()))?;

    Ok(u64::from_le_bytes(bytes))
}

#[async_trait]
impl RemoteLedgerClient for SubtensorClient {
    async fn query_dividends(
        &mut self,
        netuid: u16,
        hotkey: &str,
    ) -> Result<Option<f64>, LedgerQueryFailed> {
        let Some(account_id) = decode_ss58(hotkey) else {
            debug!(netuid, hotkey = %hotkey, "Hotkey is not a valid SS58 address, no dividend data");
            return Ok(None);
        };

        let key = tao_dividends_per_subnet_key(netuid, &account_id);
        let params = json!([format!("0x{}", hex::encode(key))]);

        let value = self
            .request("state_getStorage", params)
            .await
            .map_err(LedgerQueryFailed::new)?;

        let rao = decode_storage_u64(&value).map_err(LedgerQueryFailed::new)?;
        debug!(netuid, hotkey = %hotkey, rao, "TaoDividendsPerSubnet read");

        Ok(Some(rao_to_tao(rao)))
    }

    async fn close(&mut self) {
        match self.connection.take() {
            Some(RpcConnection::Ws(mut ws)) => {
                if let Err(e) = ws.close(None).await {
                    debug!(error = %e, "Subtensor WebSocket close failed");
                }
            }
            Some(RpcConnection::Http { .. }) | None => {}
        }
    }
}
