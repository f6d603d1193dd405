//! Ethereum JSON-RPC chain client
//!
//! Speaks the three calls the escrow contract needs: eth_sendTransaction to
//! submit a verification, eth_getTransactionReceipt polling until the
//! transaction is included, and eth_call for the read-only status accessor.
//! Receipt polling is bounded by the configured confirmation timeout.

use super::{ChainClient, ChainError, TxReceipt};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use shamba_common::config::ChainConfig;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::time::Instant;

/// JSON-RPC client over a single chain endpoint
pub struct JsonRpcChain {
    http_client: reqwest::Client,
    rpc_url: String,
    from_account: String,
    confirm_timeout: Duration,
    poll_interval: Duration,
    next_id: AtomicU64,
}

#[derive(Debug, Deserialize)]
struct RpcResponse {
    /// Null both when absent and when the method legitimately answers null
    /// (a not-yet-included transaction has a null receipt)
    #[serde(default)]
    result: Value,
    error: Option<RpcError>,
}

#[derive(Debug, Deserialize)]
struct RpcError {
    code: i64,
    message: String,
}

impl JsonRpcChain {
    pub fn new(config: &ChainConfig) -> Result<Self, ChainError> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| ChainError::Transport(e.to_string()))?;

        Ok(Self {
            http_client,
            rpc_url: config.rpc_url.clone(),
            from_account: config.from_account.clone(),
            confirm_timeout: Duration::from_secs(config.confirm_timeout_secs),
            poll_interval: Duration::from_millis(config.receipt_poll_ms),
            next_id: AtomicU64::new(1),
        })
    }

    async fn rpc(&self, method: &str, params: Value) -> Result<Value, ChainError> {
        let request = json!({
            "jsonrpc": "2.0",
            "id": self.next_id.fetch_add(1, Ordering::Relaxed),
            "method": method,
            "params": params,
        });

        let response = self
            .http_client
            .post(&self.rpc_url)
            .json(&request)
            .send()
            .await
            .map_err(|e| ChainError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ChainError::Transport(format!(
                "{} returned HTTP {}",
                method, status
            )));
        }

        let envelope: RpcResponse = response
            .json()
            .await
            .map_err(|e| ChainError::Decode(e.to_string()))?;

        if let Some(error) = envelope.error {
            return Err(ChainError::Rpc {
                code: error.code,
                message: error.message,
            });
        }

        Ok(envelope.result)
    }

    /// Poll for the transaction receipt until inclusion or timeout
    async fn wait_for_receipt(&self, tx_hash: &str) -> Result<TxReceipt, ChainError> {
        let deadline = Instant::now() + self.confirm_timeout;

        loop {
            let receipt = self
                .rpc("eth_getTransactionReceipt", json!([tx_hash]))
                .await?;
            if !receipt.is_null() {
                tracing::debug!(tx_hash, "Transaction included");
                return Ok(TxReceipt {
                    transaction_hash: tx_hash.to_string(),
                });
            }

            if Instant::now() + self.poll_interval > deadline {
                return Err(ChainError::ConfirmationTimeout);
            }
            tokio::time::sleep(self.poll_interval).await;
        }
    }
}

#[async_trait]
impl ChainClient for JsonRpcChain {
    async fn submit(&self, contract: &str, calldata: Vec<u8>) -> Result<TxReceipt, ChainError> {
        let tx = json!([{
            "from": self.from_account,
            "to": contract,
            "data": format!("0x{}", hex::encode(&calldata)),
        }]);

        let result = self.rpc("eth_sendTransaction", tx).await?;
        let tx_hash = result
            .as_str()
            .ok_or_else(|| ChainError::Decode("transaction hash is not a string".to_string()))?
            .to_string();

        tracing::debug!(tx_hash, contract, "Submitted contract transaction");

        self.wait_for_receipt(&tx_hash).await
    }

    async fn call(&self, contract: &str, calldata: Vec<u8>) -> Result<Vec<u8>, ChainError> {
        let params = json!([
            {
                "to": contract,
                "data": format!("0x{}", hex::encode(&calldata)),
            },
            "latest",
        ]);

        let result = self.rpc("eth_call", params).await?;
        let data = result
            .as_str()
            .ok_or_else(|| ChainError::Decode("call result is not a string".to_string()))?;

        hex::decode(data.trim_start_matches("0x"))
            .map_err(|e| ChainError::Decode(e.to_string()))
    }
}
