//! External collaborator clients
//!
//! The text-detection service and the chain endpoint sit behind object-safe
//! traits. Production wires in the HTTP clients below, constructed once at
//! startup and shared; tests substitute stubs. Each client converts its
//! transport failures into its own typed error at this boundary.

pub mod abi;
pub mod jsonrpc;
pub mod vision;

pub use jsonrpc::JsonRpcChain;
pub use vision::GoogleVisionClient;

use async_trait::async_trait;
use thiserror::Error;

/// Text-detection boundary errors
#[derive(Debug, Error)]
pub enum DetectError {
    #[error("text detection transport error: {0}")]
    Transport(String),

    #[error("text detection API error {0}: {1}")]
    Api(u16, String),

    #[error("text detection response parse error: {0}")]
    Parse(String),
}

/// Extracts machine-readable text from an image
#[async_trait]
pub trait TextDetector: Send + Sync {
    /// Full detected text, or an empty string when the service finds none.
    ///
    /// An empty result is a successful detection; only transport, auth, and
    /// protocol failures are errors.
    async fn detect_text(&self, image: &[u8]) -> Result<String, DetectError>;
}

/// Chain-client boundary errors
#[derive(Debug, Error)]
pub enum ChainError {
    #[error("chain transport error: {0}")]
    Transport(String),

    #[error("chain RPC error {code}: {message}")]
    Rpc { code: i64, message: String },

    #[error("transaction confirmation timed out")]
    ConfirmationTimeout,

    #[error("chain response decode error: {0}")]
    Decode(String),
}

/// Receipt for a submitted, included contract transaction
#[derive(Debug, Clone)]
pub struct TxReceipt {
    pub transaction_hash: String,
}

/// Submits state-changing calls and reads contract state
#[async_trait]
pub trait ChainClient: Send + Sync {
    /// Submit a state-changing contract call from the configured account and
    /// wait for it to be included in a block.
    async fn submit(&self, contract: &str, calldata: Vec<u8>) -> Result<TxReceipt, ChainError>;

    /// Execute a read-only contract call and return the raw return data.
    async fn call(&self, contract: &str, calldata: Vec<u8>) -> Result<Vec<u8>, ChainError>;
}
