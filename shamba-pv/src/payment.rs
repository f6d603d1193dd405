//! Single-transaction payment verification
//!
//! Walks one transaction through document and chain checks: the stored
//! proof-of-payment image must mention the recorded amount, buyer and
//! seller, and the escrow contract must confirm the payment, before the
//! record is marked verified. The walk runs once per request and restarts
//! from the beginning on any rejection.

use crate::chain::{ChainVerdict, ChainVerifier};
use crate::services::TextDetector;
use shamba_common::db::{transactions, Transaction};
use shamba_common::{Error, Result};
use sqlx::SqlitePool;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

/// Why a verification request was rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    Document,
    Chain,
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RejectReason::Document => write!(f, "document verification failed"),
            RejectReason::Chain => write!(f, "blockchain verification failed"),
        }
    }
}

/// Terminal outcome of one verification request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerifyOutcome {
    Verified,
    Rejected(RejectReason),
}

/// Intermediate stages of the verification walk
enum Stage {
    Pending,
    DocumentChecked,
    ChainChecked(ChainVerdict),
}

/// Runs the document-then-chain verification sequence for one transaction
pub struct PaymentVerifier {
    db: SqlitePool,
    detector: Arc<dyn TextDetector>,
    chain: ChainVerifier,
    media_root: PathBuf,
    fallback_contract: Option<String>,
}

impl PaymentVerifier {
    pub fn new(
        db: SqlitePool,
        detector: Arc<dyn TextDetector>,
        chain: ChainVerifier,
        media_root: PathBuf,
        fallback_contract: Option<String>,
    ) -> Self {
        Self {
            db,
            detector,
            chain,
            media_root,
            fallback_contract,
        }
    }

    /// Drive the transaction to `Verified` or a rejection.
    ///
    /// The chain is never consulted before the document check passes.
    pub async fn verify(&self, transaction: &Transaction) -> Result<VerifyOutcome> {
        let mut stage = Stage::Pending;

        loop {
            stage = match stage {
                Stage::Pending => {
                    if self.document_matches(transaction).await? {
                        Stage::DocumentChecked
                    } else {
                        return Ok(VerifyOutcome::Rejected(RejectReason::Document));
                    }
                }
                Stage::DocumentChecked => {
                    let Some(contract) = transaction
                        .smart_contract_address
                        .clone()
                        .or_else(|| self.fallback_contract.clone())
                    else {
                        warn!(
                            transaction_id = transaction.id,
                            "No escrow contract address recorded or configured"
                        );
                        return Ok(VerifyOutcome::Rejected(RejectReason::Chain));
                    };

                    let verdict = self
                        .chain
                        .check_payment(&contract, transaction.id, transaction.amount())
                        .await;
                    Stage::ChainChecked(verdict)
                }
                Stage::ChainChecked(verdict) => {
                    if verdict.is_verified() {
                        transactions::mark_verified(&self.db, transaction.id).await?;
                        info!(transaction_id = transaction.id, "Payment verified");
                        return Ok(VerifyOutcome::Verified);
                    }
                    return Ok(VerifyOutcome::Rejected(RejectReason::Chain));
                }
            };
        }
    }

    /// Case-insensitive presence check of amount, buyer, and seller in the
    /// proof image's detected text.
    ///
    /// Missing proof image, unreadable file, absent text, or a record
    /// without buyer/seller details all fail the check; only a
    /// text-detection service fault is an error.
    async fn document_matches(&self, transaction: &Transaction) -> Result<bool> {
        let (Some(buyer), Some(seller)) = (&transaction.buyer, &transaction.seller) else {
            info!(
                transaction_id = transaction.id,
                "Transaction has no buyer/seller details to verify against"
            );
            return Ok(false);
        };

        let image = match self.load_proof_image(transaction).await {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!(transaction_id = transaction.id, error = %e, "Proof image unavailable");
                return Ok(false);
            }
        };

        let text = self
            .detector
            .detect_text(&image)
            .await
            .map_err(|e| Error::Internal(format!("text detection failed: {e}")))?;

        if text.is_empty() {
            info!(
                transaction_id = transaction.id,
                "No text detected in proof image"
            );
            return Ok(false);
        }

        let haystack = text.to_lowercase();
        let details = [
            transaction.amount().to_string(),
            buyer.to_lowercase(),
            seller.to_lowercase(),
        ];

        let all_present = details.iter().all(|detail| haystack.contains(detail));
        if !all_present {
            info!(
                transaction_id = transaction.id,
                "Proof image text does not cover the recorded details"
            );
        }

        Ok(all_present)
    }

    /// Open the stored proof-of-payment image
    async fn load_proof_image(&self, transaction: &Transaction) -> Result<Vec<u8>> {
        let reference = transaction.proof_of_payment.as_deref().ok_or_else(|| {
            Error::NotFound(format!(
                "transaction {} has no proof-of-payment image",
                transaction.id
            ))
        })?;

        let path = self.media_root.join(reference);
        let bytes = tokio::fs::read(&path)
            .await
            .map_err(|e| Error::NotFound(format!("cannot read {}: {}", path.display(), e)))?;

        Ok(bytes)
    }
}
