//! On-chain payment confirmation against the escrow contract
//!
//! Submits the verification call, waits for inclusion, then reads the
//! contract's payment-verified accessor. Every submission, confirmation and
//! query failure is caught at this boundary: the verdict distinguishes a
//! contract that answered `false` from a chain that could not answer at all,
//! and callers treat both as "not yet verified" rather than an error.

use crate::services::{abi, ChainClient, ChainError};
use shamba_common::Amount;
use std::sync::Arc;
use tracing::warn;

const VERIFY_PAYMENT_SIG: &str = "verifyPayment(uint256,uint256)";
const IS_PAYMENT_VERIFIED_SIG: &str = "isPaymentVerified(uint256)";

/// Outcome of an on-chain check
#[derive(Debug)]
pub enum ChainVerdict {
    /// The contract answered; `true` means the payment is verified on-chain
    Confirmed(bool),
    /// The chain could not be consulted; retry later
    Indeterminate(ChainError),
}

impl ChainVerdict {
    /// Only an affirmative contract answer verifies the payment
    pub fn is_verified(&self) -> bool {
        matches!(self, ChainVerdict::Confirmed(true))
    }
}

/// Drives the escrow contract's verification protocol
pub struct ChainVerifier {
    client: Arc<dyn ChainClient>,
}

impl ChainVerifier {
    pub fn new(client: Arc<dyn ChainClient>) -> Self {
        Self { client }
    }

    /// Submit `verifyPayment(id, amount)` and read back
    /// `isPaymentVerified(id)`.
    ///
    /// The amount argument follows the contract's minor-unit integer
    /// convention (amount x 100).
    pub async fn check_payment(
        &self,
        contract: &str,
        transaction_id: i64,
        amount: Amount,
    ) -> ChainVerdict {
        match self.check_payment_inner(contract, transaction_id, amount).await {
            Ok(verified) => ChainVerdict::Confirmed(verified),
            Err(e) => {
                warn!(transaction_id, contract, error = %e, "Chain verification unavailable");
                ChainVerdict::Indeterminate(e)
            }
        }
    }

    async fn check_payment_inner(
        &self,
        contract: &str,
        transaction_id: i64,
        amount: Amount,
    ) -> Result<bool, ChainError> {
        let id = transaction_id as u64;

        let calldata = abi::encode_call(
            VERIFY_PAYMENT_SIG,
            &[id, amount.minor_units() as u64],
        );
        self.client.submit(contract, calldata).await?;

        let returned = self
            .client
            .call(contract, abi::encode_call(IS_PAYMENT_VERIFIED_SIG, &[id]))
            .await?;

        abi::decode_bool(&returned)
            .ok_or_else(|| ChainError::Decode("isPaymentVerified returned no boolean".to_string()))
    }
}
