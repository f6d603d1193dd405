//! Contract ABI calldata encoding
//!
//! The escrow contract takes only unsigned integer arguments and returns
//! booleans, so the encoding needed here is the four-byte Keccak-256
//! function selector followed by 32-byte big-endian words.

use sha3::{Digest, Keccak256};

/// Four-byte function selector for a canonical signature such as
/// `verifyPayment(uint256,uint256)`
pub fn selector(signature: &str) -> [u8; 4] {
    let digest = Keccak256::digest(signature.as_bytes());
    let mut selector = [0u8; 4];
    selector.copy_from_slice(&digest[..4]);
    selector
}

/// One 32-byte big-endian ABI word
pub fn encode_u256(value: u64) -> [u8; 32] {
    let mut word = [0u8; 32];
    word[24..].copy_from_slice(&value.to_be_bytes());
    word
}

/// Selector plus one word per argument
pub fn encode_call(signature: &str, args: &[u64]) -> Vec<u8> {
    let mut calldata = Vec::with_capacity(4 + 32 * args.len());
    calldata.extend_from_slice(&selector(signature));
    for arg in args {
        calldata.extend_from_slice(&encode_u256(*arg));
    }
    calldata
}

/// Decode a returned ABI boolean word
pub fn decode_bool(data: &[u8]) -> Option<bool> {
    if data.len() < 32 {
        return None;
    }
    Some(data[31] != 0)
}
