use chain_shared::ChainError;
use k256::ecdsa::signature::{Signer, Verifier};
use k256::ecdsa::{Signature, SigningKey, VerifyingKey};
use k256::elliptic_curve::sec1::ToEncodedPoint;
use num_bigint::BigUint;
use rand::rngs::OsRng;
use serde::Serialize;
use zeroize::Zeroize;

use crate::blockchain::Blockchain;
use crate::config::STARTING_BALANCE;

/// An individual wallet for a miner or sender.
///
/// Tracks no cached balance beyond the `STARTING_BALANCE` it is minted
/// with — balance is always recomputed on demand from a [`Blockchain`] via
/// [`Wallet::calculate_balance`], which takes the chain as a read-only
/// argument rather than the wallet holding a back-reference to it.
pub struct Wallet {
    pub address: String,
    pub balance: u64,
    signing_key: SigningKey,
    verifying_key: VerifyingKey,
}

impl Wallet {
    /// Generates a fresh secp256k1 keypair and assigns a random 8-character
    /// address.
    #[must_use]
    pub fn new() -> Self {
        let signing_key = SigningKey::random(&mut OsRng);
        let verifying_key = *signing_key.verifying_key();
        Self {
            address: short_uuid(),
            balance: STARTING_BALANCE,
            signing_key,
            verifying_key,
        }
    }

    /// The compressed SEC1 public key, hex-encoded for the wire format.
    #[must_use]
    pub fn public_key_hex(&self) -> String {
        hex::encode(self.verifying_key.to_encoded_point(true).as_bytes())
    }

    #[must_use]
    pub fn verifying_key(&self) -> &VerifyingKey {
        &self.verifying_key
    }

    /// Signs `data` (canonically serialized to JSON, matching `json.dumps`
    /// in the implementation this is ported from) with ECDSA over SHA-256,
    /// returning the `(r, s)` components as decimal strings — large enough
    /// to overflow an IEEE-754 double, so never round-tripped as JSON
    /// numbers.
    pub fn sign<T: Serialize>(&self, data: &T) -> Result<(String, String), ChainError> {
        let canonical = serde_json::to_vec(data)
            .map_err(|e| ChainError::SerializationError(e.to_string()))?;
        let signature: Signature = self.signing_key.sign(&canonical);
        Ok(signature_to_decimal_pair(&signature))
    }

    /// Verifies a `(r, s)` decimal-pair signature against `public_key_hex`
    /// and `data`. Fails closed on any error: a malformed key, a malformed
    /// signature, and a genuinely invalid signature are all `false`.
    #[must_use]
    pub fn verify<T: Serialize>(
        public_key_hex: &str,
        data: &T,
        signature: &(String, String),
    ) -> bool {
        let Ok(canonical) = serde_json::to_vec(data) else {
            return false;
        };
        let Some(verifying_key) = public_key_from_hex(public_key_hex) else {
            return false;
        };
        let Some(sig) = signature_from_decimal_pair(signature) else {
            return false;
        };
        verifying_key.verify(&canonical, &sig).is_ok()
    }

    /// Scans `blockchain` in order and computes `address`'s current
    /// balance.
    ///
    /// Whenever `address` appears as the sender of any transaction within a
    /// block, the running balance is *reset* to zero before that block's
    /// credits are added — a sender's transaction output already encodes
    /// its post-spend balance as a self-output, so summing deltas on top of
    /// a stale running total would double count. This reset rule is a
    /// deliberate quirk of the model being preserved, not a bug.
    #[must_use]
    pub fn calculate_balance(blockchain: &Blockchain, address: &str) -> u64 {
        let mut balance = STARTING_BALANCE;

        for block in blockchain.chain() {
            for transaction in &block.data {
                if transaction.sender_address() == Some(address) {
                    balance = 0;
                }
                if let Some(amount) = transaction.output.get(address) {
                    balance += *amount;
                }
            }
        }

        balance
    }
}

impl Default for Wallet {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Wallet {
    fn drop(&mut self) {
        let mut key_bytes = self.signing_key.to_bytes();
        key_bytes.zeroize();
    }
}

fn short_uuid() -> String {
    uuid::Uuid::new_v4().simple().to_string()[0..8].to_string()
}

fn signature_to_decimal_pair(signature: &Signature) -> (String, String) {
    let raw = signature.to_bytes();
    let (r, s) = raw.split_at(32);
    (
        BigUint::from_bytes_be(r).to_string(),
        BigUint::from_bytes_be(s).to_string(),
    )
}

fn signature_from_decimal_pair(pair: &(String, String)) -> Option<Signature> {
    let r = pair.0.parse::<BigUint>().ok()?;
    let s = pair.1.parse::<BigUint>().ok()?;
    let r_bytes = to_32_bytes(&r)?;
    let s_bytes = to_32_bytes(&s)?;
    let mut raw = [0u8; 64];
    raw[..32].copy_from_slice(&r_bytes);
    raw[32..].copy_from_slice(&s_bytes);
    Signature::from_slice(&raw).ok()
}

fn to_32_bytes(value: &BigUint) -> Option<[u8; 32]> {
    let bytes = value.to_bytes_be();
    if bytes.len() > 32 {
        return None;
    }
    let mut padded = [0u8; 32];
    padded[32 - bytes.len()..].copy_from_slice(&bytes);
    Some(padded)
}

fn public_key_from_hex(hex_str: &str) -> Option<VerifyingKey> {
    let bytes = hex::decode(hex_str).ok()?;
    VerifyingKey::from_sec1_bytes(&bytes).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn sign_then_verify_succeeds() {
        let wallet = Wallet::new();
        let mut data = BTreeMap::new();
        data.insert("foo".to_string(), 42u64);

        let signature = wallet.sign(&data).unwrap();
        assert!(Wallet::verify(&wallet.public_key_hex(), &data, &signature));
    }

    #[test]
    fn verify_fails_with_wrong_key() {
        let wallet = Wallet::new();
        let impostor = Wallet::new();
        let mut data = BTreeMap::new();
        data.insert("foo".to_string(), 42u64);

        let signature = wallet.sign(&data).unwrap();
        assert!(!Wallet::verify(&impostor.public_key_hex(), &data, &signature));
    }

    #[test]
    fn verify_fails_when_data_is_tampered() {
        let wallet = Wallet::new();
        let mut data = BTreeMap::new();
        data.insert("foo".to_string(), 42u64);
        let signature = wallet.sign(&data).unwrap();

        data.insert("foo".to_string(), 43u64);
        assert!(!Wallet::verify(&wallet.public_key_hex(), &data, &signature));
    }

    #[test]
    fn calculate_balance_defaults_to_starting_balance() {
        let blockchain = Blockchain::new();
        let wallet = Wallet::new();
        assert_eq!(
            Wallet::calculate_balance(&blockchain, &wallet.address),
            STARTING_BALANCE
        );
    }
}
