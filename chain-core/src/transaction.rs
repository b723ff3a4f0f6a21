use std::collections::BTreeMap;

use chain_shared::ChainError;
use serde::{Deserialize, Serialize};

use crate::config::{MINING_REWARD, MINING_REWARD_SENDER};
use crate::wallet::Wallet;

/// A signed, pending-or-sealed exchange of value from one sender to one or
/// more recipients (the sender's own change entry is a recipient too).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Transaction {
    pub id: String,
    pub output: BTreeMap<String, u64>,
    pub input: TransactionInput,
}

/// Either a signed sender input or the well-known reward sentinel.
///
/// Variant order matters for `#[serde(untagged)]`: `Signed` is tried first
/// because its five required fields reject a reward payload outright,
/// whereas `RewardInput`'s single `address` field would otherwise also
/// (wrongly) match a signed input's JSON, since untagged deserialization
/// ignores fields it doesn't recognize rather than rejecting them.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum TransactionInput {
    Signed(SignedInput),
    Reward(RewardInput),
}

/// Mirrors the original `MINING_REWARD_INPUT` dict's single `address` field
/// so peers that only know the JSON shape still recognize a reward input.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RewardInput {
    pub address: String,
}

impl Default for RewardInput {
    fn default() -> Self {
        Self {
            address: MINING_REWARD_SENDER.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SignedInput {
    pub timestamp: i128,
    pub amount: u64,
    pub address: String,
    pub public_key: String,
    pub signature: (String, String),
}

impl Transaction {
    /// Builds a fresh transaction moving `amount` from `sender_wallet` to
    /// `recipient`, signed over the resulting output map.
    pub fn new(sender_wallet: &Wallet, recipient: &str, amount: u64) -> Result<Self, ChainError> {
        let output = create_output(sender_wallet, recipient, amount)?;
        let input = create_input(sender_wallet, &output)?;

        Ok(Self {
            id: short_uuid(),
            output,
            input,
        })
    }

    /// Mutates a still-pending transaction to also send `amount` to
    /// `recipient`, re-signing and re-timestamping against the sender's
    /// *current* wallet balance.
    ///
    /// The amount is checked against the output's remaining change entry,
    /// not the wallet's original balance — a transaction may be updated
    /// several times before it is mined, and each update spends from what
    /// is left over from the previous one.
    pub fn update(
        &mut self,
        sender_wallet: &Wallet,
        recipient: &str,
        amount: u64,
    ) -> Result<(), ChainError> {
        let remaining = *self.output.get(&sender_wallet.address).unwrap_or(&0);
        if amount > remaining {
            return Err(ChainError::InsufficientBalance {
                needed: amount,
                available: remaining,
            });
        }

        *self.output.entry(recipient.to_string()).or_insert(0) += amount;
        *self.output.get_mut(&sender_wallet.address).unwrap() -= amount;

        self.input = create_input(sender_wallet, &self.output)?;
        Ok(())
    }

    /// The sender's address, if this is a signed (non-reward) transaction.
    #[must_use]
    pub fn sender_address(&self) -> Option<&str> {
        match &self.input {
            TransactionInput::Signed(signed) => Some(signed.address.as_str()),
            TransactionInput::Reward(_) => None,
        }
    }

    #[must_use]
    pub fn is_reward(&self) -> bool {
        matches!(self.input, TransactionInput::Reward(_))
    }
}

fn create_output(
    sender_wallet: &Wallet,
    recipient: &str,
    amount: u64,
) -> Result<BTreeMap<String, u64>, ChainError> {
    if amount > sender_wallet.balance {
        return Err(ChainError::InsufficientBalance {
            needed: amount,
            available: sender_wallet.balance,
        });
    }

    let mut output = BTreeMap::new();
    output.insert(recipient.to_string(), amount);
    output.insert(
        sender_wallet.address.clone(),
        sender_wallet.balance - amount,
    );
    Ok(output)
}

fn create_input(
    sender_wallet: &Wallet,
    output: &BTreeMap<String, u64>,
) -> Result<TransactionInput, ChainError> {
    let signature = sender_wallet.sign(output)?;
    Ok(TransactionInput::Signed(SignedInput {
        timestamp: now_ns(),
        amount: sender_wallet.balance,
        address: sender_wallet.address.clone(),
        public_key: sender_wallet.public_key_hex(),
        signature,
    }))
}

/// Validates a transaction's invariants, independent of chain history.
/// Historical-balance replay checks live in [`crate::blockchain::Blockchain`]
/// since they require the chain prefix, not just the transaction itself.
pub fn is_valid_transaction(transaction: &Transaction) -> Result<(), ChainError> {
    match &transaction.input {
        TransactionInput::Reward(_) => {
            let values: Vec<u64> = transaction.output.values().copied().collect();
            if values != [MINING_REWARD] {
                return Err(ChainError::InvalidReward);
            }
            Ok(())
        }
        TransactionInput::Signed(signed) => {
            let output_total: u64 = transaction.output.values().sum();
            if signed.amount != output_total {
                return Err(ChainError::InvalidOutput {
                    expected: signed.amount,
                    actual: output_total,
                });
            }

            if !Wallet::verify(&signed.public_key, &transaction.output, &signed.signature) {
                return Err(ChainError::InvalidSignature);
            }

            Ok(())
        }
    }
}

/// The coinbase-style transaction awarding `miner_wallet` for a mined block.
#[must_use]
pub fn reward_transaction(miner_wallet: &Wallet) -> Transaction {
    let mut output = BTreeMap::new();
    output.insert(miner_wallet.address.clone(), MINING_REWARD);

    Transaction {
        id: short_uuid(),
        output,
        input: TransactionInput::Reward(RewardInput::default()),
    }
}

fn short_uuid() -> String {
    uuid::Uuid::new_v4().simple().to_string()[0..8].to_string()
}

fn now_ns() -> i128 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system clock is before UNIX_EPOCH")
        .as_nanos() as i128
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_transaction_splits_output_between_recipient_and_change() {
        let wallet = Wallet::new();
        let tx = Transaction::new(&wallet, "recipient", 50).unwrap();

        assert_eq!(tx.output.get("recipient"), Some(&50));
        assert_eq!(
            tx.output.get(&wallet.address),
            Some(&(wallet.balance - 50))
        );
        assert!(is_valid_transaction(&tx).is_ok());
    }

    #[test]
    fn new_transaction_rejects_amount_over_balance() {
        let wallet = Wallet::new();
        let result = Transaction::new(&wallet, "recipient", wallet.balance + 1);
        assert!(matches!(
            result,
            Err(ChainError::InsufficientBalance { .. })
        ));
    }

    #[test]
    fn update_adds_to_existing_recipient_and_deducts_change() {
        let wallet = Wallet::new();
        let mut tx = Transaction::new(&wallet, "recipient", 50).unwrap();
        let previous_change = tx.output[&wallet.address];

        tx.update(&wallet, "recipient", 25).unwrap();

        assert_eq!(tx.output.get("recipient"), Some(&75));
        assert_eq!(
            tx.output.get(&wallet.address),
            Some(&(previous_change - 25))
        );
        assert!(is_valid_transaction(&tx).is_ok());
    }

    #[test]
    fn update_rejects_amount_over_remaining_change() {
        let wallet = Wallet::new();
        let mut tx = Transaction::new(&wallet, "recipient", 50).unwrap();
        let remaining = tx.output[&wallet.address];

        let result = tx.update(&wallet, "recipient", remaining + 1);
        assert!(matches!(
            result,
            Err(ChainError::InsufficientBalance { .. })
        ));
    }

    #[test]
    fn reward_transaction_has_sentinel_input_and_fixed_reward_output() {
        let wallet = Wallet::new();
        let rt = reward_transaction(&wallet);

        assert!(rt.is_reward());
        assert_eq!(
            rt.output.values().copied().collect::<Vec<_>>(),
            vec![MINING_REWARD]
        );
        assert!(is_valid_transaction(&rt).is_ok());
    }

    #[test]
    fn invalid_output_sum_is_rejected() {
        let wallet = Wallet::new();
        let mut tx = Transaction::new(&wallet, "recipient", 50).unwrap();
        tx.output.insert("recipient".to_string(), 999);

        assert!(matches!(
            is_valid_transaction(&tx),
            Err(ChainError::InvalidOutput { .. })
        ));
    }

    #[test]
    fn tampered_output_after_signing_fails_verification() {
        let wallet = Wallet::new();
        let mut tx = Transaction::new(&wallet, "recipient", 50).unwrap();
        // bump both entries by the same delta so the sum still matches
        // `input.amount`, isolating the signature check from the
        // conservation check.
        let change_key = wallet.address.clone();
        *tx.output.get_mut("recipient").unwrap() += 10;
        *tx.output.get_mut(&change_key).unwrap() -= 10;

        assert!(matches!(
            is_valid_transaction(&tx),
            Err(ChainError::InvalidSignature)
        ));
    }
}
