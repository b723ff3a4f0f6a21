use std::collections::HashSet;

use chain_shared::ChainError;
use serde::{Deserialize, Serialize};

use crate::block::Block;
use crate::config::MINING_REWARD;
use crate::transaction::{is_valid_transaction, Transaction};
use crate::wallet::Wallet;

/// An ordered, append-only sequence of blocks rooted at [`Block::genesis`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Blockchain {
    chain: Vec<Block>,
}

impl Blockchain {
    #[must_use]
    pub fn new() -> Self {
        Self {
            chain: vec![Block::genesis()],
        }
    }

    #[must_use]
    pub fn chain(&self) -> &[Block] {
        &self.chain
    }

    #[must_use]
    pub fn tip(&self) -> &Block {
        self.chain.last().expect("chain always has at least genesis")
    }

    /// Mines `data` atop the current tip and appends it. Does not validate
    /// `data` beforehand — the miner trusts its own pool contents; receivers
    /// validate on arrival via [`Self::is_valid_chain`].
    pub fn add_block(&mut self, data: Vec<Transaction>) -> &Block {
        let mined = Block::mine(self.tip(), data);
        self.chain.push(mined);
        self.chain.last().unwrap()
    }

    /// Appends a block that was already mined elsewhere, without
    /// re-running proof-of-work. Only checks `block` against the current
    /// tip via [`Block::is_valid`] — a caller that mined unlocked and is
    /// now racing the tip (another miner may have won in the meantime)
    /// should re-check `self.tip()` against the block's `last_hash`
    /// *before* calling this, since a stale `last_hash` surfaces here as
    /// [`ChainError::BadLastHash`], not the more specific race signal the
    /// caller may want to report.
    pub fn append_mined_block(&mut self, block: Block) -> Result<(), ChainError> {
        Block::is_valid(self.tip(), &block)?;
        self.chain.push(block);
        Ok(())
    }

    /// Validates `chain` start to finish: genesis identity, then each
    /// block's linkage/PoW/difficulty, then the transaction-level
    /// invariants across the whole chain.
    pub fn is_valid_chain(chain: &[Block]) -> Result<(), ChainError> {
        match chain.first() {
            Some(first) if *first == Block::genesis() => {}
            _ => return Err(ChainError::BadGenesis),
        }

        for window in chain.windows(2) {
            Block::is_valid(&window[0], &window[1])?;
        }

        is_valid_transaction_chain(chain)
    }

    /// Replaces `self.chain` with `incoming` if it is both strictly longer
    /// and fully valid. Ties are not broken; an equal-or-shorter incoming
    /// chain is a silent no-op, matching "strictly longer chain wins".
    pub fn replace_chain(&mut self, incoming: Vec<Block>) -> Result<(), ChainError> {
        if incoming.len() <= self.chain.len() {
            return Err(ChainError::ChainNotLonger);
        }

        Self::is_valid_chain(&incoming)
            .map_err(|e| ChainError::InvalidIncomingChain(Box::new(e)))?;

        self.chain = incoming;
        Ok(())
    }
}

impl Default for Blockchain {
    fn default() -> Self {
        Self::new()
    }
}

/// Walks `chain` maintaining a running set of seen non-reward transaction
/// ids and a per-block reward count, rejecting replay and double rewards,
/// and re-deriving each sender's historical balance from the chain prefix
/// that precedes their transaction's block.
fn is_valid_transaction_chain(chain: &[Block]) -> Result<(), ChainError> {
    let mut seen_ids: HashSet<String> = HashSet::new();

    for (block_index, block) in chain.iter().enumerate() {
        let mut reward_count = 0u32;

        for transaction in &block.data {
            if transaction.is_reward() {
                reward_count += 1;
                if reward_count > 1 {
                    return Err(ChainError::InvalidReward);
                }
                if transaction.output.values().copied().collect::<Vec<_>>() != [MINING_REWARD] {
                    return Err(ChainError::InvalidReward);
                }
            } else {
                if !seen_ids.insert(transaction.id.clone()) {
                    return Err(ChainError::ReplayedTransaction(transaction.id.clone()));
                }

                if let Some(sender) = transaction.sender_address() {
                    let claimed = signed_amount(transaction);
                    let historical = historical_balance(&chain[..block_index], sender);
                    if claimed != historical {
                        return Err(ChainError::HistoricalBalanceMismatch {
                            address: sender.to_string(),
                            claimed,
                            actual: historical,
                        });
                    }
                }
            }

            is_valid_transaction(transaction)?;
        }
    }

    Ok(())
}

fn signed_amount(transaction: &Transaction) -> u64 {
    match &transaction.input {
        crate::transaction::TransactionInput::Signed(signed) => signed.amount,
        crate::transaction::TransactionInput::Reward(_) => 0,
    }
}

/// Replays `prefix` the same way [`Wallet::calculate_balance`] does, but
/// against a raw block slice rather than a whole [`Blockchain`] — used to
/// check a transaction's claimed balance against the chain as it stood
/// strictly before the block that contains it. `prefix` is the leading
/// slice of an already genesis-validated chain, so it starts with genesis
/// whenever it is non-empty.
fn historical_balance(prefix: &[Block], address: &str) -> u64 {
    let chain = Blockchain {
        chain: if prefix.is_empty() {
            vec![Block::genesis()]
        } else {
            prefix.to_vec()
        },
    };
    Wallet::calculate_balance(&chain, address)
}
