use std::sync::Arc;

use crate::block::Block;
use crate::transaction::{reward_transaction, Transaction};
use crate::wallet::Wallet;

/// Configuration for one mining round: who gets the reward and what
/// already-validated pool transactions ride along.
#[derive(Debug, Clone)]
pub struct MinerConfig {
    pub miner_wallet_address: String,
}

/// The outcome of a mining round: the sealed block plus the reward
/// transaction it embeds, so callers don't have to search `block.data` for
/// it.
#[derive(Debug, Clone)]
pub struct MiningResult {
    pub block: Block,
    pub reward: Transaction,
}

/// A sequential proof-of-work driver.
///
/// Nonce search is single-threaded and increments by exactly one per
/// iteration — splitting the nonce space across worker threads would
/// change which nonce is found first for a given seed, which the
/// mining algorithm this is ported from never does.
///
/// Holds an `Arc<Wallet>` rather than an owned `Wallet` so a node's single
/// long-lived wallet can be reused across mining rounds without spawning a
/// fresh keypair (and address) each time, and so a `Miner` can be moved
/// into `tokio::task::spawn_blocking`'s `'static` closure cheaply.
pub struct Miner {
    wallet: Arc<Wallet>,
}

impl Miner {
    #[must_use]
    pub fn new(wallet: Arc<Wallet>) -> Self {
        Self { wallet }
    }

    #[must_use]
    pub fn config(&self) -> MinerConfig {
        MinerConfig {
            miner_wallet_address: self.wallet.address.clone(),
        }
    }

    /// Mines `pending` atop `last_block`, appending this miner's reward
    /// transaction to the block's data.
    #[must_use]
    pub fn mine(&self, last_block: &Block, mut pending: Vec<Transaction>) -> MiningResult {
        let reward = reward_transaction(&self.wallet);
        pending.push(reward.clone());

        let block = Block::mine(last_block, pending);
        MiningResult { block, reward }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mine_produces_a_block_containing_the_reward_transaction() {
        let miner = Miner::new(Arc::new(Wallet::new()));
        let last_block = Block::genesis();

        let result = miner.mine(&last_block, vec![]);

        assert!(result
            .block
            .data
            .iter()
            .any(|tx| tx.id == result.reward.id));
        assert!(Block::is_valid(&last_block, &result.block).is_ok());
    }
}
