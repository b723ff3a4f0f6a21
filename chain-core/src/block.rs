use chain_shared::{crypto_hash, meets_difficulty, ChainError};
use serde::{Deserialize, Serialize};

use crate::config::MINE_RATE;
use crate::transaction::Transaction;

/// An immutable, linked record of the transactions sealed by one round of
/// proof-of-work mining.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Block {
    pub timestamp: i128,
    pub last_hash: String,
    pub hash: String,
    pub data: Vec<Transaction>,
    pub difficulty: u32,
    pub nonce: u64,
}

impl Block {
    /// The fixed genesis constant. Not mined, not difficulty-checked —
    /// accepted by identity comparison against this exact value.
    ///
    /// The original tutorial's genesis carries a string nonce
    /// (`"genesis_nonce"`); here `nonce` is uniformly `u64` across every
    /// block, so genesis uses `0` instead. Genesis is never re-hashed or
    /// re-validated against its own fields, so the substitution is inert.
    #[must_use]
    pub fn genesis() -> Self {
        Self {
            timestamp: 1,
            last_hash: "genesis_last_hash".to_string(),
            hash: "genesis_hash".to_string(),
            data: Vec::new(),
            difficulty: 3,
            nonce: 0,
        }
    }

    /// Runs the proof-of-work search: increments `nonce` and refreshes
    /// `timestamp`/`difficulty` each iteration until the hash meets its own
    /// difficulty target.
    #[must_use]
    pub fn mine(last_block: &Block, data: Vec<Transaction>) -> Self {
        let last_hash = last_block.hash.clone();
        let mut timestamp = now_ns();
        let mut difficulty = adjust_difficulty(last_block, timestamp);
        let mut nonce: u64 = 0;
        let mut hash = block_hash(timestamp, &last_hash, &data, difficulty, nonce);

        while !meets_difficulty(&hash, difficulty) {
            nonce += 1;
            timestamp = now_ns();
            difficulty = adjust_difficulty(last_block, timestamp);
            hash = block_hash(timestamp, &last_hash, &data, difficulty, nonce);
        }

        Self {
            timestamp,
            last_hash,
            hash,
            data,
            difficulty,
            nonce,
        }
    }

    /// Validates `self` against its immediate predecessor. Does not check
    /// transaction contents or chain-wide replay — see
    /// [`crate::blockchain::Blockchain::is_valid_transaction_chain`].
    pub fn is_valid(last_block: &Block, block: &Block) -> Result<(), ChainError> {
        if block.last_hash != last_block.hash {
            return Err(ChainError::BadLastHash);
        }

        if !meets_difficulty(&block.hash, block.difficulty) {
            return Err(ChainError::BadProofOfWork);
        }

        if last_block.difficulty.abs_diff(block.difficulty) > 1 {
            return Err(ChainError::DifficultyJump);
        }

        let recomputed = block_hash(
            block.timestamp,
            &block.last_hash,
            &block.data,
            block.difficulty,
            block.nonce,
        );
        if recomputed != block.hash {
            return Err(ChainError::HashTamper);
        }

        Ok(())
    }
}

/// Raises difficulty when blocks are arriving faster than [`MINE_RATE`],
/// lowers it otherwise, floored at 1.
#[must_use]
pub fn adjust_difficulty(last_block: &Block, new_timestamp: i128) -> u32 {
    if new_timestamp - last_block.timestamp < MINE_RATE {
        return last_block.difficulty + 1;
    }

    if last_block.difficulty > 1 {
        last_block.difficulty - 1
    } else {
        1
    }
}

fn block_hash(
    timestamp: i128,
    last_hash: &str,
    data: &[Transaction],
    difficulty: u32,
    nonce: u64,
) -> String {
    crypto_hash!(timestamp, last_hash, data, difficulty, nonce)
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
    use chain_shared::hex_to_binary;

    #[test]
    fn genesis_matches_the_fixed_constant() {
        let genesis = Block::genesis();
        assert_eq!(genesis.hash, "genesis_hash");
        assert_eq!(genesis.last_hash, "genesis_last_hash");
        assert_eq!(genesis.timestamp, 1);
        assert_eq!(genesis.difficulty, 3);
        assert!(genesis.data.is_empty());
    }

    #[test]
    fn mined_block_meets_its_own_difficulty() {
        let last_block = Block::genesis();
        let mined = Block::mine(&last_block, vec![]);

        let binary = hex_to_binary(&mined.hash);
        assert!(binary[..mined.difficulty as usize]
            .chars()
            .all(|c| c == '0'));
        assert_eq!(mined.last_hash, last_block.hash);
    }

    #[test]
    fn is_valid_accepts_a_freshly_mined_block() {
        let last_block = Block::genesis();
        let mined = Block::mine(&last_block, vec![]);
        assert!(Block::is_valid(&last_block, &mined).is_ok());
    }

    #[test]
    fn is_valid_rejects_wrong_last_hash() {
        let last_block = Block::genesis();
        let mut mined = Block::mine(&last_block, vec![]);
        mined.last_hash = "not-the-real-last-hash".to_string();

        assert_eq!(
            Block::is_valid(&last_block, &mined),
            Err(ChainError::BadLastHash)
        );
    }

    #[test]
    fn is_valid_rejects_jumped_difficulty() {
        let last_block = Block::genesis();
        let mut mined = Block::mine(&last_block, vec![]);
        mined.difficulty = last_block.difficulty + 5;
        mined.hash = block_hash(
            mined.timestamp,
            &mined.last_hash,
            &mined.data,
            mined.difficulty,
            mined.nonce,
        );

        assert_eq!(
            Block::is_valid(&last_block, &mined),
            Err(ChainError::DifficultyJump)
        );
    }

    #[test]
    fn is_valid_rejects_tampered_hash() {
        let last_block = Block::genesis();
        let mut mined = Block::mine(&last_block, vec![]);
        mined.hash = "0".repeat(mined.hash.len());

        assert_eq!(
            Block::is_valid(&last_block, &mined),
            Err(ChainError::HashTamper)
        );
    }

    #[test]
    fn adjust_difficulty_raises_when_blocks_arrive_quickly() {
        let last_block = Block::genesis();
        let raised = adjust_difficulty(&last_block, last_block.timestamp + 1);
        assert_eq!(raised, last_block.difficulty + 1);
    }

    #[test]
    fn adjust_difficulty_lowers_when_blocks_arrive_slowly() {
        let last_block = Block::genesis();
        let lowered = adjust_difficulty(&last_block, last_block.timestamp + MINE_RATE * 100);
        assert_eq!(lowered, last_block.difficulty - 1);
    }

    #[test]
    fn adjust_difficulty_is_floored_at_one() {
        let mut last_block = Block::genesis();
        last_block.difficulty = 1;
        let lowered = adjust_difficulty(&last_block, last_block.timestamp + MINE_RATE * 100);
        assert_eq!(lowered, 1);
    }
}
