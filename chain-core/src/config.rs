//! Consensus-relevant constants. Every node MUST agree on these values —
//! changing any of them is a hard fork, not a config tweak.

/// Starting balance assigned to every freshly-created [`crate::Wallet`].
pub const STARTING_BALANCE: u64 = 1000;

/// Flat reward paid to the miner of a block via the coinbase-style reward
/// transaction.
pub const MINING_REWARD: u64 = 50;

/// Well-known sentinel address used as the "sender" of a reward
/// transaction. Mirrors the original `MINING_REWARD_INPUT` dict's
/// `address` field so peers that only know the JSON shape still recognize
/// it.
pub const MINING_REWARD_SENDER: &str = "*--official-mining-reward--*";

/// Target inter-block interval, in nanoseconds. Difficulty is adjusted up
/// or down each block to track this rate (see [`crate::Block::adjust_difficulty`]).
pub const MINE_RATE: i128 = 4_000_000_000; // 4 seconds
