pub mod block;
pub mod blockchain;
pub mod config;
pub mod mining;
pub mod transaction;
pub mod transaction_pool;
pub mod wallet;

pub use block::{adjust_difficulty, Block};
pub use blockchain::Blockchain;
pub use config::{MINE_RATE, MINING_REWARD, MINING_REWARD_SENDER, STARTING_BALANCE};
pub use mining::{Miner, MinerConfig, MiningResult};
pub use transaction::{
    is_valid_transaction, reward_transaction, RewardInput, SignedInput, Transaction,
    TransactionInput,
};
pub use transaction_pool::TransactionPool;
pub use wallet::Wallet;

pub use chain_shared::ChainError;
