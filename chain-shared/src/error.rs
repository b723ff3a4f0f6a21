use thiserror::Error;

/// Errors raised by the consensus-critical core: block construction, chain
/// validation, and transaction/signature checks.
///
/// The HTTP façade maps caller-fault variants to 4xx and everything else to
/// 5xx; the broadcast receiver logs these and triggers a full-chain resync
/// instead of propagating them.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChainError {
    #[error("insufficient balance: needed {needed}, had {available}")]
    InsufficientBalance { needed: u64, available: u64 },

    #[error("invalid signature")]
    InvalidSignature,

    #[error("invalid transaction output: outputs sum to {actual}, expected {expected}")]
    InvalidOutput { expected: u64, actual: u64 },

    #[error("invalid mining reward")]
    InvalidReward,

    #[error("transaction {0} replayed: id already present earlier in chain")]
    ReplayedTransaction(String),

    #[error(
        "historical balance mismatch for {address}: input claims {claimed}, chain shows {actual}"
    )]
    HistoricalBalanceMismatch {
        address: String,
        claimed: u64,
        actual: u64,
    },

    #[error("genesis block must be valid")]
    BadGenesis,

    #[error("last hash must match the hash of the previous block")]
    BadLastHash,

    #[error("block hash must meet its own difficulty target")]
    BadProofOfWork,

    #[error("block difficulty must differ from the previous block by at most 1")]
    DifficultyJump,

    #[error("block hash does not match its recomputed fields")]
    HashTamper,

    #[error("the incoming chain must be longer than the current chain")]
    ChainNotLonger,

    #[error("the incoming chain is invalid: {0}")]
    InvalidIncomingChain(Box<ChainError>),

    #[error("serialization error: {0}")]
    SerializationError(String),
}

pub type Result<T> = std::result::Result<T, ChainError>;
