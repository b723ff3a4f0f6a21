pub mod error;
pub mod hash;
pub mod hex_binary;

pub use error::{ChainError, Result};
pub use hash::{hash_values, leading_zero_bits, meets_difficulty, serialize_for_hash};
pub use hex_binary::hex_to_binary;
