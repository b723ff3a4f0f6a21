use serde::Serialize;
use sha2::{Digest, Sha256};

/// Deterministic digest over a heterogeneous list of values.
///
/// Each argument is canonically serialized to JSON text, the resulting
/// strings are sorted lexicographically, concatenated, and SHA-256 hashed.
/// Sorting before concatenation makes the digest insensitive to argument
/// order — an intentional property of the original implementation this is
/// ported from, preserved here for cross-node consensus compatibility even
/// though a conventional ordered hash would be the more obvious choice.
#[must_use]
pub fn hash_values(values: &[String]) -> String {
    let mut serialized: Vec<String> = values.to_vec();
    serialized.sort_unstable();
    let joined = serialized.concat();
    let digest = Sha256::digest(joined.as_bytes());
    hex::encode(digest)
}

/// Serializes a single value the same way [`hash_values`] does internally,
/// for callers building up the argument list with [`crypto_hash!`].
///
/// # Panics
///
/// Panics if `value` cannot be serialized to JSON. Every caller in this
/// crate passes plain data types (strings, integers, transaction records)
/// that always serialize, so this should never trigger in practice.
#[must_use]
pub fn serialize_for_hash<T: Serialize>(value: &T) -> String {
    serde_json::to_string(value).expect("value must serialize to JSON for hashing")
}

/// Computes [`hash_values`] over any number of `Serialize` arguments.
///
/// ```
/// # use chain_shared::crypto_hash;
/// let a = crypto_hash!("foo", 1, 2);
/// let b = crypto_hash!(2, "foo", 1);
/// assert_eq!(a, b); // order-insensitive, per CryptoHash's sort step
/// ```
#[macro_export]
macro_rules! crypto_hash {
    ($($value:expr),+ $(,)?) => {{
        let values: Vec<String> = vec![$($crate::hash::serialize_for_hash(&$value)),+];
        $crate::hash::hash_values(&values)
    }};
}

/// Counts the number of leading zero bits in a lowercase hex digest, using
/// its binary expansion (each nibble expands to exactly 4 bits).
#[must_use]
pub fn leading_zero_bits(hex_digest: &str) -> u32 {
    let binary = crate::hex_binary::hex_to_binary(hex_digest);
    binary.chars().take_while(|&c| c == '0').count() as u32
}

/// Checks whether a hex digest meets a proof-of-work difficulty target
/// (i.e. its binary expansion begins with `difficulty` zero bits).
#[must_use]
pub fn meets_difficulty(hex_digest: &str, difficulty: u32) -> bool {
    leading_zero_bits(hex_digest) >= difficulty
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn order_insensitive() {
        let a = crypto_hash!("foo", 1, [1, 2, 3]);
        let b = crypto_hash!([1, 2, 3], "foo", 1);
        let c = crypto_hash!(1, [1, 2, 3], "foo");
        assert_eq!(a, b);
        assert_eq!(b, c);
    }

    #[test]
    fn changes_with_input() {
        let a = crypto_hash!("foo");
        let b = crypto_hash!("bar");
        assert_ne!(a, b);
    }

    #[test]
    fn output_is_lowercase_hex_sha256_length() {
        let digest = crypto_hash!("anything");
        assert_eq!(digest.len(), 64);
        assert!(digest.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn meets_difficulty_counts_leading_zero_bits() {
        // 0x0f... => 0000 1111 ... => 4 leading zero bits
        assert!(meets_difficulty("0fff", 4));
        assert!(!meets_difficulty("0fff", 5));
    }
}
