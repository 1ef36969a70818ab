// Hashing utilities

use sha2::{Digest, Sha256};
use crate::core::Hash256;

/// SHA256 double hash
/// hash256 = SHA256(SHA256(data))
pub fn hash256(data: &[u8]) -> Hash256 {
    let first_hash = Sha256::digest(data);
    let second_hash = Sha256::digest(first_hash);
    let mut result = [0u8; 32];
    result.copy_from_slice(&second_hash);
    Hash256::new(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash256_empty() {
        // Well-known double SHA256 of the empty string
        let hash = hash256(b"");
        assert_eq!(
            hex::encode(hash.as_bytes()),
            "5df6e0e2761359d30a8275058e299fcc0381534545f55cf43e41983f5d4c9456"
        );
    }

    #[test]
    fn test_hash256_deterministic() {
        let data = b"hello world";
        assert_eq!(hash256(data), hash256(data));
        assert_ne!(hash256(data), hash256(b"hello world!"));
    }
}
