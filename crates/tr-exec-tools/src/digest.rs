//! Digest primitives for tamper-evident execution records.

use sha2::{Digest, Sha256};

pub fn sha256_bytes(data: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hasher.finalize().into()
}

pub fn sha256_hex(data: &[u8]) -> String {
    hex::encode(sha256_bytes(data))
}

/// Merkle root over leaves that are already 32-byte hashes. An odd node is
/// paired with itself; the empty forest has the defined root sha256("").
pub fn merkle_root(leaves: &[[u8; 32]]) -> [u8; 32] {
    if leaves.is_empty() {
        return sha256_bytes(b"");
    }
    let mut level: Vec<[u8; 32]> = leaves.to_vec();
    while level.len() > 1 {
        let mut next = Vec::with_capacity(level.len().div_ceil(2));
        for pair in level.chunks(2) {
            let left = pair[0];
            let right = if pair.len() == 2 { pair[1] } else { pair[0] };
            let mut buf = [0u8; 64];
            buf[0..32].copy_from_slice(&left);
            buf[32..64].copy_from_slice(&right);
            next.push(sha256_bytes(&buf));
        }
        level = next;
    }
    level[0]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sha256_known_vector() {
        assert_eq!(
            sha256_hex(b""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn merkle_empty_is_defined() {
        assert_eq!(merkle_root(&[]), sha256_bytes(b""));
    }

    #[test]
    fn merkle_single_leaf_is_identity() {
        let leaf = sha256_bytes(b"leaf");
        assert_eq!(merkle_root(&[leaf]), leaf);
    }

    #[test]
    fn merkle_odd_level_duplicates_last() {
        let a = sha256_bytes(b"a");
        let b = sha256_bytes(b"b");
        let c = sha256_bytes(b"c");
        // Three leaves: (a,b) and (c,c), then the pair of those.
        let root = merkle_root(&[a, b, c]);

        let mut ab = [0u8; 64];
        ab[..32].copy_from_slice(&a);
        ab[32..].copy_from_slice(&b);
        let mut cc = [0u8; 64];
        cc[..32].copy_from_slice(&c);
        cc[32..].copy_from_slice(&c);
        let mut top = [0u8; 64];
        top[..32].copy_from_slice(&sha256_bytes(&ab));
        top[32..].copy_from_slice(&sha256_bytes(&cc));
        assert_eq!(root, sha256_bytes(&top));
    }

    #[test]
    fn merkle_is_order_sensitive() {
        let a = sha256_bytes(b"a");
        let b = sha256_bytes(b"b");
        assert_ne!(merkle_root(&[a, b]), merkle_root(&[b, a]));
    }
}
