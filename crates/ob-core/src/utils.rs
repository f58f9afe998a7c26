//! Small free-function utilities shared across crates, in the teacher's
//! style of a flat `utils` module rather than a grab-bag trait.

use sha2::{Digest, Sha256};

/// Stable 64-bit digest of a byte string, used as the "node digest" and
/// "key digest" inputs to HRW (§4.2) and as `Snode.digest`. SHA-256 is used
/// (already in the dependency stack for checksums) truncated to 8 bytes;
/// HRW only needs a uniformly distributed score, not cryptographic
/// strength.
pub fn stable_digest(input: &str) -> u64 {
    let hash = Sha256::digest(input.as_bytes());
    u64::from_be_bytes(hash[0..8].try_into().unwrap())
}

/// Combines a node digest and a key digest the way `hash(node_digest ‖
/// key_digest)` is described in §4.2: concatenate the two digests' bytes
/// and re-hash, rather than XOR/add, so scores don't correlate across
/// nodes sharing a key prefix.
pub fn hrw_score(node_digest: u64, key_digest: u64) -> u64 {
    let mut buf = [0u8; 16];
    buf[0..8].copy_from_slice(&node_digest.to_be_bytes());
    buf[8..16].copy_from_slice(&key_digest.to_be_bytes());
    let hash = Sha256::digest(buf);
    u64::from_be_bytes(hash[0..8].try_into().unwrap())
}

/// A random daemon-id-shaped uuid for job descriptors (§3 NL: "globally
/// unique, random 128-bit equivalent").
pub fn generate_job_uuid() -> String {
    uuid::Uuid::new_v4().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stable_digest_is_deterministic() {
        assert_eq!(stable_digest("T1"), stable_digest("T1"));
        assert_ne!(stable_digest("T1"), stable_digest("T2"));
    }

    #[test]
    fn hrw_score_is_deterministic_and_key_dependent() {
        let a = hrw_score(1, 100);
        let b = hrw_score(1, 100);
        let c = hrw_score(1, 101);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }
}
