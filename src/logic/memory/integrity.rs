//! Integrity Tree
//!
//! Binary SHA-256 tree over the sorted signature set. Odd levels duplicate
//! their last node; a single signature is its own root.

use sha2::{Digest, Sha256};

use super::types::Signature;

/// Root of the empty set
pub fn empty_root() -> String {
    hex::encode(Sha256::digest(b"empty"))
}

/// Root over `signatures` (sorted internally)
pub fn integrity_root<'a, I>(signatures: I) -> String
where
    I: IntoIterator<Item = &'a Signature>,
{
    let mut level: Vec<String> = signatures.into_iter().map(|s| s.0.clone()).collect();
    if level.is_empty() {
        return empty_root();
    }
    level.sort();

    while level.len() > 1 {
        if level.len() % 2 == 1 {
            if let Some(last) = level.last().cloned() {
                level.push(last);
            }
        }
        level = level
            .chunks(2)
            .map(|pair| {
                let mut hasher = Sha256::new();
                hasher.update(pair[0].as_bytes());
                hasher.update(pair[1].as_bytes());
                hex::encode(hasher.finalize())
            })
            .collect();
    }

    level.remove(0)
}
