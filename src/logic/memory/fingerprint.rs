//! Fingerprint Comparators
//!
//! Fuzzy recall asks a comparator for a symmetric similarity in [0, 1].
//! Swap the comparator to change the metric without touching the store.

use super::types::Fingerprint;

pub trait FingerprintComparator: Send + Sync {
    fn name(&self) -> &str;

    /// Symmetric similarity, 1.0 = identical
    fn similarity(&self, a: &Fingerprint, b: &Fingerprint) -> f64;
}

/// `1 - hamming(a, b) / bits`
#[derive(Debug, Default, Clone, Copy)]
pub struct HammingComparator;

impl FingerprintComparator for HammingComparator {
    fn name(&self) -> &str {
        "hamming"
    }

    fn similarity(&self, a: &Fingerprint, b: &Fingerprint) -> f64 {
        let differing: u32 = a.0.iter().zip(b.0.iter()).map(|(x, y)| (x ^ y).count_ones()).sum();
        1.0 - differing as f64 / a.bits() as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::memory::types::FINGERPRINT_BYTES;

    #[test]
    fn test_hamming_bounds_and_symmetry() {
        let zero = Fingerprint([0u8; FINGERPRINT_BYTES]);
        let ones = Fingerprint([0xff; FINGERPRINT_BYTES]);
        let mut half = [0u8; FINGERPRINT_BYTES];
        half[..FINGERPRINT_BYTES / 2].fill(0xff);
        let half = Fingerprint(half);

        let cmp = HammingComparator;
        assert_eq!(cmp.similarity(&zero, &zero), 1.0);
        assert_eq!(cmp.similarity(&zero, &ones), 0.0);
        assert_eq!(cmp.similarity(&zero, &half), 0.5);
        assert_eq!(cmp.similarity(&half, &zero), cmp.similarity(&zero, &half));
    }
}
