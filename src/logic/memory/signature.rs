//! Signature & Fingerprint Derivation
//!
//! Both functions are pure and depend only on the feature map contents,
//! never on insertion order.

use std::collections::BTreeMap;

use sha2::{Digest, Sha256};

use super::types::{Fingerprint, Signature, FINGERPRINT_BYTES};
use crate::logic::events::Features;

/// Fingerprint bucket width on the 0..100 feature scale
pub const FINGERPRINT_BUCKET: f64 = 10.0;

fn sorted(features: &Features) -> BTreeMap<&str, f64> {
    features.iter().map(|(k, v)| (k.as_str(), *v)).collect()
}

/// SHA-256 over `key:value` pairs (4 decimals) in key order
pub fn signature_of(features: &Features) -> Signature {
    let mut hasher = Sha256::new();
    for (key, value) in sorted(features) {
        hasher.update(format!("{}:{:.4}", key, value).as_bytes());
    }
    Signature(hex::encode(hasher.finalize()))
}

/// 256-bit SimHash over `key:bucket` tokens.
///
/// Maps that differ in a few buckets keep most bits; unrelated maps land
/// near 50% agreement. Empty maps give the all-zero fingerprint.
pub fn fingerprint_of(features: &Features) -> Fingerprint {
    let mut weights = [0i32; FINGERPRINT_BYTES * 8];

    for (key, value) in sorted(features) {
        let bucket = (value / FINGERPRINT_BUCKET).floor() as i64;
        let token = Sha256::digest(format!("{}:{}", key, bucket).as_bytes());
        for (bit, weight) in weights.iter_mut().enumerate() {
            if token[bit / 8] & (1 << (bit % 8)) != 0 {
                *weight += 1;
            } else {
                *weight -= 1;
            }
        }
    }

    let mut out = [0u8; FINGERPRINT_BYTES];
    for (bit, weight) in weights.iter().enumerate() {
        if *weight > 0 {
            out[bit / 8] |= 1 << (bit % 8);
        }
    }
    Fingerprint(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ordered(pairs: &[(&str, f64)]) -> Features {
        let mut features = Features::new();
        for (k, v) in pairs {
            features.insert(k.to_string(), *v);
        }
        features
    }

    #[test]
    fn test_signature_ignores_insertion_order() {
        let a = ordered(&[("value_anomaly", 92.0), ("gas_price_deviation", 85.0), ("mempool_manipulation", 83.0)]);
        let b = ordered(&[("mempool_manipulation", 83.0), ("value_anomaly", 92.0), ("gas_price_deviation", 85.0)]);
        assert_eq!(signature_of(&a), signature_of(&b));
        assert_eq!(fingerprint_of(&a), fingerprint_of(&b));
    }

    #[test]
    fn test_signature_changes_with_value() {
        let a = ordered(&[("value_anomaly", 92.0)]);
        let b = ordered(&[("value_anomaly", 92.5)]);
        assert_ne!(signature_of(&a), signature_of(&b));
        assert_eq!(signature_of(&a).as_str().len(), 64);
    }

    #[test]
    fn test_fingerprint_shares_bucket() {
        // 92.0 and 95.0 fall into the same bucket
        let a = ordered(&[("value_anomaly", 92.0), ("gas_price_deviation", 85.0)]);
        let b = ordered(&[("value_anomaly", 95.0), ("gas_price_deviation", 85.0)]);
        assert_ne!(signature_of(&a), signature_of(&b));
        assert_eq!(fingerprint_of(&a), fingerprint_of(&b));
    }

    #[test]
    fn test_empty_fingerprint_is_zero() {
        assert_eq!(fingerprint_of(&Features::new()).0, [0u8; FINGERPRINT_BYTES]);
    }
}
