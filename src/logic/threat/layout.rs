//! Feature Layout - default scorer channels
//!
//! Ledger transaction features, each on a 0..100 scale.
//! Order matters only for logging; scoring treats channels independently.

/// Feature names read by `SamplingScorer::new`
pub const FEATURE_LAYOUT: &[&str] = &[
    "gas_price_deviation",      // 0
    "value_anomaly",            // 1
    "recipient_reputation",     // 2
    "temporal_pattern_break",   // 3
    "smart_contract_risk",      // 4
    "network_centrality_spike", // 5
    "validator_coordination",   // 6
    "mempool_manipulation",     // 7
];

/// Upper end of the feature scale
pub const FEATURE_SCALE: f64 = 100.0;

pub fn default_layout() -> Vec<String> {
    FEATURE_LAYOUT.iter().map(|s| s.to_string()).collect()
}
