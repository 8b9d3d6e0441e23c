//! Immune Core - demo entry point
//!
//! Runs one suspicious and one normal ledger transaction through the
//! pipeline and prints the result. Settings come from `IMMUNE_*` variables
//! (a `.env` file is honoured).

use std::sync::Arc;

use chrono::Utc;
use sha2::{Digest, Sha256};

use immune_core::constants::{get_environment, APP_NAME, APP_VERSION};
use immune_core::logic::memory::storage::get_default_snapshot_path;
use immune_core::{Event, Features, Orchestrator, PipelineConfig, ScheduledExecutor};

fn transaction(seed: &str, features: &[(&str, f64)]) -> Event {
    let id = format!("0x{}", hex::encode(Sha256::digest(seed.as_bytes())));
    let features: Features = features.iter().map(|(k, v)| (k.to_string(), *v)).collect();
    Event::new(id, features)
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    log::info!("Starting {} v{} ({})", APP_NAME, APP_VERSION, get_environment());

    let config = match PipelineConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            log::error!("Invalid configuration: {} - using development preset", e);
            PipelineConfig::development()
        }
    };

    let executor = Arc::new(ScheduledExecutor::new());
    let orchestrator = match Orchestrator::builder(config).executor(executor.clone()).build() {
        Ok(o) => o,
        Err(e) => {
            log::error!("Pipeline startup failed: {}", e);
            std::process::exit(1);
        }
    };

    let suspicious = transaction(
        "suspicious_transaction",
        &[
            ("gas_price_deviation", 85.0),
            ("value_anomaly", 92.0),
            ("recipient_reputation", 15.0),
            ("temporal_pattern_break", 78.0),
            ("smart_contract_risk", 88.0),
            ("network_centrality_spike", 71.0),
            ("validator_coordination", 65.0),
            ("mempool_manipulation", 83.0),
        ],
    );
    let normal = transaction(
        "normal_transaction",
        &[
            ("gas_price_deviation", 5.0),
            ("value_anomaly", 8.0),
            ("recipient_reputation", 95.0),
            ("temporal_pattern_break", 3.0),
            ("smart_contract_risk", 2.0),
            ("network_centrality_spike", 1.0),
            ("validator_coordination", 0.0),
            ("mempool_manipulation", 0.0),
        ],
    );

    for (label, event) in [("suspicious", suspicious), ("normal", normal)] {
        let short_id: String = event.id.chars().take(16).collect();
        println!("\nProcessing {} transaction {}...", label, short_id);

        match orchestrator.submit(event).await {
            Some(decision) => {
                let action = &decision.action;
                println!("  THREAT DETECTED: {}", action.kind);
                println!("  Duration: {}s", action.duration_secs);
                println!("  Restrictions: {:?}", action.restrictions);
                if decision.moderated {
                    println!("  Moderated: {}", decision.reason);
                }
                if let Some(c) = &action.activation_commitment {
                    println!("  Activates at: {}", c.reveal_time);
                }
            }
            None => {
                let reason = orchestrator
                    .history()
                    .last()
                    .and_then(|o| o.error.clone().or_else(|| o.decision.as_ref().map(|d| d.reason.clone())))
                    .unwrap_or_else(|| "no threat detected".to_string());
                println!("  No action ({})", reason);
            }
        }
    }

    orchestrator.shutdown().await;

    let stats = orchestrator.stats();
    println!("\nStatistics:");
    println!("  Events received: {}", stats.received);
    println!("  Threats detected: {}", stats.threats);
    println!("  Actions executed: {}", stats.executed);
    println!("  Rejected by review: {}", stats.rejected);
    println!("  Scheduled (pending reveal): {}", executor.pending());
    println!("  Due now: {}", executor.take_due(Utc::now()).len());

    for store in orchestrator.memory().shards() {
        println!("  Memory root: {} ({} records)", store.integrity_root(), store.len());
    }

    if std::env::var("IMMUNE_SAVE_MEMORY").is_ok() {
        let base = get_default_snapshot_path();
        for (i, store) in orchestrator.memory().shards().iter().enumerate() {
            let path = if i == 0 {
                base.clone()
            } else {
                base.with_file_name(format!("memory_v1.shard{}.json", i))
            };
            if let Err(e) = store.save_to(&path) {
                log::error!("Failed to save memory snapshot {}: {}", path.display(), e);
            }
        }
    }
}
