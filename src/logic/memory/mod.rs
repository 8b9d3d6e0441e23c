//! Memory Module - long-term threat memory
//!
//! Content-addressable store of previously seen threat signatures. Each record
//! carries its effectiveness history and a fuzzy fingerprint; the whole set is
//! summarised by an integrity root for external audit.
//!
//! # Architecture
//! - `types.rs`: `Signature`, `Fingerprint`, `MemoryRecord`, `MemoryHint`, `MemoryExport`
//! - `signature.rs`: deterministic signature + fingerprint derivation
//! - `fingerprint.rs`: pluggable similarity comparators
//! - `integrity.rs`: binary hash tree over sorted signatures
//! - `store.rs`: `MemoryStore` (exact/fuzzy recall, optimistic learn)
//! - `storage.rs`: JSON snapshots with atomic replace
//! - `bank.rs`: sharded stores with parallel recall
//!
//! # Failure Strategy
//! Records are replaced whole (`Arc` swap), never patched field by field.
//! Same-signature writers retry a bounded number of times, then surface
//! `StoreWriteConflict`.

pub mod types;
pub mod signature;
pub mod fingerprint;
pub mod integrity;
pub mod store;
pub mod storage;
pub mod bank;

pub use types::{Signature, Fingerprint, MemoryRecord, MemoryHint, MemoryExport};
pub use signature::{signature_of, fingerprint_of};
pub use fingerprint::{FingerprintComparator, HammingComparator};
pub use integrity::integrity_root;
pub use store::{enhance, MemoryStore};
pub use storage::{save_snapshot, load_snapshot};
pub use bank::MemoryBank;
