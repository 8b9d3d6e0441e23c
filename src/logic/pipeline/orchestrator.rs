//! Orchestrator
//!
//! Drives one event at a time through the stages. Never re-raises across
//! event boundaries: every failure ends in a `Suppressed` outcome.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::Notify;

use super::types::{PipelineOutcome, PipelineState, PipelineStats};
use crate::error::{PipelineError, PipelineResult};
use crate::logic::config::PipelineConfig;
use crate::logic::events::Event;
use crate::logic::memory::MemoryBank;
use crate::logic::policy::{Decision, ReviewBoard};
use crate::logic::response::{CandidateAction, Executor, ResponsePlanner};
use crate::logic::threat::DetectorPool;

// ============================================================================
// SHUTDOWN SIGNAL
// ============================================================================

/// Cooperative cancellation: stops admission, lets in-flight events finish
#[derive(Default)]
struct ShutdownSignal {
    cancelled: AtomicBool,
    in_flight: AtomicUsize,
    idle: Notify,
}

/// Decrements the in-flight count when an admitted event finishes
struct InFlightGuard(Arc<ShutdownSignal>);

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        if self.0.in_flight.fetch_sub(1, Ordering::SeqCst) == 1 {
            self.0.idle.notify_waiters();
        }
    }
}

impl ShutdownSignal {
    fn admit(self: &Arc<Self>) -> Option<InFlightGuard> {
        if self.cancelled.load(Ordering::SeqCst) {
            return None;
        }
        self.in_flight.fetch_add(1, Ordering::SeqCst);
        let guard = InFlightGuard(Arc::clone(self));

        // Shutdown may have raced with the increment
        if self.cancelled.load(Ordering::SeqCst) {
            return None;
        }
        Some(guard)
    }
}

// ============================================================================
// BUILDER
// ============================================================================

/// Stages not supplied explicitly are built from the config
pub struct OrchestratorBuilder {
    config: PipelineConfig,
    detectors: Option<DetectorPool>,
    memory: Option<MemoryBank>,
    reviewers: Option<ReviewBoard>,
    executor: Option<Arc<dyn Executor>>,
}

impl OrchestratorBuilder {
    pub fn detectors(mut self, detectors: DetectorPool) -> Self {
        self.detectors = Some(detectors);
        self
    }

    /// Share one memory between several orchestrators
    pub fn memory(mut self, memory: MemoryBank) -> Self {
        self.memory = Some(memory);
        self
    }

    pub fn reviewers(mut self, reviewers: ReviewBoard) -> Self {
        self.reviewers = Some(reviewers);
        self
    }

    pub fn executor(mut self, executor: Arc<dyn Executor>) -> Self {
        self.executor = Some(executor);
        self
    }

    /// Fails with `Configuration` on any invalid setting
    pub fn build(self) -> PipelineResult<Orchestrator> {
        self.config.validate()?;

        let detectors = match self.detectors {
            Some(d) => d,
            None => DetectorPool::from_config(&self.config)?,
        };
        let memory = match self.memory {
            Some(m) => m,
            None => MemoryBank::from_config(&self.config)?,
        };
        let reviewers = match self.reviewers {
            Some(r) => r,
            None => ReviewBoard::from_config(&self.config)?,
        };

        if self.executor.is_none() {
            log::warn!("No executor configured - approved actions are recorded with default effectiveness");
        }

        log::info!(
            "Pipeline ready: {} detectors (k={}), {} reviewers (k={}), {} memory shard(s)",
            detectors.population(),
            detectors.effective_sample_size(),
            reviewers.population(),
            reviewers.effective_sample_size(),
            memory.shards().len()
        );

        Ok(Orchestrator {
            planner: ResponsePlanner::from_config(&self.config),
            executor_timeout: Duration::from_millis(self.config.executor_timeout_ms),
            history_limit: self.config.history_limit,
            detectors,
            memory,
            reviewers,
            executor: self.executor,
            shutdown: Arc::new(ShutdownSignal::default()),
            stats: Mutex::new(PipelineStats::default()),
            history: Mutex::new(VecDeque::new()),
        })
    }
}

// ============================================================================
// ORCHESTRATOR
// ============================================================================

pub struct Orchestrator {
    detectors: DetectorPool,
    memory: MemoryBank,
    planner: ResponsePlanner,
    reviewers: ReviewBoard,
    executor: Option<Arc<dyn Executor>>,
    executor_timeout: Duration,
    history_limit: usize,
    shutdown: Arc<ShutdownSignal>,
    stats: Mutex<PipelineStats>,
    history: Mutex<VecDeque<PipelineOutcome>>,
}

impl Orchestrator {
    pub fn builder(config: PipelineConfig) -> OrchestratorBuilder {
        OrchestratorBuilder {
            config,
            detectors: None,
            memory: None,
            reviewers: None,
            executor: None,
        }
    }

    /// Everything from config, no executor
    pub fn from_config(config: PipelineConfig) -> PipelineResult<Self> {
        Self::builder(config).build()
    }

    // ------------------------------------------------------------------------
    // Ingress
    // ------------------------------------------------------------------------

    /// The approved decision if an action was handed off, `None` otherwise.
    /// Suppressed and clean events are told apart only via `history()` and logs.
    pub async fn submit(&self, event: Event) -> Option<Decision> {
        self.process(event).await.executed_decision().cloned()
    }

    /// Run one event to a terminal state
    pub async fn process(&self, event: Event) -> PipelineOutcome {
        let mut outcome = PipelineOutcome::received(&event.id);

        let result = match self.shutdown.admit() {
            Some(_guard) => self.run(&event, &mut outcome).await,
            None => Err(PipelineError::Cancelled),
        };

        if let Err(e) = result {
            match &e {
                PipelineError::Cancelled => {
                    log::info!("Event {} refused: pipeline is shutting down", event.id)
                }
                PipelineError::StoreWriteConflict { .. } => log::error!(
                    "Event {} suppressed: {} - manual follow-up required",
                    event.id,
                    e
                ),
                _ => log::warn!("Event {} suppressed: {}", event.id, e),
            }
            outcome.fail(&e);
        }

        self.record(&outcome);
        outcome
    }

    /// Events in order; one failure never aborts the rest
    pub async fn process_batch(&self, events: Vec<Event>) -> Vec<PipelineOutcome> {
        let mut outcomes = Vec::with_capacity(events.len());
        for event in events {
            outcomes.push(self.process(event).await);
        }
        outcomes
    }

    async fn run(&self, event: &Event, outcome: &mut PipelineOutcome) -> PipelineResult<()> {
        event.validate()?;

        // 1. Detect
        let verdict = match self.detectors.evaluate(event).await? {
            Some(v) => v,
            None => {
                outcome.advance(PipelineState::Scored);
                outcome.advance(PipelineState::Suppressed);
                log::debug!("Event {}: no threat", event.id);
                return Ok(());
            }
        };
        outcome.verdict = Some(verdict.clone());
        outcome.advance(PipelineState::Scored);

        // 2. Recall
        let hint = self.memory.recall(&verdict).await;
        if hint.is_some() {
            outcome.advance(PipelineState::Recalled);
        }

        // 3. Plan
        let candidate = self.planner.plan(&verdict, hint.as_ref());
        outcome.advance(PipelineState::Planned);

        // 4. Review
        let decision = self.reviewers.review(&verdict, &candidate).await;
        outcome.decision = Some(decision.clone());
        outcome.advance(PipelineState::Reviewed);

        if !decision.approved {
            // Non-actioned sightings still build memory
            self.memory.learn(&verdict, 0.0)?;
            outcome.effectiveness = Some(0.0);
            outcome.advance(PipelineState::Suppressed);
            return Ok(());
        }

        // 5. Execute + learn
        let effectiveness = self.execute(&decision.action).await;
        self.memory.learn(&verdict, effectiveness)?;
        outcome.effectiveness = Some(effectiveness);
        outcome.advance(PipelineState::Executed);

        Ok(())
    }

    /// Hand off to the executor; falls back to the kind's default
    /// effectiveness when it is missing, fails or is too slow
    async fn execute(&self, action: &CandidateAction) -> f64 {
        let fallback = action.kind.default_effectiveness();

        let executor = match &self.executor {
            Some(e) => Arc::clone(e),
            None => {
                log::warn!(
                    "Executor unavailable - treating {} as applied (effectiveness {})",
                    action.description(),
                    fallback
                );
                return fallback;
            }
        };

        let name = executor.name().to_string();
        let owned = action.clone();
        let task = tokio::task::spawn_blocking(move || executor.apply(&owned));

        let result = match tokio::time::timeout(self.executor_timeout, task).await {
            Ok(Ok(result)) => result,
            Ok(Err(e)) => Err(PipelineError::Executor(e.to_string())),
            Err(_) => Err(PipelineError::timeout(
                "executor",
                self.executor_timeout.as_millis() as u64,
            )),
        };

        match result {
            Ok(score) if score.is_finite() => score.clamp(0.0, 1.0),
            Ok(score) => {
                log::warn!("Executor {} reported invalid effectiveness {} - using {}", name, score, fallback);
                fallback
            }
            Err(e) => {
                log::warn!(
                    "Executor {} unavailable ({}) - treating {} as applied (effectiveness {})",
                    name,
                    e,
                    action.description(),
                    fallback
                );
                fallback
            }
        }
    }

    fn record(&self, outcome: &PipelineOutcome) {
        self.stats.lock().record(outcome);

        if self.history_limit == 0 {
            return;
        }
        let mut history = self.history.lock();
        if history.len() >= self.history_limit {
            history.pop_front();
        }
        history.push_back(outcome.clone());
    }

    // ------------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------------

    /// Stop admitting events and wait for in-flight ones to finish
    pub async fn shutdown(&self) {
        if !self.shutdown.cancelled.swap(true, Ordering::SeqCst) {
            log::info!("Pipeline shutdown requested");
        }

        loop {
            let idle = self.shutdown.idle.notified();
            if self.shutdown.in_flight.load(Ordering::SeqCst) == 0 {
                break;
            }
            idle.await;
        }

        log::info!("Pipeline shutdown complete");
    }

    pub fn is_cancelled(&self) -> bool {
        self.shutdown.cancelled.load(Ordering::SeqCst)
    }

    // ------------------------------------------------------------------------
    // Introspection
    // ------------------------------------------------------------------------

    pub fn stats(&self) -> PipelineStats {
        self.stats.lock().clone()
    }

    /// Most recent outcomes, oldest first
    pub fn history(&self) -> Vec<PipelineOutcome> {
        self.history.lock().iter().cloned().collect()
    }

    pub fn memory(&self) -> &MemoryBank {
        &self.memory
    }
}
