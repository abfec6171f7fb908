//! Transfer engine: resolution, scheduling, execution, progress

pub mod entry;
pub mod orchestrator;
pub mod progress;
pub mod resolver;
pub mod retry;
pub mod scheduler;
pub mod worker;

pub use entry::{TransferEntry, TransferKind, TransferOutcome, TransferResult};
pub use orchestrator::{JobSpec, Operation, OrchestratorState, TransferOrchestrator};
pub use progress::{NoopSink, ProgressSink, ProgressSnapshot, ProgressTracker};
pub use resolver::PathResolver;
pub use retry::{RetryPolicy, DEFAULT_MAX_ATTEMPTS};
pub use scheduler::{Batch, BatchScheduler, DEFAULT_BATCH_SIZE};
pub use worker::{effective_workers, CancelFlag, WorkerPool, DEFAULT_WORKERS};
