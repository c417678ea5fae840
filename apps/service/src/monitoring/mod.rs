/// Health-check core.
///
/// One recurring check job per active monitor probes its URL, the state
/// evaluator turns the outcome into transitions, events, and
/// notifications, and the scheduler keeps the job set in sync with the
/// registry.
pub mod dedup;
pub mod evaluator;
pub mod prober;
pub mod scheduler;

pub use dedup::DedupTracker;
pub use evaluator::{AlertRequest, StateEvaluator};
pub use prober::{HttpProber, ProbeOutcome, Prober};
pub use scheduler::{Scheduler, SchedulerSettings};
