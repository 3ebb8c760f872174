//! Context assembly for recollect.
//!
//! - [`Retriever`] ranks a thread's memory for a purpose under a token budget.
//! - [`WorkingSetBuilder`] packages a ranking into a bounded prompt section.
//! - [`MemoryService`] is the caller-facing entry point that ties extraction,
//!   consolidation, ranking and assembly to a store.

pub mod retriever;
pub mod service;
pub mod working_set;

pub use retriever::{FocusItem, Globals, RetrievalResult, Retriever, Runbook, RunbookEntry, ScoreBreakdown};
pub use service::{IngestReport, MemoryService, ThreadStats};
pub use working_set::{FocusDecision, FocusTask, Level, RunbookSteps, WorkingSet, WorkingSetBuilder};
