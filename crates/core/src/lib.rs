//! # recollect core
//!
//! Domain types, traits, and error definitions for the recollect
//! context-memory engine. This crate has **no framework dependencies**: it
//! defines the memory model that the extraction, consolidation and ranking
//! crates compute over.
//!
//! ## Design Philosophy
//!
//! Persistence and time are traits here. Implementations live in their
//! respective crates. This enables:
//! - Swapping storage backends via configuration
//! - Deterministic tests with a fixed clock and in-memory store
//! - Clean dependency graph (all crates depend inward on core)

pub mod clock;
pub mod error;
pub mod hash;
pub mod item;
pub mod store;
pub mod token;

// Re-export key types at crate root for ergonomics
pub use clock::{Clock, FixedClock, SystemClock};
pub use error::{Error, Result, StoreError};
pub use item::{
    Artifact, EpisodicItem, EpisodicKind, ItemKind, ItemStatus, Links, MemoryItem, SemanticItem,
    SemanticKind, ThreadItems, UsageEvent, UsageStats,
};
pub use store::MemoryStore;
pub use token::estimate_tokens;
