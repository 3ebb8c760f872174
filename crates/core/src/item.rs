//! Memory items — the durable records a thread accumulates.
//!
//! Three record families exist:
//! - [`SemanticItem`]: decisions, requirements, constraints, tasks and other
//!   durable knowledge
//! - [`EpisodicItem`]: event-like material (test failures, stack traces, logs, diffs)
//! - [`Artifact`]: references to code regions or snippets
//!
//! All of them belong to exactly one thread. [`MemoryItem`] is the closed sum
//! over the three, keyed by [`ItemKind`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Lower bound applied to salience when an item is first extracted.
pub const MIN_INITIAL_SALIENCE: f64 = 0.1;

/// Maximum characters kept in an episodic snippet.
pub const MAX_SNIPPET_CHARS: usize = 500;

// ── Kinds & status ────────────────────────────────────────────────────────

/// Kind of a semantic (durable knowledge) item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SemanticKind {
    Decision,
    Requirement,
    Contract,
    Constraint,
    Task,
    Glossary,
}

impl SemanticKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Decision => "decision",
            Self::Requirement => "requirement",
            Self::Contract => "contract",
            Self::Constraint => "constraint",
            Self::Task => "task",
            Self::Glossary => "glossary",
        }
    }
}

impl fmt::Display for SemanticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of an episodic (event-like) item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EpisodicKind {
    TestFail,
    Stack,
    Chat,
    Log,
    Diff,
}

impl EpisodicKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TestFail => "test_fail",
            Self::Stack => "stack",
            Self::Chat => "chat",
            Self::Log => "log",
            Self::Diff => "diff",
        }
    }

    /// Whether this kind describes an error condition.
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::TestFail | Self::Stack | Self::Log)
    }
}

impl fmt::Display for EpisodicKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle status of a semantic item.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemStatus {
    Accepted,
    #[default]
    Provisional,
    Rejected,
    Superseded,
}

impl ItemStatus {
    /// Ordering used when merging: a merge only ever moves status upward.
    ///
    /// `superseded < rejected < provisional < accepted`
    pub fn priority(&self) -> u8 {
        match self {
            Self::Superseded => 0,
            Self::Rejected => 1,
            Self::Provisional => 2,
            Self::Accepted => 3,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Accepted => "accepted",
            Self::Provisional => "provisional",
            Self::Rejected => "rejected",
            Self::Superseded => "superseded",
        }
    }
}

impl fmt::Display for ItemStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Discriminates the three record families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "family", content = "kind", rename_all = "snake_case")]
pub enum ItemKind {
    Semantic(SemanticKind),
    Episodic(EpisodicKind),
    Artifact,
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Semantic(k) => write!(f, "semantic:{k}"),
            Self::Episodic(k) => write!(f, "episodic:{k}"),
            Self::Artifact => f.write_str("artifact"),
        }
    }
}

// ── Records ───────────────────────────────────────────────────────────────

/// Outgoing references from a semantic item.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Links {
    /// Item ids or artifact refs this item points to. Deduplicated.
    #[serde(default)]
    pub references: Vec<String>,
}

impl Links {
    /// Append a reference unless it is already present.
    pub fn add(&mut self, target: &str) {
        if !self.references.iter().any(|r| r == target) {
            self.references.push(target.to_string());
        }
    }
}

/// A durable knowledge unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SemanticItem {
    pub id: String,
    pub thread_id: String,
    pub kind: SemanticKind,
    pub title: String,
    pub body: String,
    #[serde(default)]
    pub tags: BTreeSet<String>,
    #[serde(default)]
    pub links: Links,
    #[serde(default)]
    pub status: ItemStatus,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub supersedes: Vec<String>,
    pub salience: f64,
    #[serde(default)]
    pub usage_count: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl SemanticItem {
    /// Text used for lexical comparison against other items.
    ///
    /// Bodies of neighbouring lines share most of their context window, so
    /// the title (the item's own clause) is compared instead.
    pub fn comparison_text(&self) -> &str {
        if self.title.is_empty() { &self.body } else { &self.title }
    }

    /// Body, or the title when the body is empty.
    pub fn content(&self) -> &str {
        if self.body.is_empty() { &self.title } else { &self.body }
    }
}

/// An event-like record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpisodicItem {
    pub id: String,
    pub thread_id: String,
    pub kind: EpisodicKind,
    pub title: String,
    pub snippet: String,
    #[serde(default)]
    pub source: String,
    /// Content hash of `snippet`, used for exact deduplication.
    pub hash: String,
    pub salience: f64,
    /// Symmetric clustering links to other episodic items.
    #[serde(default)]
    pub neighbors: Vec<String>,
    pub created_at: DateTime<Utc>,
}

/// A reference to a code/file region or snippet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Artifact {
    /// e.g. `CODE:src/auth.rs#L10-L20`
    #[serde(rename = "ref")]
    pub reference: String,
    pub thread_id: String,
    pub role: String,
    pub hash: String,
    #[serde(default)]
    pub neighbors: Vec<String>,
    pub created_at: DateTime<Utc>,
}

impl Artifact {
    /// The file path portion of the ref, without prefix or line range.
    ///
    /// `CODE:src/auth.rs#L10-L20` → `src/auth.rs`
    pub fn file_path(&self) -> &str {
        let without_prefix = self
            .reference
            .split_once(':')
            .map(|(_, rest)| rest)
            .unwrap_or(&self.reference);
        without_prefix
            .split_once('#')
            .map(|(path, _)| path)
            .unwrap_or(without_prefix)
    }
}

/// Per-item usage counters, owned by the feedback path.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UsageStats {
    #[serde(default)]
    pub clicks: u32,
    #[serde(default)]
    pub references: u32,
    #[serde(default)]
    pub expansions: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_used_at: Option<DateTime<Utc>>,
}

impl UsageStats {
    pub fn total(&self) -> u64 {
        self.clicks as u64 + self.references as u64 + self.expansions as u64
    }
}

/// A single feedback signal recorded against an item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UsageEvent {
    Click,
    Reference,
    Expansion,
}

impl UsageStats {
    /// Apply a feedback event at the given instant.
    pub fn record(&mut self, event: UsageEvent, at: DateTime<Utc>) {
        match event {
            UsageEvent::Click => self.clicks += 1,
            UsageEvent::Reference => self.references += 1,
            UsageEvent::Expansion => self.expansions += 1,
        }
        self.last_used_at = Some(at);
    }
}

/// Any persisted memory record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MemoryItem {
    Semantic(SemanticItem),
    Episodic(EpisodicItem),
    Artifact(Artifact),
}

impl MemoryItem {
    pub fn thread_id(&self) -> &str {
        match self {
            Self::Semantic(s) => &s.thread_id,
            Self::Episodic(e) => &e.thread_id,
            Self::Artifact(a) => &a.thread_id,
        }
    }
}

/// A snapshot of everything one thread owns.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ThreadItems {
    #[serde(default)]
    pub semantic: Vec<SemanticItem>,
    #[serde(default)]
    pub episodic: Vec<EpisodicItem>,
    #[serde(default)]
    pub artifacts: Vec<Artifact>,
}

impl ThreadItems {
    pub fn is_empty(&self) -> bool {
        self.semantic.is_empty() && self.episodic.is_empty() && self.artifacts.is_empty()
    }

    pub fn len(&self) -> usize {
        self.semantic.len() + self.episodic.len() + self.artifacts.len()
    }

    /// Flatten into the tagged sum type, semantic first.
    pub fn into_items(self) -> Vec<MemoryItem> {
        self.semantic
            .into_iter()
            .map(MemoryItem::Semantic)
            .chain(self.episodic.into_iter().map(MemoryItem::Episodic))
            .chain(self.artifacts.into_iter().map(MemoryItem::Artifact))
            .collect()
    }
}

/// Clamp a salience value into `[0.0, 1.0]`, mapping NaN to 0.
pub fn clamp_salience(value: f64) -> f64 {
    if value.is_nan() { 0.0 } else { value.clamp(0.0, 1.0) }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn artifact(reference: &str) -> Artifact {
        Artifact {
            reference: reference.into(),
            thread_id: "T1".into(),
            role: "code".into(),
            hash: String::new(),
            neighbors: vec![],
            created_at: Utc::now(),
        }
    }

    #[test]
    fn status_priority_orders_upgrades() {
        assert!(ItemStatus::Rejected.priority() < ItemStatus::Provisional.priority());
        assert!(ItemStatus::Provisional.priority() < ItemStatus::Accepted.priority());
        assert!(ItemStatus::Superseded.priority() < ItemStatus::Rejected.priority());
    }

    #[test]
    fn artifact_file_path_strips_prefix_and_range() {
        assert_eq!(artifact("CODE:src/auth.rs#L10-L20").file_path(), "src/auth.rs");
        assert_eq!(artifact("CODE:src/auth.rs").file_path(), "src/auth.rs");
        assert_eq!(artifact("README.md").file_path(), "README.md");
    }

    #[test]
    fn artifact_ref_serializes_as_ref() {
        let json = serde_json::to_string(&artifact("CODE:a.rs")).unwrap();
        assert!(json.contains("\"ref\":\"CODE:a.rs\""));
    }

    #[test]
    fn links_add_deduplicates() {
        let mut links = Links::default();
        links.add("S_1");
        links.add("S_1");
        links.add("S_2");
        assert_eq!(links.references, vec!["S_1", "S_2"]);
    }

    #[test]
    fn usage_record_bumps_counter_and_timestamp() {
        let mut stats = UsageStats::default();
        let at = Utc::now();
        stats.record(UsageEvent::Click, at);
        stats.record(UsageEvent::Expansion, at);
        assert_eq!(stats.total(), 2);
        assert_eq!(stats.last_used_at, Some(at));
    }

    #[test]
    fn clamp_salience_handles_nan_and_range() {
        assert_eq!(clamp_salience(f64::NAN), 0.0);
        assert_eq!(clamp_salience(1.7), 1.0);
        assert_eq!(clamp_salience(-0.2), 0.0);
        assert_eq!(clamp_salience(0.42), 0.42);
    }

    #[test]
    fn kinds_serialize_snake_case() {
        assert_eq!(serde_json::to_string(&EpisodicKind::TestFail).unwrap(), "\"test_fail\"");
        assert_eq!(serde_json::to_string(&SemanticKind::Decision).unwrap(), "\"decision\"");
    }
}
