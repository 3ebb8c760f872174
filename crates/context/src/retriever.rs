//! Ranking engine — scores every semantic and episodic item of a thread
//! against a purpose and selects a token-bounded subset.
//!
//! # Scoring
//!
//! Each item gets seven components in `[0, 1]`, combined with the configured
//! [`ScoringWeights`]:
//!
//! | component | semantic | episodic |
//! |-----------|----------|----------|
//! | task relevance | purpose-word overlap, +0.3 literal match, +0.2 kind named | purpose-word overlap, +0.3 failure kind on an error purpose |
//! | decision impact | kind weight × status multiplier | own salience |
//! | recency | `exp(-ln2 · age_h / half_life)` | same |
//! | graph degree | incoming references / thread max | `neighbors / 10` |
//! | failure impact | failure keyword hits / 3, +0.2 for constraints and requirements | per-kind table |
//! | usage frequency | `ln(events + 1) / ln(100)` | same |
//! | redundancy (subtracted) | same-kind items sharing ≥ 3 title words / 5 | items with > 70 % leading similarity / 3 |
//!
//! # Selection
//!
//! Items are sorted by score, descending, with the original order as a
//! stable tie-break. The walk accepts an item when it fits in the remaining
//! budget, or when it is smaller than `small_item_ratio × budget` even if it
//! does not fit. The selected total can therefore overshoot the budget by a
//! bounded margin.
//!
//! # Determinism
//!
//! Ranking is a pure function of the thread snapshot, usage stats, purpose,
//! budget and `now`.

use chrono::{DateTime, Utc};
use recollect_config::{RetrievalConfig, ScoringWeights};
use recollect_core::item::{
    EpisodicItem, EpisodicKind, ItemKind, ItemStatus, SemanticItem, SemanticKind, ThreadItems,
    UsageStats,
};
use recollect_core::token::estimate_joined;
use recollect_memory::similarity;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Mission used when no selected requirement states one.
pub const FALLBACK_MISSION: &str = "No explicit mission recorded for this thread.";

const MAX_CONSTRAINTS: usize = 5;
const MAX_RUNBOOK_ENTRIES: usize = 10;
const ARTIFACT_REF_TOKENS: usize = 50;
const ARTIFACT_PREFIX: &str = "CODE:";
const LEADING_CHARS: usize = 100;

const MISSION_KEYWORDS: &[&str] = &["mission", "goal", "objective"];
const ERROR_PURPOSE_KEYWORDS: &[&str] = &["error", "fail", "bug", "issue"];
const FAILURE_KEYWORDS: &[&str] = &[
    "fail",
    "error",
    "bug",
    "crash",
    "broken",
    "regression",
    "incident",
    "outage",
    "exception",
    "timeout",
    "panic",
];

// ── Types ─────────────────────────────────────────────────────────────────

/// Raw component values for one item, before weighting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub task_relevance: f64,
    pub decision_impact: f64,
    pub recency: f64,
    pub graph_degree: f64,
    pub failure_impact: f64,
    pub usage_frequency: f64,
    /// Subtracted from the total.
    pub redundancy: f64,
}

impl ScoreBreakdown {
    /// Weighted sum of the components.
    pub fn total(&self, weights: &ScoringWeights) -> f64 {
        weights.task_relevance * self.task_relevance
            + weights.decision_impact * self.decision_impact
            + weights.recency * self.recency
            + weights.graph_degree * self.graph_degree
            + weights.failure_impact * self.failure_impact
            + weights.usage_frequency * self.usage_frequency
            - weights.redundancy_penalty * self.redundancy
    }
}

/// One selected item, in rank order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FocusItem {
    pub id: String,
    pub kind: ItemKind,
    pub title: String,
    /// Semantic body or episodic snippet.
    pub body: String,
    /// Semantic items only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<ItemStatus>,
    pub score: f64,
    pub tokens: usize,
    pub breakdown: ScoreBreakdown,
}

/// A runbook line distilled from a selected task or decision.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunbookEntry {
    pub id: String,
    pub title: String,
    pub status: ItemStatus,
    pub description: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Runbook {
    pub tasks: Vec<RunbookEntry>,
    pub decisions: Vec<RunbookEntry>,
}

/// Thread-level context derived from the selected items only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Globals {
    pub mission: String,
    pub constraints: Vec<String>,
    pub runbook: Runbook,
}

impl Default for Globals {
    fn default() -> Self {
        Self {
            mission: FALLBACK_MISSION.to_string(),
            constraints: Vec::new(),
            runbook: Runbook::default(),
        }
    }
}

impl Globals {
    /// Heuristic token cost of the globals text.
    pub fn token_estimate(&self) -> usize {
        let mut parts: Vec<&str> = vec![&self.mission];
        parts.extend(self.constraints.iter().map(String::as_str));
        for entry in self.runbook.tasks.iter().chain(self.runbook.decisions.iter()) {
            parts.push(&entry.title);
            parts.push(entry.status.as_str());
        }
        estimate_joined(&parts)
    }
}

/// Output of [`Retriever::recall`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievalResult {
    pub thread_id: String,
    pub purpose: String,
    pub token_budget: usize,
    pub globals: Globals,
    pub focus_ids: Vec<String>,
    pub focus: Vec<FocusItem>,
    pub artifact_refs: Vec<String>,
    pub token_estimate: usize,
}

// ── Retriever ─────────────────────────────────────────────────────────────

/// The ranking engine. Stateless — create one and reuse it.
#[derive(Debug, Clone)]
pub struct Retriever {
    weights: ScoringWeights,
    half_life_hours: f64,
    small_item_ratio: f64,
}

impl Default for Retriever {
    fn default() -> Self {
        Self::new(&RetrievalConfig::default())
    }
}

/// Borrowed view of a scorable item.
#[derive(Clone, Copy)]
enum Source<'a> {
    Semantic(&'a SemanticItem),
    Episodic(&'a EpisodicItem),
}

struct Scored<'a> {
    source: Source<'a>,
    breakdown: ScoreBreakdown,
    score: f64,
    tokens: usize,
}

impl Retriever {
    pub fn new(config: &RetrievalConfig) -> Self {
        Self {
            weights: config.weights.clone(),
            half_life_hours: config.recency_half_life_hours,
            small_item_ratio: config.small_item_ratio,
        }
    }

    /// Rank `items` for `purpose` and select within `token_budget`.
    ///
    /// `usage` maps item ids to their feedback counters; missing ids count as
    /// unused.
    pub fn recall(
        &self,
        thread_id: &str,
        items: &ThreadItems,
        usage: &HashMap<String, UsageStats>,
        purpose: &str,
        token_budget: usize,
        now: DateTime<Utc>,
    ) -> RetrievalResult {
        let mut scored = self.score_all(items, usage, purpose, now);
        // `sort_by` is stable, so equal scores keep thread order.
        scored.sort_by(|a, b| b.score.total_cmp(&a.score));

        let selected = self.select(scored, token_budget);
        let globals = derive_globals(&selected);
        let artifact_refs = collect_artifact_refs(&selected);

        let item_tokens: usize = selected.iter().map(|s| s.tokens).sum();
        let token_estimate =
            item_tokens + globals.token_estimate() + ARTIFACT_REF_TOKENS * artifact_refs.len();

        let focus: Vec<FocusItem> = selected.iter().map(to_focus_item).collect();
        let focus_ids = focus.iter().map(|f| f.id.clone()).collect();

        tracing::debug!(
            thread_id,
            candidates = items.semantic.len() + items.episodic.len(),
            selected = focus.len(),
            token_budget,
            token_estimate,
            "Recall ranked thread"
        );

        RetrievalResult {
            thread_id: thread_id.to_string(),
            purpose: purpose.to_string(),
            token_budget,
            globals,
            focus_ids,
            focus,
            artifact_refs,
            token_estimate,
        }
    }

    fn score_all<'a>(
        &self,
        items: &'a ThreadItems,
        usage: &HashMap<String, UsageStats>,
        purpose: &str,
        now: DateTime<Utc>,
    ) -> Vec<Scored<'a>> {
        let query = Query::new(purpose);
        let in_degree = incoming_references(&items.semantic);
        let max_degree = in_degree.values().copied().max().unwrap_or(0);
        let title_words: Vec<HashSet<String>> = items
            .semantic
            .iter()
            .map(|s| similarity::words(&s.title).into_iter().collect())
            .collect();

        let mut scored = Vec::with_capacity(items.semantic.len() + items.episodic.len());

        for (idx, item) in items.semantic.iter().enumerate() {
            let degree = in_degree.get(item.id.as_str()).copied().unwrap_or(0);
            let breakdown = ScoreBreakdown {
                task_relevance: query.semantic_relevance(item),
                decision_impact: semantic_impact(item.kind) * status_multiplier(item.status),
                recency: self.recency(item.created_at, now),
                graph_degree: if max_degree == 0 {
                    0.0
                } else {
                    degree as f64 / max_degree as f64
                },
                failure_impact: semantic_failure_impact(item),
                usage_frequency: usage_frequency(usage.get(&item.id)),
                redundancy: semantic_redundancy(idx, &items.semantic, &title_words),
            };
            scored.push(Scored {
                source: Source::Semantic(item),
                score: breakdown.total(&self.weights),
                breakdown,
                tokens: estimate_joined(&[&item.title, &item.body]),
            });
        }

        for (idx, item) in items.episodic.iter().enumerate() {
            let breakdown = ScoreBreakdown {
                task_relevance: query.episodic_relevance(item),
                decision_impact: item.salience,
                recency: self.recency(item.created_at, now),
                graph_degree: (item.neighbors.len() as f64 / 10.0).min(1.0),
                failure_impact: episodic_failure_impact(item.kind),
                usage_frequency: usage_frequency(usage.get(&item.id)),
                redundancy: episodic_redundancy(idx, &items.episodic),
            };
            scored.push(Scored {
                source: Source::Episodic(item),
                score: breakdown.total(&self.weights),
                breakdown,
                tokens: estimate_joined(&[&item.title, &item.snippet]),
            });
        }

        scored
    }

    /// Greedy walk over the ranked list with the soft small-item allowance.
    fn select<'a>(&self, ranked: Vec<Scored<'a>>, token_budget: usize) -> Vec<Scored<'a>> {
        let small_item_limit = self.small_item_ratio * token_budget as f64;
        let mut running = 0usize;
        let mut selected = Vec::new();

        for item in ranked {
            if running + item.tokens <= token_budget || (item.tokens as f64) < small_item_limit {
                running += item.tokens;
                selected.push(item);
            }
        }
        selected
    }

    fn recency(&self, created_at: DateTime<Utc>, now: DateTime<Utc>) -> f64 {
        let age_hours = (now - created_at).num_milliseconds() as f64 / 3_600_000.0;
        (-std::f64::consts::LN_2 * age_hours / self.half_life_hours)
            .exp()
            .min(1.0)
    }
}

// ── Components ────────────────────────────────────────────────────────────

/// Pre-tokenized purpose.
struct Query {
    lowered: String,
    words: HashSet<String>,
    mentions_errors: bool,
}

impl Query {
    fn new(purpose: &str) -> Self {
        let lowered = purpose.trim().to_lowercase();
        let mentions_errors = ERROR_PURPOSE_KEYWORDS.iter().any(|k| lowered.contains(k));
        Self {
            words: similarity::words(&lowered).into_iter().collect(),
            lowered,
            mentions_errors,
        }
    }

    /// Fraction of purpose words that appear in `text`.
    fn overlap(&self, text: &str) -> f64 {
        if self.words.is_empty() {
            return 0.0;
        }
        let text_words: HashSet<String> = similarity::words(text).into_iter().collect();
        let shared = self.words.iter().filter(|w| text_words.contains(*w)).count();
        shared as f64 / self.words.len() as f64
    }

    fn names_kind(&self, kind: &str) -> bool {
        self.words
            .iter()
            .any(|w| w == kind || w.strip_suffix('s') == Some(kind))
    }

    fn semantic_relevance(&self, item: &SemanticItem) -> f64 {
        let text = format!("{} {}", item.title, item.body).to_lowercase();
        let mut score = self.overlap(&text);
        if !self.lowered.is_empty() && text.contains(&self.lowered) {
            score += 0.3;
        }
        if self.names_kind(item.kind.as_str()) {
            score += 0.2;
        }
        score.clamp(0.0, 1.0)
    }

    fn episodic_relevance(&self, item: &EpisodicItem) -> f64 {
        let text = format!("{} {}", item.title, item.snippet).to_lowercase();
        let mut score = self.overlap(&text);
        if item.kind.is_failure() && self.mentions_errors {
            score += 0.3;
        }
        score.clamp(0.0, 1.0)
    }
}

fn semantic_impact(kind: SemanticKind) -> f64 {
    match kind {
        SemanticKind::Decision => 1.0,
        SemanticKind::Contract => 0.9,
        SemanticKind::Requirement => 0.8,
        SemanticKind::Constraint => 0.7,
        SemanticKind::Task => 0.5,
        SemanticKind::Glossary => 0.3,
    }
}

fn status_multiplier(status: ItemStatus) -> f64 {
    match status {
        ItemStatus::Accepted => 1.0,
        ItemStatus::Provisional => 0.7,
        ItemStatus::Rejected => 0.2,
        ItemStatus::Superseded => 0.1,
    }
}

fn semantic_failure_impact(item: &SemanticItem) -> f64 {
    let hits = similarity::words(&format!("{} {}", item.title, item.body))
        .iter()
        .filter(|w| FAILURE_KEYWORDS.iter().any(|k| w.starts_with(k)))
        .count();
    let mut score = (hits as f64 / 3.0).min(1.0);
    if matches!(item.kind, SemanticKind::Constraint | SemanticKind::Requirement) {
        score += 0.2;
    }
    score.min(1.0)
}

fn episodic_failure_impact(kind: EpisodicKind) -> f64 {
    match kind {
        EpisodicKind::TestFail => 1.0,
        EpisodicKind::Stack => 0.9,
        EpisodicKind::Diff => 0.4,
        EpisodicKind::Log => 0.3,
        EpisodicKind::Chat => 0.1,
    }
}

fn usage_frequency(stats: Option<&UsageStats>) -> f64 {
    let events = stats.map(UsageStats::total).unwrap_or(0);
    ((events as f64 + 1.0).ln() / 100f64.ln()).min(1.0)
}

/// Number of other semantic items referencing each id.
fn incoming_references(items: &[SemanticItem]) -> HashMap<&str, usize> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for item in items {
        let unique: HashSet<&str> = item
            .links
            .references
            .iter()
            .map(String::as_str)
            .filter(|r| *r != item.id)
            .collect();
        for target in unique {
            *counts.entry(target).or_default() += 1;
        }
    }
    counts
}

fn semantic_redundancy(idx: usize, items: &[SemanticItem], title_words: &[HashSet<String>]) -> f64 {
    let kind = items[idx].kind;
    let mine = &title_words[idx];
    let similar = items
        .iter()
        .enumerate()
        .filter(|(j, other)| {
            *j != idx && other.kind == kind && mine.intersection(&title_words[*j]).count() >= 3
        })
        .count();
    (similar as f64 / 5.0).min(1.0)
}

fn episodic_redundancy(idx: usize, items: &[EpisodicItem]) -> f64 {
    let mine = &items[idx].snippet;
    let similar = items
        .iter()
        .enumerate()
        .filter(|(j, other)| {
            *j != idx && similarity::leading_ratio(mine, &other.snippet, LEADING_CHARS) > 0.7
        })
        .count();
    (similar as f64 / 3.0).min(1.0)
}

// ── Globals ───────────────────────────────────────────────────────────────

fn derive_globals(selected: &[Scored<'_>]) -> Globals {
    let semantic: Vec<&SemanticItem> = selected
        .iter()
        .filter_map(|s| match s.source {
            Source::Semantic(item) => Some(item),
            Source::Episodic(_) => None,
        })
        .collect();

    let mission = semantic
        .iter()
        .find(|s| {
            let title = s.title.to_lowercase();
            s.kind == SemanticKind::Requirement && MISSION_KEYWORDS.iter().any(|k| title.contains(k))
        })
        .map(|s| s.content().to_string())
        .unwrap_or_else(|| FALLBACK_MISSION.to_string());

    let constraints = semantic
        .iter()
        .filter(|s| s.kind == SemanticKind::Constraint)
        .take(MAX_CONSTRAINTS)
        .map(|s| s.title.clone())
        .collect();

    let runbook = Runbook {
        tasks: runbook_entries(&semantic, SemanticKind::Task),
        decisions: runbook_entries(&semantic, SemanticKind::Decision),
    };

    Globals {
        mission,
        constraints,
        runbook,
    }
}

fn runbook_entries(items: &[&SemanticItem], kind: SemanticKind) -> Vec<RunbookEntry> {
    items
        .iter()
        .filter(|s| s.kind == kind)
        .take(MAX_RUNBOOK_ENTRIES)
        .map(|s| RunbookEntry {
            id: s.id.clone(),
            title: s.title.clone(),
            status: s.status,
            description: s.body.clone(),
        })
        .collect()
}

fn collect_artifact_refs(selected: &[Scored<'_>]) -> Vec<String> {
    let mut seen: HashSet<&str> = HashSet::new();
    let mut refs = Vec::new();
    for scored in selected {
        if let Source::Semantic(item) = scored.source {
            for r in &item.links.references {
                if r.starts_with(ARTIFACT_PREFIX) && seen.insert(r.as_str()) {
                    refs.push(r.clone());
                }
            }
        }
    }
    refs
}

fn to_focus_item(scored: &Scored<'_>) -> FocusItem {
    match scored.source {
        Source::Semantic(item) => FocusItem {
            id: item.id.clone(),
            kind: ItemKind::Semantic(item.kind),
            title: item.title.clone(),
            body: item.body.clone(),
            status: Some(item.status),
            score: scored.score,
            tokens: scored.tokens,
            breakdown: scored.breakdown,
        },
        Source::Episodic(item) => FocusItem {
            id: item.id.clone(),
            kind: ItemKind::Episodic(item.kind),
            title: item.title.clone(),
            body: item.snippet.clone(),
            status: None,
            score: scored.score,
            tokens: scored.tokens,
            breakdown: scored.breakdown,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use recollect_core::hash::content_hash;
    use recollect_core::item::Links;
    use std::collections::BTreeSet;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 5, 1, 12, 0, 0).unwrap()
    }

    fn sem(id: &str, kind: SemanticKind, title: &str, body: &str) -> SemanticItem {
        SemanticItem {
            id: id.into(),
            thread_id: "T1".into(),
            kind,
            title: title.into(),
            body: body.into(),
            tags: BTreeSet::new(),
            links: Links::default(),
            status: ItemStatus::Accepted,
            supersedes: vec![],
            salience: 0.5,
            usage_count: 0,
            created_at: now(),
            updated_at: now(),
        }
    }

    fn epi(id: &str, kind: EpisodicKind, snippet: &str) -> EpisodicItem {
        EpisodicItem {
            id: id.into(),
            thread_id: "T1".into(),
            kind,
            title: snippet.chars().take(40).collect(),
            snippet: snippet.into(),
            source: "test".into(),
            hash: content_hash(snippet),
            salience: 0.5,
            neighbors: vec![],
            created_at: now(),
        }
    }

    fn recall(items: &ThreadItems, purpose: &str, budget: usize) -> RetrievalResult {
        Retriever::default().recall("T1", items, &HashMap::new(), purpose, budget, now())
    }

    #[test]
    fn empty_thread_yields_fallbacks() {
        let result = recall(&ThreadItems::default(), "anything", 4000);
        assert!(result.focus_ids.is_empty());
        assert_eq!(result.globals.mission, FALLBACK_MISSION);
        assert!(result.globals.constraints.is_empty());
        assert!(result.artifact_refs.is_empty());
        assert_eq!(result.token_estimate, result.globals.token_estimate());
    }

    #[test]
    fn relevant_item_ranks_first() {
        let items = ThreadItems {
            semantic: vec![
                sem("S_a", SemanticKind::Task, "Update the changelog", "Update the changelog"),
                sem("S_b", SemanticKind::Task, "Rotate auth keys", "Rotate authentication keys"),
            ],
            ..Default::default()
        };
        let result = recall(&items, "authentication", 4000);
        assert_eq!(result.focus_ids, vec!["S_b", "S_a"]);
        assert!(result.focus[0].breakdown.task_relevance > result.focus[1].breakdown.task_relevance);
    }

    #[test]
    fn ties_keep_thread_order() {
        let items = ThreadItems {
            semantic: vec![
                sem("S_1", SemanticKind::Task, "alpha", "alpha"),
                sem("S_2", SemanticKind::Task, "bravo", "bravo"),
                sem("S_3", SemanticKind::Task, "charlie", "charlie"),
            ],
            ..Default::default()
        };
        let result = recall(&items, "unrelated", 4000);
        assert_eq!(result.focus_ids, vec!["S_1", "S_2", "S_3"]);
    }

    #[test]
    fn recency_halves_every_half_life() {
        let r = Retriever::default();
        assert_eq!(r.recency(now(), now()), 1.0);
        let week_ago = now() - Duration::hours(168);
        assert!((r.recency(week_ago, now()) - 0.5).abs() < 1e-9);
        let future = now() + Duration::hours(5);
        assert_eq!(r.recency(future, now()), 1.0);
    }

    #[test]
    fn graph_degree_is_normalized_by_thread_max() {
        let mut a = sem("S_a", SemanticKind::Decision, "a", "a");
        let mut b = sem("S_b", SemanticKind::Decision, "b", "b");
        let mut c = sem("S_c", SemanticKind::Decision, "c", "c");
        a.links.references = vec!["S_c".into()];
        b.links.references = vec!["S_c".into(), "S_a".into()];
        c.links.references = vec!["S_c".into()];
        let items = ThreadItems {
            semantic: vec![a, b, c],
            ..Default::default()
        };
        let result = recall(&items, "", 4000);
        let degree = |id: &str| {
            result
                .focus
                .iter()
                .find(|f| f.id == id)
                .map(|f| f.breakdown.graph_degree)
                .unwrap()
        };
        assert_eq!(degree("S_c"), 1.0);
        assert_eq!(degree("S_a"), 0.5);
        assert_eq!(degree("S_b"), 0.0);
    }

    #[test]
    fn error_purpose_boosts_failure_episodes() {
        let items = ThreadItems {
            episodic: vec![
                epi("E_diff", EpisodicKind::Diff, "diff --git a/src/x.rs b/src/x.rs"),
                epi("E_fail", EpisodicKind::TestFail, "FAILED: test_checkout_flow"),
            ],
            ..Default::default()
        };
        let result = recall(&items, "why does this fail", 4000);
        assert_eq!(result.focus_ids[0], "E_fail");
        assert!(result.focus[0].breakdown.task_relevance >= 0.3);
    }

    #[test]
    fn usage_frequency_saturates() {
        let heavy = UsageStats {
            clicks: 60,
            references: 30,
            expansions: 9,
            last_used_at: None,
        };
        assert_eq!(usage_frequency(Some(&heavy)), 1.0);
        assert_eq!(usage_frequency(None), 0.0);
    }

    #[test]
    fn redundant_titles_are_penalized() {
        let items = ThreadItems {
            semantic: vec![
                sem("S_1", SemanticKind::Task, "fix the login redirect loop", "x"),
                sem("S_2", SemanticKind::Task, "fix the login redirect again", "y"),
                sem("S_3", SemanticKind::Task, "write release notes", "z"),
            ],
            ..Default::default()
        };
        let result = recall(&items, "", 4000);
        let red = |id: &str| result.focus.iter().find(|f| f.id == id).unwrap().breakdown.redundancy;
        assert!((red("S_1") - 0.2).abs() < 1e-9);
        assert_eq!(red("S_3"), 0.0);
    }

    #[test]
    fn small_items_may_overshoot_budget() {
        // Each item costs 25 tokens; a budget of 400 allows 16 by fit and any
        // item under 40 tokens beyond that.
        let semantic = (0..20)
            .map(|i| sem(&format!("S_{i:02}"), SemanticKind::Task, &"t".repeat(50), &"b".repeat(49)))
            .collect();
        let items = ThreadItems {
            semantic,
            ..Default::default()
        };
        let result = recall(&items, "", 400);
        assert_eq!(result.focus_ids.len(), 20);
        let item_tokens: usize = result.focus.iter().map(|f| f.tokens).sum();
        assert_eq!(item_tokens, 500);
    }

    #[test]
    fn large_items_respect_budget() {
        let semantic = (0..4)
            .map(|i| sem(&format!("S_{i}"), SemanticKind::Task, "t", &"b".repeat(800)))
            .collect();
        let items = ThreadItems {
            semantic,
            ..Default::default()
        };
        let result = recall(&items, "", 450);
        assert_eq!(result.focus_ids.len(), 2);
    }

    #[test]
    fn globals_come_from_selected_items() {
        let items = ThreadItems {
            semantic: vec![
                sem("S_m", SemanticKind::Requirement, "Mission: ship SSO", "Ship SSO by Q3 for enterprise tenants"),
                sem("S_c", SemanticKind::Constraint, "No more than 2 deploys per day", "body"),
                sem("S_d", SemanticKind::Decision, "Use Postgres", "We decided to use Postgres"),
                sem("S_t", SemanticKind::Task, "Write migration", "TODO write migration"),
            ],
            ..Default::default()
        };
        let result = recall(&items, "", 4000);
        assert_eq!(result.globals.mission, "Ship SSO by Q3 for enterprise tenants");
        assert_eq!(result.globals.constraints, vec!["No more than 2 deploys per day"]);
        assert_eq!(result.globals.runbook.decisions[0].title, "Use Postgres");
        assert_eq!(result.globals.runbook.tasks[0].id, "S_t");

        let starved = recall(&items, "", 0);
        assert!(starved.focus_ids.is_empty());
        assert_eq!(starved.globals.mission, FALLBACK_MISSION);
    }

    #[test]
    fn artifact_refs_are_deduplicated_code_links() {
        let mut a = sem("S_a", SemanticKind::Decision, "a", "a");
        let mut b = sem("S_b", SemanticKind::Decision, "b", "b");
        a.links.references = vec!["CODE:src/a.rs".into(), "S_b".into()];
        b.links.references = vec!["CODE:src/a.rs".into(), "CODE:src/b.rs".into()];
        let items = ThreadItems {
            semantic: vec![a, b],
            ..Default::default()
        };
        let result = recall(&items, "", 4000);
        assert_eq!(result.artifact_refs.len(), 2);
        let item_tokens: usize = result.focus.iter().map(|f| f.tokens).sum();
        assert_eq!(
            result.token_estimate,
            item_tokens + result.globals.token_estimate() + 100
        );
    }

    #[test]
    fn recall_is_deterministic() {
        let items = ThreadItems {
            semantic: vec![
                sem("S_1", SemanticKind::Decision, "Use JWT", "We decided to use JWT"),
                sem("S_2", SemanticKind::Constraint, "Never log tokens", "never log tokens"),
            ],
            episodic: vec![epi("E_1", EpisodicKind::Log, "[ERROR] token expired")],
            ..Default::default()
        };
        let a = serde_json::to_string(&recall(&items, "tokens", 1000)).unwrap();
        let b = serde_json::to_string(&recall(&items, "tokens", 1000)).unwrap();
        assert_eq!(a, b);
    }
}
