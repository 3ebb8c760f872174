//! Consolidation — merges freshly extracted candidates into a thread's
//! existing memory.
//!
//! | family | match rule | on match | otherwise |
//! |--------|-----------|----------|-----------|
//! | semantic | best same-kind similarity `s` | `s ≥ merge`: merge into match; `similarity ≤ s < merge`: add + link | add |
//! | episodic | exact snippet hash | raise salience, no new record | add; link neighbors with `s ≥ similarity` |
//! | artifact | exact ref | union neighbors | add |
//!
//! Consolidation is a read-modify-write against the store; callers must
//! serialize calls per thread or two concurrent passes can both decide
//! "no match" and insert near-duplicates.

use crate::similarity;
use chrono::{DateTime, Utc};
use recollect_config::ConsolidationConfig;
use recollect_core::item::{Artifact, EpisodicItem, SemanticItem, clamp_salience};
use std::collections::{BTreeMap, HashSet};

/// Result of consolidating one family of items.
#[derive(Debug, Clone, Default)]
pub struct Outcome<T> {
    /// The full post-consolidation set, existing items first in original order.
    pub items: Vec<T>,
    /// Ids of candidates stored as new records.
    pub added: Vec<String>,
    /// Ids of pre-existing records that changed.
    pub updated: Vec<String>,
}

impl<T> Outcome<T> {
    /// Ids that must be written back to the store.
    pub fn touched(&self) -> HashSet<&str> {
        self.added
            .iter()
            .chain(self.updated.iter())
            .map(String::as_str)
            .collect()
    }
}

/// Stateless consolidator over in-memory snapshots.
#[derive(Debug, Clone)]
pub struct Consolidator {
    merge_threshold: f64,
    similarity_threshold: f64,
}

impl Default for Consolidator {
    fn default() -> Self {
        Self::new(&ConsolidationConfig::default())
    }
}

impl Consolidator {
    pub fn new(config: &ConsolidationConfig) -> Self {
        Self {
            merge_threshold: config.merge_threshold,
            similarity_threshold: config.similarity_threshold,
        }
    }

    /// Merge semantic candidates into `existing`.
    ///
    /// `artifact_refs` are the thread's artifact refs after artifact
    /// consolidation; together with the final semantic ids they form the set
    /// of valid reference targets.
    pub fn consolidate_semantic(
        &self,
        existing: Vec<SemanticItem>,
        candidates: Vec<SemanticItem>,
        artifact_refs: &HashSet<String>,
        now: DateTime<Utc>,
    ) -> Outcome<SemanticItem> {
        let mut items = existing;
        let mut added: Vec<String> = Vec::new();
        let mut updated: Vec<String> = Vec::new();

        for mut candidate in candidates {
            match self.best_semantic_match(&items, &candidate) {
                Some((idx, score)) if score >= self.merge_threshold => {
                    let target = &mut items[idx];
                    merge_semantic(target, candidate, now);
                    note_update(&target.id, &added, &mut updated);
                }
                Some((idx, score)) if score >= self.similarity_threshold => {
                    candidate.links.add(&items[idx].id);
                    added.push(candidate.id.clone());
                    items.push(candidate);
                }
                _ => {
                    added.push(candidate.id.clone());
                    items.push(candidate);
                }
            }
        }

        // Drop references whose target is not in this thread.
        let mut valid: HashSet<String> = items.iter().map(|i| i.id.clone()).collect();
        valid.extend(artifact_refs.iter().cloned());
        for item in items.iter_mut() {
            let before = item.links.references.len();
            let own_id = item.id.clone();
            item.links
                .references
                .retain(|r| *r != own_id && valid.contains(r));
            if item.links.references.len() != before {
                tracing::trace!(id = %item.id, dropped = before - item.links.references.len(), "Dropped dangling references");
                note_update(&item.id, &added, &mut updated);
            }
        }

        Outcome {
            items,
            added,
            updated,
        }
    }

    /// Same-kind item with the highest similarity; an identical id always
    /// wins with score 1.0.
    fn best_semantic_match(
        &self,
        items: &[SemanticItem],
        candidate: &SemanticItem,
    ) -> Option<(usize, f64)> {
        if let Some(idx) = items.iter().position(|i| i.id == candidate.id) {
            return Some((idx, 1.0));
        }

        let text = candidate.comparison_text();
        let mut best: Option<(usize, f64)> = None;
        for (idx, item) in items.iter().enumerate() {
            if item.kind != candidate.kind {
                continue;
            }
            let score = similarity::ratio(item.comparison_text(), text);
            if best.is_none_or(|(_, b)| score > b) {
                best = Some((idx, score));
            }
        }
        best
    }

    /// Merge episodic candidates into `existing`.
    pub fn consolidate_episodic(
        &self,
        existing: Vec<EpisodicItem>,
        candidates: Vec<EpisodicItem>,
    ) -> Outcome<EpisodicItem> {
        let mut items = existing;
        let mut added: Vec<String> = Vec::new();
        let mut updated: Vec<String> = Vec::new();

        for mut candidate in candidates {
            if let Some(dup) = items.iter_mut().find(|i| i.hash == candidate.hash) {
                if candidate.salience > dup.salience {
                    dup.salience = clamp_salience(candidate.salience);
                    note_update(&dup.id, &added, &mut updated);
                }
                continue;
            }

            let neighbor_idx: Vec<usize> = items
                .iter()
                .enumerate()
                .filter(|(_, i)| {
                    i.kind == candidate.kind
                        && i.id != candidate.id
                        && similarity::ratio(&i.snippet, &candidate.snippet)
                            >= self.similarity_threshold
                })
                .map(|(idx, _)| idx)
                .collect();

            for idx in neighbor_idx {
                let neighbor = &mut items[idx];
                if !neighbor.neighbors.contains(&candidate.id) {
                    neighbor.neighbors.push(candidate.id.clone());
                    note_update(&neighbor.id, &added, &mut updated);
                }
                if !candidate.neighbors.contains(&neighbor.id) {
                    candidate.neighbors.push(neighbor.id.clone());
                }
            }

            candidate.salience = clamp_salience(candidate.salience);
            added.push(candidate.id.clone());
            items.push(candidate);
        }

        Outcome {
            items,
            added,
            updated,
        }
    }

    /// Merge artifact candidates into `existing`, then cluster artifacts of
    /// the same file.
    pub fn consolidate_artifacts(
        &self,
        existing: Vec<Artifact>,
        candidates: Vec<Artifact>,
    ) -> Outcome<Artifact> {
        let mut items = existing;
        let mut added: Vec<String> = Vec::new();
        let mut updated: Vec<String> = Vec::new();

        for candidate in candidates {
            match items.iter_mut().find(|a| a.reference == candidate.reference) {
                Some(found) => {
                    for n in candidate.neighbors {
                        if !found.neighbors.contains(&n) {
                            found.neighbors.push(n);
                        }
                    }
                    note_update(&found.reference, &added, &mut updated);
                }
                None => {
                    added.push(candidate.reference.clone());
                    items.push(candidate);
                }
            }
        }

        let mut by_file: BTreeMap<String, Vec<usize>> = BTreeMap::new();
        for (idx, artifact) in items.iter().enumerate() {
            by_file
                .entry(artifact.file_path().to_string())
                .or_default()
                .push(idx);
        }

        for group in by_file.values().filter(|g| g.len() > 1) {
            let refs: Vec<String> = group.iter().map(|&i| items[i].reference.clone()).collect();
            for &idx in group {
                let artifact = &mut items[idx];
                let mut changed = false;
                for r in &refs {
                    if *r != artifact.reference && !artifact.neighbors.contains(r) {
                        artifact.neighbors.push(r.clone());
                        changed = true;
                    }
                }
                if changed {
                    note_update(&artifact.reference, &added, &mut updated);
                }
            }
        }

        Outcome {
            items,
            added,
            updated,
        }
    }
}

/// Fold `candidate` into `target`.
fn merge_semantic(target: &mut SemanticItem, candidate: SemanticItem, now: DateTime<Utc>) {
    if !candidate.body.is_empty() && !target.body.contains(&candidate.body) {
        if target.body.is_empty() {
            target.body = candidate.body;
        } else {
            target.body = format!("{}\n{}", target.body, candidate.body);
        }
    }
    target.tags.extend(candidate.tags);
    for r in &candidate.links.references {
        target.links.add(r);
    }
    for s in candidate.supersedes {
        if !target.supersedes.contains(&s) {
            target.supersedes.push(s);
        }
    }
    target.salience = clamp_salience(target.salience.max(candidate.salience));
    if candidate.status.priority() > target.status.priority() {
        target.status = candidate.status;
    }
    target.updated_at = now;
}

/// Record `id` as updated unless it was added in this same pass.
fn note_update(id: &str, added: &[String], updated: &mut Vec<String>) {
    if !added.iter().any(|a| a == id) && !updated.iter().any(|u| u == id) {
        updated.push(id.to_string());
    }
}
