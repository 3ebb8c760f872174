//! Extraction — turns raw interaction text into candidate memory items.
//!
//! # Pipeline
//!
//! 1. Redact secrets (always before anything else sees the text)
//! 2. Scan line by line; classify each line against ordered per-kind
//!    patterns, first match wins
//! 3. Build title / body (semantic) or title / snippet (episodic)
//! 4. Derive stable ids from a content hash
//! 5. Score initial salience from a per-kind table plus keyword adjustments
//!
//! Artifacts (code fences, path-like inline code, file paths with line
//! ranges) are extracted independently and deduplicated by ref.
//!
//! Extraction is a pure function: malformed, empty or binary-looking input
//! simply yields empty lists.

use crate::redact;
use chrono::{DateTime, Utc};
use recollect_config::ExtractionConfig;
use recollect_core::hash::{content_hash, short_hash};
use recollect_core::item::{
    Artifact, EpisodicItem, EpisodicKind, ItemStatus, Links, MAX_SNIPPET_CHARS,
    MIN_INITIAL_SALIENCE, SemanticItem, SemanticKind,
};
use regex_lite::Regex;
use std::collections::{BTreeSet, HashSet};
use std::sync::LazyLock;

const SEMANTIC_TITLE_CHARS: usize = 100;
const EPISODIC_TITLE_CHARS: usize = 80;
const SEMANTIC_WINDOW: usize = 2;
const DEFAULT_SOURCE: &str = "ingest";

fn re(pattern: &str) -> Regex {
    Regex::new(pattern).expect("extraction pattern is valid")
}

// ── Classification patterns (order matters: first match wins) ────────────

static SEMANTIC_PATTERNS: LazyLock<Vec<(SemanticKind, Regex)>> = LazyLock::new(|| {
    vec![
        (
            SemanticKind::Decision,
            re(r"(?i)\b(decided|decision|we will use|we'll use|going with|chose|chosen|agreed|settled on|opted for)\b"),
        ),
        (
            SemanticKind::Requirement,
            re(r"(?i)\b(must|shall|required|requirement|is needed|mission|goal|objective)\b"),
        ),
        (
            SemanticKind::Constraint,
            re(r"(?i)\b(cannot|can't|never|limit|limited to|at most|no more than|maximum|minimum|constraint|restricted|not allowed)\b"),
        ),
        (
            SemanticKind::Task,
            re(r"(?i)(\b(todo|fixme|task|implement|need to|needs to|next step|action item|follow up|follow-up)\b|^\s*[-*]\s*\[ \])"),
        ),
    ]
});

static EPISODIC_PATTERNS: LazyLock<Vec<(EpisodicKind, Regex)>> = LazyLock::new(|| {
    vec![
        (
            EpisodicKind::TestFail,
            re(r"(?i)(\btests?\b.*\bfail(ed|ure|s|ing)?\b|\bfail(ed)?\b.*\btests?\b|\bFAIL(ED)?:|assertion ?error|assertion failed)"),
        ),
        (
            EpisodicKind::Stack,
            re(r#"(?i)(traceback \(most recent call last\)|panicked at|stack backtrace|exception in thread|^\s+at [\w$.<>]+\(|^\s*File "[^"]+", line \d+)"#),
        ),
        (
            EpisodicKind::Log,
            re(r"(?i)(^\s*\[?(error|warn|warning|info|debug|fatal|critical)\]?[\s:]|\b\d{4}-\d{2}-\d{2}[ t]\d{2}:\d{2}:\d{2})"),
        ),
        (
            EpisodicKind::Diff,
            re(r"^(diff --git |@@ -\d+(,\d+)? \+\d+(,\d+)? @@|\+\+\+ [ab/]|--- [ab/]|index [0-9a-f]{7,}\.\.[0-9a-f]{7,})"),
        ),
    ]
});

// ── Salience keyword adjustments ──────────────────────────────────────────

static URGENT_STRONG: LazyLock<Regex> =
    LazyLock::new(|| re(r"(?i)\b(critical|urgent|blocker|blocking|security)\b"));
static URGENT_MILD: LazyLock<Regex> =
    LazyLock::new(|| re(r"(?i)\b(important|breaking|asap|high priority)\b"));
static TRIVIAL_STRONG: LazyLock<Regex> =
    LazyLock::new(|| re(r"(?i)\b(trivial|typo|nit|cosmetic|minor)\b"));
static TRIVIAL_MILD: LazyLock<Regex> =
    LazyLock::new(|| re(r"(?i)\b(maybe|optional|nice to have|someday)\b"));
static SEVERE_FAILURE: LazyLock<Regex> =
    LazyLock::new(|| re(r"(?i)\b(fatal|panic|panicked|segfault|crash(ed)?|oom|data loss)\b"));
static NOISY_LOG: LazyLock<Regex> =
    LazyLock::new(|| re(r"(?i)\b(debug|trace|verbose|heartbeat)\b"));

static CONFIRMED: LazyLock<Regex> =
    LazyLock::new(|| re(r"(?i)\b(decided|agreed|approved|confirmed|finalized|settled on)\b"));
static TENTATIVE: LazyLock<Regex> =
    LazyLock::new(|| re(r"(?i)\b(maybe|might|consider|considering|propose|proposed|should we|tbd)\b"));

static HASHTAG: LazyLock<Regex> =
    LazyLock::new(|| re(r"(?:^|\s)#([A-Za-z][A-Za-z0-9_-]+)"));

// ── Artifact patterns ─────────────────────────────────────────────────────

static CODE_FENCE: LazyLock<Regex> = LazyLock::new(|| re(r"^\s*```\s*([A-Za-z0-9_+-]*)"));
static INLINE_CODE: LazyLock<Regex> = LazyLock::new(|| re(r"`([^`\n]+)`"));
static FILE_PATH: LazyLock<Regex> = LazyLock::new(|| {
    re(r"\b((?:[A-Za-z0-9_.-]+/)*[A-Za-z0-9_-][A-Za-z0-9_.-]*\.(?:rs|py|ts|tsx|js|jsx|go|java|kt|c|h|cc|cpp|hpp|cs|rb|php|swift|scala|sh|toml|yaml|yml|json|md|sql|html|css|proto))\b(?:(?::|#L)(\d+)(?:-L?(\d+))?)?")
});

/// Everything one extraction pass produced.
#[derive(Debug, Clone, Default)]
pub struct Extraction {
    pub semantic: Vec<SemanticItem>,
    pub episodic: Vec<EpisodicItem>,
    pub artifacts: Vec<Artifact>,
    /// Number of redaction substitutions applied to the input.
    pub redactions: usize,
}

impl Extraction {
    pub fn is_empty(&self) -> bool {
        self.semantic.is_empty() && self.episodic.is_empty() && self.artifacts.is_empty()
    }
}

/// Stateless extractor. Create one and reuse it.
#[derive(Debug, Clone, Default)]
pub struct Extractor {
    config: ExtractionConfig,
}

impl Extractor {
    pub fn new(config: ExtractionConfig) -> Self {
        Self { config }
    }

    /// Extract candidate items from `content` for `thread_id`.
    ///
    /// `now` stamps `created_at`/`updated_at`; `source` defaults to "ingest".
    pub fn extract(
        &self,
        content: &str,
        thread_id: &str,
        source: Option<&str>,
        now: DateTime<Utc>,
    ) -> Extraction {
        let (text, redactions) = if self.config.redact {
            let redacted = redact::redact(content);
            (redacted.text, redacted.count)
        } else {
            (content.to_string(), 0)
        };

        let lines: Vec<&str> = text.lines().collect();
        let source = source.unwrap_or(DEFAULT_SOURCE);

        let artifacts = extract_artifacts(&lines, thread_id, now);
        let mut semantic = self.extract_semantic(&lines, thread_id, now);
        let episodic = self.extract_episodic(&lines, thread_id, source, now);

        link_artifacts(&mut semantic, &artifacts);

        tracing::debug!(
            thread_id,
            semantic = semantic.len(),
            episodic = episodic.len(),
            artifacts = artifacts.len(),
            redactions,
            "Extraction complete"
        );

        Extraction {
            semantic,
            episodic,
            artifacts,
            redactions,
        }
    }

    fn extract_semantic(
        &self,
        lines: &[&str],
        thread_id: &str,
        now: DateTime<Utc>,
    ) -> Vec<SemanticItem> {
        let mut items = Vec::new();
        let mut seen = HashSet::new();

        for (idx, raw) in lines.iter().enumerate() {
            let line = raw.trim();
            if line.chars().count() < self.config.semantic_min_line || is_binary_noise(line) {
                continue;
            }
            let Some(kind) = classify_semantic(line) else {
                continue;
            };

            let id = format!("S_{}", short_hash(&format!("{kind}|{line}")));
            if !seen.insert(id.clone()) {
                continue;
            }

            let lo = idx.saturating_sub(SEMANTIC_WINDOW);
            let hi = (idx + SEMANTIC_WINDOW + 1).min(lines.len());
            let body = truncate_chars(
                lines[lo..hi]
                    .iter()
                    .map(|l| l.trim())
                    .filter(|l| !l.is_empty())
                    .collect::<Vec<_>>()
                    .join("\n")
                    .as_str(),
                MAX_SNIPPET_CHARS,
            );

            let mut tags: BTreeSet<String> = HASHTAG
                .captures_iter(line)
                .filter_map(|c| c.get(1).map(|m| m.as_str().to_lowercase()))
                .collect();
            tags.insert(kind.as_str().to_string());

            items.push(SemanticItem {
                id,
                thread_id: thread_id.to_string(),
                kind,
                title: first_clause(line, SEMANTIC_TITLE_CHARS),
                body,
                tags,
                links: Links::default(),
                status: initial_status(kind, line),
                supersedes: Vec::new(),
                salience: semantic_salience(kind, line),
                usage_count: 0,
                created_at: now,
                updated_at: now,
            });
        }

        items
    }

    fn extract_episodic(
        &self,
        lines: &[&str],
        thread_id: &str,
        source: &str,
        now: DateTime<Utc>,
    ) -> Vec<EpisodicItem> {
        let mut items = Vec::new();
        let mut seen = HashSet::new();

        for (idx, raw) in lines.iter().enumerate() {
            if raw.trim().chars().count() < self.config.episodic_min_line || is_binary_noise(raw) {
                continue;
            }
            // Stack and diff patterns are indentation / column sensitive.
            let Some(kind) = classify_episodic(raw) else {
                continue;
            };

            let window = match lines.get(idx + 1) {
                Some(next) => format!("{}\n{}", raw.trim_end(), next.trim_end()),
                None => raw.trim_end().to_string(),
            };
            let snippet = truncate_chars(window.trim(), MAX_SNIPPET_CHARS);
            let hash = content_hash(&snippet);
            let id = format!("E_{}", &hash[..8]);
            if !seen.insert(id.clone()) {
                continue;
            }

            items.push(EpisodicItem {
                id,
                thread_id: thread_id.to_string(),
                kind,
                title: first_clause(raw.trim(), EPISODIC_TITLE_CHARS),
                snippet,
                source: source.to_string(),
                hash,
                salience: episodic_salience(kind, raw),
                neighbors: Vec::new(),
                created_at: now,
            });
        }

        items
    }
}

fn classify_semantic(line: &str) -> Option<SemanticKind> {
    SEMANTIC_PATTERNS
        .iter()
        .find(|(_, pattern)| pattern.is_match(line))
        .map(|(kind, _)| *kind)
}

fn classify_episodic(line: &str) -> Option<EpisodicKind> {
    EPISODIC_PATTERNS
        .iter()
        .find(|(_, pattern)| pattern.is_match(line))
        .map(|(kind, _)| *kind)
}

/// Base salience of a semantic kind before keyword adjustment.
pub fn semantic_base_salience(kind: SemanticKind) -> f64 {
    match kind {
        SemanticKind::Decision => 0.8,
        SemanticKind::Requirement => 0.7,
        SemanticKind::Constraint => 0.6,
        SemanticKind::Task => 0.5,
        SemanticKind::Contract => 0.6,
        SemanticKind::Glossary => 0.4,
    }
}

/// Base salience of an episodic kind before keyword adjustment.
pub fn episodic_base_salience(kind: EpisodicKind) -> f64 {
    match kind {
        EpisodicKind::TestFail => 0.9,
        EpisodicKind::Stack => 0.8,
        EpisodicKind::Log => 0.3,
        EpisodicKind::Diff => 0.4,
        EpisodicKind::Chat => 0.3,
    }
}

fn semantic_salience(kind: SemanticKind, line: &str) -> f64 {
    let mut score = semantic_base_salience(kind);
    if URGENT_STRONG.is_match(line) {
        score += 0.2;
    } else if URGENT_MILD.is_match(line) {
        score += 0.1;
    }
    if TRIVIAL_STRONG.is_match(line) {
        score -= 0.2;
    } else if TRIVIAL_MILD.is_match(line) {
        score -= 0.1;
    }
    clamp_initial(score)
}

fn episodic_salience(kind: EpisodicKind, line: &str) -> f64 {
    let mut score = episodic_base_salience(kind);
    if SEVERE_FAILURE.is_match(line) {
        score += 0.1;
    }
    if kind == EpisodicKind::Log && NOISY_LOG.is_match(line) {
        score -= 0.2;
    }
    clamp_initial(score)
}

fn clamp_initial(score: f64) -> f64 {
    // Round away float noise from the ±0.1 steps so 0.8 stays 0.8.
    let rounded = (score * 1000.0).round() / 1000.0;
    rounded.clamp(MIN_INITIAL_SALIENCE, 1.0)
}

fn initial_status(kind: SemanticKind, line: &str) -> ItemStatus {
    if TENTATIVE.is_match(line) {
        return ItemStatus::Provisional;
    }
    match kind {
        SemanticKind::Decision if CONFIRMED.is_match(line) => ItemStatus::Accepted,
        SemanticKind::Decision | SemanticKind::Task => ItemStatus::Provisional,
        _ => ItemStatus::Accepted,
    }
}

/// First sentence-like clause of a line, stripped of list / heading markers.
fn first_clause(line: &str, max_chars: usize) -> String {
    let stripped = line
        .trim()
        .trim_start_matches(['-', '*', '#', '>', ' '])
        .trim_start_matches("[ ]")
        .trim();
    let end = [". ", "; ", "! ", "? "]
        .iter()
        .filter_map(|sep| stripped.find(sep))
        .min()
        .unwrap_or(stripped.len());
    let clause = stripped[..end].trim_end_matches(['.', ';', ':', ' ']);
    truncate_chars(clause, max_chars)
}

fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => text[..byte_idx].to_string(),
        None => text.to_string(),
    }
}

/// Lines dominated by control or replacement characters (binary dumps).
fn is_binary_noise(line: &str) -> bool {
    let total = line.chars().count();
    if total == 0 {
        return false;
    }
    let noisy = line
        .chars()
        .filter(|c| *c == '\u{FFFD}' || (c.is_control() && *c != '\t'))
        .count();
    noisy * 4 > total
}

// ── Artifacts ─────────────────────────────────────────────────────────────

fn extract_artifacts(lines: &[&str], thread_id: &str, now: DateTime<Utc>) -> Vec<Artifact> {
    let mut artifacts: Vec<Artifact> = Vec::new();
    let mut push = |reference: String, role: &str, body: &str| {
        if artifacts.iter().any(|a| a.reference == reference) {
            return;
        }
        artifacts.push(Artifact {
            hash: content_hash(body),
            reference,
            thread_id: thread_id.to_string(),
            role: role.to_string(),
            neighbors: Vec::new(),
            created_at: now,
        });
    };

    let mut idx = 0;
    while idx < lines.len() {
        let line = lines[idx];

        if let Some(caps) = CODE_FENCE.captures(line) {
            let lang = caps.get(1).map(|m| m.as_str()).unwrap_or("");
            let close = lines[idx + 1..]
                .iter()
                .position(|l| l.trim_start().starts_with("```"))
                .map(|offset| idx + 1 + offset);
            let end = close.unwrap_or(lines.len());
            let code = lines[idx + 1..end].join("\n");
            if !code.trim().is_empty() {
                let ext = if lang.is_empty() { "txt" } else { lang };
                let reference = format!("CODE:snippet_{}.{}", short_hash(&code), ext);
                push(reference, "snippet", &code);
            }
            // Paths inside fences are code, not references.
            idx = end + 1;
            continue;
        }

        for caps in INLINE_CODE.captures_iter(line) {
            let Some(inner) = caps.get(1) else { continue };
            if let Some(reference) = file_reference(inner.as_str()) {
                push(reference, "reference", inner.as_str());
            }
        }

        let without_inline = INLINE_CODE.replace_all(line, " ");
        for caps in FILE_PATH.captures_iter(&without_inline) {
            if let Some(reference) = reference_from_captures(&caps) {
                push(reference, "file", caps.get(0).map(|m| m.as_str()).unwrap_or(""));
            }
        }

        idx += 1;
    }

    artifacts
}

fn file_reference(text: &str) -> Option<String> {
    let caps = FILE_PATH.captures(text.trim())?;
    reference_from_captures(&caps)
}

fn reference_from_captures(caps: &regex_lite::Captures<'_>) -> Option<String> {
    let path = caps.get(1)?.as_str().trim_start_matches("./");
    if path.is_empty() {
        return None;
    }
    let start = caps.get(2).map(|m| m.as_str());
    let end = caps.get(3).map(|m| m.as_str());
    Some(match (start, end) {
        (Some(s), Some(e)) => format!("CODE:{path}#L{s}-L{e}"),
        (Some(s), None) => format!("CODE:{path}#L{s}"),
        _ => format!("CODE:{path}"),
    })
}

/// Whole file paths mentioned in `text`, as the artifact scan sees them.
fn mentioned_paths(text: &str) -> HashSet<&str> {
    FILE_PATH
        .captures_iter(text)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str().trim_start_matches("./"))
        .collect()
}

/// Point semantic items at the file artifacts their body mentions.
fn link_artifacts(items: &mut [SemanticItem], artifacts: &[Artifact]) {
    for item in items.iter_mut() {
        let paths = mentioned_paths(&item.body);
        for artifact in artifacts.iter().filter(|a| a.role != "snippet") {
            if paths.contains(artifact.file_path()) {
                item.links.add(&artifact.reference);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 1, 9, 0, 0).unwrap()
    }

    fn extract(content: &str) -> Extraction {
        Extractor::default().extract(content, "T1", None, now())
    }

    #[test]
    fn decision_sentence_yields_one_decision() {
        let out = extract("We decided to use JWT tokens for authentication.");
        assert_eq!(out.semantic.len(), 1);
        assert!(out.episodic.is_empty());
        assert!(out.artifacts.is_empty());

        let item = &out.semantic[0];
        assert_eq!(item.kind, SemanticKind::Decision);
        assert_eq!(item.salience, 0.8);
        assert_eq!(item.status, ItemStatus::Accepted);
        assert_eq!(item.title, "We decided to use JWT tokens for authentication");
        assert!(item.id.starts_with("S_"));
        assert_eq!(item.id.len(), 10);
        assert!(item.tags.contains("decision"));
    }

    #[test]
    fn ids_are_stable_across_runs() {
        let a = extract("We decided to use JWT tokens for authentication.");
        let b = extract("We decided to use JWT tokens for authentication.");
        assert_eq!(a.semantic[0].id, b.semantic[0].id);
    }

    #[test]
    fn first_matching_kind_wins() {
        // "decided" (decision) precedes "must" (requirement) in pattern order.
        let out = extract("We decided the API must return JSON");
        assert_eq!(out.semantic.len(), 1);
        assert_eq!(out.semantic[0].kind, SemanticKind::Decision);
    }

    #[test]
    fn requirement_constraint_and_task_are_classified() {
        let out = extract(
            "The service must support 1k rps\nResponses can't exceed 2MB\nTODO: implement retries",
        );
        let kinds: Vec<_> = out.semantic.iter().map(|s| s.kind).collect();
        assert_eq!(
            kinds,
            vec![SemanticKind::Requirement, SemanticKind::Constraint, SemanticKind::Task]
        );
    }

    #[test]
    fn links_only_whole_path_mentions() {
        let out = extract(
            "We decided to refactor data.rs first\n\
             filler line one\n\
             filler line two\n\
             filler line three\n\
             later we look at a.rs too",
        );
        let refs: Vec<_> = out.artifacts.iter().map(|a| a.reference.as_str()).collect();
        assert_eq!(refs, vec!["CODE:data.rs", "CODE:a.rs"]);
        assert_eq!(out.semantic.len(), 1);
        assert_eq!(out.semantic[0].links.references, vec!["CODE:data.rs"]);
    }

    #[test]
    fn links_paths_with_line_ranges_and_inline_code() {
        let out = extract("We agreed to split `src/auth/jwt.rs` and touch src/db.rs:40-L52 later");
        let links = &out.semantic[0].links.references;
        assert!(links.contains(&"CODE:src/auth/jwt.rs".to_string()));
        assert!(links.contains(&"CODE:src/db.rs#L40-L52".to_string()));
        assert_eq!(links.len(), 2);
    }

    #[test]
    fn short_lines_are_skipped() {
        let out = extract("decided\nTODO fix");
        assert!(out.semantic.is_empty());
    }

    #[test]
    fn body_includes_surrounding_lines() {
        let out = extract("line one here\nline two here\nWe decided on Postgres\nline four here\nline five here\nline six here");
        let body = &out.semantic[0].body;
        assert!(body.contains("line one here"));
        assert!(body.contains("line five here"));
        assert!(!body.contains("line six here"));
    }

    #[test]
    fn salience_adjusts_for_keywords_and_stays_bounded() {
        let out = extract(
            "Critical: we decided to rotate all keys\nMinor task: fix the typo in the footer",
        );
        assert_eq!(out.semantic[0].salience, 1.0);
        assert!((out.semantic[1].salience - 0.3).abs() < 1e-9);
        for item in &out.semantic {
            assert!((0.1..=1.0).contains(&item.salience));
        }
    }

    #[test]
    fn episodic_kinds_are_classified() {
        let out = extract(
            "test_login failed: expected 200 got 401\n\
             thread 'main' panicked at src/main.rs:10:5\n\
             [ERROR] connection reset by peer\n\
             diff --git a/src/lib.rs b/src/lib.rs",
        );
        let kinds: Vec<_> = out.episodic.iter().map(|e| e.kind).collect();
        assert_eq!(
            kinds,
            vec![
                EpisodicKind::TestFail,
                EpisodicKind::Stack,
                EpisodicKind::Log,
                EpisodicKind::Diff
            ]
        );
        assert_eq!(out.episodic[0].salience, 0.9);
        // snippet is current + next line
        assert!(out.episodic[0].snippet.contains("panicked at"));
        assert_eq!(out.episodic[0].source, "ingest");
    }

    #[test]
    fn episodic_hash_is_content_hash_of_snippet() {
        let out = extract("[ERROR] database connection pool exhausted");
        let item = &out.episodic[0];
        assert_eq!(item.hash, content_hash(&item.snippet));
        assert_eq!(item.id, format!("E_{}", &item.hash[..8]));
    }

    #[test]
    fn secrets_are_redacted_before_storage() {
        let out = extract("We decided to use api_key=abcd1234efgh5678 for staging");
        assert_eq!(out.redactions, 1);
        assert!(!out.semantic[0].body.contains("abcd1234efgh5678"));
        assert!(out.semantic[0].body.contains("[REDACTED_API_KEY]"));
    }

    #[test]
    fn artifacts_from_paths_fences_and_inline_code() {
        let out = extract(
            "We decided to refactor src/auth/jwt.rs:10-42 first\n\
             see `config/app.toml` too\n\
             ```rust\nfn main() {}\n```\n\
             and again src/auth/jwt.rs:10-42",
        );
        let refs: Vec<_> = out.artifacts.iter().map(|a| a.reference.as_str()).collect();
        assert!(refs.contains(&"CODE:src/auth/jwt.rs#L10-L42"));
        assert!(refs.contains(&"CODE:config/app.toml"));
        assert!(refs.iter().any(|r| r.starts_with("CODE:snippet_") && r.ends_with(".rust")));
        assert_eq!(refs.len(), 3);

        // the decision mentions the file and links to it
        let decision = &out.semantic[0];
        assert!(decision
            .links
            .references
            .contains(&"CODE:src/auth/jwt.rs#L10-L42".to_string()));
    }

    #[test]
    fn empty_and_binary_input_yield_nothing() {
        assert!(extract("").is_empty());
        assert!(extract("\u{0}\u{1}\u{2}\u{3}\u{FFFD}\u{FFFD}decided\u{0}\u{0}\u{0}\u{0}\u{0}").is_empty());
    }

    #[test]
    fn title_is_first_clause_and_capped() {
        let long = format!("We decided to {}. Then more", "x".repeat(200));
        let out = extract(&long);
        assert_eq!(out.semantic[0].title.chars().count(), 100);

        assert_eq!(first_clause("- [ ] implement caching; later", 100), "implement caching");
    }
}
