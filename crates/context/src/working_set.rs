//! Working-set assembly — turns a [`RetrievalResult`] into the bounded,
//! structured payload injected into a prompt.
//!
//! Every field is built independently and never left empty: missing inputs
//! fall back to fixed placeholders. When the rendered estimate exceeds the
//! budget, fields are trimmed in a fixed order:
//!
//! 1. open questions → 70 %
//! 2. artifacts → 80 %
//! 3. focus tasks → 80 %
//! 4. constraints → 90 %
//! 5. focus decisions → 90 %
//! 6. runbook steps → first 5
//!
//! Each ratio applies to the current length (at least one entry survives),
//! and the estimate is recomputed after every step. This is a single pass,
//! so pathological inputs can still end up over budget.

use crate::retriever::{FocusItem, RetrievalResult, RunbookEntry};
use recollect_config::WorkingSetConfig;
use recollect_core::hash::short_hash;
use recollect_core::item::{ItemKind, ItemStatus};
use recollect_core::token::estimate_tokens;
use serde::{Deserialize, Serialize};

const MISSION_PREFIX: &str = "Mission:";
const MAX_OPEN_QUESTIONS: usize = 5;
const MAX_RUNBOOK_STEPS_AFTER_TRIM: usize = 5;

const NO_CONSTRAINTS: &str = "No explicit constraints recorded; follow existing project conventions.";
const PLACEHOLDER_TASK: &str = "Review the thread context and confirm the next step";
const PLACEHOLDER_STEP: &str = "Review the current context and define the first concrete step.";
const FALLBACK_QUESTIONS: [&str; 3] = [
    "What is the most important outcome for this thread right now?",
    "Which constraints or requirements are missing from the current context?",
    "What should be verified before proceeding?",
];

const HIGH_IMPACT: &[&str] = &["architecture", "architectural", "security", "breaking"];
const MEDIUM_IMPACT: &[&str] = &["feature", "component"];
const HIGH_PRIORITY: &[&str] = &["urgent", "critical", "fix", "bug", "security"];
const LOW_PRIORITY: &[&str] = &["cleanup", "clean up", "minor", "refactor"];

const DECISION_HINTS: &[&str] = &["decided", "decision", "chose", "agreed", "will use", "going with"];
const TASK_HINTS: &[&str] = &["todo", "implement", "fix", "need to", "task", "should"];

/// Impact of a decision or priority of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Level {
    Low,
    Medium,
    High,
}

impl Level {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FocusDecision {
    /// `D_` + 8 hex chars of a hash over title and description.
    pub id: String,
    pub title: String,
    pub status: ItemStatus,
    pub impact: Level,
    /// The memory item this decision was derived from, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FocusTask {
    /// `T_` + 8 hex chars of a hash over title and description.
    pub id: String,
    pub title: String,
    pub status: ItemStatus,
    pub priority: Level,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_id: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunbookSteps {
    pub steps: Vec<String>,
}

/// The assembled, prompt-ready context for one request. Never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkingSet {
    pub mission: String,
    pub constraints: Vec<String>,
    pub focus_decisions: Vec<FocusDecision>,
    pub focus_tasks: Vec<FocusTask>,
    pub runbook: RunbookSteps,
    pub artifacts: Vec<String>,
    pub citations: Vec<String>,
    pub open_questions: Vec<String>,
    pub token_estimate: usize,
}

impl WorkingSet {
    /// Render the prompt section. Empty sections are omitted.
    pub fn render(&self) -> String {
        let mut out = format!("{}\n", self.mission);

        if !self.constraints.is_empty() {
            out.push_str("\nConstraints:\n");
            for c in &self.constraints {
                out.push_str(&format!("- {c}\n"));
            }
        }

        if !self.focus_decisions.is_empty() {
            out.push_str("\nFocus decisions:\n");
            for d in &self.focus_decisions {
                out.push_str(&format!(
                    "- [{}] {} ({}, impact: {})\n",
                    d.id,
                    d.title,
                    d.status,
                    d.impact.as_str()
                ));
            }
        }

        if !self.focus_tasks.is_empty() {
            out.push_str("\nFocus tasks:\n");
            for t in &self.focus_tasks {
                out.push_str(&format!(
                    "- [{}] {} ({}, priority: {})\n",
                    t.id,
                    t.title,
                    t.status,
                    t.priority.as_str()
                ));
            }
        }

        if !self.runbook.steps.is_empty() {
            out.push_str("\nRunbook:\n");
            for (i, step) in self.runbook.steps.iter().enumerate() {
                out.push_str(&format!("{}. {step}\n", i + 1));
            }
        }

        if !self.artifacts.is_empty() {
            out.push_str("\nArtifacts:\n");
            for a in &self.artifacts {
                out.push_str(&format!("- {a}\n"));
            }
        }

        if !self.citations.is_empty() {
            out.push_str(&format!("\nCitations: {}\n", self.citations.join(", ")));
        }

        if !self.open_questions.is_empty() {
            out.push_str("\nOpen questions:\n");
            for q in &self.open_questions {
                out.push_str(&format!("- {q}\n"));
            }
        }

        out
    }

    /// Heuristic token cost of the rendered text.
    pub fn estimate_tokens(&self) -> usize {
        estimate_tokens(&self.render())
    }
}

/// Fields the trim pass may shrink, in trim order.
#[derive(Debug, Clone, Copy)]
enum TrimField {
    OpenQuestions,
    Artifacts,
    FocusTasks,
    Constraints,
    FocusDecisions,
}

const TRIM_ORDER: [(TrimField, usize); 5] = [
    (TrimField::OpenQuestions, 70),
    (TrimField::Artifacts, 80),
    (TrimField::FocusTasks, 80),
    (TrimField::Constraints, 90),
    (TrimField::FocusDecisions, 90),
];

/// Builds working sets. Stateless — create one and reuse it.
#[derive(Debug, Clone)]
pub struct WorkingSetBuilder {
    default_token_budget: usize,
}

impl Default for WorkingSetBuilder {
    fn default() -> Self {
        Self::new(&WorkingSetConfig::default())
    }
}

impl WorkingSetBuilder {
    pub fn new(config: &WorkingSetConfig) -> Self {
        Self {
            default_token_budget: config.default_token_budget,
        }
    }

    /// Assemble a working set, trimming to `token_budget` (or the configured
    /// default).
    pub fn build(&self, result: &RetrievalResult, token_budget: Option<usize>) -> WorkingSet {
        let budget = token_budget.unwrap_or(self.default_token_budget);

        let (mut decisions, mut tasks) = (
            result.globals.runbook.decisions.iter().map(focus_decision).collect::<Vec<_>>(),
            result.globals.runbook.tasks.iter().map(focus_task).collect::<Vec<_>>(),
        );
        if decisions.is_empty() && tasks.is_empty() {
            (decisions, tasks) = scan_focus_items(&result.focus);
        }
        if decisions.is_empty() && tasks.is_empty() {
            tasks.push(placeholder_task());
        }

        let runbook = RunbookSteps {
            steps: runbook_steps(&decisions, &tasks),
        };
        let open_questions = open_questions(&decisions, &tasks);

        let mut ws = WorkingSet {
            mission: normalize_mission(&result.globals.mission),
            constraints: if result.globals.constraints.is_empty() {
                vec![NO_CONSTRAINTS.to_string()]
            } else {
                result.globals.constraints.clone()
            },
            focus_decisions: decisions,
            focus_tasks: tasks,
            runbook,
            artifacts: result.artifact_refs.clone(),
            citations: result.focus_ids.clone(),
            open_questions,
            token_estimate: 0,
        };

        let before = ws.estimate_tokens();
        ws.token_estimate = before;
        if before > budget {
            trim_to_budget(&mut ws, budget);
            tracing::debug!(
                thread_id = %result.thread_id,
                budget,
                before,
                after = ws.token_estimate,
                "Trimmed working set"
            );
        }
        ws
    }
}

// ── Field builders ────────────────────────────────────────────────────────

fn normalize_mission(mission: &str) -> String {
    let mission = mission.trim();
    let body = if mission.len() >= MISSION_PREFIX.len()
        && mission.is_char_boundary(MISSION_PREFIX.len())
        && mission[..MISSION_PREFIX.len()].eq_ignore_ascii_case(MISSION_PREFIX)
    {
        mission[MISSION_PREFIX.len()..].trim_start()
    } else {
        mission
    };
    if body.is_empty() {
        format!("{MISSION_PREFIX} {}", crate::retriever::FALLBACK_MISSION)
    } else {
        format!("{MISSION_PREFIX} {body}")
    }
}

fn synthetic_id(prefix: &str, title: &str, description: &str) -> String {
    format!("{prefix}{}", short_hash(&format!("{title}{description}")))
}

fn contains_any(text: &str, keywords: &[&str]) -> bool {
    keywords.iter().any(|k| text.contains(k))
}

fn decision_impact(title: &str, description: &str) -> Level {
    let text = format!("{title} {description}").to_lowercase();
    if contains_any(&text, HIGH_IMPACT) {
        Level::High
    } else if contains_any(&text, MEDIUM_IMPACT) {
        Level::Medium
    } else {
        Level::Low
    }
}

fn task_priority(title: &str, description: &str, status: ItemStatus) -> Level {
    if status == ItemStatus::Accepted {
        return Level::High;
    }
    let text = format!("{title} {description}").to_lowercase();
    if contains_any(&text, HIGH_PRIORITY) {
        Level::High
    } else if contains_any(&text, LOW_PRIORITY) {
        Level::Low
    } else {
        Level::Medium
    }
}

fn focus_decision(entry: &RunbookEntry) -> FocusDecision {
    FocusDecision {
        id: synthetic_id("D_", &entry.title, &entry.description),
        title: entry.title.clone(),
        status: entry.status,
        impact: decision_impact(&entry.title, &entry.description),
        source_id: Some(entry.id.clone()),
    }
}

fn focus_task(entry: &RunbookEntry) -> FocusTask {
    FocusTask {
        id: synthetic_id("T_", &entry.title, &entry.description),
        title: entry.title.clone(),
        status: entry.status,
        priority: task_priority(&entry.title, &entry.description, entry.status),
        source_id: Some(entry.id.clone()),
    }
}

/// Keyword scan over the selected semantic items, used when the runbook
/// holds no decisions or tasks.
fn scan_focus_items(focus: &[FocusItem]) -> (Vec<FocusDecision>, Vec<FocusTask>) {
    let mut decisions = Vec::new();
    let mut tasks = Vec::new();
    for item in focus {
        if !matches!(item.kind, ItemKind::Semantic(_)) {
            continue;
        }
        let entry = RunbookEntry {
            id: item.id.clone(),
            title: item.title.clone(),
            status: item.status.unwrap_or_default(),
            description: item.body.clone(),
        };
        let text = format!("{} {}", item.title, item.body).to_lowercase();
        if contains_any(&text, DECISION_HINTS) {
            decisions.push(focus_decision(&entry));
        } else if contains_any(&text, TASK_HINTS) {
            tasks.push(focus_task(&entry));
        }
    }
    (decisions, tasks)
}

fn placeholder_task() -> FocusTask {
    FocusTask {
        id: synthetic_id("T_", PLACEHOLDER_TASK, ""),
        title: PLACEHOLDER_TASK.to_string(),
        status: ItemStatus::Provisional,
        priority: Level::Medium,
        source_id: None,
    }
}

/// Ordered prose steps: foundations, urgent work, pending decisions, the rest.
fn runbook_steps(decisions: &[FocusDecision], tasks: &[FocusTask]) -> Vec<String> {
    let mut steps = Vec::new();
    for d in decisions.iter().filter(|d| d.status == ItemStatus::Accepted) {
        steps.push(format!("Build on the agreed decision: {}", d.title));
    }
    for t in tasks.iter().filter(|t| t.priority == Level::High) {
        steps.push(format!("Start with high-priority task: {}", t.title));
    }
    for d in decisions.iter().filter(|d| d.status == ItemStatus::Provisional) {
        steps.push(format!("Resolve pending decision (needs resolution): {}", d.title));
    }
    for t in tasks.iter().filter(|t| t.priority == Level::Medium) {
        steps.push(format!("Then work on: {}", t.title));
    }
    if steps.is_empty() {
        steps.push(PLACEHOLDER_STEP.to_string());
    }
    steps
}

fn open_questions(decisions: &[FocusDecision], tasks: &[FocusTask]) -> Vec<String> {
    let mut questions: Vec<String> = decisions
        .iter()
        .filter(|d| d.status == ItemStatus::Provisional)
        .map(|d| format!("Should we proceed with: {}?", d.title))
        .chain(
            tasks
                .iter()
                .filter(|t| t.priority == Level::High)
                .map(|t| format!("How should we implement: {}?", t.title)),
        )
        .take(MAX_OPEN_QUESTIONS)
        .collect();
    if questions.is_empty() {
        questions = FALLBACK_QUESTIONS.iter().map(|q| q.to_string()).collect();
    }
    questions
}

// ── Trimming ──────────────────────────────────────────────────────────────

/// `max(1, ⌈len · pct / 100⌉)` for non-empty lists.
fn kept(len: usize, pct: usize) -> usize {
    if len == 0 {
        0
    } else {
        (len * pct).div_ceil(100).max(1)
    }
}

fn trim_field(ws: &mut WorkingSet, field: TrimField, pct: usize) {
    match field {
        TrimField::OpenQuestions => {
            let keep = kept(ws.open_questions.len(), pct);
            ws.open_questions.truncate(keep);
        }
        TrimField::Artifacts => {
            let keep = kept(ws.artifacts.len(), pct);
            ws.artifacts.truncate(keep);
        }
        TrimField::FocusTasks => {
            let keep = kept(ws.focus_tasks.len(), pct);
            ws.focus_tasks.truncate(keep);
        }
        TrimField::Constraints => {
            let keep = kept(ws.constraints.len(), pct);
            ws.constraints.truncate(keep);
        }
        TrimField::FocusDecisions => {
            let keep = kept(ws.focus_decisions.len(), pct);
            ws.focus_decisions.truncate(keep);
        }
    }
}

fn trim_to_budget(ws: &mut WorkingSet, budget: usize) {
    for (field, pct) in TRIM_ORDER {
        trim_field(ws, field, pct);
        ws.token_estimate = ws.estimate_tokens();
        if ws.token_estimate <= budget {
            return;
        }
    }
    ws.runbook.steps.truncate(MAX_RUNBOOK_STEPS_AFTER_TRIM);
    ws.token_estimate = ws.estimate_tokens();
}
