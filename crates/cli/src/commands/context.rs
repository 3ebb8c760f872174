//! `recollect recall` / `recollect working-set` — Read a thread's memory.

use super::open_service;

pub async fn recall(
    thread: &str,
    purpose: &str,
    budget: Option<usize>,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let service = open_service()?;
    let result = service.recall(thread, purpose, budget).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }

    println!("Mission: {}", result.globals.mission);
    if !result.globals.constraints.is_empty() {
        println!("Constraints:");
        for c in &result.globals.constraints {
            println!("  - {c}");
        }
    }

    println!();
    println!(
        "Focus ({} items, ~{} of {} tokens):",
        result.focus.len(),
        result.token_estimate,
        result.token_budget
    );
    if result.focus.is_empty() {
        println!("  (nothing stored for this thread)");
    }
    for (i, item) in result.focus.iter().enumerate() {
        println!(
            "  {:>2}. [{:.3}] {} {} — {}",
            i + 1,
            item.score,
            item.id,
            item.kind,
            item.title
        );
    }

    if !result.artifact_refs.is_empty() {
        println!();
        println!("Artifacts:");
        for r in &result.artifact_refs {
            println!("  - {r}");
        }
    }
    Ok(())
}

pub async fn working_set(
    thread: &str,
    purpose: &str,
    budget: Option<usize>,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let service = open_service()?;
    let ws = service.prepare_context(thread, purpose, budget).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&ws)?);
    } else {
        print!("{}", ws.render());
        tracing::debug!(tokens = ws.token_estimate, "Working set built");
    }
    Ok(())
}
