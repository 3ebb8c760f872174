//! `recollect ingest` — Feed a transcript into a thread's memory.

use super::open_service;
use std::io::Read;
use std::path::Path;

pub async fn run(
    thread: &str,
    source: Option<&str>,
    input: &Path,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let content = read_input(input)?;
    let service = open_service()?;
    let report = service.ingest(&content, thread, source).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("Ingested into thread '{}'", report.thread_id);
    println!(
        "  Semantic:   {} added, {} updated",
        report.semantic_added.len(),
        report.semantic_updated.len()
    );
    println!(
        "  Episodic:   {} added, {} updated",
        report.episodic_added.len(),
        report.episodic_updated.len()
    );
    println!(
        "  Artifacts:  {} added, {} updated",
        report.artifacts_added.len(),
        report.artifacts_updated.len()
    );
    if report.redactions > 0 {
        println!("  Redacted:   {} secret(s)", report.redactions);
    }
    Ok(())
}

fn read_input(input: &Path) -> Result<String, Box<dyn std::error::Error>> {
    if input.as_os_str() == "-" {
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf)?;
        return Ok(buf);
    }
    std::fs::read_to_string(input)
        .map_err(|e| format!("Failed to read {}: {e}", input.display()).into())
}
