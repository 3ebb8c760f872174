//! `recollect stats` — Per-thread item counts.

use super::open_service;

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let service = open_service()?;
    let stats = service.stats().await?;

    println!("Memory Statistics");
    println!("=================");
    println!("  Backend:  {}", service.store().name());
    println!("  Threads:  {}", stats.len());
    if stats.is_empty() {
        return Ok(());
    }

    println!();
    println!(
        "  {:<24} {:>9} {:>9} {:>9}",
        "THREAD", "SEMANTIC", "EPISODIC", "ARTIFACTS"
    );
    for s in &stats {
        println!(
            "  {:<24} {:>9} {:>9} {:>9}",
            s.thread_id, s.semantic, s.episodic, s.artifacts
        );
    }
    Ok(())
}
