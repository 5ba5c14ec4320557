//! Ranked "what should I work on next" command.

use anyhow::Result;
use chrono::Utc;
use std::path::Path;

use taskdeck::context::AppContext;
use taskdeck::scoring::rank_actionable;

pub fn cmd_next(project_dir: &Path, limit: usize, json: bool) -> Result<()> {
    let ctx = AppContext::open(project_dir)?;
    ctx.boards().board()?;
    let ranked = rank_actionable(&ctx, Utc::now())?;
    let page: Vec<_> = ranked.into_iter().take(limit.max(1)).collect();

    if json {
        println!("{}", serde_json::to_string_pretty(&page)?);
        return Ok(());
    }
    if page.is_empty() {
        println!("No actionable tasks.");
        return Ok(());
    }

    println!();
    for (i, result) in page.iter().enumerate() {
        let breakdown: Vec<String> = result
            .breakdown
            .iter()
            .map(|c| format!("{} {:.1}", c.scorer, c.score))
            .collect();
        println!(
            "{}. {} {:<8} {}",
            i + 1,
            console::style(&result.task.id).cyan(),
            format!("{:.1}", result.total),
            result.task.title
        );
        println!("   {}", console::style(breakdown.join("  ")).dim());
    }
    println!();
    Ok(())
}
