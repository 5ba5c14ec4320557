//! Sync an external todo batch against the board.

use anyhow::{Context, Result, bail};
use std::io::Read;
use std::path::Path;

use taskdeck::context::AppContext;
use taskdeck::sync::{SyncEngine, TodoBatch};

pub fn cmd_sync(project_dir: &Path, input: &str, json: bool) -> Result<()> {
    let raw = if input == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("Failed to read todo batch from stdin")?;
        buf
    } else {
        std::fs::read_to_string(input)
            .with_context(|| format!("Failed to read todo batch from {}", input))?
    };
    let batch: TodoBatch =
        serde_json::from_str(&raw).context("Invalid todo batch: expected {\"todos\": [...]}")?;

    let ctx = AppContext::open(project_dir)?;
    ctx.boards().board()?;
    let result = SyncEngine::new(&ctx).run(&batch);

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        println!(
            "Sync: {} created, {} moved, {} skipped",
            result.created, result.moved, result.skipped
        );
        for err in &result.errors {
            println!("  {} {}", console::style("error:").red(), err);
        }
    }
    if !result.success {
        bail!("{} item(s) failed to sync", result.errors.len());
    }
    Ok(())
}
