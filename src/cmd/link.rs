//! Link graph commands.

use anyhow::{Result, anyhow};
use std::path::Path;
use std::str::FromStr;

use taskdeck::context::AppContext;
use taskdeck::models::LinkType;

pub fn cmd_link(project_dir: &Path, from: &str, to: &str, link_type: &str) -> Result<()> {
    let ctx = AppContext::open(project_dir)?;
    let link_type = LinkType::from_str(link_type).map_err(|e| anyhow!(e))?;
    ctx.links().add_link(from, to, link_type)?;
    println!("{} {} {}", from, link_type, to);
    Ok(())
}

pub fn cmd_unlink(project_dir: &Path, from: &str, to: &str, link_type: &str) -> Result<()> {
    let ctx = AppContext::open(project_dir)?;
    let link_type = LinkType::from_str(link_type).map_err(|e| anyhow!(e))?;
    ctx.links().remove_link(from, to, link_type)?;
    println!("Removed {} {} {}", from, link_type, to);
    Ok(())
}

pub fn cmd_links(project_dir: &Path, id: &str) -> Result<()> {
    let ctx = AppContext::open(project_dir)?;
    let links = ctx.links().get_all_links(id, None)?;
    if links.is_empty() {
        println!("No links.");
        return Ok(());
    }
    for link in &links {
        println!(
            "{} {} {}",
            link.from_task_id, link.link_type, link.to_task_id
        );
    }
    Ok(())
}

pub fn cmd_blockers(project_dir: &Path, id: &str) -> Result<()> {
    let ctx = AppContext::open(project_dir)?;
    let blockers = ctx.links().get_blockers(id)?;
    if blockers.is_empty() {
        println!("Nothing blocks {}.", id);
        return Ok(());
    }
    println!("Blocked by:");
    for blocker in &blockers {
        println!("  {}", blocker);
    }
    Ok(())
}
