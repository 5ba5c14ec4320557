//! Scoring engine: ranks actionable tasks for "what should I work on next".
//!
//! A fixed, ordered pipeline of independent scorers runs over the candidate
//! set; each contributes a named score and the totals are sorted descending.
//! Ranking is deterministic for a fixed input set: ties fall back to the
//! per-scorer contributions in pipeline order, then to the task id. New
//! scorers append to the pipeline without altering existing contributions.

mod scorers;

pub use scorers::{BlockingScorer, DueDateScorer, FifoScorer, PriorityScorer};

use std::cmp::Ordering;
use std::collections::HashMap;

use chrono::{DateTime, Utc};

use crate::context::AppContext;
use crate::errors::Result;
use crate::models::{ScoreResult, ScorerContribution, Task};

/// Everything a scorer may look at for one task.
pub struct ScorerInput<'a> {
    pub task: &'a Task,
    pub now: DateTime<Utc>,
    /// How many other tasks this one currently blocks.
    pub blocking_count: usize,
}

pub trait Scorer {
    fn name(&self) -> &'static str;
    fn score(&self, input: &ScorerInput<'_>) -> f64;
}

pub struct ScoringEngine {
    scorers: Vec<Box<dyn Scorer>>,
}

impl Default for ScoringEngine {
    fn default() -> Self {
        Self::standard()
    }
}

impl ScoringEngine {
    /// The standard pipeline, in evaluation order.
    pub fn standard() -> Self {
        Self {
            scorers: vec![
                Box::new(PriorityScorer),
                Box::new(DueDateScorer),
                Box::new(BlockingScorer),
                Box::new(FifoScorer),
            ],
        }
    }

    pub fn with_scorers(scorers: Vec<Box<dyn Scorer>>) -> Self {
        Self { scorers }
    }

    /// Append a scorer to the end of the pipeline.
    pub fn push(&mut self, scorer: Box<dyn Scorer>) {
        self.scorers.push(scorer);
    }

    /// Score and rank a candidate list. `now` is passed in so a ranking is a
    /// pure function of its inputs.
    pub fn rank(
        &self,
        candidates: &[Task],
        blocking_counts: &HashMap<String, usize>,
        now: DateTime<Utc>,
    ) -> Vec<ScoreResult> {
        let mut results: Vec<ScoreResult> = candidates
            .iter()
            .map(|task| {
                let input = ScorerInput {
                    task,
                    now,
                    blocking_count: blocking_counts.get(&task.id).copied().unwrap_or(0),
                };
                let breakdown: Vec<ScorerContribution> = self
                    .scorers
                    .iter()
                    .map(|s| ScorerContribution {
                        scorer: s.name().to_string(),
                        score: s.score(&input),
                    })
                    .collect();
                let total = breakdown.iter().map(|c| c.score).sum();
                ScoreResult {
                    task: task.clone(),
                    total,
                    breakdown,
                }
            })
            .collect();
        results.sort_by(compare_results);
        results
    }
}

fn compare_results(a: &ScoreResult, b: &ScoreResult) -> Ordering {
    match b.total.partial_cmp(&a.total) {
        Some(Ordering::Equal) | None => {}
        Some(ord) => return ord,
    }
    for (ca, cb) in a.breakdown.iter().zip(&b.breakdown) {
        match cb.score.partial_cmp(&ca.score) {
            Some(Ordering::Equal) | None => {}
            Some(ord) => return ord,
        }
    }
    a.task.id.cmp(&b.task.id)
}

/// Rank every actionable task on the board with the standard pipeline.
pub fn rank_actionable(ctx: &AppContext, now: DateTime<Utc>) -> Result<Vec<ScoreResult>> {
    let candidates = ctx.tasks().actionable_tasks()?;
    let links = ctx.links();
    let mut blocking_counts = HashMap::new();
    for task in &candidates {
        blocking_counts.insert(task.id.clone(), links.get_blocking(&task.id)?.len());
    }
    Ok(ScoringEngine::standard().rank(&candidates, &blocking_counts, now))
}
