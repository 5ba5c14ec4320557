//! The standard scorers, in their pipeline order.

use super::{Scorer, ScorerInput};
use crate::models::Priority;

/// Fixed weight per declared priority tier.
pub struct PriorityScorer;

impl Scorer for PriorityScorer {
    fn name(&self) -> &'static str {
        "priority"
    }

    fn score(&self, input: &ScorerInput<'_>) -> f64 {
        match input.task.priority {
            Priority::Low => 10.0,
            Priority::Medium => 20.0,
            Priority::High => 30.0,
        }
    }
}

/// Urgency grows monotonically as the due date approaches and caps out once
/// it has passed. Tasks without a due date contribute nothing.
pub struct DueDateScorer;

impl DueDateScorer {
    const MAX: f64 = 25.0;
    /// Seconds over which urgency ramps up (7 days).
    const HORIZON_SECS: f64 = 604_800.0;
}

impl Scorer for DueDateScorer {
    fn name(&self) -> &'static str {
        "due_date"
    }

    fn score(&self, input: &ScorerInput<'_>) -> f64 {
        let Some(due_at) = input.task.due_at else {
            return 0.0;
        };
        let remaining = (due_at - input.now).num_seconds();
        if remaining <= 0 {
            return Self::MAX;
        }
        Self::MAX * Self::HORIZON_SECS / (Self::HORIZON_SECS + remaining as f64)
    }
}

/// Rewards unblocking high-fan-out work: a fixed amount per task this one
/// blocks, capped.
pub struct BlockingScorer;

impl BlockingScorer {
    const PER_BLOCKED: f64 = 5.0;
    const MAX: f64 = 25.0;
}

impl Scorer for BlockingScorer {
    fn name(&self) -> &'static str {
        "blocking"
    }

    fn score(&self, input: &ScorerInput<'_>) -> f64 {
        (input.blocking_count as f64 * Self::PER_BLOCKED).min(Self::MAX)
    }
}

/// Small age-based contribution so older tasks edge out newer ones when all
/// other scorers tie. Bounded below 1.0 so it never outweighs a real signal.
pub struct FifoScorer;

impl FifoScorer {
    const MAX: f64 = 1.0;
    /// Seconds at which the contribution reaches half its cap (7 days).
    const HORIZON_SECS: f64 = 604_800.0;
}

impl Scorer for FifoScorer {
    fn name(&self) -> &'static str {
        "fifo"
    }

    fn score(&self, input: &ScorerInput<'_>) -> f64 {
        let age = (input.now - input.task.created_at).num_seconds().max(0) as f64;
        Self::MAX * age / (age + Self::HORIZON_SECS)
    }
}
