/// Task state definitions for tracking crawl progress
///
/// Every crawl task walks `Pending -> Fetching -> Succeeded -> Dispatched`
/// or ends in `Failed` straight from `Fetching`.
use std::fmt;

/// Represents the current state of one crawl task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskState {
    // ===== Active States =====
    /// Task is queued and waiting for a fetch slot
    Pending,

    /// Task's page is being fetched
    Fetching,

    /// Page was fetched; children and records not handed off yet
    Succeeded,

    // ===== Terminal States =====
    /// Children were queued and the record (if any) was aggregated
    Dispatched,

    /// Fetch failed; the failure is logged and isolated to this task
    Failed,
}

impl TaskState {
    /// Returns true if no further processing happens for the task
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Dispatched | Self::Failed)
    }

    /// Returns true if this state may be followed by `next`
    pub fn can_transition_to(&self, next: TaskState) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Fetching)
                | (Self::Fetching, Self::Succeeded)
                | (Self::Fetching, Self::Failed)
                | (Self::Succeeded, Self::Dispatched)
        )
    }

    /// Moves to `next`, rejecting transitions the state machine does not allow
    pub fn advance(&mut self, next: TaskState) -> crate::Result<()> {
        if !self.can_transition_to(next) {
            return Err(crate::SweepError::InvalidTransition { from: *self, to: next });
        }
        *self = next;
        Ok(())
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Fetching => "fetching",
            Self::Succeeded => "succeeded",
            Self::Dispatched => "dispatched",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for TaskState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
